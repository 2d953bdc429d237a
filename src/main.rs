//! Punto de entrada ("driver").
//!
//! Este módulo orquesta una compilación y expone una CLI. La hoja de
//! estilos estática se escribe en el archivo de salida o en stdout; el
//! reporte opcional de clases y fragmentos dinámicos va a stderr.

use anyhow::{self, bail, Context};
use clap::{self, crate_version, value_parser, Arg, ArgAction, Command};
use tracing_subscriber::EnvFilter;
use vcss::{error::Diagnostics, Compiled, Compiler, Config};

use std::{
    fs,
    io::{self, Read, Write},
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "vcss=warn".into()))
        .with_writer(io::stderr)
        .init();

    // Parsing de CLI
    let args = Command::new("Void CSS compiler")
        .version(crate_version!())
        .arg(
            Arg::new("input")
                .value_name("FILE")
                .default_value("-")
                .help("Input file ('-' for stdin)"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .default_value("-")
                .help("Output file ('-' for stdout)"),
        )
        .arg(
            Arg::new("compressed")
                .short('c')
                .long("compressed")
                .action(ArgAction::SetTrue)
                .help("Emit without whitespace"),
        )
        .arg(
            Arg::new("indent")
                .long("indent")
                .value_name("TEXT")
                .default_value("  ")
                .help("Indentation unit"),
        )
        .arg(
            Arg::new("prefix")
                .long("prefix")
                .value_name("PREFIX")
                .default_value("vcss")
                .help("Middle segment of generated class names"),
        )
        .arg(
            Arg::new("suffix-length")
                .long("suffix-length")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .default_value("5")
                .help("Length of the random suffix of generated class names"),
        )
        .arg(
            Arg::new("no-merge")
                .long("no-merge")
                .action(ArgAction::SetTrue)
                .help("Do not merge adjacent rules with the same selector"),
        )
        .arg(
            Arg::new("license")
                .long("license")
                .value_name("FILE")
                .help("Prepend the contents of FILE to the output"),
        )
        .arg(
            Arg::new("report")
                .long("report")
                .action(ArgAction::SetTrue)
                .help("Print exported classes and dynamic fragments to stderr"),
        )
        .get_matches();

    // Se extraen argumentos necesarios
    let input = string_arg(&args, "input")?;
    let output = string_arg(&args, "output")?;
    let suffix_length = match args.get_one::<usize>("suffix-length") {
        Some(0) => bail!("Suffix length must be at least 1"),
        Some(length) => *length,
        None => bail!("Missing argument: suffix-length"),
    };

    let license_notice = match args.get_one::<String>("license") {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read license notice: {}", path))?,
        None => String::new(),
    };

    let config = Config {
        compressed: args.get_flag("compressed"),
        indentation: string_arg(&args, "indent")?.to_owned(),
        class_prefix: string_arg(&args, "prefix")?.to_owned(),
        class_suffix_length: suffix_length,
        merge_rules: !args.get_flag("no-merge"),
        license_notice,
        ..Config::default()
    };

    let (name, source) = match input {
        "-" => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("Failed to read from stdin")?;

            ("<stdin>", source)
        }

        path => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("Failed to open for reading: {}", path))?;

            (path, source)
        }
    };

    let compiled = match Compiler::new(config).compile(&source) {
        Ok(compiled) => compiled,
        Err(error) => {
            let diagnostics = Diagnostics::from(error).with_source(name, source.as_str());
            eprint!("{}", diagnostics);
            bail!("Failed to compile: {}", name);
        }
    };

    match output {
        "-" => {
            let mut stdout = io::stdout();
            writeln!(stdout, "{}", compiled.static_css).context("Failed to write to stdout")?;
        }

        path => {
            let mut css = compiled.static_css.clone();
            css.push('\n');

            fs::write(path, css).with_context(|| format!("Failed to write to file: {}", path))?;
        }
    }

    if args.get_flag("report") {
        report(&compiled, &mut io::stderr()).context("Failed to write report")?;
    }

    Ok(())
}

fn string_arg<'a>(args: &'a clap::ArgMatches, id: &str) -> anyhow::Result<&'a str> {
    match args.get_one::<String>(id) {
        Some(value) => Ok(value.as_str()),
        None => bail!("Missing argument: {}", id),
    }
}

fn report(compiled: &Compiled, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "classes:")?;
    for (key, generated) in &compiled.classes {
        writeln!(out, "  {} = {}", key, generated)?;
    }

    writeln!(out, "dynamic:")?;
    for fragment in &compiled.dynamic {
        writeln!(out, "  {} [{}]", fragment.hash, fragment.dependencies.join(", "))?;
        for line in fragment.css.lines() {
            writeln!(out, "    {}", line)?;
        }
    }

    Ok(())
}
