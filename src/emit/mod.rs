//! Emisión de CSS.
//!
//! Convierte las reglas del árbol en texto. Las reglas estáticas se
//! concatenan en la hoja de estilos final; las dinámicas se entregan
//! por separado junto a un hash de su contenido, que sirve como
//! identificador estable para el entorno de ejecución. Los bloques
//! `@keyframes` se emiten aparte, en [`keyframes`].

mod keyframes;

use std::collections::BTreeMap;

use crate::{
    context::Context,
    extension::Event,
    tree::{ExportedClass, Rule},
};

use base64::{engine::general_purpose, Engine as _};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Resultado de una compilación.
#[derive(Clone, Debug, Default)]
pub struct Compiled {
    /// Clases exportadas: nombre original en camelCase a nombre generado.
    pub classes: BTreeMap<String, String>,

    /// Hoja de estilos estática.
    pub static_css: String,

    /// Fragmentos que dependen de variables de tiempo de ejecución.
    pub dynamic: Vec<Fragment>,
}

/// Regla dinámica ya emitida.
///
/// El texto conserva las referencias `$nombre`, que el entorno de
/// ejecución sustituye.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    pub css: String,
    pub dependencies: Vec<String>,

    /// SHA-256 de `css` en base64, con `+`, `=` y `/` reemplazados.
    pub hash: String,

    pub exported_classes: Vec<ExportedClass>,
}

/// Emite las reglas y los `@keyframes` registrados en `cx`.
pub fn emit(cx: &Context<'_>, rules: Vec<Rule<'_>>) -> Compiled {
    let config = cx.config();
    let rules = if config.merge_rules {
        merge(rules)
    } else {
        rules
    };

    let mut css = String::new();
    let mut dynamic = Vec::new();

    for rule in &rules {
        if rule.selector.is_empty() && rule.at_rules.is_empty() {
            continue;
        }

        let rendered = render(cx, rule);
        if rule.dynamic {
            dynamic.push(Fragment {
                hash: hash(&rendered),
                css: rendered,
                dependencies: rule.dependencies.clone(),
                exported_classes: rule.exported_classes.clone(),
            });
        } else {
            css.push_str(&rendered);
        }
    }

    css.push_str(&keyframes::render(cx, cx.keyframes()));

    let mut static_css = String::new();
    let notice = &config.license_notice;
    if !notice.is_empty() {
        static_css.push_str(notice);
        if !notice.ends_with('\n') {
            static_css.push('\n');
        }
    }

    static_css.push_str(css.trim());

    debug!(
        rules = rules.len(),
        dynamic = dynamic.len(),
        bytes = static_css.len(),
        "emission finished"
    );

    Compiled {
        classes: cx.classes().clone(),
        static_css,
        dynamic,
    }
}

/// Fusiona cada regla con la inmediatamente anterior si comparten
/// contexto.
///
/// Solo se comparan vecinas: fusionar reglas distantes alteraría el
/// orden de la cascada respecto a las reglas intermedias.
fn merge(rules: Vec<Rule<'_>>) -> Vec<Rule<'_>> {
    let mut merged: Vec<Rule<'_>> = Vec::with_capacity(rules.len());
    for rule in rules {
        match merged.last_mut() {
            Some(last)
                if last.at_rules == rule.at_rules
                    && last.selector == rule.selector
                    && last.dynamic == rule.dynamic
                    && last.dependencies == rule.dependencies =>
            {
                last.declarations.extend(rule.declarations);
            }

            _ => merged.push(rule),
        }
    }

    merged
}

/// Emite una regla con sus reglas `@` envolventes.
fn render(cx: &Context<'_>, rule: &Rule<'_>) -> String {
    let config = cx.config();
    let compressed = config.compressed;
    let indent = config.indent();
    let (open, newline, space) = if compressed {
        ("{", "", "")
    } else {
        (" {\n", "\n", " ")
    };

    let mut css = String::new();
    let mut shift = String::new();

    for at_rule in &rule.at_rules {
        css.push_str(&shift);
        css.push_str(at_rule);
        css.push_str(open);
        shift.push_str(indent);
    }

    // Sin selector, las declaraciones van directo en la regla `@`
    let direct = rule.selector.is_empty();
    let body = if direct {
        shift.clone()
    } else {
        let selector = cx.query(Event::Selector, &rule.selector, None);
        css.push_str(&shift);
        css.push_str(&selector);
        css.push_str(open);

        format!("{}{}", shift, indent)
    };

    let count = rule.declarations.len();
    for (index, declaration) in rule.declarations.iter().enumerate() {
        let property = &declaration.property;
        let value = &declaration.value;

        let name = cx.query(Event::PropertyName, property.text, Some(property));
        let value = cx.query(Event::PropertyValue, value.text.trim(), Some(value));
        let omit = value.ends_with(';') || (compressed && index + 1 == count);

        css.push_str(&body);
        css.push_str(&name);
        css.push(':');
        css.push_str(space);
        css.push_str(&value);
        if !omit {
            css.push(';');
        }

        css.push_str(newline);
    }

    if !direct {
        css.push_str(&shift);
        css.push('}');
        css.push_str(newline);
    }

    for _ in &rule.at_rules {
        shift.truncate(shift.len().saturating_sub(indent.len()));
        css.push_str(&shift);
        css.push('}');
        css.push_str(newline);
    }

    css
}

/// Hash apto para identificadores CSS.
fn hash(css: &str) -> String {
    let digest = Sha256::digest(css.as_bytes());
    general_purpose::STANDARD
        .encode(digest)
        .replace(|c: char| c == '+' || c == '=', "-")
        .replace('/', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, extension, lex, tree};

    fn compile_with(source: &str, config: &Config) -> Compiled {
        let defaults = extension::defaults();
        let mut cx = Context::new(source, config).register(defaults.iter().map(|extension| &**extension));
        lex::lex(&mut cx).expect("valid input");

        let rules = tree::build(cx.stripped());
        emit(&cx, rules)
    }

    fn compile(source: &str) -> Compiled {
        compile_with(source, &Config::default())
    }

    #[test]
    fn test_single_rule() {
        let compiled = compile(".test { color: red; }");
        assert_eq!(compiled.static_css, ".test {\n  color: red;\n}");
        assert!(compiled.dynamic.is_empty());
    }

    #[test]
    fn test_nested_at_rule_indentation() {
        let compiled = compile("@media screen { .a { color: blue; } }");
        assert_eq!(
            compiled.static_css,
            "@media screen {\n  .a {\n    color: blue;\n  }\n}"
        );
    }

    #[test]
    fn test_direct_at_rule_declarations() {
        let compiled = compile("@font-face { font-family: x; }");
        assert_eq!(compiled.static_css, "@font-face {\n  font-family: x;\n}");
    }

    #[test]
    fn test_compressed() {
        let config = Config {
            compressed: true,
            ..Config::default()
        };

        let compiled = compile_with(".a { color: red; margin: 0; } @media x { .b { c: d; } }", &config);
        assert_eq!(compiled.static_css, ".a{color:red;margin:0}@media x{.b{c:d}}");
    }

    #[test]
    fn test_adjacent_rules_merge() {
        let source = ".a { x: 1; .b { y: 2; } } .a { z: 3; }";
        let merged = compile(source);
        assert_eq!(merged.static_css.matches(".a {").count(), 2);

        let source = ".a { x: 1; } .a { z: 3; }";
        let merged = compile(source);
        assert_eq!(merged.static_css, ".a {\n  x: 1;\n  z: 3;\n}");

        let config = Config {
            merge_rules: false,
            ..Config::default()
        };

        let separate = compile_with(source, &config);
        assert_eq!(separate.static_css.matches(".a {").count(), 2);
    }

    #[test]
    fn test_dynamic_fragment() {
        let compiled = compile(".a { color: $theme; }");
        assert_eq!(compiled.static_css, "");
        assert_eq!(compiled.dynamic.len(), 1);

        let fragment = &compiled.dynamic[0];
        assert_eq!(fragment.dependencies, vec!["$theme".to_string()]);
        assert_eq!(fragment.css, ".a {\n  color: $theme;\n}\n");
        assert_eq!(fragment.hash, hash(&fragment.css));
    }

    #[test]
    fn test_hash_charset() {
        for input in ["", "a", ".a { color: $x; }", "\u{fffd}\u{fffd}"] {
            let hash = hash(input);
            assert!(
                hash.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
                "{}",
                hash
            );
        }
    }

    #[test]
    fn test_license_notice() {
        let config = Config {
            license_notice: String::from("/* MIT */"),
            ..Config::default()
        };

        let compiled = compile_with(".a { b: c; }", &config);
        assert_eq!(compiled.static_css, "/* MIT */\n.a {\n  b: c;\n}");
    }

    #[test]
    fn test_value_hooks() {
        let compiled = compile(".a { width: --w?10px + 2px; }");
        assert_eq!(
            compiled.static_css,
            ".a {\n  width: calc(var(--w, 10px) + 2px);\n}"
        );
    }
}
