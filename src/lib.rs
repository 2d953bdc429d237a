//! Compilador de Void CSS.
//!
//! Void CSS extiende CSS con reglas anidadas, clases exportadas con
//! nombres generados, valores dependientes de variables de tiempo de
//! ejecución y azúcar sintáctico para `var()` y `calc()`.
//!
//! # Fases
//! Una compilación ocurre en tres fases sobre un mismo [`Context`]:
//!
//! 1. [`lex`] recorre la entrada con una máquina de estados y produce
//!    bitácoras planas de tokens, cada uno con su profundidad de
//!    anidamiento. Es la única fase que puede fallar.
//! 2. [`tree`] reconstruye las reglas a partir de las profundidades,
//!    interpola selectores anidados y separa las declaraciones
//!    dinámicas.
//! 3. [`emit`] genera la hoja de estilos estática, los fragmentos
//!    dinámicos y los `@keyframes`, pasando nombres, selectores y
//!    valores por las [`Extension`]es registradas.
//!
//! Los nombres generados para clases exportadas se recuerdan en un
//! [`ClassCache`] compartido entre compilaciones, de modo que una
//! misma clase recibe siempre el mismo nombre.

#[macro_use]
mod macros;

pub mod classes;
pub mod config;
pub mod context;
pub mod emit;
pub mod engine;
pub mod error;
pub mod extension;
pub mod lex;
pub mod source;
pub mod token;
pub mod tree;

pub use classes::ClassCache;
pub use config::Config;
pub use context::Context;
pub use emit::{Compiled, Fragment};
pub use extension::{Event, Events, Extension};
pub use lex::LexerError;
pub use source::{Located, Location};

use tracing::info;

/// Compila `source` con las extensiones dadas, en orden.
pub fn compile(
    source: &str,
    config: &Config,
    extensions: &[Box<dyn Extension>],
) -> Result<Compiled, Located<LexerError>> {
    let mut cx = Context::new(source, config).register(extensions.iter().map(|extension| &**extension));
    lex::lex(&mut cx)?;

    let rules = tree::build(cx.stripped());
    let compiled = emit::emit(&cx, rules);

    info!(
        bytes = source.len(),
        classes = compiled.classes.len(),
        dynamic = compiled.dynamic.len(),
        "compiled"
    );

    Ok(compiled)
}

/// Compilador reutilizable.
///
/// Conserva la configuración y las extensiones entre llamadas. Como la
/// caché de clases vive en [`Config`], compilar varios archivos con un
/// mismo `Compiler` produce nombres consistentes entre ellos.
pub struct Compiler {
    config: Config,
    extensions: Vec<Box<dyn Extension>>,
}

impl Compiler {
    /// Compilador con las extensiones estándar.
    pub fn new(config: Config) -> Self {
        Compiler {
            config,
            extensions: extension::defaults(),
        }
    }

    /// Compilador sin extensiones.
    pub fn bare(config: Config) -> Self {
        Compiler {
            config,
            extensions: Vec::new(),
        }
    }

    /// Agrega una extensión después de las ya registradas.
    pub fn with_extension(mut self, extension: impl Extension + 'static) -> Self {
        self.extensions.push(Box::new(extension));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn compile(&self, source: &str) -> Result<Compiled, Located<LexerError>> {
        compile(source, &self.config, &self.extensions)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new(Config::default())
    }
}
