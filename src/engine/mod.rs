//! Motores de reescritura de valores.
//!
//! Transformaciones puras de texto que se aplican a los valores de
//! propiedades durante la emisión, por medio de [`crate::extension`].

pub mod calc;
pub mod var;

pub use calc::{calcify, Calc};
pub use var::varify;
