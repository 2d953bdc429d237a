//! Reporte de errores.
//!
//! [`Diagnostics`] agrupa errores ubicados y los presenta al estilo de
//! `rustc`: mensaje, posición, la línea ofensiva y un subrayado. Para
//! esto último hace falta el texto fuente, que se adjunta con
//! [`Diagnostics::with_source`]; sin él se reportan solo las posiciones
//! en bytes.

use crate::source::{line_text, Located, Location};
use std::{
    error::Error,
    fmt::{self, Display},
};

mod sealed {
    pub trait Sealed {}
}

pub trait LocatedError: sealed::Sealed {
    fn source(&self) -> &dyn Error;
    fn location(&self) -> &Location;
}

/// Nombre y contenido del archivo que originó los errores.
struct Source {
    name: String,
    text: String,
}

pub struct Diagnostics {
    kind: &'static str,
    source: Option<Source>,
    errors: Vec<Box<dyn 'static + LocatedError>>,
}

impl Diagnostics {
    pub fn kind(self, kind: &'static str) -> Self {
        Diagnostics { kind, ..self }
    }

    /// Adjunta el texto fuente para poder mostrar líneas.
    pub fn with_source(self, name: impl Into<String>, text: impl Into<String>) -> Self {
        let source = Source {
            name: name.into(),
            text: text.into(),
        };

        Diagnostics {
            source: Some(source),
            ..self
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    fn frame(
        &self,
        fmt: &mut fmt::Formatter<'_>,
        source: &Source,
        location: &Location,
    ) -> fmt::Result {
        let range = location.resolve(&source.text);
        let (start, end) = (range.start, range.end);
        writeln!(fmt, " --> {}:{}", source.name, start)?;

        let digits = end.line().to_string().chars().count();
        writeln!(fmt, "{:digits$} |", "", digits = digits)?;

        for line_number in start.line()..=end.line() {
            let line = line_text(&source.text, line_number);
            writeln!(fmt, "{:>digits$} | {}", line_number, line, digits = digits)?;
        }

        let (from, to) = (start.column(), end.column());
        let min = from.min(to);
        let max = from.max(to);

        let skip = (min - 1) as usize;
        let highlight = (max - min + 1) as usize;

        writeln!(
            fmt,
            "{:digits$} | {:skip$}{:^<highlight$}",
            "",
            "",
            "",
            digits = digits,
            skip = skip,
            highlight = highlight
        )
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Diagnostics {
            kind: "error",
            source: None,
            errors: Default::default(),
        }
    }
}

impl<E: 'static + LocatedError> From<E> for Diagnostics {
    fn from(error: E) -> Self {
        Diagnostics {
            errors: vec![Box::new(error)],
            ..Default::default()
        }
    }
}

impl<E: 'static + LocatedError> From<Vec<E>> for Diagnostics {
    fn from(errors: Vec<E>) -> Self {
        let errors = errors
            .into_iter()
            .map(|error| {
                let error: Box<dyn LocatedError> = Box::new(error);
                error
            })
            .collect();

        Diagnostics {
            errors,
            ..Default::default()
        }
    }
}

impl Display for Diagnostics {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Diagnostics { kind, source, errors } = self;

        if errors.is_empty() {
            return writeln!(fmt, "No errors were reported");
        }

        for error in errors {
            writeln!(fmt, "{}: {}", kind, error.source())?;

            let location = error.location();
            match source {
                Some(source) => self.frame(fmt, source, location)?,
                None => writeln!(fmt, " --> {}", location)?,
            }

            writeln!(fmt)?;
        }

        let error_or_errors = if errors.len() == 1 { "error" } else { "errors" };
        writeln!(
            fmt,
            "Build failed with {} {}",
            errors.len(),
            error_or_errors
        )
    }
}

impl<E: Error> sealed::Sealed for Located<E> {}

impl<E: Error> LocatedError for Located<E> {
    fn source(&self) -> &dyn Error {
        self.as_ref()
    }

    fn location(&self) -> &Location {
        Located::location(self)
    }
}
