//! Rastreo de ubicaciones originales en código fuente.
//!
//! Los tokens y errores que produce el compilador llevan cuenta de
//! rangos de bytes en el texto original. A partir de estos rangos se
//! determinan líneas y columnas únicamente al momento de reportar un
//! error, ya que el texto fuente completo se encuentra en memoria.

use std::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
    ops::Range,
};

/// Ancho de los divisores de tabulador.
const TAB_STOP: u32 = 4;

/// Un objeto cualquiera con una posición original asociada.
#[derive(Debug, Clone)]
pub struct Located<T> {
    location: Location,
    value: T,
}

impl<T> Located<T> {
    /// Obtiene el valor.
    pub fn val(&self) -> &T {
        &self.value
    }

    /// Obtiene la ubicación.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Descarta la ubicación y toma ownership del valor.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Descompone y toma ownership de las dos partes.
    pub fn split(self) -> (Location, T) {
        (self.location, self.value)
    }

    /// Construye a partir de un valor y una ubicación.
    pub fn at(value: T, location: Location) -> Self {
        Located { value, location }
    }
}

impl<T> AsRef<T> for Located<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

impl<T: Display> Display for Located<T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} (at {})", self.value, self.location)
    }
}

impl<T: Error> Error for Located<T> {}

/// Una ubicación es un rango de bytes en el texto fuente.
///
/// Un rango vacío señala un punto entre dos caracteres, como
/// el final de la entrada.
#[derive(Clone, PartialEq, Eq)]
pub struct Location {
    span: Range<usize>,
}

impl Location {
    /// Construye una ubicación a partir de un rango de bytes.
    pub fn new(span: Range<usize>) -> Self {
        Location { span }
    }

    /// Unifica un rango de ubicaciones.
    pub fn span(from: Location, to: &Location) -> Self {
        Location {
            span: from.span.start..to.span.end,
        }
    }

    /// Offset de inicio.
    pub fn start(&self) -> usize {
        self.span.start
    }

    /// Offset de fin (exclusivo).
    pub fn end(&self) -> usize {
        self.span.end
    }

    /// Rango de bytes completo.
    pub fn range(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Resuelve el rango a posiciones línea-columna en `source`.
    ///
    /// La posición final es la del último carácter incluido, o la
    /// misma de inicio si el rango es vacío.
    pub fn resolve(&self, source: &str) -> Range<Position> {
        let start = position_at(source, self.span.start);
        let end = if self.span.end > self.span.start {
            position_at(source, self.span.end).back().max_with(start)
        } else {
            start
        };

        start..end
    }
}

impl Display for Location {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let Range { start, end } = self.span;
        if end <= start + 1 {
            write!(formatter, "byte {}", start)
        } else {
            write!(formatter, "bytes [{}-{}]", start, end - 1)
        }
    }
}

impl Debug for Location {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        <Self as Display>::fmt(self, formatter)
    }
}

/// Una posición línea-columna en un archivo.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Position {
    line: u32,
    column: u32,
}

impl Position {
    /// Obtiene el número de línea.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Obtiene el número de columna.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Incrementa el número de columna.
    pub fn advance(self) -> Position {
        Position {
            line: self.line,
            column: self.column + 1,
        }
    }

    /// Decrementa el número de columna.
    pub fn back(self) -> Position {
        Position {
            line: self.line,
            column: self.column.saturating_sub(1).max(1),
        }
    }

    /// Incrementa el número de línea y retorna a la columna 1.
    pub fn newline(self) -> Position {
        Position {
            line: self.line + 1,
            column: 1,
        }
    }

    /// Ajusta la posición a la siguiente columna de tabulador.
    pub fn tab(self) -> Position {
        let column = 1 + ((self.column - 1) / TAB_STOP + 1) * TAB_STOP;
        Position {
            line: self.line,
            column,
        }
    }

    // Un rango que termina en un salto de línea no debe retroceder a
    // una línea anterior a su inicio
    fn max_with(self, start: Position) -> Position {
        if (self.line, self.column) < (start.line, start.column) {
            start
        } else {
            self
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position { line: 1, column: 1 }
    }
}

impl Display for Position {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.line, self.column)
    }
}

/// Calcula la posición que le corresponde a un offset de bytes.
pub fn position_at(source: &str, offset: usize) -> Position {
    let mut here = Position::default();
    for (index, c) in source.char_indices() {
        if index >= offset {
            break;
        }

        here = match c {
            '\n' => here.newline(),
            '\t' => here.tab(),
            _ => here.advance(),
        };
    }

    here
}

/// Obtiene el texto de una línea (1-indexada), sin el salto final.
pub fn line_text(source: &str, line: u32) -> &str {
    source
        .split('\n')
        .nth(line.saturating_sub(1) as usize)
        .map(|line| line.trim_end_matches('\r'))
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_at_lines() {
        let source = ".a {\n  color red;\n}";
        let position = position_at(source, 7);
        assert_eq!((position.line(), position.column()), (2, 3));
        assert_eq!(line_text(source, 2), "  color red;");
    }

    #[test]
    fn test_position_at_tab() {
        let position = position_at("\tx", 1);
        assert_eq!(position.column(), 5);
    }

    #[test]
    fn test_resolve_empty_span() {
        let location = Location::new(3..3);
        let range = location.resolve("abc");
        assert_eq!(range.start, range.end);
        assert_eq!(range.start.column(), 4);
    }
}
