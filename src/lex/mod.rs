//! Análisis léxico.
//!
//! # Máquina de estados
//! Esta es la primera fase del compilador. El lexer recorre la entrada
//! una única vez. Su estado es la categoría resuelta del último token
//! reconocido; a partir de ese estado, [`grammar`] decide qué
//! reconocedores son legales y en qué orden se prueban. El primero que
//! coincide gana, sin buscar la coincidencia más larga.
//!
//! # Contadores
//! Además del estado, el lexer lleva tres contadores:
//! - La profundidad de anidamiento, que aumenta cuando un token de
//!   selector sigue a uno que no lo es y disminuye tras un `}`. El
//!   anidamiento se deduce así de las transiciones entre dominios.
//! - La pila de cierres pendientes, alimentada por cada `{`.
//! - La profundidad de funciones de selector como `:not(`, dentro de
//!   las cuales no se permite `,` ni `{`.
//!
//! El final de la entrada es válido solo si los tres están en cero.
//!
//! # Errores
//! No hay recuperación: el primer error aborta la compilación. El
//! rango reportado es una estimación, ya que el lexer no sabe cómo
//! tokenizar el texto que acaba de rechazar.

mod grammar;
pub mod matcher;

use std::borrow::Cow;

use crate::{
    context::Context,
    source::{Located, Location},
    token::{Domain, Kind},
};

use grammar::Expectation;
use matcher::Match;
use thiserror::Error;
use tracing::{debug, trace};

// Case-insensitive
use unicase::Ascii as NoCase;

/// Nombres de `@keyframes` que solo son legales entre comillas.
const RESERVED_KEYFRAMES_NAMES: &[NoCase<&str>] = &[NoCase::new("none"), NoCase::new("initial")];

/// Error de escaneo.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LexerError {
    /// Ningún reconocedor legal coincide en esta posición.
    #[error("Unexpected token{context}. {expected}")]
    Unexpected {
        context: &'static str,
        expected: Cow<'static, str>,
    },

    /// La entrada terminó a mitad de una construcción.
    #[error("Unexpected end of input. {0}")]
    UnexpectedEof(Cow<'static, str>),

    /// Quedaron bloques sin cerrar.
    #[error("Unterminated block, {0} closing '}}' missing")]
    Unterminated(usize),

    /// `,` dentro de `:not(...)` y similares.
    #[error(
        "Unexpected selector separator ','. Selector branching is not valid inside \
         ':not(...)', ':has(...)', ':is(...)' or ':where(...)'. Did you forget ')'?"
    )]
    BranchInPseudo,

    /// `{` dentro de `:not(...)` y similares.
    #[error(
        "Unexpected token in style scope. Expected: ')'. \
         Did you forget to end your ':not(...)' or ':has(...)' operator?"
    )]
    ScopeInPseudo,

    /// Nombre de `@keyframes` reservado.
    #[error("Keyframes cannot be named {0:?} unless the name is quoted")]
    ReservedKeyframesName(String),

    /// La tabla de transiciones no contempla este estado.
    #[error("Internal lexer error: no transition from {0:?}")]
    NoTransition(Kind),

    /// Un `}` cerró un bloque distinto al esperado.
    #[error("Internal lexer error: expected to close {expected:?}, found {found:?}")]
    EnclosureMismatch { expected: Option<Kind>, found: Kind },
}

/// Último token significativo (no vacío).
#[derive(Clone)]
struct Significant {
    kind: Kind,
    domain: Domain,
    location: Location,
}

/// Estado de la máquina entre un token y el siguiente.
struct Lexer {
    state: Kind,
    depth: usize,
    pseudo_depth: usize,

    /// Cierre esperado y ubicación de la apertura correspondiente.
    enclosures: Vec<(Kind, Location)>,

    last: Option<Significant>,
}

/// Tokeniza por completo la entrada de `cx`.
///
/// Los tokens se acumulan en el contexto. Si la entrada no es válida,
/// se retorna el primer error con su ubicación aproximada.
pub fn lex(cx: &mut Context<'_>) -> Result<(), Located<LexerError>> {
    let mut lexer = Lexer {
        state: Kind::Skip,
        depth: 0,
        pseudo_depth: 0,
        enclosures: Vec::new(),
        last: None,
    };

    loop {
        let inside = !lexer.enclosures.is_empty();
        let expectation = grammar::expect(lexer.state, inside, lexer.pseudo_depth)
            .map_err(|error| lexer.locate(error, cx.cursor()))?;

        let rest = cx.rest();
        match expectation
            .matchers
            .iter()
            .find_map(|matcher| matcher.probe(rest))
        {
            Some(found) => lexer.step(cx, found)?,
            None => return lexer.finish(cx, &expectation),
        }
    }
}

impl Lexer {
    /// Consume una coincidencia y actualiza los contadores.
    fn step(&mut self, cx: &mut Context<'_>, found: Match) -> Result<(), Located<LexerError>> {
        let start = cx.cursor();
        let location = Location::new(start..start + found.len);
        let kind = found.resolved();
        let mut export = None;

        // Los espacios y comentarios no afectan contadores
        if found.domain != Domain::Void {
            let (ascend, descend) = match &self.last {
                None => (found.domain == Domain::Selector, false),
                Some(last) => (
                    last.domain != Domain::Selector && found.domain == Domain::Selector,
                    last.kind == Kind::StyleScopeEnd,
                ),
            };

            self.depth = (self.depth + ascend as usize).saturating_sub(descend as usize);
            self.enclose(&found, &location)?;

            match kind {
                Kind::NotOperatorParenthesis => self.pseudo_depth += 1,
                Kind::NotOperatorParenthesisEnd => {
                    self.pseudo_depth = self.pseudo_depth.saturating_sub(1)
                }

                _ => (),
            }

            let text = &cx.rest()[..found.len];
            if kind == Kind::KeyframesName
                && RESERVED_KEYFRAMES_NAMES.contains(&NoCase::new(text))
            {
                let error = LexerError::ReservedKeyframesName(text.to_owned());
                return Err(Located::at(error, location));
            }

            // Enlace temprano: el selector ya contiene el nombre generado
            let exported = matches!(&self.last, Some(last) if last.kind == Kind::ExportClassName);
            if kind == Kind::ClassName && exported {
                export = Some(cx.export_class(text));
            }

            self.last = Some(Significant {
                kind: found.kind,
                domain: found.domain,
                location,
            });
        }

        let token = cx.tokenize(found, self.depth, export);
        trace!(
            kind = ?token.resolved(),
            depth = token.depth,
            start = token.start,
            text = token.text,
            "token"
        );

        self.state = kind;
        Ok(())
    }

    /// Mantiene la pila de cierres pendientes.
    fn enclose(&mut self, found: &Match, location: &Location) -> Result<(), Located<LexerError>> {
        match found.kind {
            Kind::StyleScope => {
                let closer = match found.resolved() {
                    Kind::KeyframesScope => Kind::KeyframesScopeEnd,
                    Kind::KeyframesBlock => Kind::KeyframesBlockEnd,
                    _ => Kind::StyleScopeEnd,
                };

                self.enclosures.push((closer, location.clone()));
            }

            Kind::StyleScopeEnd => match self.enclosures.pop() {
                Some((closer, _)) if closer == found.resolved() => (),
                other => {
                    let error = LexerError::EnclosureMismatch {
                        expected: other.map(|(closer, _)| closer),
                        found: found.resolved(),
                    };

                    return Err(Located::at(error, location.clone()));
                }
            },

            _ => (),
        }

        Ok(())
    }

    /// Ubica un error de la tabla de transiciones sobre el último token.
    fn locate(&self, error: LexerError, cursor: usize) -> Located<LexerError> {
        let location = match &self.last {
            Some(last) => last.location.clone(),
            None => Location::new(cursor..cursor),
        };

        Located::at(error, location)
    }

    /// Ningún reconocedor coincidió: fin de la entrada o error.
    fn finish(self, cx: &Context<'_>, expectation: &Expectation) -> Result<(), Located<LexerError>> {
        let start = cx.cursor();
        let rest = cx.rest();

        if !rest.is_empty() {
            let len = expectation.extent.measure(rest);
            let error = LexerError::Unexpected {
                context: expectation.context,
                expected: expectation.explain(&rest[..len]),
            };

            return Err(Located::at(error, Location::new(start..start + len)));
        }

        // El último `}` aún no ha descontado su nivel
        let closing = matches!(&self.last, Some(last) if last.kind == Kind::StyleScopeEnd);
        let depth = self.depth.saturating_sub(closing as usize);

        if let Some((_, opener)) = self.enclosures.last() {
            let error = LexerError::Unterminated(self.enclosures.len());
            return Err(Located::at(error, opener.clone()));
        }

        if depth > 0 || self.pseudo_depth > 0 {
            let error = LexerError::UnexpectedEof(expectation.explain(""));
            return Err(Located::at(error, Location::new(start..start)));
        }

        debug!(
            tokens = cx.tokens().len(),
            stripped = cx.stripped().len(),
            keyframes = cx.keyframes().len(),
            "lexing finished"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn kinds(source: &str) -> Vec<(Kind, usize)> {
        let config = Config::default();
        let mut cx = Context::new(source, &config);
        lex(&mut cx).expect("valid input");

        cx.stripped()
            .iter()
            .map(|token| (token.resolved(), token.depth))
            .collect()
    }

    fn error(source: &str) -> Located<LexerError> {
        let config = Config::default();
        let mut cx = Context::new(source, &config);
        lex(&mut cx).expect_err("invalid input")
    }

    #[test]
    fn test_depth_from_domain_transitions() {
        use Kind::*;

        let tokens = kinds(".a { color: red; .b { x: y; } }");
        assert_eq!(
            tokens,
            vec![
                (ClassNameInitiator, 1),
                (ClassName, 1),
                (SelectorChild, 1),
                (StyleScope, 1),
                (PropertyName, 1),
                (PropertyColon, 1),
                (PropertyValue, 1),
                (ValueSemiColon, 1),
                (ClassNameInitiator, 2),
                (ClassName, 2),
                (SelectorChild, 2),
                (StyleScope, 2),
                (PropertyName, 2),
                (PropertyColon, 2),
                (PropertyValue, 2),
                (ValueSemiColon, 2),
                (StyleScopeEnd, 2),
                (StyleScopeEnd, 1),
            ]
        );
    }

    #[test]
    fn test_sibling_rules_share_depth() {
        let spaced = kinds(".a {} .b {}");
        let packed = kinds(".a {}.b {}");
        assert_eq!(spaced, packed);
        assert!(spaced.iter().all(|(_, depth)| *depth == 1));
    }

    #[test]
    fn test_tokens_are_contiguous() {
        let source = "/* x */ .a:not(.b) > [data-x='y'] {\n  color: red; // c\n}\n";
        let config = Config::default();
        let mut cx = Context::new(source, &config);
        lex(&mut cx).expect("valid input");

        let mut offset = 0;
        for token in cx.tokens() {
            assert_eq!(token.start, offset);
            assert_eq!(token.end, token.start + token.text.len());
            assert_eq!(&source[token.start..token.end], token.text);
            offset = token.end;
        }

        assert_eq!(offset, source.len());
    }

    #[test]
    fn test_keyframes_are_routed_apart() {
        let source = "@keyframes spin { from { opacity: 0; } to { opacity: 1; } } .a { b: c; }";
        let config = Config::default();
        let mut cx = Context::new(source, &config);
        lex(&mut cx).expect("valid input");

        assert!(cx.keyframes().iter().any(|token| token.resolved() == Kind::KeyframesName));
        assert!(cx
            .stripped()
            .iter()
            .all(|token| !token.attributes.contains(crate::token::Attributes::KEYFRAMES)));
        assert_eq!(cx.stripped().first().map(|token| token.depth), Some(1));
    }

    #[test]
    fn test_export_binds_at_lex_time() {
        let config = Config::default();
        let mut cx = Context::new("..button { a: b; }", &config);
        lex(&mut cx).expect("valid input");

        let class = cx
            .stripped()
            .iter()
            .find(|token| token.resolved() == Kind::ClassName)
            .expect("class name");

        let generated = class.export.as_deref().expect("export");
        assert!(generated.starts_with("button-vcss-"));
        assert_eq!(cx.classes().get("button").map(String::as_str), Some(generated));
    }

    #[test]
    fn test_unexpected_token_span() {
        let source = ".a {\n  color red;\n}";
        let error = error(source);
        assert!(matches!(error.val(), LexerError::Unexpected { .. }));

        let range = error.location().resolve(source);
        assert_eq!(range.start.line(), 2);
    }

    #[test]
    fn test_missing_value() {
        let error = error(".a { color: ; }");
        assert!(matches!(error.val(), LexerError::Unexpected { .. }));
        assert_eq!(error.location().start(), 11);
    }

    #[test]
    fn test_unterminated_block() {
        let error = error(".a { .b { color: red; }");
        assert!(matches!(error.val(), LexerError::Unterminated(1)));
        assert_eq!(error.location().start(), 3);
    }

    #[test]
    fn test_unexpected_eof() {
        assert!(matches!(error(".a").val(), LexerError::UnexpectedEof(_)));
        assert!(matches!(error("@media").val(), LexerError::UnexpectedEof(_)));
    }

    #[test]
    fn test_branch_in_pseudo() {
        let source = ".a:not(.b, .c) {}";
        let error = error(source);
        assert!(matches!(error.val(), LexerError::BranchInPseudo));
        assert_eq!(&source[error.location().range()], ", ");
    }

    #[test]
    fn test_scope_in_pseudo() {
        let error = error(".a:not(.b {}");
        assert!(matches!(error.val(), LexerError::ScopeInPseudo));
    }

    #[test]
    fn test_reserved_keyframes_name() {
        let error = error("@keyframes None { }");
        assert!(matches!(error.val(), LexerError::ReservedKeyframesName(name) if name == "None"));
        assert!(kinds("@keyframes \"None\" { }").is_empty());
    }

    #[test]
    fn test_root_hint() {
        let error = error("& .a { color: red; }");
        assert!(error.to_string().contains("current selector"));
    }

    #[test]
    fn test_empty_and_comment_only_input() {
        assert!(kinds("").is_empty());
        assert!(kinds("  // nothing\n/* here */\n").is_empty());
    }
}
