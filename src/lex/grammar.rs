//! Tabla de transiciones.
//!
//! Para cada categoría previa se construye la lista ordenada de
//! reconocedores legales. El primero que coincide gana. Junto a la
//! lista viaja lo necesario para reportar un error si ninguno lo hace:
//! el mensaje, las pistas y una heurística para acotar el fragmento
//! ofensivo.

use std::borrow::Cow;

use super::{
    matcher::{self as m, Matcher},
    LexerError,
};

use crate::token::Kind;

/// Inicios válidos de un selector compuesto.
const STARTS: [Matcher; 7] = [
    m::ATTRIBUTE_SELECTOR_INITIATOR,
    m::CLASS_NAME_INITIATOR,
    m::SELECTOR_NAME,
    m::ID_INITIATOR,
    m::WILDCARD,
    m::NOT_OPERATOR,
    m::COLON,
];

/// Cómo delimitar el fragmento que se resalta en un error.
///
/// Es una aproximación: el lexer no sabe tokenizar lo que rechazó.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum Extent {
    /// Un carácter.
    Char,

    /// Hasta el siguiente espacio en blanco.
    Word,

    /// Hasta `{` o fin de línea.
    Selector,

    /// Hasta fin de línea, `;` o `}`.
    Property,
}

impl Extent {
    /// Largo en bytes del fragmento al inicio de `rest`.
    pub fn measure(self, rest: &str) -> usize {
        let len = match self {
            Extent::Char => 0,
            Extent::Word => rest.find(char::is_whitespace).unwrap_or(rest.len()),
            Extent::Selector => rest
                .find(|c: char| matches!(c, '{' | '\n'))
                .unwrap_or(rest.len()),
            Extent::Property => rest
                .find(|c: char| matches!(c, '\n' | ';' | '}'))
                .unwrap_or(rest.len()),
        };

        if len > 0 {
            len
        } else {
            rest.chars().next().map_or(0, char::len_utf8)
        }
    }
}

type Predicate = fn(&str) -> bool;

/// Lo que el lexer espera a continuación.
pub(super) struct Expectation {
    pub matchers: Vec<Matcher>,
    pub context: &'static str,
    pub extent: Extent,
    expected: Cow<'static, str>,
    hints: Vec<(Predicate, &'static str)>,
}

impl Expectation {
    /// Espera con comentarios permitidos; un comentario conserva el estado.
    fn new(state: Kind, expected: &'static str) -> Self {
        Expectation::bare(expected)
            .then(m::INLINE_COMMENT.alias(state))
            .then(m::BLOCK_COMMENT.alias(state))
    }

    /// Espera sin comentarios.
    fn bare(expected: &'static str) -> Self {
        Expectation {
            matchers: Vec::new(),
            context: "",
            extent: Extent::Char,
            expected: Cow::Borrowed(expected),
            hints: Vec::new(),
        }
    }

    fn then(mut self, matcher: Matcher) -> Self {
        self.matchers.push(matcher);
        self
    }

    fn when(self, condition: bool, matcher: Matcher) -> Self {
        if condition {
            self.then(matcher)
        } else {
            self
        }
    }

    fn all(mut self, matchers: &[Matcher]) -> Self {
        self.matchers.extend_from_slice(matchers);
        self
    }

    fn context(self, context: &'static str) -> Self {
        Expectation { context, ..self }
    }

    fn extent(self, extent: Extent) -> Self {
        Expectation { extent, ..self }
    }

    /// Agrega una pista si el fragmento rechazado cumple `applies`.
    fn hint(mut self, applies: Predicate, hint: &'static str) -> Self {
        self.hints.push((applies, hint));
        self
    }

    /// Agrega una pista incondicional si `condition` se cumple.
    fn note(mut self, condition: bool, note: impl Into<Cow<'static, str>>) -> Self {
        if condition {
            let note = note.into();
            self.expected = Cow::Owned(format!("{} {}", self.expected, note));
        }

        self
    }

    /// Continuaciones de un selector compuesto.
    fn compound(self, open: bool) -> Self {
        self.then(m::NOT_OPERATOR)
            .when(open, m::NOT_OPERATOR_PARENTHESIS_END)
            .then(m::ATTRIBUTE_SELECTOR_INITIATOR)
            .then(m::COLON)
            .then(m::CLASS_NAME_INITIATOR)
            .then(m::ID_INITIATOR)
            .then(m::SELECTOR_CHILD)
            .then(m::SELECTOR_SEPARATOR)
            .then(m::COMBINATOR)
            .then(m::STYLE_SCOPE)
            .extent(Extent::Selector)
    }

    fn root_hints(self) -> Self {
        self.hint(
            |section| section.contains('&'),
            "Root level selectors cannot contain the current selector ('&').",
        )
        .hint(
            starts_with_combinator,
            "Root level selectors cannot begin with a selector combinator ('~', '>', '+', '||'). \
             Did you forget its left operand?",
        )
    }

    /// Mensaje completo para un fragmento rechazado.
    pub fn explain(&self, section: &str) -> Cow<'static, str> {
        let mut expected = self.expected.clone();
        for (applies, hint) in &self.hints {
            if applies(section) {
                expected = Cow::Owned(format!("{} {}", expected, hint));
            }
        }

        expected
    }
}

fn starts_with_combinator(section: &str) -> bool {
    let section = section.trim_start();
    ["~", ">", "+", "||"]
        .iter()
        .any(|combinator| section.starts_with(combinator))
}

fn expected_in_compound(open: bool) -> &'static str {
    if open {
        "Expected: ')' or [css selector]."
    } else {
        "Expected: '{' or [css selector]."
    }
}

fn missing_parenthesis(pseudo: usize) -> String {
    format!("Did you forget '{}'?", ")".repeat(pseudo.max(1)))
}

/// Después de `}`, ya sea de una regla o de un bloque `@keyframes`.
fn after_scope(state: Kind, inside: bool) -> Expectation {
    let expected = if inside {
        "Expected: '}', [css selector] or [css property]."
    } else {
        "Expected: [css selector]."
    };

    let expectation = Expectation::new(state, expected)
        .then(m::WHITESPACE.alias(state))
        .when(inside, m::STYLE_SCOPE_END)
        .then(m::AT_KEYFRAMES)
        .then(m::AT_SYMBOL)
        .when(inside, m::PROPERTY_NAME)
        .when(inside, m::CURRENT_SELECTOR)
        .when(inside, m::COMBINATOR)
        .when(!inside, m::ROOT_SELECTOR)
        .all(&STARTS)
        .extent(Extent::Selector);

    if inside {
        expectation.context(" in style scope")
    } else {
        expectation.root_hints()
    }
}

/// Construye la espera que sigue a `state`.
///
/// `inside` indica si hay al menos un bloque abierto y `pseudo` es la
/// profundidad de funciones de selector (`:not(`) abiertas.
pub(super) fn expect(state: Kind, inside: bool, pseudo: usize) -> Result<Expectation, LexerError> {
    use Kind::*;

    let open = pseudo > 0;
    let expectation = match state {
        Skip => Expectation::new(state, "Expected: [css selector].")
            .then(m::WHITESPACE)
            .then(m::AT_KEYFRAMES)
            .then(m::AT_SYMBOL)
            .then(m::ROOT_SELECTOR)
            .all(&STARTS)
            .extent(Extent::Selector)
            .root_hints(),

        InlineComment | BlockComment => return Err(LexerError::NoTransition(state)),

        NotOperator => Expectation::bare("Expected: '('.").then(m::NOT_OPERATOR_PARENTHESIS),

        NotOperatorParenthesis => Expectation::new(state, "Expected: [css selector].")
            .when(inside, m::CURRENT_SELECTOR)
            .all(&STARTS)
            .extent(Extent::Selector),

        NotOperatorParenthesisEnd => {
            Expectation::new(state, expected_in_compound(open)).compound(open)
        }

        AtSymbol => Expectation::bare(
            "Expected: 'color-profile', 'container', 'counter-style', 'document', 'font-face', \
             'font-feature-values', 'keyframes', 'layer', 'media', 'page', 'property' or 'supports'.",
        )
        .then(m::NESTED_AT_RULE_NAME)
        .extent(Extent::Word),

        NestedAtRuleName => Expectation::bare("Expected: [at rule prelude] followed by '{'.")
            .then(m::NESTED_AT_RULE)
            .extent(Extent::Selector),

        NestedAtRule => Expectation::bare("Expected: '{'.").then(m::STYLE_SCOPE),

        AtKeyframes => Expectation::bare("Expected: [whitespace].")
            .then(m::SELECTOR_CHILD.alias(KeyframesWhiteSpace).keyframes()),

        KeyframesWhiteSpace => Expectation::new(state, "Expected: [keyframes name].")
            .then(m::SELECTOR_NAME.alias(KeyframesName).keyframes())
            .then(m::KEYFRAMES_SPECIAL_NAMES.keyframes())
            .extent(Extent::Word)
            .hint(
                |section| section.starts_with('"') || section.starts_with('\''),
                "Only \"initial\" and \"None\" may be written as quoted keyframes names.",
            ),

        KeyframesName | KeyframesSpecialNames | KeyframesNameWhiteSpace => {
            Expectation::new(state, "Expected: '{'.")
                .then(m::SELECTOR_CHILD.alias(KeyframesNameWhiteSpace).keyframes())
                .then(m::STYLE_SCOPE.alias(KeyframesScope).keyframes())
        }

        KeyframesScope | KeyframesScopeWhiteSpace => Expectation::new(
            state,
            "Expected: [percentage selector], 'from', 'to' or '}'.",
        )
        .then(m::WHITESPACE.alias(KeyframesScopeWhiteSpace))
        .then(m::KEYFRAMES_SELECTOR)
        .then(m::STYLE_SCOPE_END.alias(KeyframesScopeEnd).keyframes())
        .extent(Extent::Word),

        KeyframesSelector => Expectation::new(state, "Expected: ',' or '{'.")
            .then(m::WHITESPACE.alias(state))
            .then(m::SELECTOR_SEPARATOR.alias(KeyframesSeparator).keyframes())
            .then(m::STYLE_SCOPE.alias(KeyframesBlock).keyframes()),

        KeyframesSeparator => Expectation::new(
            state,
            "Expected: [percentage selector], 'from' or 'to'.",
        )
        .then(m::WHITESPACE.alias(state))
        .then(m::KEYFRAMES_SELECTOR)
        .extent(Extent::Word),

        KeyframesBlock | KeyframesBlockWhiteSpace => {
            Expectation::new(state, "Expected: [property name] or '}'.")
                .then(m::WHITESPACE.alias(KeyframesBlockWhiteSpace))
                .then(m::PROPERTY_NAME.alias(KeyframesBlockPropertyName).keyframes())
                .then(m::STYLE_SCOPE_END.alias(KeyframesBlockEnd).keyframes())
                .extent(Extent::Property)
        }

        KeyframesBlockPropertyName => Expectation::new(state, "Expected: ':'.")
            .then(m::PROPERTY_COLON.alias(KeyframesPropertyColon).keyframes()),

        KeyframesPropertyColon => {
            Expectation::new(state, "Expected: [property value]. Did you forget ';'?")
                .then(m::PROPERTY_VALUE.alias(KeyframesPropertyValue).keyframes())
                .extent(Extent::Property)
        }

        KeyframesPropertyValue => Expectation::new(state, "Expected: ';' or '}'.")
            .then(m::VALUE_SEMICOLON.alias(KeyframesValueSemiColon).keyframes())
            .then(m::STYLE_SCOPE_END.alias(KeyframesBlockEnd).keyframes()),

        KeyframesValueSemiColon => Expectation::new(state, "Expected: [property name] or '}'.")
            .then(m::WHITESPACE.alias(state))
            .then(m::PROPERTY_NAME.alias(KeyframesBlockPropertyName).keyframes())
            .then(m::STYLE_SCOPE_END.alias(KeyframesBlockEnd).keyframes())
            .extent(Extent::Property),

        KeyframesBlockEnd | KeyframesBlockEndWhiteSpace => {
            Expectation::new(state, "Expected: [keyframes selector] or '}'.")
                .then(m::WHITESPACE.alias(KeyframesBlockEndWhiteSpace))
                .then(m::STYLE_SCOPE_END.alias(KeyframesScopeEnd).keyframes())
                .then(m::KEYFRAMES_SELECTOR)
                .extent(Extent::Word)
        }

        KeyframesScopeEnd | StyleScopeEnd => after_scope(state, inside),

        IdInitiator => Expectation::bare("Expected: [id name].")
            .then(m::SELECTOR_NAME)
            .extent(Extent::Word),

        CurrentSelector => Expectation::new(
            state,
            "Expected: ' ', '>', '+', '~', '||', '.', ':', '::', '[...]', ',' or '{' \
             directly following the current selector ('&').",
        )
        .then(m::SELECTOR_NAME)
        .compound(open),

        AttributeSelectorInitiator => Expectation::bare("Expected: [attribute name].")
            .then(m::SELECTOR_NAME.alias(AttributeSelectorName))
            .extent(Extent::Word),

        AttributeSelectorName => Expectation::bare(
            "Expected: '=', '!=', '|=', '~=', '^=', '$=', '*=' or ']'.",
        )
        .then(m::ATTRIBUTE_SELECTOR_CLOSE_WITHOUT_OPERATOR)
        .then(m::ATTRIBUTE_SELECTOR_MODIFIER),

        AttributeSelectorModifier => {
            Expectation::bare("Expected: \"'\", '\"' or [attribute value].")
                .then(m::ATTRIBUTE_SELECTOR_SINGLE_QUOTE_INITIATOR)
                .then(m::ATTRIBUTE_SELECTOR_DOUBLE_QUOTE_INITIATOR)
                .then(m::SELECTOR_NAME.alias(AttributeSelectorValue))
        }

        AttributeSelectorSingleQuoteInitiator => Expectation::bare("Expected: \"'\".")
            .then(m::ATTRIBUTE_SELECTOR_SINGLE_QUOTE_BODY)
            .extent(Extent::Selector),

        AttributeSelectorDoubleQuoteInitiator => Expectation::bare("Expected: '\"'.")
            .then(m::ATTRIBUTE_SELECTOR_DOUBLE_QUOTE_BODY)
            .extent(Extent::Selector),

        AttributeSelectorSingleQuoteBody
        | AttributeSelectorDoubleQuoteBody
        | AttributeSelectorValue => {
            Expectation::bare("Expected: 'i]', 'I]', 's]', 'S]' or ']'.")
                .then(m::ATTRIBUTE_SELECTOR_CLOSE)
        }

        AttributeSelectorClose | ClassName | SelectorName | PseudoArgument => {
            Expectation::new(state, expected_in_compound(open))
                .compound(open)
                .note(open, missing_parenthesis(pseudo))
        }

        ClassNameInitiator => Expectation::bare("Expected: [class name] or '.'.")
            .then(m::EXPORT_CLASS_NAME)
            .then(m::SELECTOR_NAME.alias(ClassName))
            .extent(Extent::Word),

        ExportClassName => Expectation::bare("Expected: [class name].")
            .then(m::SELECTOR_NAME.alias(ClassName))
            .extent(Extent::Word),

        Wildcard => Expectation::new(
            state,
            "Expected: '{' or [css selector] directly following the universal selector ('*').",
        )
        .compound(open)
        .extent(Extent::Word),

        Combinator => Expectation::new(state, "Expected: [combinator operand].")
            .then(m::SELECTOR_CHILD.alias(Combinator))
            .all(&STARTS)
            .extent(Extent::Selector)
            .hint(
                starts_with_combinator,
                "Two selector combinators cannot follow each other.",
            ),

        RootSelector => Expectation::new(state, "Expected: ',' or '{'.")
            .then(m::SELECTOR_CHILD)
            .then(m::STYLE_SCOPE)
            .then(m::COMBINATOR)
            .then(m::SELECTOR_SEPARATOR)
            .extent(Extent::Word),

        PseudoSelector => Expectation::new(state, expected_in_compound(open))
            .then(m::PSEUDO_ARGUMENT)
            .compound(open)
            .note(open, missing_parenthesis(pseudo)),

        SelectorSeparator if open => return Err(LexerError::BranchInPseudo),
        SelectorSeparator => Expectation::new(state, "Expected: [css selector].")
            .when(!inside, m::ROOT_SELECTOR)
            .when(inside, m::CURRENT_SELECTOR)
            .when(inside, m::COMBINATOR)
            .all(&STARTS)
            .extent(Extent::Selector),

        SelectorChild => Expectation::new(state, expected_in_compound(open))
            .then(m::STYLE_SCOPE)
            .when(open, m::NOT_OPERATOR_PARENTHESIS_END)
            .then(m::SELECTOR_SEPARATOR)
            .then(m::COMBINATOR)
            .when(inside, m::CURRENT_SELECTOR)
            .all(&STARTS)
            .extent(Extent::Selector)
            .note(open, missing_parenthesis(pseudo)),

        StyleScope | StyleScopeWhiteSpace if open => return Err(LexerError::ScopeInPseudo),
        StyleScope | StyleScopeWhiteSpace => Expectation::new(
            state,
            "Expected: '}', [css selector] or [css property].",
        )
        .context(" in style scope")
        .then(m::WHITESPACE.alias(StyleScopeWhiteSpace))
        .then(m::STYLE_SCOPE_END)
        .then(m::AT_KEYFRAMES)
        .then(m::AT_SYMBOL)
        .then(m::PROPERTY_NAME)
        .then(m::CURRENT_SELECTOR)
        .then(m::COMBINATOR)
        .all(&STARTS)
        .extent(Extent::Selector),

        Colon => Expectation::bare(
            "Expected: [pseudo selector]. This error often occurs when a selector is missing.",
        )
        .then(m::PSEUDO_SELECTOR)
        .extent(Extent::Word),

        PropertyName => Expectation::new(state, "Expected: ':'.").then(m::PROPERTY_COLON),

        PropertyColon => Expectation::new(state, "Expected: [property value]. Did you forget ';'?")
            .then(m::PROPERTY_VALUE)
            .extent(Extent::Property),

        PropertyValue => Expectation::new(state, "Expected: ';' or '}'.")
            .then(m::STYLE_SCOPE_END)
            .then(m::VALUE_SEMICOLON),

        ValueSemiColon => Expectation::new(
            state,
            "Expected: '}', [css selector] or [css property].",
        )
        .context(" in style scope")
        .then(m::WHITESPACE.alias(state))
        .then(m::VALUE_SEMICOLON)
        .then(m::STYLE_SCOPE_END)
        .then(m::AT_KEYFRAMES)
        .then(m::AT_SYMBOL)
        .then(m::PROPERTY_NAME)
        .then(m::CURRENT_SELECTOR)
        .then(m::COMBINATOR)
        .all(&STARTS)
        .extent(Extent::Selector),
    };

    Ok(expectation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(state: Kind, inside: bool, input: &str) -> Option<Kind> {
        let expectation = expect(state, inside, 0).ok()?;
        expectation
            .matchers
            .iter()
            .find_map(|matcher| matcher.probe(input))
            .map(|found| found.resolved())
    }

    #[test]
    fn test_extent_measure() {
        assert_eq!(Extent::Char.measure("ab"), 1);
        assert_eq!(Extent::Word.measure("ab cd"), 2);
        assert_eq!(Extent::Word.measure("abcd"), 4);
        assert_eq!(Extent::Selector.measure(".a .b {"), 6);
        assert_eq!(Extent::Selector.measure("{"), 1);
        assert_eq!(Extent::Property.measure(" red\n"), 4);
        assert_eq!(Extent::Char.measure(""), 0);
    }

    #[test]
    fn test_ordered_alternation() {
        assert_eq!(first(Kind::StyleScope, true, "color: red;"), Some(Kind::PropertyName));
        assert_eq!(first(Kind::StyleScope, true, "a:hover {"), Some(Kind::SelectorName));
        assert_eq!(first(Kind::StyleScope, true, "&:hover {"), Some(Kind::CurrentSelector));
        assert_eq!(first(Kind::ClassName, true, ":not(.a)"), Some(Kind::NotOperator));
        assert_eq!(first(Kind::ClassName, true, ":hover"), Some(Kind::Colon));
        assert_eq!(first(Kind::ClassNameInitiator, false, ".x"), Some(Kind::ExportClassName));
    }

    #[test]
    fn test_comments_keep_the_state() {
        assert_eq!(first(Kind::StyleScope, true, "/* x */"), Some(Kind::StyleScope));
        assert_eq!(first(Kind::Skip, false, "// x\n"), Some(Kind::Skip));
    }

    #[test]
    fn test_root_rejects_current_selector() {
        assert_eq!(first(Kind::Skip, false, "& .a {"), None);
        assert_eq!(first(Kind::StyleScopeEnd, false, "& .a {"), None);
        assert_eq!(first(Kind::StyleScopeEnd, true, "& .a {"), Some(Kind::CurrentSelector));
    }

    #[test]
    fn test_pseudo_restrictions() {
        assert!(matches!(
            expect(Kind::SelectorSeparator, false, 1),
            Err(LexerError::BranchInPseudo)
        ));
        assert!(matches!(
            expect(Kind::StyleScope, false, 2),
            Err(LexerError::ScopeInPseudo)
        ));
    }

    #[test]
    fn test_root_hints() {
        let expectation = expect(Kind::Skip, false, 0).expect("skip state");
        let explained = expectation.explain("> .a ");
        assert!(explained.contains("selector combinator"), "{}", explained);
        assert!(!expectation.explain(".a").contains("Root level"));
    }
}
