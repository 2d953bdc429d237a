//! Reconocedores de categorías léxicas.
//!
//! Cada reconocedor examina el inicio de la entrada restante y
//! reporta cuántos bytes le pertenecen. Nunca consumen ni fallan:
//! la ausencia de coincidencia es simplemente `None`. Los
//! combinadores [`Matcher::alias`], [`Matcher::alias_in`] y
//! [`Matcher::keyframes`] derivan variantes sin alterar el escaneo.

use crate::token::{Attributes, Domain, Kind};

// Case-insensitive
use unicase::Ascii as NoCase;

/// Reglas `@` que abren un bloque anidable.
const NESTED_AT_RULES: &[NoCase<&str>] = &[
    NoCase::new("color-profile"),
    NoCase::new("container"),
    NoCase::new("counter-style"),
    NoCase::new("document"),
    NoCase::new("font-face"),
    NoCase::new("font-feature-values"),
    NoCase::new("layer"),
    NoCase::new("media"),
    NoCase::new("page"),
    NoCase::new("property"),
    NoCase::new("supports"),
];

/// Pseudoclases funcionales cuyo argumento es otro selector.
const SELECTOR_FUNCTIONS: &[NoCase<&str>] = &[
    NoCase::new("not"),
    NoCase::new("has"),
    NoCase::new("is"),
    NoCase::new("where"),
];

/// Un reconocedor con su categoría, dominio y atributos.
#[derive(Copy, Clone)]
pub struct Matcher {
    kind: Kind,
    alias: Option<Kind>,
    domain: Domain,
    attributes: Attributes,
    scan: fn(&str) -> Option<usize>,
}

/// Coincidencia de un [`Matcher`] sobre la entrada restante.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Match {
    pub kind: Kind,
    pub alias: Option<Kind>,
    pub domain: Domain,
    pub attributes: Attributes,
    pub len: usize,
}

impl Match {
    /// Categoría efectiva.
    pub fn resolved(&self) -> Kind {
        self.alias.unwrap_or(self.kind)
    }
}

impl Matcher {
    const fn new(kind: Kind, domain: Domain, scan: fn(&str) -> Option<usize>) -> Self {
        Matcher {
            kind,
            alias: None,
            domain,
            attributes: Attributes::empty(),
            scan,
        }
    }

    const fn with(self, attributes: Attributes) -> Self {
        Matcher {
            attributes: Attributes::from_bits_truncate(self.attributes.bits() | attributes.bits()),
            ..self
        }
    }

    /// Renombra la categoría reportada, conservando el dominio.
    pub const fn alias(self, alias: Kind) -> Self {
        Matcher {
            alias: Some(alias),
            ..self
        }
    }

    /// Renombra la categoría y reemplaza el dominio.
    pub const fn alias_in(self, alias: Kind, domain: Domain) -> Self {
        Matcher {
            alias: Some(alias),
            domain,
            ..self
        }
    }

    /// Marca las coincidencias como parte de un bloque `@keyframes`.
    pub const fn keyframes(self) -> Self {
        self.with(Attributes::KEYFRAMES)
    }

    /// Categoría efectiva que tendrá una coincidencia.
    pub fn resolved(&self) -> Kind {
        self.alias.unwrap_or(self.kind)
    }

    /// Intenta reconocer el inicio de `input`.
    pub fn probe(&self, input: &str) -> Option<Match> {
        (self.scan)(input).map(|len| Match {
            kind: self.kind,
            alias: self.alias,
            domain: self.domain,
            attributes: self.attributes,
            len,
        })
    }
}

pub const WHITESPACE: Matcher = Matcher::new(Kind::Skip, Domain::Void, whitespace);
pub const INLINE_COMMENT: Matcher = Matcher::new(Kind::InlineComment, Domain::Void, inline_comment);
pub const BLOCK_COMMENT: Matcher = Matcher::new(Kind::BlockComment, Domain::Void, block_comment);

pub const ROOT_SELECTOR: Matcher = Matcher::new(Kind::RootSelector, Domain::Selector, root_selector);
pub const COLON: Matcher = Matcher::new(Kind::Colon, Domain::Selector, colon);
pub const PSEUDO_SELECTOR: Matcher =
    Matcher::new(Kind::PseudoSelector, Domain::Selector, pseudo_name);
pub const PSEUDO_ARGUMENT: Matcher =
    Matcher::new(Kind::PseudoArgument, Domain::Selector, pseudo_argument);
pub const CLASS_NAME_INITIATOR: Matcher =
    Matcher::new(Kind::ClassNameInitiator, Domain::Selector, period);
pub const EXPORT_CLASS_NAME: Matcher =
    Matcher::new(Kind::ExportClassName, Domain::Selector, period);
pub const ID_INITIATOR: Matcher = Matcher::new(Kind::IdInitiator, Domain::Selector, hash);
pub const SELECTOR_SEPARATOR: Matcher =
    Matcher::new(Kind::SelectorSeparator, Domain::Selector, separator);
pub const SELECTOR_CHILD: Matcher = Matcher::new(Kind::SelectorChild, Domain::Selector, whitespace);
pub const SELECTOR_NAME: Matcher = Matcher::new(Kind::SelectorName, Domain::Selector, name);
pub const COMBINATOR: Matcher = Matcher::new(Kind::Combinator, Domain::Selector, combinator);
pub const WILDCARD: Matcher = Matcher::new(Kind::Wildcard, Domain::Selector, asterisk);
pub const CURRENT_SELECTOR: Matcher =
    Matcher::new(Kind::CurrentSelector, Domain::Selector, ampersand);
pub const NOT_OPERATOR: Matcher = Matcher::new(Kind::NotOperator, Domain::Selector, not_operator);
pub const NOT_OPERATOR_PARENTHESIS: Matcher =
    Matcher::new(Kind::NotOperatorParenthesis, Domain::Selector, open_parenthesis);
pub const NOT_OPERATOR_PARENTHESIS_END: Matcher =
    Matcher::new(Kind::NotOperatorParenthesisEnd, Domain::Selector, close_parenthesis);

pub const ATTRIBUTE_SELECTOR_INITIATOR: Matcher =
    Matcher::new(Kind::AttributeSelectorInitiator, Domain::Selector, open_bracket);
pub const ATTRIBUTE_SELECTOR_MODIFIER: Matcher = Matcher::new(
    Kind::AttributeSelectorModifier,
    Domain::Selector,
    attribute_modifier,
);
pub const ATTRIBUTE_SELECTOR_SINGLE_QUOTE_INITIATOR: Matcher = Matcher::new(
    Kind::AttributeSelectorSingleQuoteInitiator,
    Domain::Selector,
    single_quote_initiator,
);
pub const ATTRIBUTE_SELECTOR_SINGLE_QUOTE_BODY: Matcher = Matcher::new(
    Kind::AttributeSelectorSingleQuoteBody,
    Domain::Selector,
    single_quote_body,
);
pub const ATTRIBUTE_SELECTOR_DOUBLE_QUOTE_INITIATOR: Matcher = Matcher::new(
    Kind::AttributeSelectorDoubleQuoteInitiator,
    Domain::Selector,
    double_quote_initiator,
);
pub const ATTRIBUTE_SELECTOR_DOUBLE_QUOTE_BODY: Matcher = Matcher::new(
    Kind::AttributeSelectorDoubleQuoteBody,
    Domain::Selector,
    double_quote_body,
);
pub const ATTRIBUTE_SELECTOR_CLOSE: Matcher =
    Matcher::new(Kind::AttributeSelectorClose, Domain::Selector, attribute_close);
pub const ATTRIBUTE_SELECTOR_CLOSE_WITHOUT_OPERATOR: Matcher = Matcher::new(
    Kind::AttributeSelectorClose,
    Domain::Selector,
    attribute_close_bare,
);

pub const STYLE_SCOPE: Matcher = Matcher::new(Kind::StyleScope, Domain::Style, open_brace);
pub const STYLE_SCOPE_END: Matcher = Matcher::new(Kind::StyleScopeEnd, Domain::Style, close_brace);
pub const PROPERTY_NAME: Matcher = Matcher::new(Kind::PropertyName, Domain::Style, property_name);
pub const PROPERTY_COLON: Matcher = Matcher::new(Kind::PropertyColon, Domain::Style, single_colon);
pub const PROPERTY_VALUE: Matcher =
    Matcher::new(Kind::PropertyValue, Domain::Style, property_value);
pub const VALUE_SEMICOLON: Matcher = Matcher::new(Kind::ValueSemiColon, Domain::Style, semicolon);

pub const AT_SYMBOL: Matcher =
    Matcher::new(Kind::AtSymbol, Domain::Selector, at_symbol).with(Attributes::AT_RULE);
pub const NESTED_AT_RULE_NAME: Matcher =
    Matcher::new(Kind::NestedAtRuleName, Domain::Selector, nested_at_rule_name)
        .with(Attributes::AT_RULE);
pub const NESTED_AT_RULE: Matcher =
    Matcher::new(Kind::NestedAtRule, Domain::Selector, at_rule_prelude).with(Attributes::AT_RULE);

pub const AT_KEYFRAMES: Matcher =
    Matcher::new(Kind::AtKeyframes, Domain::Selector, at_keyframes).keyframes();
pub const KEYFRAMES_SPECIAL_NAMES: Matcher = Matcher::new(
    Kind::KeyframesSpecialNames,
    Domain::Selector,
    keyframes_special_name,
);
pub const KEYFRAMES_SELECTOR: Matcher =
    Matcher::new(Kind::KeyframesSelector, Domain::Selector, keyframes_selector).keyframes();

fn literal(input: &str, prefix: &str) -> Option<usize> {
    input.starts_with(prefix).then_some(prefix.len())
}

fn leading_whitespace(input: &str) -> usize {
    input.len() - input.trim_start().len()
}

fn name_len(input: &str) -> usize {
    input
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_' || *b == b'-')
        .count()
}

fn word_len(input: &str) -> usize {
    input
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic() || *b == b'-')
        .count()
}

fn whitespace(input: &str) -> Option<usize> {
    let len = leading_whitespace(input);
    (len > 0).then_some(len)
}

fn inline_comment(input: &str) -> Option<usize> {
    input
        .starts_with("//")
        .then(|| input.find('\n').unwrap_or(input.len()))
}

fn block_comment(input: &str) -> Option<usize> {
    let body = input.strip_prefix("/*")?;
    body.find("*/").map(|end| end + 4)
}

fn root_selector(input: &str) -> Option<usize> {
    let rest = input.strip_prefix(':')?;
    let len = name_len(rest);
    (NoCase::new(&rest[..len]) == NoCase::new("root")).then_some(len + 1)
}

fn colon(input: &str) -> Option<usize> {
    literal(input, "::").or_else(|| literal(input, ":"))
}

fn single_colon(input: &str) -> Option<usize> {
    literal(input, ":")
}

fn pseudo_name(input: &str) -> Option<usize> {
    let len = word_len(input);
    (len > 0).then_some(len)
}

fn pseudo_argument(input: &str) -> Option<usize> {
    if !input.starts_with('(') {
        return None;
    }

    let mut depth = 0usize;
    for (index, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index + 1);
                }
            }

            '{' | '}' | ';' | '\n' => return None,
            _ => (),
        }
    }

    None
}

fn period(input: &str) -> Option<usize> {
    literal(input, ".")
}

fn hash(input: &str) -> Option<usize> {
    literal(input, "#")
}

fn separator(input: &str) -> Option<usize> {
    let rest = input.strip_prefix(',')?;
    Some(1 + leading_whitespace(rest))
}

fn name(input: &str) -> Option<usize> {
    let len = name_len(input);
    (len > 0).then_some(len)
}

fn combinator(input: &str) -> Option<usize> {
    [">", "~", "+", "||"]
        .iter()
        .find_map(|symbol| literal(input, symbol))
}

fn asterisk(input: &str) -> Option<usize> {
    literal(input, "*")
}

fn ampersand(input: &str) -> Option<usize> {
    literal(input, "&")
}

fn not_operator(input: &str) -> Option<usize> {
    let rest = input.strip_prefix(':')?;
    let len = word_len(rest);
    let function = NoCase::new(&rest[..len]);

    let known = SELECTOR_FUNCTIONS.iter().any(|name| *name == function);
    (known && rest[len..].starts_with('(')).then_some(len + 1)
}

fn open_parenthesis(input: &str) -> Option<usize> {
    literal(input, "(")
}

fn close_parenthesis(input: &str) -> Option<usize> {
    literal(input, ")")
}

fn open_bracket(input: &str) -> Option<usize> {
    literal(input, "[")
}

fn attribute_modifier(input: &str) -> Option<usize> {
    let skip = leading_whitespace(input);
    let rest = &input[skip..];
    let operator = match rest.as_bytes().first() {
        Some(b'!' | b'|' | b'~' | b'^' | b'$' | b'*') => 1,
        _ => 0,
    };

    rest[operator..]
        .starts_with('=')
        .then_some(skip + operator + 1)
}

fn quote_initiator(input: &str, quote: char) -> Option<usize> {
    let skip = leading_whitespace(input);
    input[skip..].starts_with(quote).then_some(skip + 1)
}

fn quote_body(input: &str, quote: char) -> Option<usize> {
    let mut escaped = false;
    for (index, c) in input.char_indices() {
        match c {
            '\n' => return None,
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            _ if c == quote => return Some(index + 1),
            _ => (),
        }
    }

    None
}

fn single_quote_initiator(input: &str) -> Option<usize> {
    quote_initiator(input, '\'')
}

fn single_quote_body(input: &str) -> Option<usize> {
    quote_body(input, '\'')
}

fn double_quote_initiator(input: &str) -> Option<usize> {
    quote_initiator(input, '"')
}

fn double_quote_body(input: &str) -> Option<usize> {
    quote_body(input, '"')
}

fn attribute_close(input: &str) -> Option<usize> {
    let skip = leading_whitespace(input);
    let rest = &input[skip..];
    let flag = match rest.as_bytes().first() {
        Some(b'i' | b'I' | b's' | b'S') => 1,
        _ => 0,
    };

    rest[flag..].starts_with(']').then_some(skip + flag + 1)
}

fn attribute_close_bare(input: &str) -> Option<usize> {
    let skip = leading_whitespace(input);
    input[skip..].starts_with(']').then_some(skip + 1)
}

fn open_brace(input: &str) -> Option<usize> {
    literal(input, "{")
}

fn close_brace(input: &str) -> Option<usize> {
    let skip = leading_whitespace(input);
    input[skip..].starts_with('}').then_some(skip + 1)
}

fn property_name(input: &str) -> Option<usize> {
    let len = name_len(input);
    if len == 0 || !input[len..].starts_with(':') {
        return None;
    }

    // `a:hover {` es un selector, no una declaración
    let rest = &input[len + 1..];
    match rest.find(|c: char| matches!(c, '{' | ';' | '}')) {
        Some(end) if rest[end..].starts_with('{') => None,
        _ => Some(len),
    }
}

fn property_value(input: &str) -> Option<usize> {
    let mut quote = None;
    let mut escaped = false;
    let mut depth = 0usize;

    for (index, c) in input.char_indices() {
        match (quote, c) {
            _ if escaped => escaped = false,
            (_, '\\') => escaped = true,
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => (),
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';' | '}') => return (!input[..index].trim().is_empty()).then_some(index),
            (None, '{') => return None,
            (None, ':') if depth == 0 => return None,
            _ => (),
        }
    }

    None
}

fn semicolon(input: &str) -> Option<usize> {
    literal(input, ";")
}

fn at_symbol(input: &str) -> Option<usize> {
    literal(input, "@")
}

fn at_keyframes(input: &str) -> Option<usize> {
    let rest = input.strip_prefix('@')?;
    let len = word_len(rest);
    (NoCase::new(&rest[..len]) == NoCase::new("keyframes")).then_some(len + 1)
}

fn nested_at_rule_name(input: &str) -> Option<usize> {
    let len = word_len(input);
    let name = NoCase::new(&input[..len]);
    NESTED_AT_RULES
        .iter()
        .any(|rule| *rule == name)
        .then_some(len)
}

fn at_rule_prelude(input: &str) -> Option<usize> {
    let end = input.find(|c: char| c == '{' || c == '\n')?;
    input[end..].starts_with('{').then_some(end)
}

fn keyframes_special_name(input: &str) -> Option<usize> {
    literal(input, "\"initial\"").or_else(|| literal(input, "\"None\""))
}

fn keyframes_selector(input: &str) -> Option<usize> {
    let digits = input.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 {
        let rest = &input[digits..];
        let fraction = match rest.strip_prefix('.') {
            Some(decimals) => match decimals.bytes().take_while(u8::is_ascii_digit).count() {
                0 => return None,
                count => count + 1,
            },
            None => 0,
        };

        return rest[fraction..]
            .starts_with('%')
            .then_some(digits + fraction + 1);
    }

    let len = name_len(input);
    let word = NoCase::new(&input[..len]);
    (word == NoCase::new("from") || word == NoCase::new("to")).then_some(len)
}
