//! Unidades léxicas.
//!
//! Cada token registra la categoría gramatical que lo reconoció
//! ([`Kind`]), un alias opcional que decide la transición siguiente
//! del lexer, el dominio al que pertenece y su profundidad de
//! anidamiento. El texto es un préstamo del código fuente original.

use bitflags::bitflags;

bitflags! {
    /// Atributos adicionales de un token.
    pub struct Attributes: u8 {
        /// Pertenece a un bloque `@keyframes`.
        const KEYFRAMES = 0x01;

        /// Forma parte del preludio de una regla `@`.
        const AT_RULE = 0x02;
    }
}

/// Dominio de un token.
///
/// El dominio decide qué fases observan al token: los de selector
/// construyen selectores, los de estilo construyen declaraciones y
/// los vacíos (espacios, comentarios) se descartan tras el lexer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Domain {
    Selector,
    Style,
    Void,

    /// Reservado para control de flujo (`@if`), sin gramática aún.
    Flow,
}

/// Categoría gramatical.
///
/// Las categorías base las produce algún reconocedor; las restantes
/// solo aparecen como alias de otra categoría base.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Espacio en blanco descartable, y también el estado inicial.
    Skip,
    InlineComment,
    BlockComment,

    RootSelector,
    Colon,
    PseudoSelector,
    PseudoArgument,
    ClassNameInitiator,
    ExportClassName,
    ClassName,
    IdInitiator,
    SelectorSeparator,
    SelectorChild,
    SelectorName,
    Combinator,
    Wildcard,
    CurrentSelector,
    NotOperator,
    NotOperatorParenthesis,
    NotOperatorParenthesisEnd,

    AttributeSelectorInitiator,
    AttributeSelectorName,
    AttributeSelectorModifier,
    AttributeSelectorSingleQuoteInitiator,
    AttributeSelectorSingleQuoteBody,
    AttributeSelectorDoubleQuoteInitiator,
    AttributeSelectorDoubleQuoteBody,
    AttributeSelectorValue,
    AttributeSelectorClose,

    StyleScope,
    StyleScopeWhiteSpace,
    StyleScopeEnd,
    PropertyName,
    PropertyColon,
    PropertyValue,
    ValueSemiColon,

    AtSymbol,
    NestedAtRuleName,
    NestedAtRule,

    AtKeyframes,
    KeyframesWhiteSpace,
    KeyframesName,
    KeyframesSpecialNames,
    KeyframesNameWhiteSpace,
    KeyframesScope,
    KeyframesScopeWhiteSpace,
    KeyframesSelector,
    KeyframesSeparator,
    KeyframesBlock,
    KeyframesBlockWhiteSpace,
    KeyframesBlockPropertyName,
    KeyframesPropertyColon,
    KeyframesPropertyValue,
    KeyframesValueSemiColon,
    KeyframesBlockEnd,
    KeyframesBlockEndWhiteSpace,
    KeyframesScopeEnd,
}

/// Objeto resultante del análisis léxico.
#[derive(Clone, Debug)]
pub struct Token<'a> {
    /// Categoría base del reconocedor.
    pub kind: Kind,

    /// Categoría de reemplazo, si el reconocedor fue renombrado.
    pub alias: Option<Kind>,

    pub domain: Domain,
    pub attributes: Attributes,

    /// Texto exacto consumido.
    pub text: &'a str,

    /// Offset de inicio en bytes.
    pub start: usize,

    /// Offset de fin (exclusivo) en bytes.
    pub end: usize,

    /// Profundidad de anidamiento de reglas.
    pub depth: usize,

    /// Nombre generado para una clase exportada (`..nombre`).
    pub export: Option<String>,
}

impl Token<'_> {
    /// Categoría efectiva: el alias si existe, si no la base.
    pub fn resolved(&self) -> Kind {
        self.alias.unwrap_or(self.kind)
    }

    /// Indica si pertenece al dominio de selectores.
    pub fn is_selector(&self) -> bool {
        self.domain == Domain::Selector
    }
}
