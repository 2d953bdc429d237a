//! Emisión de bloques `@keyframes`.
//!
//! La gramática de `@keyframes` es restringida, así que basta un
//! recorrido lineal sobre su bitácora, sin construir reglas.

use crate::{context::Context, extension::Event, token::Kind};

pub(super) fn render(cx: &Context<'_>, tokens: &[crate::token::Token<'_>]) -> String {
    let config = cx.config();
    let compressed = config.compressed;
    let indent = config.indent();
    let (open, newline, space) = if compressed {
        ("{", "", "")
    } else {
        (" {\n", "\n", " ")
    };

    let mut css = String::new();
    for (index, token) in tokens.iter().enumerate() {
        match token.resolved() {
            Kind::AtKeyframes => css.push_str(token.text),
            Kind::KeyframesWhiteSpace => css.push(' '),
            Kind::KeyframesName | Kind::KeyframesSpecialNames => css.push_str(token.text),
            Kind::KeyframesScope | Kind::KeyframesBlock => css.push_str(open),

            Kind::KeyframesSelector => {
                let follows = index
                    .checked_sub(1)
                    .map_or(false, |previous| tokens[previous].is_selector());

                if !follows {
                    css.push_str(indent);
                }

                css.push_str(token.text.trim());
            }

            Kind::KeyframesSeparator => {
                css.push(',');
                css.push_str(space);
            }

            Kind::KeyframesBlockPropertyName => {
                let name = cx.query(Event::PropertyName, token.text, Some(token));
                css.push_str(indent);
                css.push_str(indent);
                css.push_str(&name);
                css.push(':');
                css.push_str(space);
            }

            Kind::KeyframesPropertyValue => {
                let value = cx.query(Event::PropertyValue, token.text.trim(), Some(token));
                let closes = tokens[index + 1..]
                    .iter()
                    .find(|next| next.resolved() != Kind::KeyframesValueSemiColon)
                    .map_or(true, |next| next.resolved() == Kind::KeyframesBlockEnd);

                css.push_str(&value);
                if !value.ends_with(';') && !(compressed && closes) {
                    css.push(';');
                }

                css.push_str(newline);
            }

            Kind::KeyframesBlockEnd => {
                css.push_str(indent);
                css.push('}');
                css.push_str(newline);
            }

            Kind::KeyframesScopeEnd => {
                css.push('}');
                css.push_str(newline);
            }

            _ => (),
        }
    }

    css
}
