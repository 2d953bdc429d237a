//! Ganchos de transformación.
//!
//! Una extensión observa uno o más [`Event`]s de la emisión y puede
//! reescribir el texto correspondiente. Las extensiones se aplican en
//! orden de registro; la salida de una es la entrada de la siguiente.

use crate::{
    engine::{varify, Calc},
    token::Token,
};

use bitflags::bitflags;

bitflags! {
    /// Conjunto de eventos que observa una extensión.
    pub struct Events: u8 {
        const SELECTOR = 0x01;
        const PROPERTY_NAME = 0x02;
        const PROPERTY_VALUE = 0x04;
    }
}

/// Evento de emisión.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Selector completo de una regla, ya interpolado.
    Selector,

    /// Nombre de una propiedad.
    PropertyName,

    /// Valor de una propiedad, sin espacios circundantes.
    PropertyValue,
}

impl Event {
    /// Bandera correspondiente en [`Events`].
    pub fn flag(self) -> Events {
        match self {
            Event::Selector => Events::SELECTOR,
            Event::PropertyName => Events::PROPERTY_NAME,
            Event::PropertyValue => Events::PROPERTY_VALUE,
        }
    }
}

/// Transformación de texto enganchada a la emisión.
pub trait Extension: Send + Sync {
    /// Eventos que esta extensión desea observar.
    fn events(&self) -> Events;

    /// Reescribe `text`. `token` es el token de origen, si existe.
    fn on_event(&self, event: Event, text: &str, token: Option<&Token<'_>>) -> String;
}

/// `--x?respaldo` a `var(--x, respaldo)`.
#[derive(Debug, Default)]
pub struct AutoVar;

impl Extension for AutoVar {
    fn events(&self) -> Events {
        Events::PROPERTY_VALUE
    }

    fn on_event(&self, _: Event, text: &str, _: Option<&Token<'_>>) -> String {
        varify(text)
    }
}

/// `a + b` a `calc(a + b)`.
#[derive(Debug, Default)]
pub struct AutoCalc {
    engine: Calc,
}

impl Extension for AutoCalc {
    fn events(&self) -> Events {
        Events::PROPERTY_VALUE
    }

    fn on_event(&self, _: Event, text: &str, _: Option<&Token<'_>>) -> String {
        self.engine.calcify(text)
    }
}

/// Extensiones estándar: variables primero, aritmética después.
pub fn defaults() -> Vec<Box<dyn Extension>> {
    vec![Box::new(AutoVar), Box::new(AutoCalc::default())]
}

/// Aplica en orden las extensiones que observan `event`.
pub fn apply(
    extensions: &[&dyn Extension],
    event: Event,
    text: &str,
    token: Option<&Token<'_>>,
) -> String {
    extensions
        .iter()
        .filter(|extension| extension.events().contains(event.flag()))
        .fold(text.to_owned(), |text, extension| {
            extension.on_event(event, &text, token)
        })
}
