//! Estado de una compilación.
//!
//! Un [`Context`] vive durante una única llamada a [`crate::compile`].
//! Es dueño del cursor y de las tres bitácoras de tokens: la completa,
//! la significativa (sin espacios, comentarios ni `@keyframes`) y la
//! de `@keyframes`. Todas son de solo inserción.

use std::collections::BTreeMap;

use crate::{
    classes::class_key,
    config::Config,
    extension::{self, Event, Extension},
    lex::matcher::Match,
    token::{Attributes, Domain, Token},
};

pub struct Context<'a> {
    source: &'a str,
    cursor: usize,
    tokens: Vec<Token<'a>>,
    stripped: Vec<Token<'a>>,
    keyframes: Vec<Token<'a>>,
    extensions: Vec<&'a dyn Extension>,
    classes: BTreeMap<String, String>,
    config: &'a Config,
}

impl<'a> Context<'a> {
    pub fn new(source: &'a str, config: &'a Config) -> Self {
        Context {
            source,
            cursor: 0,
            tokens: Vec::new(),
            stripped: Vec::new(),
            keyframes: Vec::new(),
            extensions: Vec::new(),
            classes: BTreeMap::new(),
            config,
        }
    }

    /// Registra extensiones, que se aplicarán en el orden dado.
    pub fn register<I>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = &'a dyn Extension>,
    {
        self.extensions.extend(extensions);
        self
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Entrada aún no consumida.
    pub fn rest(&self) -> &'a str {
        &self.source[self.cursor..]
    }

    pub fn config(&self) -> &'a Config {
        self.config
    }

    pub fn tokens(&self) -> &[Token<'a>] {
        &self.tokens
    }

    pub fn stripped(&self) -> &[Token<'a>] {
        &self.stripped
    }

    pub fn keyframes(&self) -> &[Token<'a>] {
        &self.keyframes
    }

    /// Clases exportadas: clave en camelCase a nombre generado.
    pub fn classes(&self) -> &BTreeMap<String, String> {
        &self.classes
    }

    /// Consume la coincidencia, avanza el cursor y registra el token.
    pub fn tokenize(&mut self, found: Match, depth: usize, export: Option<String>) -> &Token<'a> {
        let start = self.cursor;
        let end = start + found.len;

        let token = Token {
            kind: found.kind,
            alias: found.alias,
            domain: found.domain,
            attributes: found.attributes,
            text: &self.source[start..end],
            start,
            end,
            depth,
            export,
        };

        self.cursor = end;
        if token.domain != Domain::Void {
            if token.attributes.contains(Attributes::KEYFRAMES) {
                self.keyframes.push(token.clone());
            } else {
                self.stripped.push(token.clone());
            }
        }

        self.tokens.push(token);
        &self.tokens[self.tokens.len() - 1]
    }

    /// Nombre generado para una clase exportada.
    pub fn export_class(&mut self, original: &str) -> String {
        let config = self.config;
        let generated = config.class_cache.generate(
            original,
            &config.class_prefix,
            config.class_suffix_length,
        );

        self.classes.insert(class_key(original), generated.clone());
        generated
    }

    /// Aplica las extensiones que observan `event`.
    pub fn query(&self, event: Event, text: &str, token: Option<&Token<'_>>) -> String {
        extension::apply(&self.extensions, event, text, token)
    }
}
