//! Reducción aritmética.
//!
//! Expresiones como `10px + 20vh` se envuelven en `calc(...)`. Los
//! operadores requieren espacios a ambos lados; `*` y `/` se reducen
//! antes que `+` y `-`, siempre el más a la izquierda primero. Los
//! argumentos de funciones distintas de `calc` y `var` se reducen
//! recursivamente. Al final, `|` y `\/` se traducen a `/` literal.

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

/// Reductor con memoria de resultados previos.
#[derive(Debug, Default)]
pub struct Calc {
    cache: Mutex<HashMap<String, String>>,
}

impl Calc {
    /// Construye un reductor con memoria vacía.
    pub fn new() -> Self {
        Calc::default()
    }

    /// Reduce `input`, consultando y alimentando la memoria.
    pub fn calcify(&self, input: &str) -> String {
        if !has_arithmetic(input) {
            return resolve_slashes(input);
        }

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = cache.get(input) {
            return hit.clone();
        }

        let output = calcify(input);
        cache.insert(input.to_owned(), output.clone());
        output
    }

    /// Cantidad de entradas memorizadas.
    pub fn cached(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Reduce `input` sin memoria.
pub fn calcify(input: &str) -> String {
    if !has_arithmetic(input) {
        return resolve_slashes(input);
    }

    resolve_slashes(&expand(input))
}

fn has_arithmetic(input: &str) -> bool {
    input.contains(|c: char| matches!(c, '-' | '+' | '/' | '*'))
}

fn expand(input: &str) -> String {
    reduce(operands(input)).into_iter().map(resolve).collect()
}

/// Reduce argumentos de funciones que no sean `calc()` ni `var()`.
fn resolve(term: String) -> String {
    if !has_arithmetic(&term) {
        return term;
    }

    let function = regex!(r"^([a-zA-Z]*)\((.*)\)$");
    let (name, argument) = match function.captures(&term) {
        Some(captures) => (captures[1].to_owned(), captures[2].to_owned()),
        None => return term,
    };

    if argument.is_empty() || name == "calc" || name == "var" {
        return term;
    }

    let argument = expand(&argument);
    if name.is_empty() {
        argument
    } else {
        format!("{}({})", name, argument)
    }
}

fn reduce(mut terms: Vec<String>) -> Vec<String> {
    let product = regex!(r"^\s+[/*]\s+$");
    let sum = regex!(r"^\s+[+\-]\s+$");

    loop {
        let operator = terms
            .iter()
            .position(|term| product.is_match(term))
            .or_else(|| terms.iter().position(|term| sum.is_match(term)));

        // Un operador al inicio no tiene operando izquierdo
        let index = match operator {
            Some(index) if index > 0 && index + 1 < terms.len() => index,
            _ => return terms,
        };

        let (left, right) = (&terms[index - 1], &terms[index + 1]);
        if !is_operand(left) || !is_operand(right) {
            return terms;
        }

        let joined = format!("{}{}{}", left, terms[index], right);
        let wrapped = format!("calc({})", joined.replacen("calc(", "(", 1));
        terms.drain(index..=index + 1);
        terms[index - 1] = wrapped;
    }
}

fn is_operand(term: &str) -> bool {
    regex!(r"(?:--|\$)[a-zA-Z0-9_-]+|\d*\.?-?\d+[a-zA-Z]*|^[a-zA-Z%]+\(").is_match(term)
}

/// Separa operandos y operadores; funciones y paréntesis quedan
/// agrupados en un solo término.
fn operands(input: &str) -> Vec<String> {
    let pattern = regex!(
        r"(?:--|\$)[a-zA-Z0-9_-]+|\s+(?:[+\-/*]|\*\*)\s+|[a-zA-Z]+\(|\s+|-?\d*\.?\d+[a-zA-Z%]*|."
    );

    let mut terms: Vec<String> = Vec::new();
    let mut grouping = false;
    let mut depth = 0usize;

    for token in pattern.find_iter(input).map(|found| found.as_str()) {
        match terms.last_mut() {
            Some(last) if grouping => last.push_str(token),
            _ => terms.push(token.to_owned()),
        }

        if token.contains('(') {
            if grouping {
                depth += 1;
            } else {
                grouping = true;
            }
        } else if token == ")" && grouping {
            if depth == 0 {
                grouping = false;
            } else {
                depth -= 1;
            }
        }
    }

    terms
}

/// `|` y `\/` se traducen a `/`, salvo que los preceda `\`.
fn resolve_slashes(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut previous = None;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        let escaped = previous == Some('\\');
        match c {
            '\\' if !escaped && chars.peek() == Some(&'/') => {
                chars.next();
                output.push('/');
                previous = Some('/');
                continue;
            }

            '|' if !escaped => output.push('/'),
            _ => output.push(c),
        }

        previous = Some(c);
    }

    output
}
