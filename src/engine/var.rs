//! Expansión de variables con respaldo.
//!
//! `--nombre` se convierte en `var(--nombre)` y `--nombre?respaldo`
//! en `var(--nombre, respaldo)`. Un respaldo que a su vez comienza
//! con `--` se expande recursivamente. Las referencias que ya están
//! dentro de `var(` no se tocan.

/// Expande las referencias a variables de `input`.
pub fn varify(input: &str) -> String {
    let pattern = regex!(r"--[a-zA-Z0-9_-]+");

    let mut output = String::with_capacity(input.len());
    let mut copied = 0;
    let mut from = 0;

    while let Some(found) = pattern.find_at(input, from) {
        if inside_var(&input[..found.start()]) {
            from = next_boundary(input, found.start());
            continue;
        }

        let name = found.as_str();
        let fallback = input[found.end()..]
            .strip_prefix('?')
            .map(|rest| &rest[..fallback_len(rest)])
            .filter(|fallback| !fallback.is_empty());

        output.push_str(&input[copied..found.start()]);
        match fallback {
            Some(fallback) => {
                let fallback = if fallback.starts_with("--") {
                    varify(fallback)
                } else {
                    fallback.to_owned()
                };

                output.push_str(&format!("var({}, {})", name, fallback));
                copied = found.end() + 1 + fallback_len(&input[found.end() + 1..]);
            }

            None => {
                output.push_str(&format!("var({})", name));
                copied = found.end();
            }
        }

        from = copied;
    }

    output.push_str(&input[copied..]);
    output
}

/// Indica si el texto previo termina en `var(`, con espacios opcionales
/// entre `var` y el paréntesis.
fn inside_var(before: &str) -> bool {
    before
        .strip_suffix('(')
        .map(|head| head.trim_end().ends_with("var"))
        .unwrap_or(false)
}

fn next_boundary(input: &str, index: usize) -> usize {
    input[index..]
        .chars()
        .next()
        .map_or(input.len(), |c| index + c.len_utf8())
}

/// Largo del respaldo: caracteres no blancos, sin cerrar un paréntesis
/// ajeno ni cruzar una coma de primer nivel.
fn fallback_len(rest: &str) -> usize {
    let mut depth = 0usize;
    for (index, c) in rest.char_indices() {
        match c {
            c if c.is_whitespace() => return index,
            '(' => depth += 1,
            ')' if depth == 0 => return index,
            ')' => depth -= 1,
            ',' if depth == 0 => return index,
            _ => (),
        }
    }

    rest.len()
}
