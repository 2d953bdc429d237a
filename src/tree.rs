//! Construcción de reglas.
//!
//! La bitácora significativa del lexer es plana: cada token solo sabe
//! su profundidad. Este módulo la recorre recursivamente por niveles
//! y produce una lista plana de [`Rule`]s, cada una con su selector ya
//! interpolado con los de sus ancestros y con la cadena de reglas `@`
//! que la envuelven.
//!
//! Las declaraciones cuyo valor menciona una variable de tiempo de
//! ejecución (`$nombre`) se desvían a reglas dinámicas, agrupadas por
//! selector, dependencias y reglas `@`.

use crate::{
    classes::class_key,
    token::{Attributes, Kind, Token},
};

use tracing::debug;

/// Clase exportada que aparece en el selector propio de una regla.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedClass {
    pub generated: String,

    /// Nombre original, en camelCase.
    pub original: String,
}

/// Par propiedad-valor ya validado por el lexer.
#[derive(Clone, Debug)]
pub struct Declaration<'a> {
    pub property: Token<'a>,
    pub value: Token<'a>,
}

/// Una regla de estilo.
#[derive(Clone, Debug)]
pub struct Rule<'a> {
    pub declarations: Vec<Declaration<'a>>,
    pub depth: usize,

    /// Selector final, vacío si las declaraciones van directo en una regla `@`.
    pub selector: String,

    /// Preludios de las reglas `@` envolventes, de afuera hacia adentro.
    pub at_rules: Vec<String>,

    pub dynamic: bool,

    /// Variables `$nombre` referenciadas, sin repetidos y en orden.
    pub dependencies: Vec<String>,

    pub exported_classes: Vec<ExportedClass>,
}

/// Construye las reglas a partir de la bitácora significativa.
pub fn build<'a>(tokens: &[Token<'a>]) -> Vec<Rule<'a>> {
    let mut rules = Vec::new();
    scope(tokens, 0, "", &[], &mut rules);

    debug!(rules = rules.len(), "rule tree built");
    rules
}

fn scope<'a>(
    tokens: &[Token<'a>],
    depth: usize,
    parent: &str,
    inherited: &[String],
    rules: &mut Vec<Rule<'a>>,
) {
    let mut selector = String::new();
    let mut at_rule = String::new();
    let mut at_rules = inherited.to_vec();
    let mut declarations = Vec::new();
    let mut dynamic: Vec<Rule<'a>> = Vec::new();
    let mut exported_classes = Vec::new();
    let mut children = Vec::new();
    let mut property = None;

    for (index, token) in tokens.iter().enumerate() {
        if token.depth != depth {
            // Un hijo comienza con un selector un nivel más abajo
            let opens = index == 0 || !tokens[index - 1].is_selector();
            if token.depth == depth + 1 && token.is_selector() && opens {
                children.push(index);
            }

            continue;
        }

        match token.resolved() {
            Kind::StyleScopeEnd => break,
            Kind::PropertyName => property = Some(token),

            Kind::PropertyValue => {
                let name = match property.take() {
                    Some(name) => name,
                    None => continue,
                };

                let declaration = Declaration {
                    property: name.clone(),
                    value: token.clone(),
                };

                let dependencies = dependencies(token.text);
                if dependencies.is_empty() {
                    declarations.push(declaration);
                    continue;
                }

                let selector = interpolate(&selector, parent);
                let existing = dynamic.iter_mut().find(|rule| {
                    rule.selector == selector
                        && rule.dependencies == dependencies
                        && rule.at_rules == at_rules
                });

                match existing {
                    Some(rule) => rule.declarations.push(declaration),
                    None => dynamic.push(Rule {
                        declarations: vec![declaration],
                        depth,
                        selector,
                        at_rules: at_rules.clone(),
                        dynamic: true,
                        dependencies,
                        exported_classes: exported_classes.clone(),
                    }),
                }
            }

            _ if token.is_selector() => {
                if token.attributes.contains(Attributes::AT_RULE) {
                    at_rule.push_str(token.text);
                } else if let Some(generated) = &token.export {
                    selector.push_str(generated);
                    exported_classes.push(ExportedClass {
                        generated: generated.clone(),
                        original: class_key(token.text),
                    });
                } else if token.kind != Kind::ExportClassName {
                    selector.push_str(token.text);
                    if token.kind == Kind::Combinator {
                        selector.push(' ');
                    }
                }
            }

            _ => (),
        }

        if !token.is_selector() && !at_rule.is_empty() {
            at_rules.push(at_rule.trim().to_owned());
            at_rule.clear();
        }
    }

    let selector = interpolate(&selector, parent);
    if !declarations.is_empty() {
        rules.push(Rule {
            declarations,
            depth,
            selector: selector.clone(),
            at_rules: at_rules.clone(),
            dynamic: false,
            dependencies: Vec::new(),
            exported_classes,
        });
    }

    rules.extend(dynamic);
    for child in children {
        scope(&tokens[child..], depth + 1, &selector, &at_rules, rules);
    }
}

/// Variables de tiempo de ejecución referenciadas por un valor.
fn dependencies(value: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for name in regex!(r"\$[a-zA-Z0-9_-]+").find_iter(value) {
        if !found.iter().any(|known| known == name.as_str()) {
            found.push(name.as_str().to_owned());
        }
    }

    found
}

/// Interpola un selector hijo con el de su padre.
///
/// Ambos son listas separadas por comas; el resultado es su producto
/// cruz. Una alternativa hija con `&` reemplaza cada `&` por la
/// alternativa padre, y si no lo tiene se le antepone como ancestro.
pub fn interpolate(selector: &str, parent: &str) -> String {
    let children = alternatives(selector);
    let parents = alternatives(parent);

    let combined: Vec<String> = match (parents.is_empty(), children.is_empty()) {
        (true, _) => children.iter().map(|child| trim_selector(child)).collect(),
        (false, true) => parents.iter().map(|parent| trim_selector(parent)).collect(),
        (false, false) => parents
            .iter()
            .flat_map(|parent| {
                let parent = trim_selector(parent);
                children.iter().map(move |child| {
                    let joined = if child.contains('&') {
                        child.replace('&', &parent)
                    } else {
                        format!("{} {}", parent, child)
                    };

                    trim_selector(&joined)
                })
            })
            .collect(),
    };

    combined.join(", ")
}

/// Divide una lista de selectores en sus comas de primer nivel.
fn alternatives(list: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut quote = None;
    let mut depth = 0usize;
    let mut from = 0;

    for (index, c) in list.char_indices() {
        match (quote, c) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => (),
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                pieces.push(&list[from..index]);
                from = index + 1;
            }

            _ => (),
        }
    }

    pieces.push(&list[from..]);
    pieces.retain(|piece| !piece.trim().is_empty());
    pieces
}

/// Colapsa espacios y elimina los que preceden a una coma.
pub fn trim_selector(selector: &str) -> String {
    selector
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(" ,", ",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, context::Context, lex};

    fn rules_of(source: &str) -> Vec<(String, Vec<String>, Vec<String>, bool)> {
        let config = Config::default();
        let mut cx = Context::new(source, &config);
        lex::lex(&mut cx).expect("valid input");

        build(cx.stripped())
            .into_iter()
            .map(|rule| {
                let declarations = rule
                    .declarations
                    .iter()
                    .map(|declaration| {
                        format!("{}:{}", declaration.property.text, declaration.value.text.trim())
                    })
                    .collect();

                (rule.selector, rule.at_rules, declarations, rule.dynamic)
            })
            .collect()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn test_interpolate_cross_product() {
        assert_eq!(interpolate("& c, & d", "a, b"), "a c, a d, b c, b d");
        assert_eq!(interpolate(".x", ".a, .b"), ".a .x, .b .x");
        assert_eq!(interpolate("&:hover", ".a"), ".a:hover");
        assert_eq!(interpolate(".a ", ""), ".a");
        assert_eq!(interpolate("", ".a"), ".a");
        assert_eq!(interpolate("> .b ", ".a"), ".a > .b");
    }

    #[test]
    fn test_alternatives_respect_nesting() {
        assert_eq!(alternatives("[a=','], :is(.b)"), vec!["[a=',']", " :is(.b)"]);
        assert!(alternatives("  ").is_empty());
    }

    #[test]
    fn test_trim_selector() {
        assert_eq!(trim_selector("  .a   .b ,  .c "), ".a .b, .c");
    }

    #[test]
    fn test_nested_rules() {
        let rules = rules_of(".a { color: red; .b { margin: 0; } &:hover { x: y; } }");
        assert_eq!(
            rules,
            vec![
                (".a".into(), vec![], strings(&["color:red"]), false),
                (".a .b".into(), vec![], strings(&["margin:0"]), false),
                (".a:hover".into(), vec![], strings(&["x:y"]), false),
            ]
        );
    }

    #[test]
    fn test_empty_rules_are_pruned() {
        let rules = rules_of(".a { .b { color: red; } }");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].0, ".a .b");
    }

    #[test]
    fn test_at_rules_wrap_children() {
        let rules = rules_of("@media screen { .a { color: blue; } }");
        assert_eq!(
            rules,
            vec![(".a".into(), strings(&["@media screen"]), strings(&["color:blue"]), false)]
        );

        let rules = rules_of(".a { @media print { color: red; } }");
        assert_eq!(
            rules,
            vec![(".a".into(), strings(&["@media print"]), strings(&["color:red"]), false)]
        );
    }

    #[test]
    fn test_dynamic_declarations_are_diverted() {
        let rules = rules_of(".a { color: $theme; margin: 0; border-color: $theme; }");
        assert_eq!(
            rules,
            vec![
                (".a".into(), vec![], strings(&["margin:0"]), false),
                (".a".into(), vec![], strings(&["color:$theme", "border-color:$theme"]), true),
            ]
        );
    }

    #[test]
    fn test_dependencies_are_ordered_and_unique() {
        assert_eq!(dependencies("$a $b-c $a"), strings(&["$a", "$b-c"]));
        assert!(dependencies("10px").is_empty());
    }
}
