use vcss::{
    error::Diagnostics, extension, ClassCache, Compiled, Compiler, Config, Event, Events,
    Extension, LexerError,
};

fn config() -> Config {
    Config {
        class_cache: ClassCache::seeded(7),
        ..Config::default()
    }
}

fn compile(source: &str) -> Compiled {
    vcss::compile(source, &config(), &extension::defaults()).expect("valid input")
}

fn fail(source: &str) -> vcss::Located<LexerError> {
    vcss::compile(source, &config(), &extension::defaults()).expect_err("invalid input")
}

#[test]
fn test_plain_rule() {
    let compiled = compile(".test { color: red; }");
    assert_eq!(compiled.static_css, ".test {\n  color: red;\n}");
    assert!(compiled.classes.is_empty());
    assert!(compiled.dynamic.is_empty());
}

#[test]
fn test_variable_fallback() {
    let compiled = compile(".a { margin: --c?10px; }");
    assert!(compiled.static_css.contains("margin: var(--c, 10px);"));
}

#[test]
fn test_arithmetic() {
    let compiled = compile(".a { height: 10px + 20vh; }");
    assert!(compiled.static_css.contains("height: calc(10px + 20vh);"));
}

#[test]
fn test_nested_at_rules_share_indentation() {
    let compiled = compile("@media screen { @media (min-width: 10px) { .a { color: blue; } } }");
    assert_eq!(
        compiled.static_css,
        "@media screen {\n  @media (min-width: 10px) {\n    .a {\n      color: blue;\n    }\n  }\n}"
    );
}

#[test]
fn test_runtime_variable_goes_dynamic() {
    let compiled = compile(".a { color: $theme; }");
    assert_eq!(compiled.static_css, "");
    assert_eq!(compiled.dynamic.len(), 1);
    assert_eq!(compiled.dynamic[0].dependencies, vec!["$theme".to_string()]);
}

#[test]
fn test_mixed_static_and_dynamic() {
    let compiled = compile(".a { margin: 0; color: $fg; background: $bg; border-color: $fg; }");
    assert_eq!(compiled.static_css, ".a {\n  margin: 0;\n}");

    let dependencies: Vec<_> = compiled
        .dynamic
        .iter()
        .map(|fragment| fragment.dependencies.join(" "))
        .collect();

    assert_eq!(dependencies, vec!["$fg", "$bg"]);
    assert!(compiled.dynamic[0].css.contains("border-color: $fg;"));
    assert_ne!(compiled.dynamic[0].hash, compiled.dynamic[1].hash);
}

#[test]
fn test_exported_class() {
    let compiled = compile("..test-class { color: red; }");
    let generated = compiled.classes.get("testClass").expect("exported class");

    assert!(generated.starts_with("test-class-vcss-"));
    assert_eq!(generated.len(), "test-class-vcss-".len() + 5);
    assert_eq!(compiled.static_css, format!(".{} {{\n  color: red;\n}}", generated));
}

#[test]
fn test_exported_class_in_dynamic_fragment() {
    let compiled = compile("..card { color: $fg; }");
    let fragment = &compiled.dynamic[0];

    assert_eq!(fragment.exported_classes.len(), 1);
    assert_eq!(fragment.exported_classes[0].original, "card");
    assert_eq!(
        Some(&fragment.exported_classes[0].generated),
        compiled.classes.get("card")
    );
}

#[test]
fn test_shared_cache_across_compiles() {
    let config = config();
    let compiler = Compiler::new(config.clone());

    let first = compiler.compile("..button { a: b; }").expect("valid input");
    let second = vcss::compile(".x ..button { c: d; }", &config, &extension::defaults())
        .expect("valid input");

    assert_eq!(first.classes.get("button"), second.classes.get("button"));
    assert_eq!(config.class_cache.len(), 1);
}

#[test]
fn test_distinct_classes_get_distinct_names() {
    let compiled = compile("..a, ..b { x: y; } ..c { x: y; }");
    let mut names: Vec<_> = compiled.classes.values().collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 3);
}

#[test]
fn test_selector_cross_product() {
    let compiled = compile(".a, .b { & .c, & .d { x: y; } }");
    assert_eq!(compiled.static_css, ".a .c, .a .d, .b .c, .b .d {\n  x: y;\n}");
}

#[test]
fn test_nesting_and_pseudo_selectors() {
    let compiled = compile(".list { li:nth-child(2n + 1) { color: red; } &:not(.x):hover { color: blue; } }");
    assert_eq!(
        compiled.static_css,
        ".list li:nth-child(2n + 1) {\n  color: red;\n}\n.list:not(.x):hover {\n  color: blue;\n}"
    );
}

#[test]
fn test_keyframes_follow_rules() {
    let compiled = compile("@keyframes spin { to { opacity: 1; } } .a { animation: spin 1s; }");
    assert_eq!(
        compiled.static_css,
        ".a {\n  animation: spin 1s;\n}\n@keyframes spin {\n  to {\n    opacity: 1;\n  }\n}"
    );
}

#[test]
fn test_compressed_output() {
    let config = Config {
        compressed: true,
        ..config()
    };

    let compiled = vcss::compile(
        ".a { b: c; .d { e: f; } } @media print { .a { g: h; } }",
        &config,
        &extension::defaults(),
    )
    .expect("valid input");

    assert_eq!(compiled.static_css, ".a{b:c}.a .d{e:f}@media print{.a{g:h}}");
}

#[test]
fn test_merge_toggle() {
    let source = ".a { x: 1; } .a { y: 2; }";
    assert_eq!(compile(source).static_css, ".a {\n  x: 1;\n  y: 2;\n}");

    let config = Config {
        merge_rules: false,
        ..config()
    };

    let compiled = vcss::compile(source, &config, &extension::defaults()).expect("valid input");
    assert_eq!(compiled.static_css, ".a {\n  x: 1;\n}\n.a {\n  y: 2;\n}");
}

#[test]
fn test_static_output_has_no_extended_syntax() {
    let source = "
        // comment
        ..card {
            padding: --pad?4px * 2;
            &:hover { color: --c; }
            @media print { display: none; }
            .title { margin: 1px + 2px; }
        }
    ";

    let compiled = compile(source);
    let css = &compiled.static_css;

    assert!(!css.contains(".."), "{}", css);
    assert!(!css.contains('&'), "{}", css);
    assert!(!css.contains('?'), "{}", css);
    assert!(!css.contains("//"), "{}", css);
    assert!(!css.contains('$'), "{}", css);
}

#[test]
fn test_recompiling_output_is_stable() {
    let source = ".a { width: --w?10px + 2px; .b { margin: 1px * 2; } } @media screen { .c { color: red; } }";
    let once = compile(source);
    let twice = compile(&once.static_css);
    assert_eq!(once.static_css, twice.static_css);
}

#[test]
fn test_license_notice() {
    let config = Config {
        license_notice: String::from("/*! (c) vcss */"),
        ..config()
    };

    let compiled = vcss::compile(".a { b: c; }", &config, &[]).expect("valid input");
    assert!(compiled.static_css.starts_with("/*! (c) vcss */\n.a {"));
}

struct Uppercase;

impl Extension for Uppercase {
    fn events(&self) -> Events {
        Events::SELECTOR
    }

    fn on_event(&self, _: Event, text: &str, _: Option<&vcss::token::Token<'_>>) -> String {
        text.to_uppercase()
    }
}

#[test]
fn test_custom_extension() {
    let compiler = Compiler::bare(config()).with_extension(Uppercase);
    let compiled = compiler.compile(".a { width: 1px + 1px; }").expect("valid input");
    assert_eq!(compiled.static_css, ".A {\n  width: 1px + 1px;\n}");
}

#[test]
fn test_unexpected_token_location() {
    let error = fail("a { color: red; } }");
    assert!(matches!(error.val(), LexerError::Unexpected { .. }));
    assert_eq!(error.location().range(), 18..19);
    assert!(error.to_string().contains("Expected: [css selector]."));
}

#[test]
fn test_unterminated_location() {
    let error = fail(".a {\n  .b {\n    c: d;\n  }\n");
    assert!(matches!(error.val(), LexerError::Unterminated(1)));
    assert_eq!(error.location().range(), 3..4);
}

#[test]
fn test_pseudo_function_errors() {
    assert!(matches!(fail(".a:not(.b, .c) {}").val(), LexerError::BranchInPseudo));
    assert!(matches!(fail(".a:not(.b {}").val(), LexerError::ScopeInPseudo));
}

#[test]
fn test_diagnostics_report() {
    let source = ".a {\n  color red;\n}";
    let error = fail(source);
    let report = Diagnostics::from(error).with_source("style.vcss", source).to_string();

    assert!(report.starts_with("error: Unexpected token. Expected: '{'"), "{}", report);
    assert!(report.contains(" --> style.vcss:2:12\n"), "{}", report);
    assert!(report.contains("2 |   color red;"), "{}", report);
    assert!(report.ends_with("Build failed with 1 error\n"));
}
