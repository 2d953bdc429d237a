/// Compila una expresión regular una sola vez y retorna `&'static Regex`.
macro_rules! regex {
    ($pattern:expr) => {{
        static PATTERN: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        PATTERN.get_or_init(|| {
            regex::Regex::new($pattern)
                .unwrap_or_else(|error| panic!("invalid built-in pattern {:?}: {}", $pattern, error))
        })
    }};
}
