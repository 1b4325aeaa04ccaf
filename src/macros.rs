/// Compile a literal regex once per process and hand out a `&'static Regex`.
///
/// Used for the fixed patterns of the engine itself (normalization, split
/// delimiters). Catalog patterns are user data and go through
/// `CompiledCatalog` instead, where a bad pattern is a load error.
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Bail out of a tier function with the first non-`None` outcome.
///
/// ```text
/// tier!(exact(..));   // returns early when exact(..) is Some(result)
/// tier!(pattern(..)); // otherwise falls through to the next tier
/// ```
macro_rules! tier {
    ($attempt:expr) => {
        if let Some(result) = $attempt {
            return result;
        }
    };
}
