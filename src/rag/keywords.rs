// Keyword extraction for the hybrid re-ranker

/// Tokens shorter than this (in characters) carry no signal
pub const MIN_KEYWORD_CHARS: usize = 3;

/// Accented letters kept alongside `a-z`
const SPANISH_LETTERS: &[char] = &['á', 'é', 'í', 'ó', 'ú', 'ñ'];

/// Normalizes a query into the ordered sequence of significant terms.
///
/// Lowercases, blanks out everything that is not `a-z`, a Spanish accented
/// letter or whitespace, then keeps tokens of at least three characters.
/// Order and duplicates are preserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordExtractor;

impl KeywordExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract keywords from text
    pub fn extract(&self, text: &str) -> Vec<String> {
        let normalized: String = text
            .to_lowercase()
            .chars()
            .map(|c| if is_kept(c) { c } else { ' ' })
            .collect();

        normalized
            .split_whitespace()
            .filter(|token| token.chars().count() >= MIN_KEYWORD_CHARS)
            .map(str::to_string)
            .collect()
    }
}

fn is_kept(c: char) -> bool {
    c.is_ascii_lowercase() || SPANISH_LETTERS.contains(&c) || c.is_whitespace()
}
