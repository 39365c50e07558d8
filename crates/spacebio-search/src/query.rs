//! Query parsing and tokenization.

use serde::Serialize;

/// English stop words dropped from queries.
pub const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is",
    "it", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there",
    "these", "they", "this", "to", "was", "will", "with",
];

/// Tokens shorter than this are ignored.
pub const MIN_TERM_CHARS: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedQuery {
    /// Lowercased, de-duplicated terms in query order.
    pub terms: Vec<String>,
}

impl ParsedQuery {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.terms.iter().any(|t| t == token)
    }
}

/// Split `q` into search terms. A `key:value` chunk contributes its value.
pub fn parse_query(q: &str) -> ParsedQuery {
    let mut terms: Vec<String> = Vec::new();
    for chunk in q.split_whitespace() {
        let value = match chunk.split_once(':') {
            Some((_, v)) => v,
            None => chunk,
        };
        for token in tokenize(value) {
            let token = token.text.to_lowercase();
            if token.chars().count() < MIN_TERM_CHARS || STOP_WORDS.contains(&token.as_str()) {
                continue;
            }
            if !terms.contains(&token) {
                terms.push(token);
            }
        }
    }
    ParsedQuery { terms }
}

/// One alphanumeric run of a text, with its char offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Split on anything that is not alphanumeric. Offsets count chars, not bytes.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut run: Option<(usize, usize)> = None; // (byte start, char start)
    let mut char_pos = 0;

    for (byte_pos, c) in text.char_indices() {
        if c.is_alphanumeric() {
            if run.is_none() {
                run = Some((byte_pos, char_pos));
            }
        } else if let Some((b, s)) = run.take() {
            tokens.push(Token { text: &text[b..byte_pos], start: s, end: char_pos });
        }
        char_pos += 1;
    }
    if let Some((b, s)) = run {
        tokens.push(Token { text: &text[b..], start: s, end: char_pos });
    }
    tokens
}

/// Lowercased token strings of `text`.
pub fn lowercase_tokens(text: &str) -> Vec<String> {
    tokenize(text).into_iter().map(|t| t.text.to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_value_terms_use_value() {
        let q = parse_query("organism:Mouse bone LOSS");
        assert_eq!(q.terms, vec!["mouse", "bone", "loss"]);
    }

    #[test]
    fn test_drops_stop_words_and_short_tokens() {
        let q = parse_query("the effect of a microgravity x on bone");
        assert_eq!(q.terms, vec!["effect", "microgravity", "bone"]);
    }

    #[test]
    fn test_stop_word_only_query_is_empty() {
        assert!(parse_query("the of and").is_empty());
        assert!(parse_query("   ").is_empty());
    }

    #[test]
    fn test_dedupes_and_splits_punctuation() {
        let q = parse_query("bone-loss bone");
        assert_eq!(q.terms, vec!["bone", "loss"]);
    }

    #[test]
    fn test_tokenize_char_offsets() {
        let toks = tokenize("Rôle of µg, here");
        assert_eq!(toks[0].text, "Rôle");
        assert_eq!((toks[0].start, toks[0].end), (0, 4));
        assert_eq!(toks[2].text, "µg");
        assert_eq!((toks[2].start, toks[2].end), (8, 10));
        assert_eq!(toks[3].text, "here");
    }
}
