//! Highlight fragments with `<em>` markup around matched terms.

use crate::query::{tokenize, ParsedQuery};

pub const FRAGMENT_CHARS: usize = 150;
pub const MAX_FRAGMENTS: usize = 3;

const EM_OPEN: &str = "<em>";
const EM_CLOSE: &str = "</em>";

/// Up to [`MAX_FRAGMENTS`] windows of at most [`FRAGMENT_CHARS`] chars,
/// each centered on a match not covered by an earlier window.
pub fn highlight(text: &str, query: &ParsedQuery) -> Vec<String> {
    if query.is_empty() || text.is_empty() {
        return Vec::new();
    }
    let matches: Vec<(usize, usize)> = tokenize(text)
        .into_iter()
        .filter(|t| query.contains(&t.text.to_lowercase()))
        .map(|t| (t.start, t.end))
        .collect();
    if matches.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut fragments = Vec::new();
    let mut covered_until = 0usize;

    for &(start, end) in &matches {
        if fragments.len() == MAX_FRAGMENTS {
            break;
        }
        if !fragments.is_empty() && end <= covered_until {
            continue;
        }
        let (ws, we) = window(start, end, len);
        covered_until = we;

        let mut frag = String::with_capacity(we - ws + 16);
        let mut inside = matches.iter().filter(|(s, e)| *s >= ws && *e <= we).peekable();
        let mut open_until: Option<usize> = None;
        for (i, c) in chars.iter().enumerate().take(we).skip(ws) {
            if open_until == Some(i) {
                frag.push_str(EM_CLOSE);
                open_until = None;
            }
            if let Some(&&(s, e)) = inside.peek() {
                if s == i {
                    frag.push_str(EM_OPEN);
                    open_until = Some(e);
                    inside.next();
                }
            }
            frag.push(*c);
        }
        if open_until.is_some() {
            frag.push_str(EM_CLOSE);
        }
        fragments.push(frag.trim().to_string());
    }
    fragments
}

/// Char window `[ws, we)` of at most `FRAGMENT_CHARS` centered on `[start, end)`.
fn window(start: usize, end: usize, len: usize) -> (usize, usize) {
    if len <= FRAGMENT_CHARS {
        return (0, len);
    }
    let center = (start + end) / 2;
    let ws = center.saturating_sub(FRAGMENT_CHARS / 2).min(len - FRAGMENT_CHARS);
    (ws, ws + FRAGMENT_CHARS)
}
