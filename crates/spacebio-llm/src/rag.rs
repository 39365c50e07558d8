//! Paper context for retrieval-augmented chat.

use serde::{Deserialize, Serialize};
use spacebio_common::Paper;

use crate::backend::ChatMessage;

/// Papers included in a context block.
pub const CONTEXT_PAPERS: usize = 5;
/// Abstract chars kept per paper.
pub const SNIPPET_CHARS: usize = 800;
/// Hard cap on the whole context block.
pub const CONTEXT_CHARS: usize = 5500;

const CONTEXT_HEADER: &str = "Relevant papers from the NASA Bio-Exploration database:\n\n";

const SYSTEM_PROMPT: &str = "You are an AI assistant for the NASA Bio-Exploration Dashboard. \
You help researchers understand space biology research papers and trends.";

const SYSTEM_GUIDANCE: &str = "When answering questions, refer to the relevant papers by their \
[number] when appropriate. If the answer is not in the papers, say so. Be helpful, accurate, \
and concise.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSource {
    pub idx: usize,
    pub title: String,
    pub url: String,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RagContext {
    pub block: String,
    pub sources: Vec<ContextSource>,
}

impl RagContext {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// The system message carrying this context.
    pub fn system_message(&self) -> ChatMessage {
        if self.is_empty() {
            ChatMessage::system(format!("{SYSTEM_PROMPT}\n\n{SYSTEM_GUIDANCE}"))
        } else {
            ChatMessage::system(format!("{SYSTEM_PROMPT}\n\n{}\n{SYSTEM_GUIDANCE}", self.block))
        }
    }
}

fn take_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

fn format_entry(idx: usize, paper: &Paper) -> String {
    let year = paper.year.map_or_else(|| "Unknown".to_string(), |y| y.to_string());
    let mut entry = format!("[{idx}] {}\n   Year: {year}\n", paper.title.trim());
    let abstract_text = paper.abstract_text.trim();
    if !abstract_text.is_empty() {
        let snippet = take_chars(abstract_text, SNIPPET_CHARS);
        entry.push_str("   Abstract: ");
        entry.push_str(snippet);
        if snippet.len() < abstract_text.len() {
            entry.push_str("...");
        }
        entry.push('\n');
    }
    entry.push('\n');
    entry
}

/// Context block from the top papers. An entry that would overflow the cap is
/// cut to fit and ends the block.
pub fn build_context(papers: &[Paper]) -> RagContext {
    let mut ctx = RagContext::default();
    if papers.is_empty() {
        return ctx;
    }
    ctx.block.push_str(CONTEXT_HEADER);
    let mut used = CONTEXT_HEADER.chars().count();

    for (i, paper) in papers.iter().take(CONTEXT_PAPERS).enumerate() {
        let idx = i + 1;
        let entry = format_entry(idx, paper);
        let entry_chars = entry.chars().count();
        let remaining = CONTEXT_CHARS.saturating_sub(used);
        if remaining == 0 {
            break;
        }
        let truncated = entry_chars > remaining;
        ctx.block.push_str(take_chars(&entry, remaining));
        used += entry_chars.min(remaining);
        ctx.sources.push(ContextSource {
            idx,
            title: paper.title.clone(),
            url: paper.url.clone(),
            year: paper.year,
        });
        if truncated {
            break;
        }
    }
    ctx
}

/// `[system(context)] + messages`.
pub fn with_context(messages: &[ChatMessage], context: &RagContext) -> Vec<ChatMessage> {
    let mut out = Vec::with_capacity(messages.len() + 1);
    out.push(context.system_message());
    out.extend_from_slice(messages);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(id: usize, abstract_len: usize) -> Paper {
        let mut p = Paper::with_defaults(id.to_string(), format!("Paper {id}"), format!("https://x.org/{id}"));
        p.abstract_text = "a".repeat(abstract_len);
        p.year = Some(2020);
        p
    }

    #[test]
    fn test_top_five_only() {
        let papers: Vec<Paper> = (1..=8).map(|i| paper(i, 50)).collect();
        let ctx = build_context(&papers);
        assert_eq!(ctx.sources.len(), 5);
        assert_eq!(ctx.sources[4].idx, 5);
        assert!(ctx.block.contains("[5] Paper 5"));
        assert!(!ctx.block.contains("Paper 6"));
    }

    #[test]
    fn test_snippet_cap() {
        let ctx = build_context(&[paper(1, 2000)]);
        let longest_run = ctx.block.split(|c| c != 'a').map(str::len).max().unwrap();
        assert_eq!(longest_run, SNIPPET_CHARS);
        assert!(ctx.block.contains("..."));
    }

    #[test]
    fn test_block_cap() {
        let papers: Vec<Paper> = (1..=5).map(|i| paper(i, 2000)).collect();
        let ctx = build_context(&papers);
        assert!(ctx.block.chars().count() <= CONTEXT_CHARS);
        assert!(!ctx.sources.is_empty());
    }

    #[test]
    fn test_empty_context_prompt() {
        let ctx = build_context(&[]);
        assert!(ctx.is_empty());
        let msgs = with_context(&[ChatMessage::user("hi")], &ctx);
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, "system");
        assert!(!msgs[0].content.contains("Relevant papers"));
    }

    #[test]
    fn test_system_message_carries_block() {
        let ctx = build_context(&[paper(1, 10)]);
        let msgs = with_context(&[ChatMessage::user("bone?")], &ctx);
        assert!(msgs[0].content.contains("[1] Paper 1"));
        assert_eq!(msgs[1].content, "bone?");
    }
}
