//! spacebio-llm: Chat backends for the research assistant.
//!
//! A `ChatBackend` turns a message list into a reply. The keyword backend
//! answers offline from a fixed table; the others forward the conversation
//! to an OpenAI-compatible, Azure OpenAI, or arbitrary proxy endpoint.
//! `rag` builds the paper-context system message for context-aware chat.

pub mod backend;
pub mod rag;

pub use backend::{
    AzureOpenAiBackend, ChatBackend, ChatMessage, ChatReply, GenerationParams, KeywordBackend,
    LlmError, OpenAiBackend, ProxyBackend, Usage,
};
pub use rag::{build_context, with_context, ContextSource, RagContext};
