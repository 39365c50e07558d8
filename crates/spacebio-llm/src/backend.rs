//! Chat backend trait and concrete implementations.
//!
//! Backends:
//!   KeywordBackend    : offline canned answers keyed on topic words
//!   OpenAiBackend     : any OpenAI-compatible `/chat/completions` endpoint
//!   AzureOpenAiBackend: Azure OpenAI deployment (api-key header + api-version)
//!   ProxyBackend      : forwards the message list verbatim to an external URL

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("API error [{status}]: {message}")]
    Api { status: u16, message: String },
    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),
}

impl From<LlmError> for spacebio_common::error::ApiError {
    fn from(err: LlmError) -> Self {
        Self::Upstream(err.to_string())
    }
}

// ── Request / Response ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String, // "system" | "user" | "assistant"
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self { role: role.into(), content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub answer: String,
    /// True when the answer came from the offline keyword table.
    pub fallback: bool,
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self { temperature: 0.2, max_tokens: 1024 }
    }
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatReply, LlmError>;
    /// Short name reported by the health endpoint.
    fn name(&self) -> &str;
}

// ── Helpers: OpenAI-style responses ───────────────────────────────────────────

pub fn parse_openai_response(json: &serde_json::Value) -> Result<ChatReply, LlmError> {
    let answer = json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| LlmError::MalformedResponse("missing choices[0].message.content".into()))?
        .to_string();
    Ok(ChatReply { answer, fallback: false, usage: parse_usage(&json["usage"]) })
}

fn parse_usage(usage: &serde_json::Value) -> Usage {
    let field = |name: &str| usage[name].as_u64().map(|v| v as u32);
    let prompt_tokens = field("prompt_tokens");
    let completion_tokens = field("completion_tokens");
    let total_tokens = field("total_tokens")
        .unwrap_or_else(|| prompt_tokens.unwrap_or(0) + completion_tokens.unwrap_or(0));
    Usage { prompt_tokens, completion_tokens, total_tokens }
}

async fn check_response_status(resp: reqwest::Response) -> Result<serde_json::Value, LlmError> {
    let status = resp.status().as_u16();
    let text = resp.text().await?;
    if status >= 400 {
        let body: serde_json::Value = serde_json::from_str(&text).unwrap_or(serde_json::Value::Null);
        let msg = body["error"]["message"]
            .as_str()
            .or_else(|| body["error"].as_str())
            .or_else(|| body["message"].as_str())
            .map(str::to_string)
            .unwrap_or_else(|| if text.is_empty() { "unknown API error".to_string() } else { text });
        return Err(LlmError::Api { status, message: msg });
    }
    Ok(serde_json::from_str(&text)?)
}

// ── 1. Keyword (offline) ──────────────────────────────────────────────────────

pub const KEYWORD_PREFIX: &str = "Based on the NASA Bio-Exploration database, ";
pub const KEYWORD_TOKENS: u32 = 50;

const KEYWORD_RESPONSES: &[(&str, &str)] = &[
    ("microgravity", "Microgravity affects bone density, muscle mass, and cardiovascular function. Research shows astronauts lose 1-2% bone density per month in space."),
    ("radiation", "Space radiation exposure is a major concern for long-duration missions. Studies focus on shielding and biological countermeasures."),
    ("bone", "Bone loss in space occurs primarily in weight-bearing bones. Exercise countermeasures can reduce but not eliminate this loss."),
    ("muscle", "Muscle atrophy in space affects both skeletal and cardiac muscle. Resistance exercise is the primary countermeasure."),
    ("immune", "Spaceflight affects immune system function, with studies showing changes in T-cell function and cytokine production."),
    ("plant", "Plant growth in space is studied for life support systems. Microgravity affects root orientation and nutrient uptake."),
    ("cell", "Cell behavior changes in microgravity, affecting gene expression, protein synthesis, and cellular communication."),
];

const KEYWORD_OVERVIEW: &str = "I can help you explore space biology research topics including microgravity effects, radiation exposure, bone and muscle changes, immune system responses, plant growth, and cellular behavior. What specific area interests you?";

/// Answers from a fixed topic table without any network access.
#[derive(Debug, Clone, Default)]
pub struct KeywordBackend;

impl KeywordBackend {
    pub fn answer_for(question: &str) -> String {
        let q = question.to_lowercase();
        let body = KEYWORD_RESPONSES
            .iter()
            .find(|(kw, _)| q.contains(kw))
            .map(|(_, response)| *response)
            .unwrap_or(KEYWORD_OVERVIEW);
        format!("{KEYWORD_PREFIX}{body}")
    }
}

#[async_trait]
impl ChatBackend for KeywordBackend {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatReply, LlmError> {
        let question = messages.last().map(|m| m.content.as_str()).unwrap_or("Hello");
        Ok(ChatReply {
            answer: Self::answer_for(question),
            fallback: true,
            usage: Usage { total_tokens: KEYWORD_TOKENS, ..Default::default() },
        })
    }

    fn name(&self) -> &str { "keyword" }
}

// ── 2. OpenAI-compatible ──────────────────────────────────────────────────────

pub struct OpenAiBackend {
    pub base_url: String,
    pub model: String,
    pub params: GenerationParams,
    api_key: SecretString,
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            params: GenerationParams::default(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    #[instrument(skip(self, messages), fields(model = %self.model, n = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatReply, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model":       &self.model,
            "messages":    messages,
            "temperature": self.params.temperature,
            "max_tokens":  self.params.max_tokens,
        });
        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;
        let json = check_response_status(resp).await?;
        debug!("Chat completion received");
        parse_openai_response(&json)
    }

    fn name(&self) -> &str { "openai" }
}

// ── 3. Azure OpenAI ───────────────────────────────────────────────────────────

pub struct AzureOpenAiBackend {
    pub endpoint: String,
    pub deployment: String,
    pub api_version: String,
    pub params: GenerationParams,
    api_key: SecretString,
    client: reqwest::Client,
}

impl AzureOpenAiBackend {
    pub fn new(
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
        api_key: SecretString,
    ) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            deployment: deployment.into(),
            api_version: api_version.into(),
            params: GenerationParams::default(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }
}

#[async_trait]
impl ChatBackend for AzureOpenAiBackend {
    #[instrument(skip(self, messages), fields(deployment = %self.deployment, n = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatReply, LlmError> {
        let body = serde_json::json!({
            "messages":    messages,
            "temperature": self.params.temperature,
            "max_tokens":  self.params.max_tokens,
        });
        let resp = self
            .client
            .post(self.completions_url())
            .header("api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;
        let json = check_response_status(resp).await?;
        parse_openai_response(&json)
    }

    fn name(&self) -> &str { "azure" }
}

// ── 4. Proxy ──────────────────────────────────────────────────────────────────

/// Forwards `{"messages": [...]}` to an external chat service.
pub struct ProxyBackend {
    pub url: String,
    client: reqwest::Client,
}

impl ProxyBackend {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), client: reqwest::Client::new() }
    }
}

/// Read `answer` (or `content`) from a proxy reply.
pub fn parse_proxy_response(json: &serde_json::Value) -> Result<ChatReply, LlmError> {
    let answer = json["answer"]
        .as_str()
        .or_else(|| json["content"].as_str())
        .ok_or_else(|| LlmError::MalformedResponse("reply has neither 'answer' nor 'content'".into()))?
        .to_string();
    Ok(ChatReply {
        answer,
        fallback: json["fallback"].as_bool().unwrap_or(false),
        usage: parse_usage(&json["usage"]),
    })
}

#[async_trait]
impl ChatBackend for ProxyBackend {
    #[instrument(skip(self, messages), fields(url = %self.url, n = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatReply, LlmError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "messages": messages }))
            .send()
            .await?;
        let json = check_response_status(resp).await?;
        parse_proxy_response(&json)
    }

    fn name(&self) -> &str { "proxy" }
}
