//! Shared application state for the web server.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use spacebio_db::{Database, PaperRepository};
use spacebio_ingestion::enrich::EnrichmentProgress;
use spacebio_ingestion::sources::pmc::PmcClient;
use spacebio_ingestion::sources::ArticleSource;
use spacebio_llm::{
    AzureOpenAiBackend, ChatBackend, GenerationParams, KeywordBackend, OpenAiBackend, ProxyBackend,
};
use spacebio_search::SearchEngine;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::{ChatBackendKind, ChatConfig, Config, IngestionConfig};

/// Events pushed to connected clients via SSE.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// A paper was scraped and stored
    PaperAdded { paper_id: String, title: String },
    PaperUpdated { paper_id: String },
    PaperDeleted { paper_id: String },
    /// A bulk save finished
    BulkSaved { saved_count: usize, total_papers: u64 },
    /// Enrich-all batch status update
    EnrichmentProgress(EnrichmentProgress),
    EnrichmentComplete { enriched: usize, errors: usize, skipped: usize },
}

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub db: Arc<Database>,
    pub papers: PaperRepository,
    pub search: SearchEngine,
    pub chat: Arc<dyn ChatBackend>,
    pub articles: Arc<dyn ArticleSource>,
    pub config: Config,
    /// Broadcast channel for SSE push events
    pub event_tx: broadcast::Sender<AppEvent>,
}

impl AppState {
    pub fn new(
        db: Arc<Database>,
        config: Config,
        chat: Arc<dyn ChatBackend>,
        articles: Arc<dyn ArticleSource>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            papers: PaperRepository::new(db.clone()),
            search: SearchEngine::new(config.search.clone()),
            db,
            chat,
            articles,
            config,
            event_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.event_tx.subscribe()
    }

    /// Send to every subscriber. Having none is not an error.
    pub fn publish(&self, event: AppEvent) {
        let _ = self.event_tx.send(event);
    }
}

pub type SharedState = Arc<AppState>;

/// Pick the chat backend named in config.
/// A hosted backend without an API key degrades to the keyword backend.
pub fn build_chat_backend(config: &ChatConfig) -> anyhow::Result<Arc<dyn ChatBackend>> {
    let params = GenerationParams {
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    };

    let backend: Arc<dyn ChatBackend> = match config.backend {
        ChatBackendKind::Keyword => Arc::new(KeywordBackend),
        ChatBackendKind::Openai => match config.api_key() {
            Some(key) => Arc::new(OpenAiBackend::new(&config.base_url, &config.model, key).with_params(params)),
            None => {
                warn!(env = %config.api_key_env, "No API key set; falling back to keyword chat");
                Arc::new(KeywordBackend)
            }
        },
        ChatBackendKind::Azure => {
            if config.deployment.trim().is_empty() {
                anyhow::bail!("chat.backend = \"azure\" requires chat.deployment");
            }
            match config.api_key() {
                Some(key) => Arc::new(
                    AzureOpenAiBackend::new(&config.base_url, &config.deployment, &config.api_version, key)
                        .with_params(params),
                ),
                None => {
                    warn!(env = %config.api_key_env, "No API key set; falling back to keyword chat");
                    Arc::new(KeywordBackend)
                }
            }
        }
        ChatBackendKind::Proxy => {
            if config.proxy_url.trim().is_empty() {
                anyhow::bail!("chat.backend = \"proxy\" requires chat.proxy_url");
            }
            Arc::new(ProxyBackend::new(config.proxy_url.trim()))
        }
    };
    info!(backend = backend.name(), "Chat backend ready");
    Ok(backend)
}

/// The PMC scraper used for add-paper and enrichment.
pub fn build_article_source(config: &IngestionConfig) -> anyhow::Result<Arc<dyn ArticleSource>> {
    let client = PmcClient::new(&config.user_agent, Duration::from_secs(config.timeout_secs))
        .context("building PMC HTTP client")?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let json = serde_json::to_value(AppEvent::PaperDeleted { paper_id: "7".into() }).unwrap();
        assert_eq!(json["type"], "paper_deleted");
        assert_eq!(json["paper_id"], "7");
    }

    #[test]
    fn test_keyword_backend_by_default() {
        let backend = build_chat_backend(&ChatConfig::default()).unwrap();
        assert_eq!(backend.name(), "keyword");
    }

    #[test]
    fn test_missing_key_falls_back() {
        let config = ChatConfig {
            backend: ChatBackendKind::Openai,
            api_key_env: "SPACEBIO_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..ChatConfig::default()
        };
        assert_eq!(build_chat_backend(&config).unwrap().name(), "keyword");
    }

    #[test]
    fn test_proxy_requires_url() {
        let config = ChatConfig { backend: ChatBackendKind::Proxy, ..ChatConfig::default() };
        assert!(build_chat_backend(&config).is_err());
    }
}
