//! Configuration loading for the Space Bio server.
//! Reads spacebio.toml from the current directory or the path in SPACEBIO_CONFIG.

use std::path::Path;

use anyhow::Context;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use spacebio_search::SearchConfig;
use tracing::warn;

pub const CONFIG_ENV: &str = "SPACEBIO_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "spacebio.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub graph: GraphConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins; `*` allows any.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host()         -> String      { "127.0.0.1".to_string() }
fn default_port()         -> u16         { 5000 }
fn default_cors_origins() -> Vec<String> { vec!["*".to_string()] }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String { "data/papers.db".to_string() }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// CSV corpus loaded into an empty store at startup.
    #[serde(default = "default_csv_path")]
    pub csv_path: String,
    /// Pause between consecutive article fetches during enrich-all.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_csv_path()         -> String { "data/SB_publication_PMC.csv".to_string() }
fn default_request_delay_ms() -> u64    { 1000 }
fn default_timeout_secs()     -> u64    { 30 }
fn default_user_agent()       -> String { spacebio_ingestion::sources::pmc::DEFAULT_USER_AGENT.to_string() }

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            request_delay_ms: default_request_delay_ms(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatBackendKind {
    #[default]
    Keyword,
    Openai,
    Azure,
    Proxy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default)]
    pub backend: ChatBackendKind,
    #[serde(default = "default_chat_model")]
    pub model: String,
    /// OpenAI-compatible base URL, or the Azure resource endpoint.
    #[serde(default = "default_chat_base_url")]
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub deployment: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub proxy_url: String,
}

fn default_chat_model()    -> String { "gpt-4o-mini".to_string() }
fn default_chat_base_url() -> String { "https://api.openai.com/v1".to_string() }
fn default_api_key_env()   -> String { "OPENAI_API_KEY".to_string() }
fn default_api_version()   -> String { "2024-02-15-preview".to_string() }
fn default_temperature()   -> f32    { 0.2 }
fn default_max_tokens()    -> u32    { 1024 }

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            backend: ChatBackendKind::default(),
            model: default_chat_model(),
            base_url: default_chat_base_url(),
            api_key_env: default_api_key_env(),
            deployment: String::new(),
            api_version: default_api_version(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            proxy_url: String::new(),
        }
    }
}

impl ChatConfig {
    /// The API key from the configured environment variable, if set and non-empty.
    pub fn api_key(&self) -> Option<SecretString> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_max_links")]
    pub max_links_per_paper: usize,
    #[serde(default = "default_graph_limit")]
    pub default_limit: usize,
    #[serde(default = "default_iterations")]
    pub iterations: usize,
}

fn default_similarity_threshold() -> f64   { 0.3 }
fn default_max_links()            -> usize { 5 }
fn default_graph_limit()          -> usize { 100 }
fn default_iterations()           -> usize { 200 }

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            max_links_per_paper: default_max_links(),
            default_limit: default_graph_limit(),
            iterations: default_iterations(),
        }
    }
}

mod tests;

impl Config {
    /// Load configuration from spacebio.toml.
    /// A path named in SPACEBIO_CONFIG must exist; a missing default file
    /// falls back to built-in defaults.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => {
                if !Path::new(&path).exists() {
                    anyhow::bail!("Config file not found: {path} (named by {CONFIG_ENV})");
                }
                Self::from_file(&path)
            }
            _ if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH),
            _ => {
                warn!(path = DEFAULT_CONFIG_PATH, "Config file not found; using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
