//! Configuration management for dealscope
//!
//! Settings load from environment variables with sensible defaults.
//! Configuration covers model provider selection, search credentials,
//! and the checkpoint / report locations.
//!
//! # Environment Variables
//!
//! ## Dealscope Configuration
//! - `DEALSCOPE_PROVIDER`: Provider selection (ollama|openai|claude|gemini|grok|groq) - default: "ollama"
//! - `DEALSCOPE_MODEL`: Model name - default: "qwen2.5:7b" for Ollama, "gpt-4o-mini" for OpenAI
//! - `DEALSCOPE_REQUEST_TIMEOUT`: Timeout in seconds - default: "60"
//! - `DEALSCOPE_LOG_LEVEL`: Logging level - default: "info"
//! - `DEALSCOPE_CHECKPOINT`: Checkpoint file path - default: "checkpoint/companies.json"
//! - `DEALSCOPE_REPORTS_DIR`: Report output directory - default: "reports"
//! - `DEALSCOPE_INDEX_URL`: Document index endpoint - **required**
//!
//! ## Search Provider Configuration
//! - `TAVILY_API_KEY`: Tavily web search key - **required**
//! - `KIPRIS_API_KEY`: Patent registry key - optional; absent degrades
//!   to a stub registry that returns a placeholder result
//!
//! ## GenAI Provider Configuration
//! These environment variables are read directly by the genai library:
//! - **Ollama**: `OLLAMA_HOST` (default: http://localhost:11434)
//! - **OpenAI**: `OPENAI_API_KEY` (required), `OPENAI_API_BASE` (optional)
//! - **Claude**: `ANTHROPIC_API_KEY` (required)
//! - **Gemini**: `GOOGLE_API_KEY` (required)
//! - **Grok**: `XAI_API_KEY` (required)
//! - **Groq**: `GROQ_API_KEY` (required)

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use genai::adapter::AdapterKind;
use thiserror::Error;

use crate::llm::{BackendError, GenAIClient};
use crate::search::{
    EvidenceGatherer, HttpDocumentIndex, KiprisClient, SearchError, StubPatentRegistry,
    TavilyClient,
};

const DEFAULT_OLLAMA_MODEL: &str = "qwen2.5:7b";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CHECKPOINT_PATH: &str = "checkpoint/companies.json";
const DEFAULT_REPORTS_DIR: &str = "reports";

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required credential or endpoint is absent
    #[error("Missing required configuration: set {0}")]
    MissingRequired(&'static str),

    /// A setting is present but unusable
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// Model client initialization failed
    #[error("Model client initialization failed: {0}")]
    BackendInit(#[from] BackendError),

    /// Search client initialization failed
    #[error("Search client initialization failed: {0}")]
    SearchInit(#[from] SearchError),
}

/// Main configuration structure for dealscope
///
/// Constructed with `Default::default()`, which loads from environment
/// variables with fallback defaults.
#[derive(Debug, Clone)]
pub struct DealscopeConfig {
    /// Chat provider every analysis call goes through
    pub provider: AdapterKind,

    /// Provider-specific model identifier
    pub model: String,

    /// Request timeout in seconds, applied to model and search calls
    pub request_timeout_secs: u64,

    /// Default level for the tracing subscriber
    pub log_level: String,

    /// Path of the JSON checkpoint holding the company array
    pub checkpoint_path: PathBuf,

    /// Directory reports are written into
    pub reports_dir: PathBuf,

    /// Document index endpoint
    pub index_url: Option<String>,

    /// Tavily web search key
    pub tavily_api_key: Option<String>,

    /// Patent registry key; absence selects the stub registry
    pub kipris_api_key: Option<String>,
}

fn parse_provider(name: &str) -> Option<AdapterKind> {
    match name.to_lowercase().as_str() {
        "ollama" => Some(AdapterKind::Ollama),
        "openai" => Some(AdapterKind::OpenAI),
        "claude" | "anthropic" => Some(AdapterKind::Anthropic),
        "gemini" => Some(AdapterKind::Gemini),
        "grok" | "xai" => Some(AdapterKind::Xai),
        "groq" => Some(AdapterKind::Groq),
        _ => None,
    }
}

impl Default for DealscopeConfig {
    fn default() -> Self {
        let provider = match env::var("DEALSCOPE_PROVIDER") {
            Ok(name) => parse_provider(&name).unwrap_or_else(|| {
                tracing::warn!(provider = %name, "unrecognized DEALSCOPE_PROVIDER, using ollama");
                AdapterKind::Ollama
            }),
            Err(_) => AdapterKind::Ollama,
        };

        let model = env::var("DEALSCOPE_MODEL")
            .ok()
            .unwrap_or_else(|| Self::default_model(provider).to_string());

        let request_timeout_secs = env::var("DEALSCOPE_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let log_level = env::var("DEALSCOPE_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        let checkpoint_path = env::var("DEALSCOPE_CHECKPOINT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CHECKPOINT_PATH));

        let reports_dir = env::var("DEALSCOPE_REPORTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_REPORTS_DIR));

        Self {
            provider,
            model,
            request_timeout_secs,
            log_level,
            checkpoint_path,
            reports_dir,
            index_url: env::var("DEALSCOPE_INDEX_URL").ok(),
            tavily_api_key: env::var("TAVILY_API_KEY").ok(),
            kipris_api_key: env::var("KIPRIS_API_KEY").ok(),
        }
    }
}

impl DealscopeConfig {
    /// Default model for a provider when none is configured
    pub fn default_model(provider: AdapterKind) -> &'static str {
        match provider {
            AdapterKind::Ollama => DEFAULT_OLLAMA_MODEL,
            _ => DEFAULT_OPENAI_MODEL,
        }
    }

    /// Validates the configuration.
    ///
    /// Required search providers fail here, before any company is
    /// processed. The patent registry is deliberately not required.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=600).contains(&self.request_timeout_secs) {
            return Err(ConfigError::ValidationFailed(format!(
                "request timeout {}s is outside the supported 1-600s range",
                self.request_timeout_secs
            )));
        }

        if self.log_level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::ValidationFailed(format!(
                "unrecognized log level '{}' (expected trace, debug, info, warn, or error)",
                self.log_level
            )));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "model name is empty".to_string(),
            ));
        }

        if self.tavily_api_key.is_none() {
            return Err(ConfigError::MissingRequired("TAVILY_API_KEY"));
        }
        if self.index_url.is_none() {
            return Err(ConfigError::MissingRequired("DEALSCOPE_INDEX_URL"));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Creates the model client for the configured provider.
    ///
    /// Provider credentials are read by genai from its standard
    /// environment variables.
    pub async fn create_llm_client(&self) -> Result<Arc<GenAIClient>, ConfigError> {
        let client = GenAIClient::new(
            self.provider,
            self.model.clone(),
            self.request_timeout(),
        )
        .await?;
        Ok(Arc::new(client))
    }

    /// Creates the evidence gatherer over the configured search
    /// providers. Call `validate` first; required keys are checked
    /// here too.
    pub fn create_gatherer(&self) -> Result<Arc<EvidenceGatherer>, ConfigError> {
        let timeout = self.request_timeout();

        let tavily_key = self
            .tavily_api_key
            .clone()
            .ok_or(ConfigError::MissingRequired("TAVILY_API_KEY"))?;
        let index_url = self
            .index_url
            .clone()
            .ok_or(ConfigError::MissingRequired("DEALSCOPE_INDEX_URL"))?;

        let web = Arc::new(TavilyClient::new(tavily_key, timeout)?);
        let index = Arc::new(HttpDocumentIndex::new(index_url, timeout)?);

        let gatherer = match self.kipris_api_key.clone() {
            Some(key) => EvidenceGatherer::new(
                index,
                web,
                Arc::new(KiprisClient::new(key, timeout)?),
            ),
            None => EvidenceGatherer::new(index, web, Arc::new(StubPatentRegistry)),
        };

        Ok(Arc::new(gatherer))
    }
}

impl fmt::Display for DealscopeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dealscope Configuration:")?;
        writeln!(f, "  Provider: {:?}", self.provider)?;
        writeln!(f, "  Model: {}", self.model)?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(f, "  Checkpoint: {}", self.checkpoint_path.display())?;
        writeln!(f, "  Reports Dir: {}", self.reports_dir.display())?;
        writeln!(
            f,
            "  Web Search: {}",
            if self.tavily_api_key.is_some() {
                "configured"
            } else {
                "missing"
            }
        )?;
        writeln!(
            f,
            "  Document Index: {}",
            self.index_url.as_deref().unwrap_or("missing")
        )?;
        writeln!(
            f,
            "  Patent Registry: {}",
            if self.kipris_api_key.is_some() {
                "configured"
            } else {
                "stub"
            }
        )?;
        Ok(())
    }
}
