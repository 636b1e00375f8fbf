//! Provider-agnostic chat interface
//!
//! Every analysis stage talks to the model through this trait, so the
//! pipeline never knows whether it is driving a local Ollama instance,
//! a hosted API, or a scripted mock in tests.

use super::error::BackendError;
use super::types::{LLMRequest, LLMResponse};
use async_trait::async_trait;

/// A chat-capable model backend.
///
/// Implementations must be shareable across concurrent stage calls;
/// the orchestrator holds one `Arc<dyn LLMClient>` for a whole batch.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Runs one chat exchange and returns the model's reply.
    async fn chat(&self, request: LLMRequest) -> Result<LLMResponse, BackendError>;

    /// Short provider label used in logs (e.g. "Ollama").
    fn name(&self) -> &str;

    /// Model identifier, when the backend knows one.
    fn model_info(&self) -> Option<String> {
        None
    }
}
