//! Model access for the analysis pipeline
//!
//! Stages depend on the [`LLMClient`] trait alone; whether replies come
//! from a live provider or a scripted test double is decided once, at
//! configuration time.

mod client;
mod error;
mod genai;
mod mock;
mod types;

pub use client::LLMClient;
pub use error::BackendError;
pub use genai::GenAIClient;
pub use mock::{MockLLMClient, MockResponse};
pub use types::{ChatMessage, LLMRequest, LLMResponse, MessageRole};
