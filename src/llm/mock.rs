//! Scripted model backend for tests
//!
//! Responses are consumed FIFO, one per `chat` call, which lets a test
//! script an entire pipeline run as an ordered list: one reply per
//! stage, or a [`MockResponse::error`] where the run should break.

use super::client::LLMClient;
use super::error::BackendError;
use super::types::{LLMRequest, LLMResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Pretend the model took a moment, so timing fields look plausible.
const SIMULATED_LATENCY: Duration = Duration::from_millis(10);

/// One scripted outcome for a single `chat` call.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Text(String),
    Fail(BackendError),
}

impl MockResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    /// A reply whose body is the serialized JSON value, the shape the
    /// analysis prompts ask the model for.
    pub fn json(value: serde_json::Value) -> Self {
        Self::Text(value.to_string())
    }

    pub fn error(error: BackendError) -> Self {
        Self::Fail(error)
    }
}

pub struct MockLLMClient {
    script: Mutex<VecDeque<MockResponse>>,
    fallback: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl MockLLMClient {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn add_response(&self, response: MockResponse) {
        self.script.lock().unwrap().push_back(response);
    }

    pub fn add_responses(&self, responses: impl IntoIterator<Item = MockResponse>) {
        self.script.lock().unwrap().extend(responses);
    }

    /// Reply to use once the script runs out. Without one, an exhausted
    /// script makes further calls fail, which is how tests catch stages
    /// that talk to the model more often than expected.
    pub fn set_default_response(&self, content: impl Into<String>) {
        *self.fallback.lock().unwrap() = Some(content.into());
    }

    pub fn remaining_responses(&self) -> usize {
        self.script.lock().unwrap().len()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockLLMClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn chat(&self, _request: LLMRequest) -> Result<LLMResponse, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let scripted = self.script.lock().unwrap().pop_front();
        let next = match scripted {
            Some(response) => response,
            None => match self.fallback.lock().unwrap().clone() {
                Some(content) => MockResponse::Text(content),
                None => {
                    return Err(BackendError::Other {
                        message: "mock model script is exhausted".to_string(),
                    })
                }
            },
        };

        match next {
            MockResponse::Text(content) => Ok(LLMResponse::text(content, SIMULATED_LATENCY)),
            MockResponse::Fail(error) => Err(error),
        }
    }

    fn name(&self) -> &str {
        "MockLLM"
    }

    fn model_info(&self) -> Option<String> {
        Some("mock-model".to_string())
    }
}

impl std::fmt::Debug for MockLLMClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLLMClient")
            .field("remaining_responses", &self.remaining_responses())
            .field("calls", &self.call_count())
            .finish()
    }
}
