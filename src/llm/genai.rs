//! Live model backend built on the `genai` crate
//!
//! One adapter covers every hosted provider (Ollama, OpenAI, Claude,
//! Gemini, Grok, Groq); the provider choice is data, not code. When
//! `DEALSCOPE_API_BASE_URL` is set, all traffic is pinned to that
//! endpoint instead of the provider's default, which is how self-hosted
//! gateways and test harnesses intercept calls.

use super::client::LLMClient;
use super::error::BackendError;
use super::types::{ChatMessage, LLMRequest, LLMResponse, MessageRole};
use async_trait::async_trait;
use genai::adapter::AdapterKind;
use genai::chat::{ChatMessage as GenAIChatMessage, ChatOptions, ChatRequest as GenAIChatRequest};
use genai::resolver::{AuthData, Endpoint, ServiceTargetResolver};
use genai::{Client, ModelIden, ServiceTarget};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Chat client for a single provider/model pair.
pub struct GenAIClient {
    client: Client,
    model: String,
    provider: AdapterKind,
    timeout: Duration,
}

impl GenAIClient {
    /// Builds a client for `model` on `provider`.
    ///
    /// Honors `DEALSCOPE_API_BASE_URL` as an endpoint override; without
    /// it the provider's default endpoint and key discovery apply.
    pub async fn new(
        provider: AdapterKind,
        model: String,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = match std::env::var("DEALSCOPE_API_BASE_URL").ok() {
            Some(base_url) => {
                debug!(provider = provider.as_str(), %base_url, "pinning model endpoint");
                pinned_endpoint_client(provider, model.clone(), base_url)
            }
            None => Client::default(),
        };

        debug!(provider = provider.as_str(), %model, "model client ready");

        Ok(Self {
            client,
            model,
            provider,
            timeout,
        })
    }
}

/// Builds a client whose every request resolves to `base_url`,
/// keeping the provider's usual API-key environment lookup.
fn pinned_endpoint_client(provider: AdapterKind, model: String, base_url: String) -> Client {
    let resolver = ServiceTargetResolver::from_resolver_fn(
        move |_target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let auth = match provider.default_key_env_name() {
                Some(key_var) => AuthData::from_env(key_var),
                None => AuthData::from_single(""),
            };

            Ok(ServiceTarget {
                endpoint: Endpoint::from_owned(base_url.clone()),
                auth,
                model: ModelIden::new(provider, &model),
            })
        },
    );

    Client::builder()
        .with_service_target_resolver(resolver)
        .build()
}

fn to_genai_message(message: &ChatMessage) -> GenAIChatMessage {
    match message.role {
        MessageRole::System => GenAIChatMessage::system(&message.content),
        MessageRole::User => GenAIChatMessage::user(&message.content),
        MessageRole::Assistant => GenAIChatMessage::assistant(&message.content),
    }
}

fn to_genai_options(request: &LLMRequest) -> ChatOptions {
    let mut options = ChatOptions::default();
    if let Some(temperature) = request.temperature {
        options = options.with_temperature(temperature as f64);
    }
    if let Some(max_tokens) = request.max_tokens {
        options = options.with_max_tokens(max_tokens);
    }
    options
}

#[async_trait]
impl LLMClient for GenAIClient {
    async fn chat(&self, request: LLMRequest) -> Result<LLMResponse, BackendError> {
        let started = std::time::Instant::now();

        let messages: Vec<GenAIChatMessage> =
            request.messages.iter().map(to_genai_message).collect();
        let options = to_genai_options(&request);

        let call = self
            .client
            .exec_chat(&self.model, GenAIChatRequest::new(messages), Some(&options));

        let response = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| {
                warn!(
                    provider = self.provider.as_str(),
                    deadline_secs = self.timeout.as_secs(),
                    "chat call hit the deadline"
                );
                BackendError::TimeoutError {
                    seconds: self.timeout.as_secs(),
                }
            })?
            .map_err(|e| {
                error!(provider = self.provider.as_str(), error = %e, "chat call failed");
                BackendError::ApiError {
                    message: format!("{} request failed: {}", self.provider.as_str(), e),
                    status_code: None,
                }
            })?;

        // Some providers return structured parts; we only carry the text.
        let content = response.first_text().unwrap_or_default().to_string();

        Ok(LLMResponse::text(content, started.elapsed()))
    }

    fn name(&self) -> &str {
        self.provider.as_str()
    }

    fn model_info(&self) -> Option<String> {
        Some(self.model.clone())
    }
}

// genai::Client has no Debug; expose the configuration instead.
impl std::fmt::Debug for GenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenAIClient")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}
