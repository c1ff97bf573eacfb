use anyhow::Context;
use async_trait::async_trait;
use querygate_llm_sdk::client::LlmClient;
use querygate_llm_sdk::ollama::OllamaClient;
use querygate_llm_sdk::openai::OpenAIClient;
use querygate_llm_sdk::types::{CompletionRequest, Message};
use std::sync::Arc;

use crate::config::{LlmConfig, LlmProvider};

/// Text-generation capability used by the query generator.
///
/// One call, whole response, no streaming.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;

    /// Short label for logs, e.g. `stub` or `openai/gpt-4o`
    fn name(&self) -> String;
}

/// Deterministic backend that ignores the prompt and always returns the same text.
#[derive(Debug, Clone)]
pub struct StubBackend {
    response: String,
}

impl StubBackend {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new("SELECT 1")
    }
}

#[async_trait]
impl TextGenerator for StubBackend {
    async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        Ok(self.response.clone())
    }

    fn name(&self) -> String {
        "stub".to_string()
    }
}

/// Adapts any [`LlmClient`] (hosted or local) to [`TextGenerator`].
pub struct LlmBackend {
    client: Arc<dyn LlmClient>,
    max_tokens: u32,
    temperature: f32,
}

impl LlmBackend {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            max_tokens: 1024,
            temperature: 0.0,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl TextGenerator for LlmBackend {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let request = CompletionRequest::new(self.client.model_name(), vec![Message::user(prompt)])
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        let response = self
            .client
            .complete(request)
            .await
            .with_context(|| format!("{} completion failed", self.client.provider_name()))?;

        tracing::debug!(
            provider = self.client.provider_name(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Model responded"
        );

        Ok(response.text())
    }

    fn name(&self) -> String {
        format!("{}/{}", self.client.provider_name(), self.client.model_name())
    }
}

/// Selects the backend named by the configuration.
pub fn build_backend(config: &LlmConfig) -> anyhow::Result<Arc<dyn TextGenerator>> {
    let backend: Arc<dyn TextGenerator> = match config.provider {
        LlmProvider::Stub => Arc::new(StubBackend::new(config.stub_response.clone())),
        LlmProvider::OpenAI => {
            let api_key = config
                .api_key
                .clone()
                .context("llm.api_key (or OPENAI_API_KEY) is required for the openai provider")?;
            let mut client = OpenAIClient::new(api_key)?;
            if let Some(url) = &config.base_url {
                client = client.with_base_url(url);
            }
            if let Some(model) = &config.model {
                client = client.with_model(model);
            }
            Arc::new(
                LlmBackend::new(Arc::new(client))
                    .with_max_tokens(config.max_tokens)
                    .with_temperature(config.temperature),
            )
        }
        LlmProvider::Ollama => {
            let mut client = OllamaClient::new()?;
            if let Some(url) = &config.base_url {
                client = client.with_base_url(url);
            }
            if let Some(model) = &config.model {
                client = client.with_model(model);
            }
            Arc::new(
                LlmBackend::new(Arc::new(client))
                    .with_max_tokens(config.max_tokens)
                    .with_temperature(config.temperature),
            )
        }
    };

    tracing::info!(backend = %backend.name(), "Text generation backend ready");
    Ok(backend)
}
