use crate::{
    error::LlmError,
    types::{CompletionRequest, CompletionResponse},
};
use async_trait::async_trait;

/// Core trait for LLM clients
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete a request. There is no streaming: the whole response arrives at once.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Get provider name (e.g., "openai", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model name (e.g., "gpt-4o", "llama3.1")
    fn model_name(&self) -> &str;
}
