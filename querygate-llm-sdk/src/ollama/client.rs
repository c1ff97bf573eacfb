use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

use crate::{
    error::LlmError,
    ollama::types::{OllamaChatRequest, OllamaChatResponse, OllamaMessage, OllamaOptions, OllamaRole},
    types::{CompletionRequest, CompletionResponse, ContentBlock, Role, Usage},
};

const DEFAULT_MODEL: &str = "llama3.1";

/// Ollama local LLM client
pub struct OllamaClient {
    base_url: String,
    model: String,
    http_client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new Ollama client with the default base URL
    pub fn new() -> Result<Self, LlmError> {
        // Local models can be slow to load on first use
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .map_err(|e| LlmError::Network { source: e })?;

        Ok(Self {
            base_url: "http://localhost:11434".to_string(),
            model: DEFAULT_MODEL.to_string(),
            http_client,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Create a chat message using the Ollama /api/chat endpoint
    pub async fn create_chat(
        &self,
        request: OllamaChatRequest,
    ) -> Result<OllamaChatResponse, LlmError> {
        let url = format!("{}/api/chat", self.base_url);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        tracing::debug!(model = %request.model, "Sending Ollama chat request");

        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network { source: e })?;

        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            let ollama_response: OllamaChatResponse = serde_json::from_str(&body)?;
            Ok(ollama_response)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(LlmError::from_status(status, error_text, None))
        }
    }
}

#[async_trait]
impl crate::client::LlmClient for OllamaClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let messages = request
            .messages
            .into_iter()
            .map(|msg| {
                let role = match msg.role {
                    Role::User => OllamaRole::User,
                    Role::Assistant => OllamaRole::Assistant,
                };
                OllamaMessage::new(role, msg.text_content())
            })
            .collect();

        let options = OllamaOptions {
            temperature: request.temperature,
            num_predict: Some(request.max_tokens).filter(|&n| n > 0),
        };

        let ollama_request = OllamaChatRequest {
            model: request.model,
            messages,
            options: if options.is_empty() { None } else { Some(options) },
            stream: false,
        };

        let ollama_response = self.create_chat(ollama_request).await?;

        Ok(CompletionResponse {
            content: vec![ContentBlock::Text {
                text: ollama_response.message.content,
            }],
            role: Role::Assistant,
            usage: Usage {
                input_tokens: ollama_response.prompt_eval_count.unwrap_or(0),
                output_tokens: ollama_response.eval_count.unwrap_or(0),
            },
            stop_reason: ollama_response.done_reason,
        })
    }

    fn provider_name(&self) -> &str {
        crate::providers::OLLAMA
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
