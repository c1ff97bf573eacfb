//! # Querygate LLM SDK
//!
//! Language model clients used by the query generator. Every provider implements
//! [`client::LlmClient`], so the generator only ever sees a single `complete` call.
//!
//! ## Remote hosted model
//!
//! ```rust,no_run
//! use querygate_llm_sdk::client::LlmClient;
//! use querygate_llm_sdk::openai::OpenAIClient;
//! use querygate_llm_sdk::types::{CompletionRequest, Message};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenAIClient::new("your-api-key")?.with_model("gpt-4o-mini");
//!     let response = client
//!         .complete(CompletionRequest::new(
//!             client.model_name(),
//!             vec![Message::user("How many users signed up today?")],
//!         ))
//!         .await?;
//!
//!     println!("{}", response.text());
//!     Ok(())
//! }
//! ```
//!
//! ## Local model
//!
//! ```rust,no_run
//! use querygate_llm_sdk::ollama::OllamaClient;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new()?
//!     .with_base_url("http://localhost:11434")
//!     .with_model("sqlcoder");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod ollama;
pub mod openai;
pub mod providers;
pub mod types;
