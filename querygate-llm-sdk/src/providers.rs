//! Provider name constants

/// OpenAI and OpenAI-compatible hosted endpoints
pub const OPENAI: &str = "openai";

/// Ollama local provider
pub const OLLAMA: &str = "ollama";
