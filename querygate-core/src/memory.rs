use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::config::MemoryConfig;

pub const NO_CONVERSATION_TEXT: &str = "No previous conversation.";

/// One recorded question/query/outcome triple. Never edited after it is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub question: String,
    /// Empty when generation failed before a statement existed
    pub generated_query: String,
    pub outcome_summary: String,
    pub row_count: usize,
    pub recorded_at: DateTime<Utc>,
}

impl ConversationEntry {
    pub fn success(question: impl Into<String>, sql: impl Into<String>, row_count: usize) -> Self {
        Self {
            question: question.into(),
            generated_query: sql.into(),
            outcome_summary: format!("Query executed successfully, returned {} rows", row_count),
            row_count,
            recorded_at: Utc::now(),
        }
    }

    pub fn failure(
        question: impl Into<String>,
        sql: impl Into<String>,
        error: impl std::fmt::Display,
    ) -> Self {
        Self {
            question: question.into(),
            generated_query: sql.into(),
            outcome_summary: error.to_string(),
            row_count: 0,
            recorded_at: Utc::now(),
        }
    }
}

/// Ordered conversation log with a fixed-size prompt window.
///
/// `history` keeps every entry for display; only the last `window_size` entries are
/// ever rendered into prompts.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    window_size: usize,
    summary_chars: usize,
    history: Vec<ConversationEntry>,
}

impl ConversationMemory {
    /// A `window_size` of 0 is treated as 1.
    pub fn new(window_size: usize, summary_chars: usize) -> Self {
        Self {
            window_size: window_size.max(1),
            summary_chars,
            history: Vec::new(),
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn record(&mut self, entry: ConversationEntry) {
        self.history.push(entry);
    }

    /// The most recent `window_size` entries, oldest first
    pub fn window(&self) -> &[ConversationEntry] {
        let start = self.history.len().saturating_sub(self.window_size);
        &self.history[start..]
    }

    pub fn history(&self) -> &[ConversationEntry] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Renders the last `min(n, window_size)` entries, oldest first.
    pub fn recent_context(&self, n: usize) -> String {
        let window = self.window();
        let take = n.min(window.len());
        if take == 0 {
            return NO_CONVERSATION_TEXT.to_string();
        }

        window[window.len() - take..]
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                format!(
                    "Exchange {}:\n  User: {}\n  Assistant: {}",
                    i + 1,
                    entry.question,
                    truncate_chars(&entry.outcome_summary, self.summary_chars)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<&MemoryConfig> for ConversationMemory {
    fn from(config: &MemoryConfig) -> Self {
        Self::new(config.window_size, config.summary_chars)
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Conversation state for one operator session.
///
/// Appends are serialized through the internal lock so concurrent requests sharing a
/// session keep insertion order.
#[derive(Debug)]
pub struct ConversationSession {
    id: Uuid,
    memory: Mutex<ConversationMemory>,
}

impl ConversationSession {
    pub fn new(memory: ConversationMemory) -> Self {
        Self {
            id: Uuid::new_v4(),
            memory: Mutex::new(memory),
        }
    }

    pub fn from_config(config: &MemoryConfig) -> Self {
        Self::new(ConversationMemory::from(config))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, ConversationMemory> {
        // A panic elsewhere cannot leave a half-written entry, so the data is still usable
        self.memory.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record(&self, entry: ConversationEntry) {
        self.lock().record(entry);
    }

    pub fn recent_context(&self, n: usize) -> String {
        self.lock().recent_context(n)
    }

    /// Context rendered over the whole configured window
    pub fn prompt_context(&self) -> String {
        let memory = self.lock();
        memory.recent_context(memory.window_size())
    }

    pub fn history(&self) -> Vec<ConversationEntry> {
        self.lock().history().to_vec()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn last_entry(&self) -> Option<ConversationEntry> {
        self.lock().history().last().cloned()
    }

    pub(crate) fn clear(&self) {
        self.lock().clear();
        tracing::info!(session = %self.id, "Conversation history cleared");
    }
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::from_config(&MemoryConfig::default())
    }
}
