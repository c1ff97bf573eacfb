use std::sync::Arc;
use std::time::Instant;

use crate::backend::TextGenerator;
use crate::error::GatewayError;

/// Leading keywords that mark a line as part of a statement
const LEADING_KEYWORDS: [&str; 7] = ["SELECT", "WITH", "FROM", "WHERE", "GROUP", "ORDER", "HAVING"];
/// Keywords that mark a line as SQL wherever they appear in it
const EMBEDDED_KEYWORDS: [&str; 4] = ["SELECT", "FROM", "WHERE", "JOIN"];

const POLICY_PREAMBLE: &str = "You are a PostgreSQL expert generating queries for data analytics in READ-ONLY mode.

SAFETY RULES:
- Only read-only statements are allowed. Every query must start with SELECT or WITH.
- Never use INSERT, UPDATE, DELETE, DROP, CREATE, ALTER, TRUNCATE, GRANT, REVOKE, EXEC or EXECUTE.
- No data changes, no schema changes, no permission changes.

PATTERN MATCHING:
- Use ILIKE for free-text searches over names, descriptions and other user-entered text.
- Use LIKE only for exact codes and identifiers where case matters.
- Write patterns as single-quoted literals, e.g. WHERE name ILIKE 'john%'. Never use placeholders.

AGGREGATES:
- Never nest one aggregate directly inside another; AVG(COUNT(id)) is invalid.
- Compute the inner aggregate in a named CTE or subquery first, then aggregate over it:
  WITH per_user AS (SELECT user_id, COUNT(id) AS cnt FROM prompt_history GROUP BY user_id)
  SELECT AVG(cnt) FROM per_user

MULTIPLE TABLES:
- Give every table an alias whenever more than one table participates.
- Qualify every column with its table alias, e.g.
  SELECT ph.user_id, u.name FROM prompt_history ph JOIN usertable u ON ph.user_id = u.user_id

OUTPUT:
- Use only tables and columns present in the schema below.
- Use the conversation context to build on earlier questions instead of repeating them.
- Reply with the SQL query only, no explanations and no markdown.";

/// Composes the full prompt for one question.
pub fn build_prompt(question: &str, context: &str, schema: &str) -> String {
    format!(
        "{POLICY_PREAMBLE}

DATABASE SCHEMA:
{schema}

CONVERSATION CONTEXT:
{context}

Question: {question}

Generate a safe, read-only PostgreSQL query for this question:"
    )
}

/// Pulls a candidate statement out of free-form model output.
///
/// Lines that start with, or contain, a SQL keyword are kept and joined with single spaces.
/// When nothing qualifies the trimmed response is returned unchanged so the safety
/// validator can reject it downstream.
pub fn extract_sql(response: &str) -> String {
    let sql_lines: Vec<&str> = response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            let upper = line.to_uppercase();
            LEADING_KEYWORDS.iter().any(|kw| upper.starts_with(kw))
                || EMBEDDED_KEYWORDS.iter().any(|kw| upper.contains(kw))
        })
        .collect();

    if sql_lines.is_empty() {
        return response.trim().to_string();
    }

    sql_lines.join(" ")
}

/// Turns a question into a candidate statement. Holds no conversation state.
pub struct QueryGenerator {
    backend: Arc<dyn TextGenerator>,
}

impl QueryGenerator {
    pub fn new(backend: Arc<dyn TextGenerator>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> String {
        self.backend.name()
    }

    /// Returns an unvalidated candidate statement.
    pub async fn generate(
        &self,
        question: &str,
        context: &str,
        schema: &str,
    ) -> Result<String, GatewayError> {
        let prompt = build_prompt(question, context, schema);
        let started = Instant::now();

        let response = self.backend.complete(&prompt).await.map_err(|e| {
            tracing::warn!(backend = %self.backend.name(), error = %e, "Generation backend failed");
            GatewayError::generation(format!("{:#}", e))
        })?;

        let candidate = extract_sql(&response);
        if candidate.is_empty() {
            return Err(GatewayError::generation("language model returned an empty response"));
        }

        tracing::debug!(
            backend = %self.backend.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            candidate = %crate::connection::truncate_for_log(&candidate, 100),
            "Candidate statement generated"
        );

        Ok(candidate)
    }
}
