use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::backend::{build_backend, TextGenerator};
use crate::canned::CannedQuery;
use crate::config::QueryGateConfig;
use crate::connection::{truncate_for_log, ConnectionManager, QueryExecutor};
use crate::error::GatewayError;
use crate::generator::QueryGenerator;
use crate::memory::{ConversationEntry, ConversationSession};
use crate::safety::{classify, SafetyVerdict};
use crate::schema::{SchemaCache, SchemaSnapshot};
use crate::table::Table;

pub const MAX_SAMPLE_ROWS: u32 = 1000;

/// Position of one request in the gateway pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStage {
    Received,
    Generating,
    Validating,
    Executing,
    Recorded,
}

impl fmt::Display for RequestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestStage::Received => "RECEIVED",
            RequestStage::Generating => "GENERATING",
            RequestStage::Validating => "VALIDATING",
            RequestStage::Executing => "EXECUTING",
            RequestStage::Recorded => "RECORDED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub table: Table,
    pub sql: String,
    pub row_count: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationStatus {
    pub configured: bool,
    pub missing_fields: Vec<String>,
}

/// Sole entry point for presentation code.
///
/// Every statement, generated or fixed, is classified immediately before it is executed.
/// Each public call is a single pass; nothing is retried here.
pub struct QueryGateway {
    executor: Arc<dyn QueryExecutor>,
    generator: QueryGenerator,
    schema: SchemaCache,
    last_refresh: Mutex<Option<DateTime<Utc>>>,
}

impl QueryGateway {
    pub fn new(executor: Arc<dyn QueryExecutor>, backend: Arc<dyn TextGenerator>) -> Self {
        Self {
            executor,
            generator: QueryGenerator::new(backend),
            schema: SchemaCache::new(),
            last_refresh: Mutex::new(None),
        }
    }

    /// Builds the production gateway: a pooled PostgreSQL executor and the configured backend.
    pub fn from_config(config: &QueryGateConfig) -> anyhow::Result<Self> {
        let executor = ConnectionManager::new(&config.database, &config.pool)?;
        let backend = build_backend(&config.llm)?;
        Ok(Self::new(Arc::new(executor), backend))
    }

    pub fn backend_name(&self) -> String {
        self.generator.backend_name()
    }

    pub fn configuration_status(&self) -> ConfigurationStatus {
        let missing_fields = self.executor.missing_configuration();
        ConfigurationStatus {
            configured: missing_fields.is_empty(),
            missing_fields,
        }
    }

    fn ensure_configured(&self) -> Result<(), GatewayError> {
        let missing = self.executor.missing_configuration();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::configuration(missing))
        }
    }

    /// Generates, validates and executes one question, recording the outcome in `session`.
    ///
    /// Stage failures are recorded before being returned. A configuration refusal is not
    /// recorded since no request was attempted.
    pub async fn generate_and_execute(
        &self,
        session: &ConversationSession,
        question: &str,
    ) -> Result<QueryOutcome, GatewayError> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        log_stage(request_id, RequestStage::Received);

        self.ensure_configured()?;

        log_stage(request_id, RequestStage::Generating);
        let schema = self.schema_text().await;
        let context = session.prompt_context();

        let sql = match self.generator.generate(question, &context, &schema).await {
            Ok(sql) => sql,
            Err(err) => return Err(record_failure(session, request_id, question, "", err)),
        };

        let table = match self.validate_and_execute(request_id, &sql).await {
            Ok(table) => table,
            Err(err) => return Err(record_failure(session, request_id, question, &sql, err)),
        };

        let row_count = table.row_count();
        session.record(ConversationEntry::success(question, sql.as_str(), row_count));
        log_stage(request_id, RequestStage::Recorded);
        tracing::info!(request = %request_id, rows = row_count, "Question answered");

        Ok(QueryOutcome {
            table,
            sql,
            row_count,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Default dashboard view. Skips generation, not validation.
    pub async fn default_analytics_view(&self) -> Result<Table, GatewayError> {
        self.run_canned(CannedQuery::UsageAnalytics).await
    }

    pub async fn run_canned(&self, query: CannedQuery) -> Result<Table, GatewayError> {
        self.ensure_configured()?;
        let request_id = Uuid::new_v4();
        log_stage(request_id, RequestStage::Received);
        tracing::debug!(request = %request_id, view = %query, "Running canned query");
        self.validate_and_execute(request_id, query.sql()).await
    }

    /// First rows of `table`, with `limit` clamped to 1..=1000.
    pub async fn sample_rows(&self, table: &str, limit: u32) -> Result<Table, GatewayError> {
        self.ensure_configured()?;
        let request_id = Uuid::new_v4();
        log_stage(request_id, RequestStage::Received);
        let statement = sample_statement(table, limit);
        self.validate_and_execute(request_id, &statement).await
    }

    /// The single path from a statement to the database.
    async fn validate_and_execute(
        &self,
        request_id: Uuid,
        statement: &str,
    ) -> Result<Table, GatewayError> {
        log_stage(request_id, RequestStage::Validating);
        if let SafetyVerdict::Rejected { reason } = classify(statement) {
            tracing::warn!(
                request = %request_id,
                reason = %reason,
                statement = %truncate_for_log(statement, 100),
                "Statement rejected"
            );
            return Err(GatewayError::safety_rejection(reason, statement));
        }

        log_stage(request_id, RequestStage::Executing);
        let table = self.executor.execute(statement).await?;
        self.touch_last_refresh();
        Ok(table)
    }

    /// Schema text as embedded into prompts. Loads the snapshot on first use.
    pub async fn schema_description(&self) -> Result<String, GatewayError> {
        self.ensure_configured()?;
        Ok(self.schema_text().await)
    }

    pub async fn schema_snapshot(&self) -> Result<Arc<SchemaSnapshot>, GatewayError> {
        self.ensure_configured()?;
        Ok(self.schema.get_or_refresh(self.executor.as_ref()).await)
    }

    async fn schema_text(&self) -> String {
        self.schema.get_or_refresh(self.executor.as_ref()).await.render()
    }

    /// Drops the cached snapshot; the next request introspects again.
    pub async fn invalidate_schema(&self) {
        self.schema.invalidate().await;
    }

    pub async fn schema_refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.schema.refreshed_at().await
    }

    /// Liveness probe with round-trip latency.
    pub async fn check_connection(&self) -> Result<Duration, GatewayError> {
        self.ensure_configured()?;
        let latency = self.executor.ping().await?;
        tracing::info!(latency_ms = latency.as_millis() as u64, "Database connection OK");
        Ok(latency)
    }

    /// Empties the session's conversation. The generator keeps no history of its own, so
    /// this is the only state to reset.
    pub fn clear_session(&self, session: &ConversationSession) {
        session.clear();
    }

    /// When a statement last completed successfully
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self
            .last_refresh
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn touch_last_refresh(&self) {
        *self
            .last_refresh
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Utc::now());
    }
}

fn log_stage(request_id: Uuid, stage: RequestStage) {
    tracing::debug!(request = %request_id, stage = %stage, "Request stage");
}

fn record_failure(
    session: &ConversationSession,
    request_id: Uuid,
    question: &str,
    sql: &str,
    err: GatewayError,
) -> GatewayError {
    session.record(ConversationEntry::failure(question, sql, &err));
    log_stage(request_id, RequestStage::Recorded);
    tracing::warn!(request = %request_id, kind = %err.kind(), error = %err, "Request failed");
    err
}

fn sample_statement(table: &str, limit: u32) -> String {
    let limit = limit.clamp(1, MAX_SAMPLE_ROWS);
    format!("SELECT * FROM {} LIMIT {}", quote_identifier(table), limit)
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
