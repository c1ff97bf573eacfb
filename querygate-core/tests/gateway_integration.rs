use async_trait::async_trait;
use querygate_core::backend::{StubBackend, TextGenerator};
use querygate_core::memory::NO_CONVERSATION_TEXT;
use querygate_core::schema::{ColumnInfo, NO_SCHEMA_TEXT};
use querygate_core::{
    CannedQuery, ConversationMemory, ConversationSession, ErrorKind, GatewayError, QueryExecutor,
    QueryGateway, SchemaSnapshot, Table,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Test double that counts calls and serves a scripted result.
struct FakeExecutor {
    execute_calls: AtomicUsize,
    introspect_calls: AtomicUsize,
    statements: Mutex<Vec<String>>,
    result: Result<Table, GatewayError>,
    snapshot: SchemaSnapshot,
    missing: Vec<String>,
}

impl FakeExecutor {
    fn returning(result: Result<Table, GatewayError>) -> Self {
        let mut snapshot = SchemaSnapshot::default();
        snapshot.tables.insert(
            "usertable".to_string(),
            vec![ColumnInfo {
                name: "user_id".to_string(),
                data_type: "integer".to_string(),
                nullable: false,
                default: None,
            }],
        );
        Self {
            execute_calls: AtomicUsize::new(0),
            introspect_calls: AtomicUsize::new(0),
            statements: Mutex::new(Vec::new()),
            result,
            snapshot,
            missing: Vec::new(),
        }
    }

    fn one_by_one() -> Self {
        Self::returning(Ok(Table::new(vec!["?column?".into()], vec![vec![json!(1)]])))
    }

    fn unconfigured() -> Self {
        let mut fake = Self::one_by_one();
        fake.missing = vec!["name".into(), "password".into()];
        fake
    }

    fn with_empty_schema(mut self) -> Self {
        self.snapshot = SchemaSnapshot::default();
        self
    }

    fn execute_count(&self) -> usize {
        self.execute_calls.load(Ordering::SeqCst)
    }

    fn introspect_count(&self) -> usize {
        self.introspect_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryExecutor for FakeExecutor {
    async fn execute(&self, statement: &str) -> Result<Table, GatewayError> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        self.statements.lock().unwrap().push(statement.to_string());
        self.result.clone()
    }

    async fn introspect(&self) -> SchemaSnapshot {
        self.introspect_calls.fetch_add(1, Ordering::SeqCst);
        self.snapshot.clone()
    }

    async fn ping(&self) -> Result<Duration, GatewayError> {
        Ok(Duration::from_millis(3))
    }

    fn missing_configuration(&self) -> Vec<String> {
        self.missing.clone()
    }
}

struct FailingBackend;

#[async_trait]
impl TextGenerator for FailingBackend {
    async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        anyhow::bail!("model endpoint unreachable")
    }

    fn name(&self) -> String {
        "failing".to_string()
    }
}

/// Records every prompt it receives.
struct PromptSpy {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl TextGenerator for PromptSpy {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }

    fn name(&self) -> String {
        "spy".to_string()
    }
}

fn gateway(executor: Arc<FakeExecutor>, reply: &str) -> QueryGateway {
    QueryGateway::new(executor, Arc::new(StubBackend::new(reply)))
}

fn session() -> ConversationSession {
    ConversationSession::new(ConversationMemory::new(5, 200))
}

#[tokio::test]
async fn test_mutating_statement_never_reaches_executor() {
    let executor = Arc::new(FakeExecutor::one_by_one());
    let gateway = gateway(executor.clone(), "DELETE FROM usertable");
    let session = session();

    let err = gateway
        .generate_and_execute(&session, "delete everyone")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GatewayError::SafetyRejection {
            reason: "Query contains forbidden keyword: DELETE".to_string(),
            statement: "DELETE FROM usertable".to_string(),
        }
    );
    assert_eq!(executor.execute_count(), 0);

    let entry = session.last_entry().unwrap();
    assert_eq!(entry.question, "delete everyone");
    assert_eq!(entry.row_count, 0);
    assert!(entry.outcome_summary.contains("DELETE"));
}

#[tokio::test]
async fn test_select_one_round_trip() {
    let executor = Arc::new(FakeExecutor::one_by_one());
    let gateway = gateway(executor.clone(), "SELECT 1");
    let session = session();
    assert!(gateway.last_refresh().is_none());

    let outcome = gateway.generate_and_execute(&session, "ping").await.unwrap();

    assert_eq!(outcome.sql, "SELECT 1");
    assert_eq!(outcome.row_count, 1);
    assert_eq!(outcome.table.row_count(), 1);
    assert_eq!(outcome.table.column_count(), 1);
    assert_eq!(outcome.table.scalar(), Some(&json!(1)));
    assert_eq!(executor.execute_count(), 1);
    assert_eq!(executor.statements.lock().unwrap().as_slice(), ["SELECT 1"]);

    let history = session.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].row_count, 1);
    assert_eq!(history[0].generated_query, "SELECT 1");
    assert_eq!(
        history[0].outcome_summary,
        "Query executed successfully, returned 1 rows"
    );
    assert!(gateway.last_refresh().is_some());
}

#[tokio::test]
async fn test_prefix_rejection_for_prose_reply() {
    let executor = Arc::new(FakeExecutor::one_by_one());
    let gateway = gateway(executor.clone(), "I can help you query the database.");
    let session = session();

    let err = gateway.generate_and_execute(&session, "hello").await.unwrap_err();

    assert!(matches!(
        err,
        GatewayError::SafetyRejection { ref reason, .. } if reason == "Query must start with SELECT or WITH"
    ));
    assert_eq!(executor.execute_count(), 0);
}

#[tokio::test]
async fn test_generation_failure_is_recorded_without_sql() {
    let executor = Arc::new(FakeExecutor::one_by_one());
    let gateway = QueryGateway::new(executor.clone(), Arc::new(FailingBackend));
    let session = session();

    let err = gateway.generate_and_execute(&session, "anything").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Generation);
    assert!(err.is_recoverable());
    assert_eq!(executor.execute_count(), 0);

    let entry = session.last_entry().unwrap();
    assert_eq!(entry.generated_query, "");
    assert_eq!(entry.row_count, 0);
    assert!(entry.outcome_summary.contains("model endpoint unreachable"));
}

#[tokio::test]
async fn test_execution_error_is_recorded_verbatim() {
    let executor = Arc::new(FakeExecutor::returning(Err(GatewayError::execution(
        "relation \"orders\" does not exist",
    ))));
    let gateway = gateway(executor.clone(), "SELECT * FROM orders");
    let session = session();

    let err = gateway.generate_and_execute(&session, "show orders").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Execution);
    assert_eq!(executor.execute_count(), 1);
    let entry = session.last_entry().unwrap();
    assert_eq!(entry.generated_query, "SELECT * FROM orders");
    assert_eq!(
        entry.outcome_summary,
        "Failed to execute query: relation \"orders\" does not exist"
    );
    assert!(gateway.last_refresh().is_none());
}

#[tokio::test]
async fn test_pool_exhaustion_stays_distinct() {
    let executor = Arc::new(FakeExecutor::returning(Err(
        GatewayError::resource_exhaustion("timed out waiting for a pooled connection"),
    )));
    let gateway = gateway(executor, "SELECT 1");
    let session = session();

    let err = gateway.generate_and_execute(&session, "ping").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ResourceExhaustion);
    assert_eq!(session.len(), 1);
}

#[tokio::test]
async fn test_unconfigured_system_refuses_everything() {
    let executor = Arc::new(FakeExecutor::unconfigured());
    let gateway = gateway(executor.clone(), "SELECT 1");
    let session = session();

    let status = gateway.configuration_status();
    assert!(!status.configured);
    assert_eq!(status.missing_fields, vec!["name", "password"]);

    let err = gateway.generate_and_execute(&session, "ping").await.unwrap_err();
    assert!(matches!(err, GatewayError::Configuration { ref fields, .. } if fields == &["name", "password"]));
    assert!(!err.is_recoverable());

    assert_eq!(gateway.default_analytics_view().await.unwrap_err().kind(), ErrorKind::Configuration);
    assert_eq!(gateway.sample_rows("usertable", 5).await.unwrap_err().kind(), ErrorKind::Configuration);
    assert_eq!(gateway.schema_description().await.unwrap_err().kind(), ErrorKind::Configuration);
    assert_eq!(gateway.check_connection().await.unwrap_err().kind(), ErrorKind::Configuration);

    assert_eq!(executor.execute_count(), 0);
    assert_eq!(executor.introspect_count(), 0);
    assert!(session.is_empty());
}

#[tokio::test]
async fn test_canned_queries_run_through_validator() {
    let executor = Arc::new(FakeExecutor::one_by_one());
    let gateway = gateway(executor.clone(), "DROP TABLE usertable");

    gateway.default_analytics_view().await.unwrap();
    for query in CannedQuery::METRICS {
        gateway.run_canned(query).await.unwrap();
    }

    assert_eq!(executor.execute_count(), 1 + CannedQuery::METRICS.len());
    let statements = executor.statements.lock().unwrap();
    assert_eq!(statements[0], CannedQuery::UsageAnalytics.sql());
    assert!(gateway.last_refresh().is_some());
}

#[tokio::test]
async fn test_sample_rows_uses_quoted_identifier() {
    let executor = Arc::new(FakeExecutor::one_by_one());
    let gateway = gateway(executor.clone(), "SELECT 1");

    gateway.sample_rows("usertable", 5).await.unwrap();

    assert_eq!(
        executor.statements.lock().unwrap().as_slice(),
        ["SELECT * FROM \"usertable\" LIMIT 5"]
    );
}

#[tokio::test]
async fn test_sample_rows_still_validated() {
    let executor = Arc::new(FakeExecutor::one_by_one());
    let gateway = gateway(executor.clone(), "SELECT 1");

    let err = gateway.sample_rows("drop", 5).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SafetyRejection);
    assert_eq!(executor.execute_count(), 0);
}

#[tokio::test]
async fn test_clear_session_then_context_is_canonical() {
    let executor = Arc::new(FakeExecutor::one_by_one());
    let gateway = gateway(executor, "SELECT 1");
    let session = session();

    gateway.generate_and_execute(&session, "first").await.unwrap();
    gateway.generate_and_execute(&session, "second").await.unwrap();
    assert!(session.recent_context(3).contains("User: second"));

    gateway.clear_session(&session);

    assert!(session.history().is_empty());
    assert_eq!(session.recent_context(3), NO_CONVERSATION_TEXT);
}

#[tokio::test]
async fn test_prompt_carries_schema_and_bounded_context() {
    let executor = Arc::new(FakeExecutor::one_by_one());
    let spy = Arc::new(PromptSpy {
        reply: "SELECT 1".to_string(),
        prompts: Mutex::new(Vec::new()),
    });
    let gateway = QueryGateway::new(executor, spy.clone());
    let session = ConversationSession::new(ConversationMemory::new(3, 200));

    for i in 0..6 {
        gateway
            .generate_and_execute(&session, &format!("question {i}"))
            .await
            .unwrap();
    }

    let prompts = spy.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 6);
    assert!(prompts[0].contains(NO_CONVERSATION_TEXT));
    assert!(prompts[0].contains("Table: usertable"));

    // Last prompt sees only the three exchanges before it, oldest first
    let last = &prompts[5];
    assert!(!last.contains("User: question 1"));
    let q2 = last.find("User: question 2").unwrap();
    let q4 = last.find("User: question 4").unwrap();
    assert!(q2 < q4);
    assert!(!last.contains("User: question 5"));
    assert_eq!(session.history().len(), 6);
}

#[tokio::test]
async fn test_schema_is_cached_until_invalidated() {
    let executor = Arc::new(FakeExecutor::one_by_one());
    let gateway = gateway(executor.clone(), "SELECT 1");

    let first = gateway.schema_description().await.unwrap();
    let second = gateway.schema_description().await.unwrap();
    assert_eq!(first, second);
    assert!(first.contains("Table: usertable"));
    assert_eq!(executor.introspect_count(), 1);
    assert!(gateway.schema_refreshed_at().await.is_some());

    gateway.invalidate_schema().await;
    assert!(gateway.schema_refreshed_at().await.is_none());
    gateway.schema_description().await.unwrap();
    assert_eq!(executor.introspect_count(), 2);
}

#[tokio::test]
async fn test_empty_schema_is_reported_and_retried() {
    let executor = Arc::new(FakeExecutor::one_by_one().with_empty_schema());
    let gateway = gateway(executor.clone(), "SELECT 1");

    assert_eq!(gateway.schema_description().await.unwrap(), NO_SCHEMA_TEXT);
    assert_eq!(gateway.schema_description().await.unwrap(), NO_SCHEMA_TEXT);
    assert_eq!(executor.introspect_count(), 2);
}

#[tokio::test]
async fn test_concurrent_requests_share_one_session() {
    let executor = Arc::new(FakeExecutor::one_by_one());
    let gateway = Arc::new(gateway(executor.clone(), "SELECT 1"));
    let session = Arc::new(session());

    let mut handles = Vec::new();
    for i in 0..8 {
        let gateway = Arc::clone(&gateway);
        let session = Arc::clone(&session);
        handles.push(tokio::spawn(async move {
            gateway
                .generate_and_execute(&session, &format!("q{i}"))
                .await
                .map(|o| o.row_count)
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 1);
    }

    assert_eq!(session.len(), 8);
    assert_eq!(executor.execute_count(), 8);
}

#[tokio::test]
async fn test_check_connection_reports_latency() {
    let executor = Arc::new(FakeExecutor::one_by_one());
    let gateway = gateway(executor, "SELECT 1");
    assert_eq!(gateway.check_connection().await.unwrap(), Duration::from_millis(3));
    assert!(gateway.configuration_status().configured);
}
