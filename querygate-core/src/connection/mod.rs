//! Database access behind the gateway.
//!
//! [`QueryExecutor`] is the only path to the database. It runs exactly the statement it is
//! given and never classifies it; callers validate first.

mod postgres;

pub use postgres::{map_sqlx_error, parse_ssl_mode, ConnectionManager};

use async_trait::async_trait;
use std::time::Duration;

use crate::error::GatewayError;
use crate::schema::SchemaSnapshot;
use crate::table::Table;

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Runs `statement` verbatim and returns every row
    async fn execute(&self, statement: &str) -> Result<Table, GatewayError>;

    /// Catalog snapshot for the configured schema; empty when introspection fails
    async fn introspect(&self) -> SchemaSnapshot;

    /// Liveness probe on a pooled connection, returning round-trip latency
    async fn ping(&self) -> Result<Duration, GatewayError>;

    /// Required connection settings that are absent. Empty when fully configured.
    fn missing_configuration(&self) -> Vec<String>;
}

/// Shortens a statement for log output
pub(crate) fn truncate_for_log(statement: &str, max_chars: usize) -> String {
    let flat = statement.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &flat[..idx]),
        None => flat,
    }
}
