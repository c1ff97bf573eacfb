use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::connection::QueryExecutor;

pub const NO_SCHEMA_TEXT: &str =
    "No schema information available. Please check database configuration.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

/// Point-in-time catalog of tables and their columns.
///
/// An empty snapshot means the schema is unknown (introspection failed or was refused),
/// not that the database has no tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub tables: BTreeMap<String, Vec<ColumnInfo>>,
}

/// Per-table column count for sidebar-style listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub column_count: usize,
}

impl SchemaSnapshot {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn columns(&self, table: &str) -> Option<&[ColumnInfo]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    pub fn summary(&self) -> Vec<TableSummary> {
        self.tables
            .iter()
            .map(|(name, columns)| TableSummary {
                name: name.clone(),
                column_count: columns.len(),
            })
            .collect()
    }

    /// Text form embedded into generation prompts
    pub fn render(&self) -> String {
        if self.tables.is_empty() {
            return NO_SCHEMA_TEXT.to_string();
        }

        self.tables
            .iter()
            .map(|(table, columns)| {
                let mut part = format!("\nTable: {}\n{}", table, "=".repeat(40));
                for col in columns {
                    let nullability = if col.nullable { "NULL" } else { "NOT NULL" };
                    part.push_str(&format!("\n  {}: {} {}", col.name, col.data_type, nullability));
                    if let Some(default) = col.default.as_deref().filter(|d| !d.is_empty()) {
                        part.push_str(&format!(" DEFAULT {}", default));
                    }
                }
                part
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

struct CachedSnapshot {
    snapshot: Arc<SchemaSnapshot>,
    refreshed_at: DateTime<Utc>,
}

/// Lazily populated schema snapshot.
///
/// Rebuilt whole on demand; never patched incrementally. Empty introspection results are
/// not cached so the next request tries again.
#[derive(Default)]
pub struct SchemaCache {
    inner: RwLock<Option<CachedSnapshot>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_refresh(&self, executor: &dyn QueryExecutor) -> Arc<SchemaSnapshot> {
        if let Some(cached) = self.inner.read().await.as_ref() {
            return Arc::clone(&cached.snapshot);
        }

        let mut guard = self.inner.write().await;
        // Another caller may have refreshed while we waited for the write lock
        if let Some(cached) = guard.as_ref() {
            return Arc::clone(&cached.snapshot);
        }

        let snapshot = Arc::new(executor.introspect().await);
        if snapshot.is_empty() {
            tracing::warn!("Schema snapshot is empty; treating schema as unknown");
        } else {
            tracing::debug!(tables = snapshot.table_count(), "Schema snapshot refreshed");
            *guard = Some(CachedSnapshot {
                snapshot: Arc::clone(&snapshot),
                refreshed_at: Utc::now(),
            });
        }
        snapshot
    }

    pub async fn invalidate(&self) {
        if self.inner.write().await.take().is_some() {
            tracing::debug!("Schema snapshot invalidated");
        }
    }

    /// When the cached snapshot was taken, if one is cached
    pub async fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.as_ref().map(|c| c.refreshed_at)
    }
}
