//! # querygate-core
//!
//! Turns natural-language questions into validated, read-only SQL and runs it.
//!
//! A request flows through [`QueryGateway::generate_and_execute`]: the
//! [`generator::QueryGenerator`] builds a prompt from the schema snapshot and recent
//! conversation, the model's reply is reduced to a candidate statement,
//! [`safety::classify`] gates it, the [`connection::QueryExecutor`] runs it, and the outcome
//! is recorded in the caller's [`memory::ConversationSession`] whatever happened.
//!
//! ```rust,no_run
//! use querygate_core::{ConversationSession, QueryGateConfig, QueryGateway};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = QueryGateConfig::load(None)?;
//! let gateway = QueryGateway::from_config(&config)?;
//! let session = ConversationSession::from_config(&config.memory);
//!
//! let outcome = gateway
//!     .generate_and_execute(&session, "How many users signed up this week?")
//!     .await?;
//! println!("{} rows from: {}", outcome.row_count, outcome.sql);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod canned;
pub mod config;
pub mod connection;
pub mod error;
pub mod formatter;
pub mod gateway;
pub mod generator;
pub mod memory;
pub mod safety;
pub mod schema;
pub mod table;

pub use backend::{build_backend, LlmBackend, StubBackend, TextGenerator};
pub use canned::CannedQuery;
pub use config::QueryGateConfig;
pub use connection::{ConnectionManager, QueryExecutor};
pub use error::{ErrorKind, GatewayError};
pub use gateway::{ConfigurationStatus, QueryGateway, QueryOutcome, RequestStage};
pub use memory::{ConversationEntry, ConversationMemory, ConversationSession};
pub use safety::{classify, SafetyValidator, SafetyVerdict};
pub use schema::{ColumnInfo, SchemaSnapshot};
pub use table::Table;
