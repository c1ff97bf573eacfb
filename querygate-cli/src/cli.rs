use clap::{Parser, Subcommand};
use querygate_core::{CannedQuery, ConversationSession, QueryGateConfig, QueryGateway};
use std::path::PathBuf;

use crate::{commands, error::CliError};

#[derive(Debug, Parser)]
#[command(name = "querygate")]
#[command(about = "Ask read-only questions of a PostgreSQL database in plain language")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Configuration file path (defaults to <config dir>/querygate/querygate.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Ask a single question
    Ask {
        /// Natural-language question
        question: String,
    },

    /// Interactive session with conversation memory
    Chat,

    /// Run a fixed dashboard view (default: usage analytics)
    Dashboard {
        /// View to run: usage, total-users, daily-users, weekly-users, top-model,
        /// enhanced-prompts, reviews, or metrics for all headline numbers
        #[arg(long)]
        view: Option<String>,
    },

    /// Show the schema snapshot used for generation
    Schema {
        /// Only list tables and column counts
        #[arg(long)]
        summary: bool,
    },

    /// Show the first rows of a table
    Sample {
        table: String,

        #[arg(short, long, default_value_t = 5)]
        limit: u32,
    },

    /// Check configuration and database connectivity
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

impl Cli {
    pub async fn run(&self) -> Result<(), CliError> {
        let Some(command) = &self.command else {
            println!("querygate - read-only natural-language queries over PostgreSQL");
            println!("Run 'querygate --help' for usage information.");
            return Ok(());
        };

        let config = QueryGateConfig::load(self.config.as_deref())?;
        tracing::debug!(config = ?config, "Configuration loaded");
        let gateway = QueryGateway::from_config(&config)?;

        match command {
            Commands::Ask { question } => {
                let session = ConversationSession::from_config(&config.memory);
                commands::ask(&gateway, &session, question, self.format).await
            }
            Commands::Chat => {
                let session = ConversationSession::from_config(&config.memory);
                commands::chat(&gateway, &session).await
            }
            Commands::Dashboard { view } => match view.as_deref() {
                Some("metrics") => commands::metrics(&gateway, self.format).await,
                Some(name) => {
                    let query: CannedQuery = name.parse().map_err(CliError::Config)?;
                    commands::dashboard(&gateway, query, self.format).await
                }
                None => commands::dashboard(&gateway, CannedQuery::UsageAnalytics, self.format).await,
            },
            Commands::Schema { summary } => commands::schema(&gateway, *summary, self.format).await,
            Commands::Sample { table, limit } => {
                commands::sample(&gateway, table, *limit, self.format).await
            }
            Commands::Check => commands::check(&gateway, self.format).await,
        }
    }
}
