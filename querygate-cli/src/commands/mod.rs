//! Subcommand implementations. Each one is a thin adapter over a gateway operation.

pub mod ask;
pub mod check;
pub mod dashboard;
pub mod schema;

pub use ask::{ask, chat};
pub use check::check;
pub use dashboard::{dashboard, metrics};
pub use schema::{sample, schema};

use crate::{cli::OutputFormat, error::CliError};
use querygate_core::formatter::format_table;
use querygate_core::Table;

pub(crate) fn print_table(table: &Table, format: OutputFormat) -> Result<(), CliError> {
    match format {
        OutputFormat::Text => print!("{}", format_table(table)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(table)?),
    }
    Ok(())
}
