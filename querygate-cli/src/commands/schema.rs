use querygate_core::QueryGateway;

use super::print_table;
use crate::{cli::OutputFormat, error::CliError};

pub async fn schema(gateway: &QueryGateway, summary: bool, format: OutputFormat) -> Result<(), CliError> {
    let snapshot = gateway.schema_snapshot().await?;

    match (format, summary) {
        (OutputFormat::Json, true) => println!("{}", serde_json::to_string_pretty(&snapshot.summary())?),
        (OutputFormat::Json, false) => println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?),
        (OutputFormat::Text, true) => {
            println!("{} tables", snapshot.table_count());
            for table in snapshot.summary() {
                println!("  {} ({} columns)", table.name, table.column_count);
            }
        }
        (OutputFormat::Text, false) => println!("{}", snapshot.render()),
    }
    Ok(())
}

pub async fn sample(
    gateway: &QueryGateway,
    table: &str,
    limit: u32,
    format: OutputFormat,
) -> Result<(), CliError> {
    let rows = gateway.sample_rows(table, limit).await?;
    print_table(&rows, format)
}
