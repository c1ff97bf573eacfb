use querygate_core::QueryGateway;
use serde_json::json;

use crate::{cli::OutputFormat, error::CliError};

/// Reports configuration status, then probes the database when configured.
pub async fn check(gateway: &QueryGateway, format: OutputFormat) -> Result<(), CliError> {
    let status = gateway.configuration_status();

    if !status.configured {
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
            OutputFormat::Text => {
                println!("Database is not configured.");
                println!("Missing settings: {}", status.missing_fields.join(", "));
                println!("Set them in the [database] section of the config file or via DB_NAME, DB_USER and DB_PASSWORD.");
            }
        }
        return Err(querygate_core::GatewayError::configuration(status.missing_fields).into());
    }

    let latency = gateway.check_connection().await?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "configured": true,
                "latency_ms": latency.as_millis() as u64,
                "backend": gateway.backend_name(),
            }))?
        ),
        OutputFormat::Text => {
            println!("Database connection OK ({} ms)", latency.as_millis());
            println!("Generation backend: {}", gateway.backend_name());
        }
    }
    Ok(())
}
