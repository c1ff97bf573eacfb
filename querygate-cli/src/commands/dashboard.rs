use querygate_core::{CannedQuery, QueryGateway, Table};
use serde_json::Value;

use super::print_table;
use crate::{cli::OutputFormat, error::CliError};

pub async fn dashboard(
    gateway: &QueryGateway,
    query: CannedQuery,
    format: OutputFormat,
) -> Result<(), CliError> {
    let table = gateway.run_canned(query).await?;
    if format == OutputFormat::Text {
        println!("{}\n", query.title());
    }
    print_table(&table, format)
}

/// Headline numbers. A failing metric is shown as unavailable instead of aborting the rest.
pub async fn metrics(gateway: &QueryGateway, format: OutputFormat) -> Result<(), CliError> {
    let mut results = Vec::with_capacity(CannedQuery::METRICS.len());
    for query in CannedQuery::METRICS {
        let value = match gateway.run_canned(query).await {
            Ok(table) => metric_value(&table),
            Err(err) if err.is_recoverable() => {
                tracing::warn!(metric = %query, error = %err, "Metric unavailable");
                Value::Null
            }
            Err(err) => return Err(err.into()),
        };
        results.push((query, value));
    }

    match format {
        OutputFormat::Json => {
            let map: serde_json::Map<String, Value> = results
                .into_iter()
                .map(|(q, v)| (q.name().to_string(), v))
                .collect();
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
        OutputFormat::Text => {
            let width = results.iter().map(|(q, _)| q.title().len()).max().unwrap_or(0);
            for (query, value) in results {
                println!("{:<width$}  {}", query.title(), display_metric(&value), width = width);
            }
        }
    }
    Ok(())
}

/// First cell of the first row; the top-model metric reports its label column
fn metric_value(table: &Table) -> Value {
    table.scalar().cloned().unwrap_or(Value::Null)
}

fn display_metric(value: &Value) -> String {
    match value {
        Value::Null => "n/a".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metric_value_takes_first_cell() {
        let table = Table::new(
            vec!["llm_used".into(), "count".into()],
            vec![vec![json!("gpt-4o"), json!(120)]],
        );
        assert_eq!(metric_value(&table), json!("gpt-4o"));
        assert_eq!(metric_value(&Table::default()), Value::Null);
    }

    #[test]
    fn test_display_metric() {
        assert_eq!(display_metric(&Value::Null), "n/a");
        assert_eq!(display_metric(&json!("gpt-4o")), "gpt-4o");
        assert_eq!(display_metric(&json!(12.5)), "12.5");
    }
}
