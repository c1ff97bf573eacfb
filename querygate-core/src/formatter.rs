//! Plain-text rendering of results for terminal output.
//!
//! ```text
//! user_id | name  | total_prompts
//! --------+-------+--------------
//! 1       | Alice | 42
//! 2       | Bob   | NULL
//! ```
//!
//! At most [`MAX_ROWS`] rows are shown and cells are cut at [`MAX_CELL_CHARS`] characters.

use serde_json::Value;

use crate::gateway::QueryOutcome;
use crate::memory::ConversationEntry;
use crate::table::Table;

pub const MAX_ROWS: usize = 20;
pub const MAX_CELL_CHARS: usize = 50;

pub fn format_table(table: &Table) -> String {
    if table.is_empty() {
        return "Query executed successfully but returned no rows.".to_string();
    }

    let shown: Vec<Vec<String>> = table
        .rows
        .iter()
        .take(MAX_ROWS)
        .map(|row| row.iter().map(format_cell_value).collect())
        .collect();

    let mut col_widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &shown {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = col_widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut output = String::new();

    let header: Vec<String> = table
        .columns
        .iter()
        .zip(&col_widths)
        .map(|(col, &width)| format!("{:<width$}", col, width = width))
        .collect();
    output.push_str(header.join(" | ").trim_end());
    output.push('\n');

    let separator: Vec<String> = col_widths.iter().map(|&width| "-".repeat(width)).collect();
    output.push_str(&separator.join("-+-"));
    output.push('\n');

    for row in &shown {
        let formatted: Vec<String> = row
            .iter()
            .zip(&col_widths)
            .map(|(cell, &width)| format!("{:<width$}", cell, width = width))
            .collect();
        output.push_str(formatted.join(" | ").trim_end());
        output.push('\n');
    }

    if table.row_count() > MAX_ROWS {
        output.push_str(&format!("... and {} more rows\n", table.row_count() - MAX_ROWS));
    }

    output
}

/// Table plus the statement and timing that produced it
pub fn format_outcome(outcome: &QueryOutcome) -> String {
    format!(
        "SQL: {}\nReturned {} rows in {}ms\n\n{}",
        outcome.sql,
        outcome.row_count,
        outcome.elapsed_ms,
        format_table(&outcome.table)
    )
}

pub fn format_history(entries: &[ConversationEntry]) -> String {
    if entries.is_empty() {
        return crate::memory::NO_CONVERSATION_TEXT.to_string();
    }

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let sql = if entry.generated_query.is_empty() {
                "(none)"
            } else {
                entry.generated_query.as_str()
            };
            format!(
                "#{} [{}] {}\n   SQL: {}\n   {}",
                i + 1,
                entry.recorded_at.format("%H:%M:%S"),
                entry.question,
                sql,
                entry.outcome_summary
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_cell_value(value: &Value) -> String {
    let text = match value {
        Value::Null => return "NULL".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => value.to_string(),
    };

    // Multi-line values would break row alignment
    let text = text.replace(['\n', '\r'], " ");
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some(_) => {
            let kept: String = text.chars().take(MAX_CELL_CHARS - 3).collect();
            format!("{}...", kept)
        }
        None => text,
    }
}
