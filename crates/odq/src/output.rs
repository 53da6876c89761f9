//! Output formatting utilities for the odq CLI.
//!
//! Query results print either as a plain-text table or as pretty JSON.

use odata_client::envelope::QueryEnvelope;
use owo_colors::OwoColorize;
use serde_json::Value;

/// Widest a table column may grow before cells are truncated.
const MAX_COLUMN_WIDTH: usize = 30;

/// Formats an envelope as JSON.
pub fn format_envelope_json(envelope: &QueryEnvelope<Value>) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(envelope)
}

/// Formats an envelope as a table.
///
/// Columns are the union of the row objects' keys in first-seen order (the
/// service's key order, kept by serde_json's `preserve_order`).
/// Rows that are not objects print under a single `value` column.
pub fn format_envelope_table(envelope: &QueryEnvelope<Value>, use_colors: bool) -> String {
    if envelope.is_empty() {
        return match envelope.count {
            Some(count) if count > 0 => format!("No rows on this page ({count} total).\n"),
            _ => "No rows found.\n".to_string(),
        };
    }

    let headers = column_names(&envelope.value);
    let rows: Vec<Vec<String>> = envelope
        .value
        .iter()
        .map(|row| headers.iter().map(|h| cell_text(row, h)).collect())
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_COLUMN_WIDTH)
        })
        .collect();

    let mut output = String::new();

    // Header
    let header = format_line(&headers, &widths);
    if use_colors {
        output.push_str(&format!("{}\n", header.dimmed()));
    } else {
        output.push_str(&header);
        output.push('\n');
    }

    for row in &rows {
        output.push_str(&format_line(row, &widths));
        output.push('\n');
    }

    let summary = match envelope.count {
        Some(count) => format!("{} of {} rows", envelope.len(), count),
        None => format!("{} rows", envelope.len()),
    };
    if use_colors {
        output.push_str(&format!("{}\n", summary.dimmed()));
    } else {
        output.push_str(&summary);
        output.push('\n');
    }

    output
}

fn column_names(rows: &[Value]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for row in rows {
        match row {
            Value::Object(map) => {
                for key in map.keys() {
                    if !names.iter().any(|n| n == key) {
                        names.push(key.clone());
                    }
                }
            }
            _ => {
                if !names.iter().any(|n| n == "value") {
                    names.push("value".to_string());
                }
            }
        }
    }
    names
}

fn cell_text(row: &Value, column: &str) -> String {
    let value = match row {
        Value::Object(map) => map.get(column),
        other if column == "value" => Some(other),
        _ => None,
    };
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn format_line<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let cell = truncate_str(cell.as_ref(), *width);
            format!("{:<width$}", cell, width = *width)
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Truncates a string to at most `max_len` characters.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        s.to_string()
    }
}
