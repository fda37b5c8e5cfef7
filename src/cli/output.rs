//! Output formatting infrastructure for CLI commands.

use std::time::Duration;

use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::Value;

/// Widest cell rendered in a record table before truncation.
const MAX_CELL_CHARS: usize = 60;
/// Columns shown for record tables; the rest are available with --json.
const MAX_RECORD_COLUMNS: usize = 8;

/// Output mode for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

/// Print a single item as pretty-printed JSON.
pub fn output_json<T: Serialize>(item: &T) {
    match serde_json::to_string_pretty(item) {
        Ok(json) => println!("{}", json),
        Err(e) => print_error(&format!("Failed to serialize to JSON: {}", e)),
    }
}

/// Print a formatted table with headers and rows.
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    if rows.is_empty() {
        println!("{}", "No results found.".dimmed());
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers);

    for row in rows {
        table.add_row(row);
    }

    println!("{table}");
}

/// Render a JSON scalar for a table cell.
pub fn cell(value: &Value) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() > MAX_CELL_CHARS {
        let mut cut: String = text.chars().take(MAX_CELL_CHARS - 1).collect();
        cut.push('…');
        cut
    } else {
        text
    }
}

/// Column names for a list of records, in first-seen order.
pub fn record_columns(records: &[Value]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        if let Value::Object(map) = record {
            for key in map.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
    }
    columns.truncate(MAX_RECORD_COLUMNS);
    columns
}

/// Print API records as a table, or as JSON when they are not objects.
pub fn print_records(records: &[Value]) {
    let columns = record_columns(records);
    if columns.is_empty() {
        if records.is_empty() {
            println!("{}", "No results found.".dimmed());
        } else {
            output_json(&records);
        }
        return;
    }
    let headers: Vec<&str> = columns.iter().map(String::as_str).collect();
    let rows = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|c| cell(record.get(c).unwrap_or(&Value::Null)))
                .collect()
        })
        .collect();
    print_table(&headers, rows);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", "OK".green().bold(), msg);
}

/// Print an error message to stderr.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "Error:".red().bold(), msg);
}

/// Print a bold section header.
pub fn print_header(title: &str) {
    println!("\n{}\n", title.bold());
}

/// Print a key-value pair line.
pub fn print_kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a dimmed hint/suggestion message.
pub fn print_hint(msg: &str) {
    println!("{}", msg.dimmed());
}

/// Spinner on stderr; hidden automatically when stderr is not a terminal.
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
