//! Tool catalog listing.

use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use crate::cli::output::{output_json, print_header, print_hint, print_table, OutputMode};
use crate::mcp::{ToolCategory, ToolName};

#[derive(Serialize)]
struct ToolJson {
    name: &'static str,
    category: &'static str,
    description: &'static str,
    input_schema: Value,
}

/// First sentence of a description, for table cells.
fn summary(description: &str) -> &str {
    match description.find(". ") {
        Some(end) => &description[..end + 1],
        None => description,
    }
}

/// Catalog entries whose name or description contains `term` (case-insensitive).
pub fn matching_tools(term: Option<&str>) -> Vec<ToolName> {
    let term = term.map(str::to_lowercase);
    ToolName::ALL
        .iter()
        .filter(|tool| match &term {
            Some(t) => {
                tool.as_str().contains(t.as_str())
                    || tool.description().to_lowercase().contains(t.as_str())
            }
            None => true,
        })
        .copied()
        .collect()
}

pub fn handle_tools(search: Option<&str>, schema: bool, mode: OutputMode) {
    let tools = matching_tools(search);

    if mode == OutputMode::Json {
        let items: Vec<ToolJson> = tools
            .iter()
            .map(|tool| ToolJson {
                name: tool.as_str(),
                category: tool.category().title(),
                description: tool.description(),
                input_schema: Value::Object(tool.input_schema().as_ref().clone()),
            })
            .collect();
        output_json(&items);
        return;
    }

    for category in ToolCategory::ALL {
        let in_category: Vec<&ToolName> =
            tools.iter().filter(|t| t.category() == *category).collect();
        if in_category.is_empty() {
            continue;
        }
        print_header(category.title());
        if schema {
            for tool in in_category {
                println!("{}", tool.as_str().cyan().bold());
                println!("  {}", summary(tool.description()));
                let schema = Value::Object(tool.input_schema().as_ref().clone());
                match serde_json::to_string_pretty(&schema) {
                    Ok(text) => println!("{}\n", text),
                    Err(_) => println!(),
                }
            }
        } else {
            let rows = in_category
                .iter()
                .map(|t| vec![t.as_str().to_string(), summary(t.description()).to_string()])
                .collect();
            print_table(&["Tool", "Description"], rows);
        }
    }
    print_hint(&format!("{} of {} tools", tools.len(), ToolName::ALL.len()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_tools_filters_by_name_and_description() {
        assert_eq!(matching_tools(None).len(), ToolName::ALL.len());
        let notes = matching_tools(Some("NOTE"));
        assert!(notes.contains(&ToolName::AddOffenseNote));
        assert!(notes.contains(&ToolName::GetOffenseNotes));
        assert!(matching_tools(Some("no-such-tool-text")).is_empty());
    }

    #[test]
    fn test_summary_takes_first_sentence() {
        assert_eq!(summary("Get users. Shows all."), "Get users.");
        assert_eq!(summary("Single sentence"), "Single sentence");
    }
}
