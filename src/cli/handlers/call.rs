//! One-off tool execution from the command line.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use indicatif::ProgressBar;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::cli::output::{output_json, print_records, print_success, spinner, OutputMode};
use crate::init::AppContext;
use crate::mcp::ToolRequest;
use crate::progress::ProgressReporter;
use crate::search::SearchContext;

/// Mirrors search progress onto the CLI spinner.
struct SpinnerProgress {
    bar: ProgressBar,
}

#[async_trait]
impl ProgressReporter for SpinnerProgress {
    async fn report(&self, current: f64, total: f64, message: Option<String>) {
        let percent = if total > 0.0 {
            (current / total * 100.0).round()
        } else {
            0.0
        };
        let text = message.unwrap_or_else(|| "Waiting for QRadar".to_string());
        self.bar.set_message(format!("{} ({}%)", text, percent));
    }
}

/// Merge `--args` JSON with `--set key=value` pairs. Values that parse as
/// JSON keep their type; the rest are strings.
pub fn build_arguments(args_json: &str, set_pairs: &[(String, String)]) -> Result<Value> {
    let mut value: Value =
        serde_json::from_str(args_json).map_err(|e| anyhow!("Invalid --args JSON: {}", e))?;
    let map = value
        .as_object_mut()
        .ok_or_else(|| anyhow!("--args must be a JSON object"))?;
    for (key, raw) in set_pairs {
        let parsed = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()));
        map.insert(key.clone(), parsed);
    }
    Ok(value)
}

pub async fn handle_call(
    ctx: &AppContext,
    tool: &str,
    args_json: &str,
    set_pairs: &[(String, String)],
    mode: OutputMode,
) -> Result<()> {
    let arguments = build_arguments(args_json, set_pairs)?;

    let bar = spinner(&format!("Running {}", tool));
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };
    let search_ctx = SearchContext::new(
        cancel,
        Arc::new(SpinnerProgress { bar: bar.clone() }),
    );

    let response = ctx
        .gateway
        .dispatch(ToolRequest::new(tool, arguments), &search_ctx)
        .await;
    watcher.abort();
    bar.finish_and_clear();

    if mode == OutputMode::Json {
        output_json(&response);
        if !response.success {
            anyhow::bail!("{}", response.message);
        }
        return Ok(());
    }

    if !response.success {
        let suggestion = response
            .data
            .get("suggestion")
            .and_then(Value::as_str)
            .unwrap_or_default();
        anyhow::bail!("{}\n  {}", response.message, suggestion);
    }

    print_success(&response.message);
    match &response.data {
        Value::Array(records) => print_records(records),
        other => output_json(other),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_arguments_merges_set_pairs() {
        let args = build_arguments(
            r#"{"filter": "status=OPEN"}"#,
            &[
                ("range".into(), "0-9".into()),
                ("offense_id".into(), "42".into()),
            ],
        )
        .unwrap();
        assert_eq!(
            args,
            json!({"filter": "status=OPEN", "range": "0-9", "offense_id": 42})
        );
    }

    #[test]
    fn test_build_arguments_rejects_non_objects() {
        assert!(build_arguments("[1, 2]", &[]).is_err());
        assert!(build_arguments("{not json", &[]).is_err());
    }
}
