//! Connectivity and permission check against the configured console.

use anyhow::{anyhow, Result};
use colored::Colorize;
use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::output::{
    output_json, print_header, print_hint, print_kv, print_success, print_table, spinner,
    OutputMode,
};
use crate::client::ListFilter;
use crate::init::AppContext;
use crate::mcp::error::ToolError;
use crate::QRadarError;

/// Result of probing one endpoint with the configured token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Probe {
    Accessible { count: usize },
    Forbidden,
    Failed { error: String },
}

impl Probe {
    pub fn from_result(result: Result<Vec<Value>, QRadarError>) -> Self {
        match result {
            Ok(records) => Probe::Accessible {
                count: records.len(),
            },
            Err(err) if err.status() == Some(403) => Probe::Forbidden,
            Err(err) => Probe::Failed {
                error: err.to_string(),
            },
        }
    }

    fn is_accessible(&self) -> bool {
        matches!(self, Probe::Accessible { .. })
    }

    fn describe(&self) -> String {
        match self {
            Probe::Accessible { count } => format!("{} {}", "accessible".green(), count),
            Probe::Forbidden => "no permission".yellow().to_string(),
            Probe::Failed { error } => {
                let short: String = error.chars().take(100).collect();
                format!("{} {}", "error".red(), short)
            }
        }
    }
}

#[derive(Serialize)]
struct ProbeJson {
    endpoint: &'static str,
    #[serde(flatten)]
    probe: Probe,
}

fn text_field<'a>(info: &'a Value, key: &str) -> &'a str {
    info.get(key).and_then(Value::as_str).unwrap_or("unknown")
}

async fn run_probes(ctx: &AppContext) -> Vec<(&'static str, Probe)> {
    let client = &ctx.client;
    let none = ListFilter::default();
    vec![
        (
            "log sources",
            Probe::from_result(client.log_sources(&none).await),
        ),
        (
            "offenses",
            Probe::from_result(client.offenses(&none, Some("0-4")).await),
        ),
        ("assets", Probe::from_result(client.assets(&none).await)),
        ("rules", Probe::from_result(client.rules(&none).await)),
    ]
}

pub async fn handle_check(ctx: &AppContext, mode: OutputMode) -> Result<()> {
    let bar = spinner(&format!("Contacting {}", ctx.qradar.base_url()));
    // /system/about needs extra capabilities on some tokens; 403 is tolerated.
    let info = match ctx.client.system_info().await {
        Ok(info) => Some(info),
        Err(err) if err.status() == Some(403) => None,
        Err(err) => {
            bar.finish_and_clear();
            let details = ToolError::from(&err);
            return Err(anyhow!(
                "{} ({})\n  {}",
                err,
                details.error_code,
                details.suggestion
            ));
        }
    };
    bar.set_message("Probing endpoints");
    let probes = run_probes(ctx).await;
    bar.finish_and_clear();

    let total = probes.len();
    let accessible = probes.iter().filter(|(_, p)| p.is_accessible()).count();

    if mode == OutputMode::Json {
        let endpoints: Vec<ProbeJson> = probes
            .into_iter()
            .map(|(endpoint, probe)| ProbeJson { endpoint, probe })
            .collect();
        output_json(&json!({
            "base_url": ctx.qradar.base_url(),
            "api_version": ctx.qradar.api_version,
            "verify_ssl": ctx.qradar.verify_ssl,
            "system_info": info,
            "endpoints": endpoints,
        }));
    } else {
        print_header("QRadar console");
        print_kv("API", &ctx.qradar.base_url());
        print_kv("API version", &ctx.qradar.api_version);
        match &info {
            Some(info) => {
                print_kv("Version", text_field(info, "external_version"));
                print_kv("Release", text_field(info, "release_name"));
                print_kv("Console", text_field(info, "console_hostname"));
            }
            None => print_hint("  System information needs additional permissions"),
        }
        print_kv(
            "TLS verification",
            if ctx.qradar.verify_ssl { "on" } else { "off" },
        );
        println!();
        let rows = probes
            .iter()
            .map(|(endpoint, probe)| vec![endpoint.to_string(), probe.describe()])
            .collect();
        print_table(&["Endpoint", "Result"], rows);
    }

    if accessible == 0 && info.is_none() {
        anyhow::bail!("No endpoint is accessible with this token");
    }
    if mode == OutputMode::Human {
        print_success(&format!("{}/{} endpoints accessible", accessible, total));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_probe_classification() {
        assert_eq!(
            Probe::from_result(Ok(vec![json!({}), json!({})])),
            Probe::Accessible { count: 2 }
        );
        let forbidden = QRadarError::RemoteRequest {
            status: 403,
            body: json!({"message": "insufficient capabilities"}),
        };
        assert_eq!(Probe::from_result(Err(forbidden)), Probe::Forbidden);
        assert!(matches!(
            Probe::from_result(Err(QRadarError::Transport("refused".into()))),
            Probe::Failed { .. }
        ));
    }

    #[test]
    fn test_probe_json_shape() {
        let value = serde_json::to_value(ProbeJson {
            endpoint: "rules",
            probe: Probe::Accessible { count: 3 },
        })
        .unwrap();
        assert_eq!(value, json!({"endpoint": "rules", "status": "accessible", "count": 3}));
    }
}
