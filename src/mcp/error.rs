use serde::Serialize;

use super::catalog::closest_tool;
use crate::QRadarError;

/// Failure payload carried in the `data` field of a failed tool call.
/// Provides error_code + suggestion so calling models can self-correct.
#[derive(Debug, Clone, Serialize)]
pub struct ToolError {
    pub error: String,
    pub error_code: String,
    pub suggestion: String,
}

fn remote_suggestion(status: u16) -> &'static str {
    match status {
        401 | 403 => "Check the API token and that its security profile allows this endpoint.",
        404 => "Check the identifier. List the resource first to find valid IDs.",
        409 => "The resource changed concurrently. Fetch it again and retry.",
        400 | 422 => "Check filter syntax and parameter values.",
        429 => "QRadar is rate limiting requests. Wait before retrying.",
        _ => "QRadar returned an error. Retry later or check the console logs.",
    }
}

impl From<&QRadarError> for ToolError {
    fn from(err: &QRadarError) -> Self {
        let suggestion = match err {
            QRadarError::Submission => {
                "QRadar did not accept the search. Check the AQL syntax.".to_string()
            }
            QRadarError::QueryExecution { .. } => {
                "Fix the AQL query. Use qradar_get_ariel_fields to list valid field names."
                    .to_string()
            }
            QRadarError::QueryCanceled { .. } => {
                "The search was canceled. Run it again if results are still needed.".to_string()
            }
            QRadarError::QueryTimeout { .. } => {
                "Narrow the time range (e.g. LAST 1 HOURS), add a LIMIT or raise max_wait."
                    .to_string()
            }
            QRadarError::MissingQuery { .. } => {
                "Pick a saved search that has an AQL query, or run the query with qradar_search_events."
                    .to_string()
            }
            QRadarError::RemoteRequest { status, .. } => remote_suggestion(*status).to_string(),
            QRadarError::Transport(_) => {
                "Check connectivity to the QRadar console and the TLS settings.".to_string()
            }
            QRadarError::UnknownOperation(name) => match closest_tool(name) {
                Some(tool) => format!("Did you mean '{}'? List tools to see all names.", tool),
                None => "List tools to see the available names.".to_string(),
            },
            QRadarError::Validation(_) => {
                "Check required arguments and types against the tool's input schema.".to_string()
            }
            QRadarError::Config(_) => {
                "Set QRADAR_HOST and QRADAR_API_TOKEN, or add them to config.toml.".to_string()
            }
            QRadarError::Llm(_) => "Check that Ollama is running and the model is pulled.".to_string(),
        };

        ToolError {
            error: err.to_string(),
            error_code: err.code().to_string(),
            suggestion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_unknown_tool_suggests_closest_name() {
        let err = ToolError::from(&QRadarError::UnknownOperation("qradar_get_offense".into()));
        assert_eq!(err.error_code, "UNKNOWN_TOOL");
        assert!(err.suggestion.contains("qradar_get_offenses"));
    }

    #[test]
    fn test_timeout_suggestion() {
        let err = ToolError::from(&QRadarError::QueryTimeout {
            search_id: "s".into(),
            max_wait: Duration::from_secs(5),
        });
        assert_eq!(err.error_code, "QUERY_TIMEOUT");
        assert!(err.suggestion.contains("max_wait"));
    }

    #[test]
    fn test_remote_suggestion_by_status() {
        let err = ToolError::from(&QRadarError::RemoteRequest {
            status: 401,
            body: serde_json::json!({"message": "Unauthorized"}),
        });
        assert_eq!(err.error_code, "REMOTE_ERROR");
        assert!(err.suggestion.contains("API token"));
    }

    #[test]
    fn test_serializes_envelope_fields() {
        let json = serde_json::to_value(ToolError::from(&QRadarError::Submission)).unwrap();
        assert_eq!(json["error_code"], "SUBMISSION_FAILED");
        assert!(json["error"].as_str().unwrap().contains("no search_id"));
        assert!(json["suggestion"].is_string());
    }
}
