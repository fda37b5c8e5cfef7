use std::time::Duration;

use thiserror::Error;

/// Error type for QRadar operations.
#[derive(Debug, Error)]
pub enum QRadarError {
    /// Search creation did not yield a search identifier.
    #[error("Failed to create search - no search_id returned")]
    Submission,

    /// The remote service reported that the search failed.
    #[error("Search {search_id} failed: {}", format_messages(.messages))]
    QueryExecution {
        search_id: String,
        messages: Vec<String>,
    },

    /// The search was canceled, remotely or by the caller.
    #[error("Search {search_id} was canceled ({reason})")]
    QueryCanceled { search_id: String, reason: String },

    /// The local wait budget ran out before the search completed.
    #[error("Search {search_id} timed out after {} seconds", .max_wait.as_secs())]
    QueryTimeout {
        search_id: String,
        max_wait: Duration,
    },

    /// A saved search has no stored AQL to execute.
    #[error("Saved search {search_id} does not have an AQL query")]
    MissingQuery { search_id: String },

    /// The remote API answered with a non-success status.
    #[error("QRadar API request failed with status {status}: {body}")]
    RemoteRequest {
        status: u16,
        body: serde_json::Value,
    },

    /// The request never produced an HTTP response (connect, TLS, timeout).
    #[error("QRadar API request failed: {0}")]
    Transport(String),

    /// Dispatch received a tool name outside the catalog.
    #[error("Unknown tool: {0}")]
    UnknownOperation(String),

    /// Tool arguments failed schema checks.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The local language model endpoint failed.
    #[error("LLM error: {0}")]
    Llm(String),
}

fn format_messages(messages: &[String]) -> String {
    if messages.is_empty() {
        "no error messages reported".to_string()
    } else {
        messages.join("; ")
    }
}

impl QRadarError {
    /// Stable machine-readable code, used in tool envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            QRadarError::Submission => "SUBMISSION_FAILED",
            QRadarError::QueryExecution { .. } => "QUERY_FAILED",
            QRadarError::QueryCanceled { .. } => "QUERY_CANCELED",
            QRadarError::QueryTimeout { .. } => "QUERY_TIMEOUT",
            QRadarError::MissingQuery { .. } => "MISSING_QUERY",
            QRadarError::RemoteRequest { .. } => "REMOTE_ERROR",
            QRadarError::Transport(_) => "TRANSPORT_ERROR",
            QRadarError::UnknownOperation(_) => "UNKNOWN_TOOL",
            QRadarError::Validation(_) => "VALIDATION_ERROR",
            QRadarError::Config(_) => "CONFIG_ERROR",
            QRadarError::Llm(_) => "LLM_ERROR",
        }
    }

    /// HTTP status of a remote failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            QRadarError::RemoteRequest { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for QRadarError {
    fn from(err: reqwest::Error) -> Self {
        QRadarError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for QRadarError {
    fn from(err: serde_json::Error) -> Self {
        QRadarError::Transport(format!("JSON serialization error: {}", err))
    }
}

impl From<std::io::Error> for QRadarError {
    fn from(err: std::io::Error) -> Self {
        QRadarError::Config(format!("I/O error: {}", err))
    }
}
