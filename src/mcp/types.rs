use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::client::{ListFilter, OffenseStatus};
use crate::search::{SearchOptions, DEFAULT_MAX_WAIT_SECS, DEFAULT_POLL_TIMEOUT_SECS};

/// Default number of events for `qradar_get_recent_events`.
pub const DEFAULT_EVENT_LIMIT: u32 = 50;

/// Maximum allowed event limit (prevents unbounded queries).
pub const MAX_EVENT_LIMIT: u32 = 10_000;

fn default_timeout() -> u64 {
    DEFAULT_POLL_TIMEOUT_SECS
}

fn default_max_wait() -> u64 {
    DEFAULT_MAX_WAIT_SECS
}

fn default_limit() -> u32 {
    DEFAULT_EVENT_LIMIT
}

fn default_database() -> String {
    "events".to_string()
}

/// Accept identifiers given either as strings or as bare numbers.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "invalid type: {}, expected a string or number",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Tools without arguments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NoArgs {}

/// AQL search against events or flows.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchArgs {
    /// AQL query string
    pub query: String,
    /// Per-request timeout in seconds for each status poll
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Maximum time to wait for results in seconds
    #[serde(default = "default_max_wait")]
    pub max_wait: u64,
}

impl SearchArgs {
    pub fn options(&self) -> SearchOptions {
        SearchOptions::from_secs(self.timeout.max(1), self.max_wait)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecentEventsArgs {
    /// Maximum number of events to return
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Fields to return (e.g. ["sourceip", "destinationip", "username"])
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

/// Common `filter` / `fields` arguments of list tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListArgs {
    /// QRadar filter expression (e.g. "enabled=true")
    #[serde(default)]
    pub filter: Option<String>,
    /// Comma-separated list of fields to return
    #[serde(default)]
    pub fields: Option<String>,
}

impl From<ListArgs> for ListFilter {
    fn from(args: ListArgs) -> Self {
        ListFilter {
            filter: args.filter,
            fields: args.fields,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct OffensesArgs {
    /// Filter expression (e.g. "status=OPEN" or "severity >= 7")
    #[serde(default)]
    pub filter: Option<String>,
    /// Comma-separated list of fields to return
    #[serde(default)]
    pub fields: Option<String>,
    /// Item range to return (e.g. "0-49" for the first 50 offenses)
    #[serde(default)]
    pub range: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FilterArgs {
    /// QRadar filter expression (e.g. "enabled=true")
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OffenseIdArgs {
    /// The offense ID
    pub offense_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LogSourceIdArgs {
    /// The log source ID
    pub log_source_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RuleIdArgs {
    /// The rule ID
    pub rule_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PropertyIdArgs {
    /// The custom property ID
    pub property_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DomainIdArgs {
    /// The domain ID
    pub domain_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BlockIdArgs {
    /// The building block ID
    pub block_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UserIdArgs {
    /// The user ID
    pub user_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IpAddressArgs {
    /// IP address to search for
    pub ip_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReferenceSetArgs {
    /// Name of the reference set
    pub ref_set_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SavedSearchIdArgs {
    /// The saved search ID
    #[serde(deserialize_with = "id_string")]
    #[schemars(with = "String")]
    pub search_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteSavedSearchArgs {
    /// The saved search ID to execute
    #[serde(deserialize_with = "id_string")]
    #[schemars(with = "String")]
    pub search_id: String,
    /// Per-request timeout in seconds for each status poll
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Maximum time to wait for results in seconds
    #[serde(default = "default_max_wait")]
    pub max_wait: u64,
}

impl ExecuteSavedSearchArgs {
    pub fn options(&self) -> SearchOptions {
        SearchOptions::from_secs(self.timeout.max(1), self.max_wait)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddNoteArgs {
    /// The offense ID
    pub offense_id: u64,
    /// The note text to add
    pub note_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UpdateOffenseStatusArgs {
    /// The offense ID
    pub offense_id: u64,
    /// New status
    pub status: OffenseStatus,
    /// Closing reason ID (required when status is CLOSED)
    #[serde(default)]
    pub closing_reason_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AssignOffenseArgs {
    /// The offense ID
    pub offense_id: u64,
    /// Username to assign the offense to
    pub assigned_to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ArielFieldsArgs {
    /// Database name (events or flows)
    #[serde(default = "default_database")]
    pub database_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategorySearchArgs {
    /// Term to search for in category names
    pub search_term: String,
}

/// One tool invocation: a catalog name plus its argument bag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl ToolRequest {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Uniform outcome of every tool call.
///
/// On failure `data` holds `{error, error_code, suggestion}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub success: bool,
    pub message: String,
    pub data: Value,
}

impl ToolResponse {
    pub fn success(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }

    pub fn failure(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: false,
            message: message.into(),
            data,
        }
    }

    /// Pretty-printed JSON, the form handed to MCP clients and the chat model.
    pub fn to_text(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.message.clone())
    }
}
