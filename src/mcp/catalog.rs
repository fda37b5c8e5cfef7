//! The fixed tool catalog exposed to agents.
//!
//! Each entry ties a stable name to a description and to the argument type
//! used both for the advertised JSON Schema and for validating calls.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rmcp::model::{JsonObject, Tool};
use schemars::JsonSchema;
use serde_json::Value;

use super::types::*;
use crate::QRadarError;

/// Minimum similarity for a "did you mean" hint on unknown names.
const SUGGESTION_THRESHOLD: f64 = 0.7;

fn schema_for<T: JsonSchema>() -> Arc<JsonObject> {
    let schema = schemars::schema_for!(T);
    match serde_json::to_value(&schema) {
        Ok(Value::Object(mut object)) => {
            object.remove("$schema");
            Arc::new(object)
        }
        _ => Arc::new(JsonObject::new()),
    }
}

macro_rules! tool_catalog {
    ($( $variant:ident => $name:literal, $args:ty, $description:literal; )+) => {
        /// Every tool the gateway can dispatch.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ToolName {
            $( $variant, )+
        }

        impl ToolName {
            pub const ALL: &'static [ToolName] = &[ $( ToolName::$variant, )+ ];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( ToolName::$variant => $name, )+
                }
            }

            pub fn description(&self) -> &'static str {
                match self {
                    $( ToolName::$variant => $description, )+
                }
            }

            /// JSON Schema of the tool's arguments.
            pub fn input_schema(&self) -> Arc<JsonObject> {
                match self {
                    $( ToolName::$variant => schema_for::<$args>(), )+
                }
            }
        }
    };
}

tool_catalog! {
    SearchEvents => "qradar_search_events", SearchArgs,
        "Search QRadar events using AQL (Ariel Query Language). Use this to query security events with custom AQL queries. Example query: 'SELECT sourceip, destinationip, username FROM events WHERE eventcount > 10 LAST 24 HOURS'";
    GetRecentEvents => "qradar_get_recent_events", RecentEventsArgs,
        "Get recent events from QRadar. Returns the most recent security events. You can specify the number of events and which fields to return.";
    SearchFlows => "qradar_search_flows", SearchArgs,
        "Search network flows using AQL. Use this to query network traffic data. Example query: 'SELECT sourceip, destinationip, sourceport, destinationport FROM flows LAST 1 HOURS'";
    GetOffenses => "qradar_get_offenses", OffensesArgs,
        "Get offenses (security incidents) from QRadar. Offenses are collections of events that QRadar has determined may require investigation. You can filter by status, time range, and other criteria.";
    GetOffenseById => "qradar_get_offense_by_id", OffenseIdArgs,
        "Get detailed information about a specific offense by its ID";
    GetLogSources => "qradar_get_log_sources", ListArgs,
        "Get log sources (agents/collectors) from QRadar. Log sources are the systems sending security data to QRadar (firewalls, servers, applications, etc.)";
    GetLogSourceById => "qradar_get_log_source_by_id", LogSourceIdArgs,
        "Get detailed information about a specific log source by its ID";
    GetLogSourceTypes => "qradar_get_log_source_types", NoArgs,
        "Get available log source types. This shows what types of systems QRadar can collect logs from (e.g., Cisco ASA, Windows, Linux).";
    GetAssets => "qradar_get_assets", ListArgs,
        "Get assets from QRadar. Assets are hosts, servers, and devices that QRadar has discovered on your network.";
    SearchAssetsByIp => "qradar_search_assets_by_ip", IpAddressArgs,
        "Search for assets by IP address";
    GetReferenceSets => "qradar_get_reference_sets", NoArgs,
        "Get reference data sets. Reference sets are lists of data (IPs, domains, etc.) used in QRadar rules and for threat intelligence.";
    GetReferenceSetData => "qradar_get_reference_set_data", ReferenceSetArgs,
        "Get data from a specific reference set by name";
    GetSystemInfo => "qradar_get_system_info", NoArgs,
        "Get QRadar system information (version, license, etc.)";
    GetServers => "qradar_get_servers", NoArgs,
        "Get QRadar servers/hosts information";
    GetRules => "qradar_get_rules", ListArgs,
        "Get analytics rules from QRadar. Rules define how QRadar processes and correlates events to detect security threats.";
    GetRuleById => "qradar_get_rule_by_id", RuleIdArgs,
        "Get detailed information about a specific rule by its ID";
    GetSavedSearches => "qradar_get_saved_searches", NoArgs,
        "Get all saved Ariel searches. Saved searches are pre-defined AQL queries that can be reused for common investigations.";
    GetSavedSearchById => "qradar_get_saved_search_by_id", SavedSearchIdArgs,
        "Get details of a specific saved search by its ID";
    ExecuteSavedSearch => "qradar_execute_saved_search", ExecuteSavedSearchArgs,
        "Execute a saved search by ID. This will run the pre-configured AQL query and return the results.";
    GetOffenseNotes => "qradar_get_offense_notes", OffenseIdArgs,
        "Get all notes/annotations for a specific offense. Notes provide context and investigation details about security incidents.";
    AddOffenseNote => "qradar_add_offense_note", AddNoteArgs,
        "Add a note/annotation to an offense. Use this to document investigation findings, actions taken, or analysis results.";
    UpdateOffenseStatus => "qradar_update_offense_status", UpdateOffenseStatusArgs,
        "Update the status of an offense (OPEN, HIDDEN, CLOSED). When closing an offense, a closing reason ID must be provided.";
    GetClosingReasons => "qradar_get_closing_reasons", NoArgs,
        "Get available offense closing reasons. Use these IDs when closing offenses.";
    AssignOffense => "qradar_assign_offense", AssignOffenseArgs,
        "Assign an offense to a specific user for investigation. This helps with workload distribution and tracking.";
    GetCustomProperties => "qradar_get_custom_properties", NoArgs,
        "Get all custom properties defined in QRadar. Custom properties are user-defined fields for events, flows, and offenses.";
    GetCustomPropertyById => "qradar_get_custom_property_by_id", PropertyIdArgs,
        "Get details of a specific custom property by its ID";
    GetDomains => "qradar_get_domains", NoArgs,
        "Get all domains configured in QRadar. Domains are used for multi-tenancy to segregate data and users.";
    GetDomainById => "qradar_get_domain_by_id", DomainIdArgs,
        "Get details of a specific domain by its ID";
    GetNetworkHierarchy => "qradar_get_network_hierarchy", NoArgs,
        "Get network hierarchy configuration. This shows how network segments and objects are organized in QRadar.";
    GetArielDatabases => "qradar_get_ariel_databases", NoArgs,
        "Get available Ariel databases (events, flows). This helps understand what data sources are available for querying.";
    GetArielFields => "qradar_get_ariel_fields", ArielFieldsArgs,
        "Get available fields for Ariel queries. This is useful for building AQL queries by knowing what fields can be queried.";
    GetEventCategories => "qradar_get_event_categories", NoArgs,
        "Get all event categories. Categories classify events by type (authentication, network activity, malware, etc.).";
    SearchEventCategories => "qradar_search_event_categories", CategorySearchArgs,
        "Search event categories by name. Useful for finding the right category ID to use in AQL queries.";
    GetBuildingBlocks => "qradar_get_building_blocks", FilterArgs,
        "Get building blocks. Building blocks are reusable rule components that can be used to create complex detection rules.";
    GetBuildingBlockById => "qradar_get_building_block_by_id", BlockIdArgs,
        "Get detailed information about a specific building block by its ID";
    GetUsers => "qradar_get_users", NoArgs,
        "Get all QRadar users. This shows who has access to the system and can be used for offense assignment.";
    GetUserById => "qradar_get_user_by_id", UserIdArgs,
        "Get details of a specific user by their ID";
    GetReports => "qradar_get_reports", NoArgs,
        "Get all available reports and applications in QRadar. This shows installed apps and report templates.";
}

/// Grouping used for help output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToolCategory {
    Offenses,
    Search,
    LogSources,
    Assets,
    Rules,
    System,
}

impl ToolCategory {
    pub const ALL: &'static [ToolCategory] = &[
        ToolCategory::Offenses,
        ToolCategory::Search,
        ToolCategory::LogSources,
        ToolCategory::Assets,
        ToolCategory::Rules,
        ToolCategory::System,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ToolCategory::Offenses => "Offenses",
            ToolCategory::Search => "Searches & Ariel",
            ToolCategory::LogSources => "Log sources & properties",
            ToolCategory::Assets => "Assets & reference data",
            ToolCategory::Rules => "Rules & building blocks",
            ToolCategory::System => "System",
        }
    }
}

impl ToolName {
    /// MCP tool descriptor.
    pub fn to_tool(&self) -> Tool {
        Tool::new(self.as_str(), self.description(), self.input_schema())
    }

    pub fn category(&self) -> ToolCategory {
        use ToolName::*;
        match self {
            GetOffenses | GetOffenseById | GetOffenseNotes | AddOffenseNote
            | UpdateOffenseStatus | GetClosingReasons | AssignOffense => ToolCategory::Offenses,
            SearchEvents | GetRecentEvents | SearchFlows | GetSavedSearches
            | GetSavedSearchById | ExecuteSavedSearch | GetArielDatabases | GetArielFields
            | GetEventCategories | SearchEventCategories => ToolCategory::Search,
            GetLogSources | GetLogSourceById | GetLogSourceTypes | GetCustomProperties
            | GetCustomPropertyById => ToolCategory::LogSources,
            GetAssets | SearchAssetsByIp | GetReferenceSets | GetReferenceSetData => {
                ToolCategory::Assets
            }
            GetRules | GetRuleById | GetBuildingBlocks | GetBuildingBlockById => {
                ToolCategory::Rules
            }
            GetSystemInfo | GetServers | GetDomains | GetDomainById | GetNetworkHierarchy
            | GetUsers | GetUserById | GetReports => ToolCategory::System,
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = QRadarError;

    /// Exact, case-sensitive lookup.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .iter()
            .find(|tool| tool.as_str() == name)
            .copied()
            .ok_or_else(|| QRadarError::UnknownOperation(name.to_string()))
    }
}

/// All catalog entries as MCP tool descriptors.
pub fn all_tools() -> Vec<Tool> {
    ToolName::ALL.iter().map(ToolName::to_tool).collect()
}

/// Closest catalog name to `name`, if any is similar enough.
///
/// Also tries the `qradar_`-prefixed form so bare names like `get_offenses`
/// still resolve.
pub fn closest_tool(name: &str) -> Option<ToolName> {
    use rapidfuzz::distance::levenshtein;

    let needle = name.to_lowercase();
    let prefixed = format!("qradar_{}", needle);

    ToolName::ALL
        .iter()
        .map(|tool| {
            let candidate = tool.as_str();
            let score = levenshtein::normalized_similarity(needle.chars(), candidate.chars())
                .max(levenshtein::normalized_similarity(
                    prefixed.chars(),
                    candidate.chars(),
                ));
            (*tool, score)
        })
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(tool, _)| tool)
}
