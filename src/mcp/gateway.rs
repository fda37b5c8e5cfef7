use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::catalog::ToolName;
use super::error::ToolError;
use super::types::*;
use crate::client::{ListFilter, OffenseStatus, QRadarClient};
use crate::search::{SearchContext, SearchResult};
use crate::QRadarError;

/// Single entry point from tool calls into the resource client.
///
/// `dispatch` never fails: every error, including unknown names and bad
/// arguments, comes back as a `ToolResponse` with `success = false`.
#[derive(Clone)]
pub struct ToolGateway {
    client: QRadarClient,
}

/// Message and payload of a successful call.
type Outcome = (String, Value);

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, QRadarError> {
    let arguments = match arguments {
        Value::Null => Value::Object(serde_json::Map::new()),
        object @ Value::Object(_) => object,
        _ => {
            return Err(QRadarError::Validation(
                "arguments must be a JSON object".into(),
            ))
        }
    };
    serde_json::from_value(arguments).map_err(|e| QRadarError::Validation(e.to_string()))
}

fn require_non_empty(field: &str, value: &str) -> Result<(), QRadarError> {
    if value.trim().is_empty() {
        return Err(QRadarError::Validation(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

fn listed(items: Vec<Value>, message: String) -> Outcome {
    (message, Value::Array(items))
}

fn single<T: Serialize>(value: T, message: String) -> Result<Outcome, QRadarError> {
    Ok((message, serde_json::to_value(value)?))
}

fn searched(result: SearchResult, noun: &str, verb: &str) -> Result<Outcome, QRadarError> {
    let message = format!("{} {} {}", verb, result.record_count(), noun);
    single(result, message)
}

impl ToolGateway {
    pub fn new(client: QRadarClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &QRadarClient {
        &self.client
    }

    /// Run one tool call and envelope the outcome.
    #[instrument(name = "mcp.dispatch", skip_all, fields(tool = %request.name))]
    pub async fn dispatch(&self, request: ToolRequest, ctx: &SearchContext) -> ToolResponse {
        let name = request.name.clone();
        match self.execute(request, ctx).await {
            Ok((message, data)) => {
                info!(tool = %name, "{}", message);
                ToolResponse::success(message, data)
            }
            Err(err) => {
                warn!(tool = %name, error_code = err.code(), error = %err, "Tool call failed");
                let data = serde_json::to_value(ToolError::from(&err)).unwrap_or(Value::Null);
                ToolResponse::failure(format!("Error executing {}: {}", name, err), data)
            }
        }
    }

    async fn execute(
        &self,
        request: ToolRequest,
        ctx: &SearchContext,
    ) -> Result<Outcome, QRadarError> {
        let tool: ToolName = request.name.parse()?;
        let args = request.arguments;
        let client = &self.client;

        match tool {
            // Searches
            ToolName::SearchEvents => {
                let a: SearchArgs = parse_args(args)?;
                let result = client.search_events(&a.query, &a.options(), ctx).await?;
                searched(result, "events", "Found")
            }
            ToolName::GetRecentEvents => {
                let a: RecentEventsArgs = parse_args(args)?;
                if a.limit == 0 || a.limit > MAX_EVENT_LIMIT {
                    return Err(QRadarError::Validation(format!(
                        "limit must be between 1 and {}",
                        MAX_EVENT_LIMIT
                    )));
                }
                let result = client
                    .recent_events(a.limit, a.fields.as_deref(), &Default::default(), ctx)
                    .await?;
                searched(result, "events", "Retrieved")
            }
            ToolName::SearchFlows => {
                let a: SearchArgs = parse_args(args)?;
                let result = client.search_flows(&a.query, &a.options(), ctx).await?;
                searched(result, "flows", "Found")
            }

            // Offenses
            ToolName::GetOffenses => {
                let a: OffensesArgs = parse_args(args)?;
                let filter = ListFilter {
                    filter: a.filter,
                    fields: a.fields,
                };
                let items = client.offenses(&filter, a.range.as_deref()).await?;
                let message = format!("Retrieved {} offenses", items.len());
                Ok(listed(items, message))
            }
            ToolName::GetOffenseById => {
                let a: OffenseIdArgs = parse_args(args)?;
                let offense = client.offense(a.offense_id).await?;
                single(offense, format!("Retrieved offense {}", a.offense_id))
            }
            ToolName::GetOffenseNotes => {
                let a: OffenseIdArgs = parse_args(args)?;
                let items = client.offense_notes(a.offense_id).await?;
                let message = format!(
                    "Retrieved {} notes for offense {}",
                    items.len(),
                    a.offense_id
                );
                Ok(listed(items, message))
            }
            ToolName::AddOffenseNote => {
                let a: AddNoteArgs = parse_args(args)?;
                require_non_empty("note_text", &a.note_text)?;
                let note = client.add_offense_note(a.offense_id, &a.note_text).await?;
                single(note, format!("Added note to offense {}", a.offense_id))
            }
            ToolName::UpdateOffenseStatus => {
                let a: UpdateOffenseStatusArgs = parse_args(args)?;
                if a.status == OffenseStatus::Closed && a.closing_reason_id.is_none() {
                    return Err(QRadarError::Validation(
                        "closing_reason_id is required when status is CLOSED".into(),
                    ));
                }
                let offense = client
                    .update_offense_status(a.offense_id, a.status, a.closing_reason_id)
                    .await?;
                single(
                    offense,
                    format!("Updated offense {} status to {}", a.offense_id, a.status),
                )
            }
            ToolName::GetClosingReasons => {
                let _: NoArgs = parse_args(args)?;
                let items = client.closing_reasons().await?;
                let message = format!("Retrieved {} closing reasons", items.len());
                Ok(listed(items, message))
            }
            ToolName::AssignOffense => {
                let a: AssignOffenseArgs = parse_args(args)?;
                require_non_empty("assigned_to", &a.assigned_to)?;
                let offense = client.assign_offense(a.offense_id, &a.assigned_to).await?;
                single(
                    offense,
                    format!("Assigned offense {} to {}", a.offense_id, a.assigned_to),
                )
            }

            // Log sources
            ToolName::GetLogSources => {
                let a: ListArgs = parse_args(args)?;
                let items = client.log_sources(&a.into()).await?;
                let message = format!("Retrieved {} log sources", items.len());
                Ok(listed(items, message))
            }
            ToolName::GetLogSourceById => {
                let a: LogSourceIdArgs = parse_args(args)?;
                let source = client.log_source(a.log_source_id).await?;
                single(source, format!("Retrieved log source {}", a.log_source_id))
            }
            ToolName::GetLogSourceTypes => {
                let _: NoArgs = parse_args(args)?;
                let items = client.log_source_types().await?;
                let message = format!("Retrieved {} log source types", items.len());
                Ok(listed(items, message))
            }

            // Assets
            ToolName::GetAssets => {
                let a: ListArgs = parse_args(args)?;
                let items = client.assets(&a.into()).await?;
                let message = format!("Retrieved {} assets", items.len());
                Ok(listed(items, message))
            }
            ToolName::SearchAssetsByIp => {
                let a: IpAddressArgs = parse_args(args)?;
                require_non_empty("ip_address", &a.ip_address)?;
                let items = client.search_assets_by_ip(&a.ip_address).await?;
                let message = format!("Found {} assets with IP {}", items.len(), a.ip_address);
                Ok(listed(items, message))
            }

            // Reference data
            ToolName::GetReferenceSets => {
                let _: NoArgs = parse_args(args)?;
                let items = client.reference_sets().await?;
                let message = format!("Retrieved {} reference sets", items.len());
                Ok(listed(items, message))
            }
            ToolName::GetReferenceSetData => {
                let a: ReferenceSetArgs = parse_args(args)?;
                require_non_empty("ref_set_name", &a.ref_set_name)?;
                let set = client.reference_set(&a.ref_set_name).await?;
                single(
                    set,
                    format!("Retrieved data for reference set '{}'", a.ref_set_name),
                )
            }

            // System
            ToolName::GetSystemInfo => {
                let _: NoArgs = parse_args(args)?;
                single(
                    client.system_info().await?,
                    "Retrieved system information".to_string(),
                )
            }
            ToolName::GetServers => {
                let _: NoArgs = parse_args(args)?;
                let items = client.servers().await?;
                let message = format!("Retrieved {} servers", items.len());
                Ok(listed(items, message))
            }
            ToolName::GetDomains => {
                let _: NoArgs = parse_args(args)?;
                let items = client.domains().await?;
                let message = format!("Retrieved {} domains", items.len());
                Ok(listed(items, message))
            }
            ToolName::GetDomainById => {
                let a: DomainIdArgs = parse_args(args)?;
                let domain = client.domain(a.domain_id).await?;
                single(domain, format!("Retrieved domain {}", a.domain_id))
            }
            ToolName::GetNetworkHierarchy => {
                let _: NoArgs = parse_args(args)?;
                let items = client.network_hierarchy().await?;
                let message = format!("Retrieved {} network objects", items.len());
                Ok(listed(items, message))
            }
            ToolName::GetUsers => {
                let _: NoArgs = parse_args(args)?;
                let items = client.users().await?;
                let message = format!("Retrieved {} users", items.len());
                Ok(listed(items, message))
            }
            ToolName::GetUserById => {
                let a: UserIdArgs = parse_args(args)?;
                let user = client.user(a.user_id).await?;
                single(user, format!("Retrieved user {}", a.user_id))
            }
            ToolName::GetReports => {
                let _: NoArgs = parse_args(args)?;
                let items = client.reports().await?;
                let message = format!("Retrieved {} reports", items.len());
                Ok(listed(items, message))
            }

            // Rules
            ToolName::GetRules => {
                let a: ListArgs = parse_args(args)?;
                let items = client.rules(&a.into()).await?;
                let message = format!("Retrieved {} rules", items.len());
                Ok(listed(items, message))
            }
            ToolName::GetRuleById => {
                let a: RuleIdArgs = parse_args(args)?;
                let rule = client.rule(a.rule_id).await?;
                single(rule, format!("Retrieved rule {}", a.rule_id))
            }
            ToolName::GetBuildingBlocks => {
                let a: FilterArgs = parse_args(args)?;
                let filter = ListFilter {
                    filter: a.filter,
                    fields: None,
                };
                let items = client.building_blocks(&filter).await?;
                let message = format!("Retrieved {} building blocks", items.len());
                Ok(listed(items, message))
            }
            ToolName::GetBuildingBlockById => {
                let a: BlockIdArgs = parse_args(args)?;
                let block = client.building_block(a.block_id).await?;
                single(block, format!("Retrieved building block {}", a.block_id))
            }

            // Saved searches
            ToolName::GetSavedSearches => {
                let _: NoArgs = parse_args(args)?;
                let items = client.saved_searches().await?;
                let message = format!("Retrieved {} saved searches", items.len());
                Ok(listed(items, message))
            }
            ToolName::GetSavedSearchById => {
                let a: SavedSearchIdArgs = parse_args(args)?;
                require_non_empty("search_id", &a.search_id)?;
                let saved = client.saved_search(&a.search_id).await?;
                single(saved, format!("Retrieved saved search {}", a.search_id))
            }
            ToolName::ExecuteSavedSearch => {
                let a: ExecuteSavedSearchArgs = parse_args(args)?;
                require_non_empty("search_id", &a.search_id)?;
                let result = client
                    .execute_saved_search(&a.search_id, &a.options(), ctx)
                    .await?;
                let message = format!(
                    "Executed saved search {} ({} records)",
                    a.search_id,
                    result.record_count()
                );
                single(result, message)
            }

            // Custom properties
            ToolName::GetCustomProperties => {
                let _: NoArgs = parse_args(args)?;
                let items = client.custom_properties().await?;
                let message = format!("Retrieved {} custom properties", items.len());
                Ok(listed(items, message))
            }
            ToolName::GetCustomPropertyById => {
                let a: PropertyIdArgs = parse_args(args)?;
                let property = client.custom_property(a.property_id).await?;
                single(property, format!("Retrieved custom property {}", a.property_id))
            }

            // Ariel metadata
            ToolName::GetArielDatabases => {
                let _: NoArgs = parse_args(args)?;
                let items = client.ariel_databases().await?;
                let message = format!("Retrieved {} databases", items.len());
                Ok(listed(items, message))
            }
            ToolName::GetArielFields => {
                let a: ArielFieldsArgs = parse_args(args)?;
                require_non_empty("database_name", &a.database_name)?;
                let items = client.ariel_fields(&a.database_name).await?;
                let message = format!(
                    "Retrieved {} fields for {}",
                    items.len(),
                    a.database_name
                );
                Ok(listed(items, message))
            }
            ToolName::GetEventCategories => {
                let _: NoArgs = parse_args(args)?;
                let items = client.event_categories().await?;
                let message = format!("Retrieved {} event categories", items.len());
                Ok(listed(items, message))
            }
            ToolName::SearchEventCategories => {
                let a: CategorySearchArgs = parse_args(args)?;
                require_non_empty("search_term", &a.search_term)?;
                let items = client.search_event_categories(&a.search_term).await?;
                let message = format!("Found {} matching categories", items.len());
                Ok(listed(items, message))
            }
        }
    }
}
