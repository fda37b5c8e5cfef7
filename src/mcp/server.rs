use std::sync::Arc;

use rmcp::{
    model::*, service::RequestContext, ErrorData as McpError, RoleServer, ServerHandler,
    ServiceExt,
};
use serde_json::Value;
use tracing::instrument;

use crate::init::AppContext;
use crate::mcp::catalog::{all_tools, ToolName};
use crate::mcp::gateway::ToolGateway;
use crate::mcp::progress::make_mcp_progress;
use crate::mcp::types::ToolRequest;
use crate::search::SearchContext;

const INSTRUCTIONS: &str = r#"# QRadar SIEM

Read and triage data on an IBM QRadar console. Every tool answers with a JSON
envelope: {"success", "message", "data"}. On failure, data carries
{"error", "error_code", "suggestion"}.

## Investigating
- qradar_get_offenses: open incidents (filter "status=OPEN", range "0-49")
- qradar_get_offense_by_id, qradar_get_offense_notes: one incident in depth
- qradar_search_events / qradar_search_flows: AQL searches (may take minutes)
- qradar_get_recent_events: latest events without writing AQL
- qradar_execute_saved_search: run a stored AQL search

## Writing AQL
- qradar_get_ariel_databases, qradar_get_ariel_fields: what can be queried
- qradar_search_event_categories: category names and IDs

## Acting on offenses
- qradar_add_offense_note: record findings
- qradar_update_offense_status: CLOSED needs closing_reason_id
  (see qradar_get_closing_reasons)
- qradar_assign_offense: hand over to a user (see qradar_get_users)

## Inventory
Log sources, assets, reference sets, rules, building blocks, custom
properties, domains, network hierarchy, servers, users and apps each have
list and by-id tools.
"#;

/// MCP server exposing the QRadar tool catalog.
#[derive(Clone)]
pub struct QRadarServer {
    gateway: ToolGateway,
    tools: Arc<Vec<Tool>>,
}

impl QRadarServer {
    pub fn new(gateway: ToolGateway) -> Self {
        Self {
            gateway,
            tools: Arc::new(all_tools()),
        }
    }

    pub fn from_context(ctx: &AppContext) -> Self {
        Self::new(ctx.gateway.clone())
    }
}

impl ServerHandler for QRadarServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "qradar-mcp".to_string(),
                title: Some("QRadar SIEM".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.tools.as_ref().clone(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(name = "mcp.call_tool", skip_all, fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let progress = make_mcp_progress(&context.meta, &context.peer);
        let search_ctx = SearchContext::new(context.ct.clone(), progress);
        let arguments = request.arguments.map(Value::Object).unwrap_or(Value::Null);

        let response = self
            .gateway
            .dispatch(
                ToolRequest::new(request.name.to_string(), arguments),
                &search_ctx,
            )
            .await;

        let content = vec![Content::text(response.to_text())];
        Ok(if response.success {
            CallToolResult::success(content)
        } else {
            CallToolResult::error(content)
        })
    }
}

/// Serve the tool catalog over stdio until the client disconnects.
pub async fn run_mcp_server(ctx: AppContext) -> anyhow::Result<()> {
    let server = QRadarServer::from_context(&ctx);

    tracing::info!(
        "Starting QRadar MCP server v{} for {}",
        env!("CARGO_PKG_VERSION"),
        ctx.qradar.base_url()
    );

    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let service = server.serve(transport).await?;
    tracing::info!(
        "MCP server listening on stdio ({} tools)",
        ToolName::ALL.len()
    );

    tokio::select! {
        result = service.waiting() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }
    tracing::info!("MCP server shutting down");
    Ok(())
}
