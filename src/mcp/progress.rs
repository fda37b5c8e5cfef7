//! MCP progress notifications for long-running searches.
//!
//! Wraps `Peer<RoleServer>` and the request's `ProgressToken`. Built from the
//! call's `Meta` only when the client asked for progress.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::model::{Meta, ProgressNotificationParam, ProgressToken};
use rmcp::{Peer, RoleServer};

use crate::progress::{noop_progress, ProgressReporter};

/// Sends `notifications/progress` to the calling client.
pub struct McpProgressReporter {
    client: Peer<RoleServer>,
    token: ProgressToken,
}

impl McpProgressReporter {
    pub fn new(client: Peer<RoleServer>, token: ProgressToken) -> Self {
        Self { client, token }
    }
}

#[async_trait]
impl ProgressReporter for McpProgressReporter {
    async fn report(&self, current: f64, total: f64, message: Option<String>) {
        if let Err(e) = self
            .client
            .notify_progress(ProgressNotificationParam {
                progress_token: self.token.clone(),
                progress: current,
                total: Some(total),
                message,
            })
            .await
        {
            tracing::debug!("Dropping progress notification: {}", e);
        }
    }
}

/// Progress reporter for one call, falling back to noop without a token.
pub fn make_mcp_progress(meta: &Meta, client: &Peer<RoleServer>) -> Arc<dyn ProgressReporter> {
    match meta.get_progress_token() {
        Some(token) => Arc::new(McpProgressReporter::new(client.clone(), token.clone())),
        None => noop_progress(),
    }
}
