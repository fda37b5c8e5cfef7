//! Shared initialization logic for MCP and CLI modes.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use crate::client::QRadarClient;
use crate::config::{
    load_config_file, resolve_config_dir, ConfigFile, ConfigOverrides, QRadarConfig,
};
use crate::mcp::ToolGateway;
use crate::transport::{HttpTransport, Transport};

/// Application context holding configuration and the QRadar client.
///
/// Shared between MCP server and CLI commands.
pub struct AppContext {
    pub config_dir: PathBuf,
    pub file_config: ConfigFile,
    pub qradar: QRadarConfig,
    pub client: QRadarClient,
    pub gateway: ToolGateway,
}

impl AppContext {
    /// Initialize application context.
    ///
    /// Settings priority: flag/env overrides > `{config_dir}/config.toml` > defaults.
    pub fn new(explicit_dir: Option<PathBuf>, overrides: &ConfigOverrides) -> Result<Self> {
        let config_dir = resolve_config_dir(explicit_dir);
        tracing::info!("Using config directory: {}", config_dir.display());

        let file_config = load_config_file(&config_dir);
        let qradar = QRadarConfig::resolve(overrides, &file_config)?;
        let transport = HttpTransport::new(&qradar)?;
        tracing::info!("QRadar API at {}", transport.base_url());

        Ok(Self::from_transport(
            config_dir,
            file_config,
            qradar,
            Arc::new(transport),
        ))
    }

    /// Build a context around an existing transport.
    pub fn from_transport(
        config_dir: PathBuf,
        file_config: ConfigFile,
        qradar: QRadarConfig,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let client = QRadarClient::new(transport);
        let gateway = ToolGateway::new(client.clone());
        Self {
            config_dir,
            file_config,
            qradar,
            client,
            gateway,
        }
    }
}
