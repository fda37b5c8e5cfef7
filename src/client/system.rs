use serde_json::Value;

use super::QRadarClient;
use crate::transport::ApiRequest;
use crate::QRadarError;

impl QRadarClient {
    pub async fn system_info(&self) -> Result<Value, QRadarError> {
        self.get(ApiRequest::get("/system/about")).await
    }

    pub async fn servers(&self) -> Result<Vec<Value>, QRadarError> {
        self.list(ApiRequest::get("/system/servers")).await
    }

    pub async fn domains(&self) -> Result<Vec<Value>, QRadarError> {
        self.list(ApiRequest::get("/config/domain_management/domains"))
            .await
    }

    pub async fn domain(&self, domain_id: u64) -> Result<Value, QRadarError> {
        self.get(ApiRequest::get("/config/domain_management/domains").segment(domain_id))
            .await
    }

    pub async fn network_hierarchy(&self) -> Result<Vec<Value>, QRadarError> {
        self.list(ApiRequest::get("/config/network_hierarchy/networks"))
            .await
    }

    pub async fn users(&self) -> Result<Vec<Value>, QRadarError> {
        self.list(ApiRequest::get("/config/access/users")).await
    }

    pub async fn user(&self, user_id: u64) -> Result<Value, QRadarError> {
        self.get(ApiRequest::get("/config/access/users").segment(user_id))
            .await
    }

    /// Installed app-framework applications, which is where report apps
    /// live on current consoles.
    pub async fn reports(&self) -> Result<Vec<Value>, QRadarError> {
        self.list(ApiRequest::get("/gui_app_framework/applications"))
            .await
    }
}
