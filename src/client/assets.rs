use serde_json::Value;

use super::{ListFilter, QRadarClient};
use crate::transport::ApiRequest;
use crate::QRadarError;

/// Asset-model filter matching any interface carrying `ip`.
pub(crate) fn asset_ip_filter(ip: &str) -> String {
    format!("interfaces contains ip_addresses contains value='{}'", ip)
}

impl QRadarClient {
    pub async fn assets(&self, filter: &ListFilter) -> Result<Vec<Value>, QRadarError> {
        self.list(filter.apply(ApiRequest::get("/asset_model/assets")))
            .await
    }

    /// Assets with an interface address equal to `ip`. Matching is done by
    /// the console.
    pub async fn search_assets_by_ip(&self, ip: &str) -> Result<Vec<Value>, QRadarError> {
        self.assets(&ListFilter::filter(asset_ip_filter(ip))).await
    }
}
