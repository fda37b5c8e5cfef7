use serde_json::Value;

use super::{ListFilter, QRadarClient};
use crate::transport::ApiRequest;
use crate::QRadarError;

impl QRadarClient {
    pub async fn rules(&self, filter: &ListFilter) -> Result<Vec<Value>, QRadarError> {
        self.list(filter.apply(ApiRequest::get("/analytics/rules")))
            .await
    }

    pub async fn rule(&self, rule_id: u64) -> Result<Value, QRadarError> {
        self.get(ApiRequest::get("/analytics/rules").segment(rule_id))
            .await
    }

    pub async fn building_blocks(&self, filter: &ListFilter) -> Result<Vec<Value>, QRadarError> {
        self.list(filter.apply(ApiRequest::get("/analytics/building_blocks")))
            .await
    }

    pub async fn building_block(&self, block_id: u64) -> Result<Value, QRadarError> {
        self.get(ApiRequest::get("/analytics/building_blocks").segment(block_id))
            .await
    }
}
