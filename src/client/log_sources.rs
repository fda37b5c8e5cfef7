use serde_json::Value;

use super::{ListFilter, QRadarClient};
use crate::transport::ApiRequest;
use crate::QRadarError;

const LOG_SOURCE_MANAGEMENT: &str = "/config/event_sources/log_source_management";
const PROPERTY_EXPRESSIONS: &str = "/config/event_sources/custom_properties/property_expressions";

impl QRadarClient {
    pub async fn log_sources(&self, filter: &ListFilter) -> Result<Vec<Value>, QRadarError> {
        self.list(filter.apply(
            ApiRequest::get(LOG_SOURCE_MANAGEMENT).segment("log_sources"),
        ))
        .await
    }

    pub async fn log_source(&self, log_source_id: u64) -> Result<Value, QRadarError> {
        self.get(
            ApiRequest::get(LOG_SOURCE_MANAGEMENT)
                .segment("log_sources")
                .segment(log_source_id),
        )
        .await
    }

    pub async fn log_source_types(&self) -> Result<Vec<Value>, QRadarError> {
        self.list(ApiRequest::get(LOG_SOURCE_MANAGEMENT).segment("log_source_types"))
            .await
    }

    /// Custom event property expressions.
    pub async fn custom_properties(&self) -> Result<Vec<Value>, QRadarError> {
        self.list(ApiRequest::get(PROPERTY_EXPRESSIONS)).await
    }

    pub async fn custom_property(&self, property_id: u64) -> Result<Value, QRadarError> {
        self.get(ApiRequest::get(PROPERTY_EXPRESSIONS).segment(property_id))
            .await
    }
}
