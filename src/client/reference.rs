use serde_json::Value;

use super::QRadarClient;
use crate::transport::ApiRequest;
use crate::QRadarError;

impl QRadarClient {
    pub async fn reference_sets(&self) -> Result<Vec<Value>, QRadarError> {
        self.list(ApiRequest::get("/reference_data/sets")).await
    }

    /// One reference set with its elements. `name` may contain spaces or
    /// slashes; it is sent as a single escaped path segment.
    pub async fn reference_set(&self, name: &str) -> Result<Value, QRadarError> {
        self.get(ApiRequest::get("/reference_data/sets").segment(name))
            .await
    }
}
