//! Typed access to the QRadar REST API.
//!
//! One method per remote capability. List endpoints all go through
//! [`normalize_list`], so callers always get a sequence.

mod analytics;
mod ariel;
mod assets;
mod log_sources;
mod offenses;
mod reference;
mod system;

pub use offenses::OffenseStatus;

use std::sync::Arc;

use serde_json::Value;

use crate::search::SearchEngine;
use crate::transport::{ApiRequest, Transport};
use crate::QRadarError;

/// Coerce a list response into a sequence.
///
/// Arrays yield their elements, `null` yields nothing and any other value
/// (the console sometimes answers a single bare object) becomes a
/// one-element list.
pub fn normalize_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Optional `filter` / `fields` query parameters accepted by most list
/// endpoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilter {
    pub filter: Option<String>,
    pub fields: Option<String>,
}

impl ListFilter {
    pub fn filter(filter: impl Into<String>) -> Self {
        Self {
            filter: Some(filter.into()),
            fields: None,
        }
    }

    fn apply(&self, request: ApiRequest) -> ApiRequest {
        request
            .param_opt("filter", self.filter.as_deref())
            .param_opt("fields", self.fields.as_deref())
    }
}

/// Client for a single QRadar console.
///
/// Cheap to clone; every clone shares the transport and its connection pool.
#[derive(Clone)]
pub struct QRadarClient {
    transport: Arc<dyn Transport>,
    engine: SearchEngine,
}

impl QRadarClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let engine = SearchEngine::new(transport.clone());
        Self { transport, engine }
    }

    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    async fn get(&self, request: ApiRequest) -> Result<Value, QRadarError> {
        self.transport.send(request).await
    }

    async fn list(&self, request: ApiRequest) -> Result<Vec<Value>, QRadarError> {
        Ok(normalize_list(self.transport.send(request).await?))
    }
}
