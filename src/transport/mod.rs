//! Transport seam between the resource client and the QRadar REST API.
//!
//! The client and search engine only see [`Transport`]; production code uses
//! [`HttpTransport`], tests plug in scripted fakes.

mod http;
mod retry;

pub use http::HttpTransport;
pub use retry::{idempotent_methods, Backoff, RetryPolicy, RETRY_STATUS_CODES};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::QRadarError;

/// One call against the `/api` root.
///
/// Headers set here apply to this call only; they are merged over the
/// transport's default headers and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Unescaped path segments below `/api`.
    pub segments: Vec<String>,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            params: Vec::new(),
            headers: Vec::new(),
            timeout: None,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append one path segment verbatim; the transport escapes it.
    pub fn segment(mut self, segment: impl ToString) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    pub fn param_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.param(key, v),
            None => self,
        }
    }

    pub fn header(mut self, name: &str, value: impl ToString) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// `/a/b/c` form of the segments, for logs and test assertions.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    pub fn param_value(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Performs API calls and returns the parsed JSON body.
///
/// Implementations return `{}` for empty success bodies and
/// [`QRadarError::RemoteRequest`] for non-2xx answers.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<Value, QRadarError>;
}
