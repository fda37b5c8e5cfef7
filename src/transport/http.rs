use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{ApiRequest, RetryPolicy, Transport};
use crate::config::QRadarConfig;
use crate::QRadarError;

/// reqwest-backed transport with the console's auth headers and bounded retry.
///
/// Default headers are fixed at construction. Per-call headers (e.g. `Range`)
/// ride on the individual request only.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
}

/// Outcome of a single attempt, tagged with whether it may be retried.
struct AttemptError {
    error: QRadarError,
    retryable: bool,
}

impl HttpTransport {
    pub fn new(config: &QRadarConfig) -> Result<Self, QRadarError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("sec"),
            HeaderValue::from_str(&config.api_token).map_err(|_| {
                QRadarError::Config("API token contains invalid header characters".into())
            })?,
        );
        headers.insert(
            HeaderName::from_static("version"),
            HeaderValue::from_str(&config.api_version).map_err(|_| {
                QRadarError::Config("API version contains invalid header characters".into())
            })?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if !config.verify_ssl {
            tracing::warn!("TLS certificate verification is disabled for the QRadar console");
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()?;

        let base_url = Url::parse(&config.base_url())
            .map_err(|e| QRadarError::Config(format!("Invalid QRadar host: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(QRadarError::Config(format!(
                "Invalid QRadar host: {}",
                config.host
            )));
        }

        Ok(Self {
            client,
            base_url,
            retry: RetryPolicy::with_max_retries(config.max_retries),
        })
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn url_for(&self, request: &ApiRequest) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            for segment in &request.segments {
                segments.push(segment);
            }
        }
        url
    }

    async fn attempt(&self, url: &Url, request: &ApiRequest) -> Result<Value, AttemptError> {
        let mut builder = self
            .client
            .request(request.method.clone(), url.clone())
            .query(&request.params);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| AttemptError {
            retryable: e.is_connect() || e.is_timeout(),
            error: QRadarError::from(e),
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| AttemptError {
            retryable: e.is_timeout(),
            error: QRadarError::from(e),
        })?;

        if !status.is_success() {
            return Err(AttemptError {
                error: QRadarError::RemoteRequest {
                    status: status.as_u16(),
                    body: parse_error_body(&bytes),
                },
                retryable: true,
            });
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        serde_json::from_slice(&bytes).map_err(|e| AttemptError {
            error: QRadarError::Transport(format!("Invalid JSON in response: {}", e)),
            retryable: false,
        })
    }
}

/// Parsed JSON error body, or the raw text when it is not JSON.
fn parse_error_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, QRadarError> {
        let url = self.url_for(&request);
        let mut attempt = 0;

        loop {
            match self.attempt(&url, &request).await {
                Ok(value) => return Ok(value),
                Err(AttemptError { error, retryable }) => {
                    let retry = retryable
                        && self.retry.allows_method(&request.method)
                        && match error.status() {
                            Some(status) => self.retry.should_retry_status(attempt, status),
                            None => self.retry.should_retry_connection(attempt),
                        };
                    if !retry {
                        return Err(error);
                    }

                    let delay = self.retry.delay_for_attempt(attempt);
                    debug!(
                        attempt = attempt + 1,
                        method = %request.method,
                        path = %request.path(),
                        error = %error,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying QRadar request"
                    );
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
