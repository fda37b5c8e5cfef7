//! Test harness around a scripted QRadar transport.
//!
//! Routes are keyed by method and path. Each route replays its replies in
//! order and keeps repeating the last one, so a poll loop can be scripted as
//! `[CREATED, RUNNING, COMPLETED]` or as an endless `[RUNNING]`.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tempfile::TempDir;

use qradar_mcp::client::QRadarClient;
use qradar_mcp::config::{ConfigFile, QRadarConfig};
use qradar_mcp::init::AppContext;
use qradar_mcp::mcp::ToolGateway;
use qradar_mcp::transport::{ApiRequest, Transport};
use qradar_mcp::QRadarError;

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Status(u16, Value),
    /// Answer after a delay, to exercise per-call timeouts and cancellation.
    Delayed(Duration, Value),
    ConnectionFailure,
}

impl Reply {
    async fn into_result(self) -> Result<Value, QRadarError> {
        match self {
            Reply::Json(body) => Ok(body),
            Reply::Status(status, body) => Err(QRadarError::RemoteRequest { status, body }),
            Reply::Delayed(delay, body) => {
                tokio::time::sleep(delay).await;
                Ok(body)
            }
            Reply::ConnectionFailure => {
                Err(QRadarError::Transport("connection refused".to_string()))
            }
        }
    }
}

type RouteKey = (Method, String);

#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<RouteKey, VecDeque<Reply>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue replies for `method path`.
    pub fn route(&self, method: Method, path: &str, replies: Vec<Reply>) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .extend(replies);
    }

    pub fn on_get(&self, path: &str, body: Value) {
        self.route(Method::GET, path, vec![Reply::Json(body)]);
    }

    pub fn on_post(&self, path: &str, body: Value) {
        self.route(Method::POST, path, vec![Reply::Json(body)]);
    }

    pub fn on_delete(&self, path: &str, body: Value) {
        self.route(Method::DELETE, path, vec![Reply::Json(body)]);
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path() == path)
            .collect()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests_to(method, path).len()
    }

    fn next_reply(&self, key: &RouteKey) -> Option<Reply> {
        let mut routes = self.routes.lock().unwrap();
        let queue = routes.get_mut(key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, QRadarError> {
        let key = (request.method.clone(), request.path());
        self.requests.lock().unwrap().push(request.clone());
        match self.next_reply(&key) {
            Some(reply) => reply.into_result().await,
            None => Err(QRadarError::RemoteRequest {
                status: 404,
                body: json!({"message": format!("unscripted {} {}", key.0, key.1)}),
            }),
        }
    }
}

/// Client, gateway and app context over one scripted transport.
pub struct TestHarness {
    pub transport: Arc<ScriptedTransport>,
    pub client: QRadarClient,
    pub gateway: ToolGateway,
    /// Temporary config directory (kept alive while harness exists)
    pub temp_dir: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        let transport = ScriptedTransport::new();
        let client = QRadarClient::new(transport.clone());
        let gateway = ToolGateway::new(client.clone());
        let temp_dir = TempDir::new().expect("Failed to create temp config directory");
        Self {
            transport,
            client,
            gateway,
            temp_dir,
        }
    }

    pub fn config_dir(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    /// Full application context sharing this harness's transport.
    pub fn app_context(&self) -> AppContext {
        AppContext::from_transport(
            self.config_dir(),
            ConfigFile::default(),
            QRadarConfig::new("qradar.test", "test-token"),
            self.transport.clone(),
        )
    }

    /// Script a search that reports each status in turn, then serves
    /// `results` from its results endpoint.
    pub fn script_search(&self, search_id: &str, statuses: &[&str], results: Value) {
        self.transport.on_post(
            "/ariel/searches",
            json!({"search_id": search_id, "status": "WAIT"}),
        );
        let path = format!("/ariel/searches/{}", search_id);
        self.transport.route(
            Method::GET,
            &path,
            statuses
                .iter()
                .map(|s| Reply::Json(json!({"search_id": search_id, "status": s})))
                .collect(),
        );
        self.transport
            .on_get(&format!("{}/results", path), results);
        self.transport.on_delete(&path, json!({"status": "CANCELED"}));
    }
}
