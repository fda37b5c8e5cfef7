/// HTTP transport tests against a mock console: auth headers, per-request
/// headers, retries and error bodies.
use std::time::Duration;

use pretty_assertions::assert_eq;
use qradar_mcp::client::{ListFilter, QRadarClient};
use qradar_mcp::config::QRadarConfig;
use qradar_mcp::transport::{ApiRequest, HttpTransport, RetryPolicy, Transport};
use qradar_mcp::QRadarError;
use serde_json::json;
use std::sync::Arc;
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn transport(server: &MockServer, retry: RetryPolicy) -> HttpTransport {
    let mut config = QRadarConfig::new(server.uri(), "secret-token");
    config.api_version = "19.0".to_string();
    HttpTransport::new(&config)
        .expect("transport should build")
        .with_retry(retry)
}

#[tokio::test]
async fn test_sends_auth_and_version_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/system/about"))
        .and(header("SEC", "secret-token"))
        .and(header("Version", "19.0"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"external_version": "7.5.0"})))
        .expect(1)
        .mount(&server)
        .await;

    let body = transport(&server, RetryPolicy::disabled())
        .send(ApiRequest::get("/system/about"))
        .await
        .unwrap();
    assert_eq!(body["external_version"], "7.5.0");
}

#[tokio::test]
async fn test_range_header_does_not_leak_between_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/siem/offenses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = QRadarClient::new(Arc::new(transport(&server, RetryPolicy::disabled())));
    client
        .offenses(&ListFilter::default(), Some("0-9"))
        .await
        .unwrap();
    client.offenses(&ListFilter::default(), None).await.unwrap();

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(
        received[0].headers.get("range").map(|v| v.to_str().unwrap()),
        Some("items=0-9")
    );
    assert!(received[1].headers.get("range").is_none());
}

#[tokio::test]
async fn test_retries_unavailable_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config/access/users"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/config/access/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .mount(&server)
        .await;

    let body = transport(&server, RetryPolicy::immediate(2))
        .send(ApiRequest::get("/config/access/users"))
        .await
        .unwrap();
    assert_eq!(body, json!([{"id": 1}]));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_post_is_sent_once_on_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/siem/offenses/7/notes"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/siem/offenses/7/notes"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .mount(&server)
        .await;

    let client = QRadarClient::new(Arc::new(transport(&server, RetryPolicy::immediate(3))));
    let err = client.add_offense_note(7, "hello").await.unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/siem/offenses/999"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"code": 1002, "message": "No offense was found"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = transport(&server, RetryPolicy::immediate(3))
        .send(ApiRequest::get("/siem/offenses/999"))
        .await
        .unwrap_err();

    match err {
        QRadarError::RemoteRequest { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body["message"], "No offense was found");
        }
        other => panic!("expected RemoteRequest, got {:?}", other),
    }
}

#[tokio::test]
async fn test_retries_stop_after_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/system/servers"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(3)
        .mount(&server)
        .await;

    let err = transport(&server, RetryPolicy::immediate(2))
        .send(ApiRequest::get("/system/servers"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(502));
}

#[tokio::test]
async fn test_empty_body_is_empty_object() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/ariel/searches/s-1"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let body = transport(&server, RetryPolicy::disabled())
        .send(ApiRequest::delete("/ariel/searches").segment("s-1"))
        .await
        .unwrap();
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn test_query_parameters_are_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ariel/searches"))
        .and(query_param("query_expression", "SELECT * FROM events LAST 1 HOURS"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"search_id": "abc"})))
        .expect(1)
        .mount(&server)
        .await;

    let body = transport(&server, RetryPolicy::disabled())
        .send(
            ApiRequest::post("/ariel/searches")
                .param("query_expression", "SELECT * FROM events LAST 1 HOURS"),
        )
        .await
        .unwrap();
    assert_eq!(body["search_id"], "abc");
}

#[tokio::test]
async fn test_per_request_timeout_applies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ariel/searches/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "RUNNING"}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let err = transport(&server, RetryPolicy::disabled())
        .send(
            ApiRequest::get("/ariel/searches")
                .segment("slow")
                .timeout(Duration::from_millis(200)),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "TRANSPORT_ERROR");
}
