/// Integration tests for tool dispatch: validation, envelopes and the
/// mapping from tool arguments to QRadar requests.
mod common;

use common::{Reply, TestHarness};
use pretty_assertions::assert_eq;
use qradar_mcp::mcp::{ToolName, ToolRequest, ToolResponse};
use qradar_mcp::search::SearchContext;
use reqwest::Method;
use serde_json::{json, Value};

async fn call(harness: &TestHarness, tool: &str, arguments: Value) -> ToolResponse {
    harness
        .gateway
        .dispatch(ToolRequest::new(tool, arguments), &SearchContext::default())
        .await
}

fn error_code(response: &ToolResponse) -> &str {
    response.data["error_code"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn test_unknown_tool_suggests_closest_name() {
    let harness = TestHarness::new();
    let response = call(&harness, "qradar_get_offense", json!({})).await;

    assert!(!response.success);
    assert_eq!(error_code(&response), "UNKNOWN_TOOL");
    assert_eq!(
        response.message,
        "Error executing qradar_get_offense: Unknown tool: qradar_get_offense"
    );
    assert!(response.data["suggestion"]
        .as_str()
        .unwrap()
        .contains("qradar_get_offenses"));
    assert!(harness.transport.requests().is_empty());
}

#[tokio::test]
async fn test_unknown_tool_fails_for_any_arguments() {
    let harness = TestHarness::new();
    for arguments in [json!({"offense_id": 42, "filter": "x"}), json!([1]), Value::Null] {
        let response = call(&harness, "qradar_delete_everything", arguments).await;
        assert!(!response.success);
        assert_eq!(error_code(&response), "UNKNOWN_TOOL");
    }
    assert!(harness.transport.requests().is_empty());
}

#[tokio::test]
async fn test_empty_query_is_submitted_as_is() {
    let harness = TestHarness::new();
    harness.transport.on_post("/ariel/searches", json!({}));

    let response = call(&harness, "qradar_search_events", json!({"query": ""})).await;

    assert!(!response.success);
    assert_eq!(error_code(&response), "SUBMISSION_FAILED");
    let submits = harness.transport.requests_to(Method::POST, "/ariel/searches");
    assert_eq!(submits.len(), 1);
    assert_eq!(submits[0].param_value("query_expression"), Some(""));
}

#[tokio::test]
async fn test_get_offense_by_id() {
    let harness = TestHarness::new();
    harness
        .transport
        .on_get("/siem/offenses/42", json!({"id": 42, "status": "OPEN"}));

    let response = call(&harness, "qradar_get_offense_by_id", json!({"offense_id": 42})).await;

    assert!(response.success);
    assert_eq!(response.message, "Retrieved offense 42");
    assert_eq!(response.data["status"], "OPEN");
}

#[tokio::test]
async fn test_missing_required_argument_is_validation_error() {
    let harness = TestHarness::new();
    let response = call(&harness, "qradar_get_offense_by_id", json!({})).await;

    assert!(!response.success);
    assert_eq!(error_code(&response), "VALIDATION_ERROR");
    assert!(response.data["error"].as_str().unwrap().contains("offense_id"));
    assert!(harness.transport.requests().is_empty());
}

#[tokio::test]
async fn test_offenses_range_header_is_per_request() {
    let harness = TestHarness::new();
    harness
        .transport
        .route(Method::GET, "/siem/offenses", vec![Reply::Json(json!([{"id": 1}, {"id": 2}]))]);

    let response = call(
        &harness,
        "qradar_get_offenses",
        json!({"filter": "status=OPEN", "range": "0-49"}),
    )
    .await;
    assert!(response.success);
    assert_eq!(response.message, "Retrieved 2 offenses");

    call(&harness, "qradar_get_offenses", json!({})).await;

    let requests = harness.transport.requests_to(Method::GET, "/siem/offenses");
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].header_value("Range"), Some("items=0-49"));
    assert_eq!(requests[0].param_value("filter"), Some("status=OPEN"));
    assert_eq!(requests[1].header_value("Range"), None);
    assert_eq!(requests[1].param_value("filter"), None);
}

#[tokio::test]
async fn test_bare_object_list_is_wrapped() {
    let harness = TestHarness::new();
    harness
        .transport
        .on_get("/config/access/users", json!({"id": 7, "username": "admin"}));

    let response = call(&harness, ToolName::GetUsers.as_str(), Value::Null).await;

    assert!(response.success);
    assert_eq!(response.message, "Retrieved 1 users");
    assert_eq!(response.data, json!([{"id": 7, "username": "admin"}]));
}

#[tokio::test]
async fn test_closing_offense_requires_reason() {
    let harness = TestHarness::new();
    let response = call(
        &harness,
        "qradar_update_offense_status",
        json!({"offense_id": 5, "status": "CLOSED"}),
    )
    .await;

    assert!(!response.success);
    assert_eq!(error_code(&response), "VALIDATION_ERROR");
    assert!(harness.transport.requests().is_empty());
}

#[tokio::test]
async fn test_closing_offense_with_reason() {
    let harness = TestHarness::new();
    harness
        .transport
        .on_post("/siem/offenses/5", json!({"id": 5, "status": "CLOSED"}));

    let response = call(
        &harness,
        "qradar_update_offense_status",
        json!({"offense_id": 5, "status": "CLOSED", "closing_reason_id": 2}),
    )
    .await;

    assert!(response.success);
    assert_eq!(response.message, "Updated offense 5 status to CLOSED");
    let request = &harness.transport.requests_to(Method::POST, "/siem/offenses/5")[0];
    assert_eq!(request.param_value("status"), Some("CLOSED"));
    assert_eq!(request.param_value("closing_reason_id"), Some("2"));
}

#[tokio::test]
async fn test_invalid_status_value_is_rejected() {
    let harness = TestHarness::new();
    let response = call(
        &harness,
        "qradar_update_offense_status",
        json!({"offense_id": 5, "status": "RESOLVED"}),
    )
    .await;
    assert_eq!(error_code(&response), "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_add_note_sends_text_as_parameter() {
    let harness = TestHarness::new();
    harness
        .transport
        .on_post("/siem/offenses/9/notes", json!({"id": 100, "note_text": "checked"}));

    let response = call(
        &harness,
        "qradar_add_offense_note",
        json!({"offense_id": 9, "note_text": "checked"}),
    )
    .await;

    assert!(response.success);
    let request = &harness.transport.requests_to(Method::POST, "/siem/offenses/9/notes")[0];
    assert_eq!(request.param_value("note_text"), Some("checked"));
}

#[tokio::test]
async fn test_blank_note_is_rejected() {
    let harness = TestHarness::new();
    let response = call(
        &harness,
        "qradar_add_offense_note",
        json!({"offense_id": 9, "note_text": "   "}),
    )
    .await;
    assert_eq!(error_code(&response), "VALIDATION_ERROR");
    assert!(harness.transport.requests().is_empty());
}

#[tokio::test]
async fn test_saved_search_without_aql_never_submits() {
    let harness = TestHarness::new();
    harness
        .transport
        .on_get("/ariel/saved_searches/77", json!({"id": 77, "name": "empty"}));

    let response = call(&harness, "qradar_execute_saved_search", json!({"search_id": 77})).await;

    assert!(!response.success);
    assert_eq!(error_code(&response), "MISSING_QUERY");
    assert_eq!(harness.transport.count(Method::POST, "/ariel/searches"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_saved_search_runs_stored_aql() {
    let harness = TestHarness::new();
    harness.transport.on_get(
        "/ariel/saved_searches/abc",
        json!({"id": "abc", "aql": "SELECT * FROM events LAST 5 MINUTES"}),
    );
    harness.script_search("run-1", &["COMPLETED"], json!({"events": [{"qid": 1}]}));

    let response = call(&harness, "qradar_execute_saved_search", json!({"search_id": "abc"})).await;

    assert!(response.success, "{}", response.message);
    assert_eq!(response.message, "Executed saved search abc (1 records)");
    assert_eq!(response.data["record_count"], 1);
    let submit = &harness.transport.requests_to(Method::POST, "/ariel/searches")[0];
    assert_eq!(
        submit.param_value("query_expression"),
        Some("SELECT * FROM events LAST 5 MINUTES")
    );
}

#[tokio::test(start_paused = true)]
async fn test_recent_events_builds_query() {
    let harness = TestHarness::new();
    harness.script_search("recent", &["COMPLETED"], json!({"events": []}));

    let response = call(
        &harness,
        "qradar_get_recent_events",
        json!({"limit": 5, "fields": ["sourceip", "qid"]}),
    )
    .await;

    assert!(response.success);
    let submit = &harness.transport.requests_to(Method::POST, "/ariel/searches")[0];
    assert_eq!(
        submit.param_value("query_expression"),
        Some("SELECT sourceip, qid FROM events ORDER BY starttime DESC LIMIT 5")
    );
}

#[tokio::test]
async fn test_recent_events_limit_bounds() {
    let harness = TestHarness::new();
    for limit in [0, 10_001] {
        let response = call(&harness, "qradar_get_recent_events", json!({"limit": limit})).await;
        assert_eq!(error_code(&response), "VALIDATION_ERROR");
    }
    assert!(harness.transport.requests().is_empty());
}

#[tokio::test]
async fn test_remote_errors_carry_status_suggestion() {
    let harness = TestHarness::new();
    harness.transport.route(
        Method::GET,
        "/siem/offenses/404",
        vec![Reply::Status(404, json!({"message": "No offense found"}))],
    );

    let response = call(&harness, "qradar_get_offense_by_id", json!({"offense_id": 404})).await;

    assert!(!response.success);
    assert_eq!(error_code(&response), "REMOTE_ERROR");
    assert!(!response.data["suggestion"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_event_category_search_filters_locally() {
    let harness = TestHarness::new();
    harness.transport.on_get(
        "/data_classification/qid_records",
        json!([
            {"id": 1, "name": "Firewall Deny"},
            {"id": 2, "name": "Login Failure"},
            {"id": 3, "name": "firewall permit"}
        ]),
    );

    let response = call(
        &harness,
        "qradar_search_event_categories",
        json!({"search_term": "FIREWALL"}),
    )
    .await;

    assert_eq!(response.message, "Found 2 matching categories");
    assert_eq!(response.data.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_search_assets_by_ip_filter() {
    let harness = TestHarness::new();
    harness
        .transport
        .on_get("/asset_model/assets", json!([{"id": 3}]));

    let response = call(
        &harness,
        "qradar_search_assets_by_ip",
        json!({"ip_address": "10.1.2.3"}),
    )
    .await;

    assert_eq!(response.message, "Found 1 assets with IP 10.1.2.3");
    let request = &harness.transport.requests_to(Method::GET, "/asset_model/assets")[0];
    assert_eq!(
        request.param_value("filter"),
        Some("interfaces contains ip_addresses contains value='10.1.2.3'")
    );
}

#[tokio::test]
async fn test_reference_set_name_is_one_segment() {
    let harness = TestHarness::new();
    harness
        .transport
        .on_get("/reference_data/sets/Bad IPs/2024", json!({"name": "Bad IPs/2024"}));

    let response = call(
        &harness,
        "qradar_get_reference_set_data",
        json!({"ref_set_name": "Bad IPs/2024"}),
    )
    .await;

    assert!(response.success);
    let request = &harness.transport.requests()[0];
    assert_eq!(request.segments.last().map(String::as_str), Some("Bad IPs/2024"));
}
