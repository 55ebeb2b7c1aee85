//! Request-layer behavior against a stub backend.

use koimeret::api::types::{Cow, Sale};
use koimeret::api::{ApiError, Query, RequestOptions};
use reqwest::StatusCode;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{api, client};

#[tokio::test]
async fn test_authorization_header_carries_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api("/cows/stats/")))
        .and(header("Authorization", "Token abc123"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 3})))
        .expect(1)
        .mount(&server)
        .await;

    let stats = client(&server, Some("abc123")).cow_stats().await.unwrap();
    assert_eq!(stats["total"], 3);
}

#[tokio::test]
async fn test_no_authorization_header_without_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api("/cows/stats/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    client(&server, None).cow_stats().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
    assert_eq!(requests[0].headers["content-type"], "application/json");
}

#[tokio::test]
async fn test_no_content_yields_empty_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api("/alerts/mark_all_read/")))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let result = client(&server, Some("t")).mark_all_alerts_read().await.unwrap();
    assert_eq!(result, json!({}));
}

#[tokio::test]
async fn test_detail_message_is_surfaced_exactly() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api("/auth/login/")))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Invalid phone number"})),
        )
        .mount(&server)
        .await;

    let err = client(&server, None).login("07", "x").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid phone number");
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    assert!(!err.is_unauthenticated());
}

#[tokio::test]
async fn test_non_json_error_body_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api("/dashboard/owner/")))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>Server Error</html>"))
        .mount(&server)
        .await;

    let err = client(&server, Some("t")).owner_dashboard().await.unwrap_err();
    assert_eq!(err.to_string(), "Request failed");
}

#[tokio::test]
async fn test_empty_error_body_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api("/dashboard/owner/")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server, Some("t")).owner_dashboard().await.unwrap_err();
    assert_eq!(err.to_string(), "Request failed");
}

#[tokio::test]
async fn test_field_errors_without_detail_use_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api("/cows/")))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"tag_number": ["This field is required."]})),
        )
        .mount(&server)
        .await;

    let err = client(&server, Some("t"))
        .create_cow(&json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Request failed");
}

#[tokio::test]
async fn test_malformed_success_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api("/cows/1/")))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server, Some("t")).cow(1).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)));
    assert_eq!(err.to_string(), "Request failed");
}

#[tokio::test]
async fn test_bare_array_list_is_returned_as_is() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api("/cows/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}, {"id": 2}])))
        .mount(&server)
        .await;

    let items: Vec<Value> = client(&server, Some("t")).list("/cows/").await.unwrap();
    assert_eq!(items, vec![json!({"id": 1}), json!({"id": 2})]);

    let cows = client(&server, Some("t")).cows(&Query::new()).await.unwrap();
    assert_eq!(cows.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2]);
}

#[tokio::test]
async fn test_paginated_list_is_unwrapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api("/cows/")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"results": [{"id": 1}], "count": 1})),
        )
        .mount(&server)
        .await;

    let items: Vec<Value> = client(&server, Some("t")).list("/cows/").await.unwrap();
    assert_eq!(items, vec![json!({"id": 1})]);
}

#[tokio::test]
async fn test_filter_query_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api("/sales/")))
        .and(query_param("payment_status", "unpaid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 4,
                "buyer_name": "Brookside",
                "total_amount": "1250.50",
                "payment_status": "unpaid"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let sales: Vec<Sale> = client(&server, Some("t"))
        .sales(&Query::new().param("payment_status", "unpaid"))
        .await
        .unwrap();
    assert_eq!(sales[0].total_amount, 1250.5);
}

#[tokio::test]
async fn test_json_body_is_serialized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api("/tasks/12/skip/")))
        .and(body_json(json!({"reason": "Rain"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "skipped"})))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server, Some("t"))
        .skip_task(12, Some("Rain"))
        .await
        .unwrap();
    assert_eq!(result["status"], "skipped");
}

#[tokio::test]
async fn test_generic_request_with_custom_header() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(api("/cows/3/")))
        .and(header("X-Device-Id", "tablet-1"))
        .and(body_json(json!({"name": "Daisy"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3,
            "name": "Daisy",
            "tag_number": "KD-003"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let options = RequestOptions::patch()
        .json(&json!({"name": "Daisy"}))
        .unwrap()
        .header("X-Device-Id", "tablet-1");
    let cow: Cow = client(&server, Some("t"))
        .request("/cows/3/", options)
        .await
        .unwrap();
    assert_eq!(cow.name, "Daisy");
    assert_eq!(cow.tag_number, "KD-003");
}

#[tokio::test]
async fn test_network_failure_uses_fallback() {
    let client = koimeret::api::FarmClient::new(
        "http://127.0.0.1:9/api/v1",
        koimeret::session::SessionStore::in_memory(),
    )
    .unwrap();

    let err = client.owner_dashboard().await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(err.to_string(), "Request failed");
}

#[tokio::test]
async fn test_milk_summary_returns_aggregate_object() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api("/milk/logs/summary/")))
        .and(query_param("date_from", "2024-05-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "date_range": {"from": "2024-05-01", "to": "2024-05-31"},
            "totals": {"total_liters": "1840.50", "avg_per_day": "12.27", "total_logs": 150},
            "daily": [{"date": "2024-05-31", "total_liters": "61.00", "cow_count": 5}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = Query::new().param("date_from", "2024-05-01");
    let summary = client(&server, Some("t")).milk_summary(&query).await.unwrap();

    assert_eq!(summary["totals"]["total_logs"], 150);
    assert_eq!(summary["daily"].as_array().map(Vec::len), Some(1));
}
