use axum::http::StatusCode;
use tower::util::ServiceExt;

use super::harness::{TestHarness, decode_json, json_request, shipping_body};

#[tokio::test]
async fn shipping_calculate_prices_the_default_service() {
    let harness = TestHarness::setup();
    let response = harness
        .router
        .clone()
        .oneshot(json_request("/finance/shipping/calculate", shipping_body()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let payload: serde_json::Value = decode_json(response).await;
    assert_eq!(payload["service_type"], "standard");
    assert_eq!(payload["carrier_service"], "yunexpress");
    assert_eq!(payload["actual_weight_kg"], 1.2);
    assert_eq!(payload["volume_weight_kg"], 1.8);
    assert_eq!(payload["chargeable_weight_kg"], 1.8);
    assert_eq!(payload["rounded_weight_kg"], 2.0);
    assert_eq!(payload["total_cost"], 22.5);
    assert_eq!(payload["rejected"], false);
    assert_eq!(payload["scenario"], "standard");
    assert!(payload["rate_version"].as_str().is_some_and(|v| !v.is_empty()));
    assert!(payload["request_id"].as_str().is_some_and(|v| !v.is_empty()));
}

#[tokio::test]
async fn shipping_calculate_rejects_invalid_input_with_a_field_reason() {
    let harness = TestHarness::setup();
    let mut body = shipping_body();
    body["weight_g"] = serde_json::json!(0);
    let response = harness
        .router
        .clone()
        .oneshot(json_request("/finance/shipping/calculate", body))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let payload: serde_json::Value = decode_json(response).await;
    assert_eq!(payload["code"], "VALIDATION_FAILED");
    assert_eq!(payload["operation"], "shipping.calculate");
    assert!(payload["message"]
        .as_str()
        .is_some_and(|m| m.contains("weight_g")));
    assert!(payload["trace_id"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn shipping_calculate_unknown_platform_is_not_found() {
    let harness = TestHarness::setup();
    let mut body = shipping_body();
    body["platform"] = serde_json::json!("altmarket");
    let response = harness
        .router
        .clone()
        .oneshot(json_request("/finance/shipping/calculate", body))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload: serde_json::Value = decode_json(response).await;
    assert_eq!(payload["code"], "RATE_NOT_FOUND");
}

#[tokio::test]
async fn shipping_calculate_multiple_compares_all_platform_services() {
    let harness = TestHarness::setup();
    let response = harness
        .router
        .clone()
        .oneshot(json_request(
            "/finance/shipping/calculate-multiple",
            shipping_body(),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let results: serde_json::Value = decode_json(response).await;
    let results = results.as_array().expect("results");
    assert_eq!(results.len(), 3);
    // Best-first ordering: the head entry is the recommendation.
    assert_eq!(results[0]["service_type"], "economy");
    assert_eq!(results[0]["total_cost"], 12.5);
    assert_eq!(results[1]["service_type"], "standard");
    assert_eq!(results[2]["service_type"], "express");
}

#[tokio::test]
async fn shipping_calculate_multiple_honors_the_service_filter() {
    let harness = TestHarness::setup();
    let response = harness
        .router
        .clone()
        .oneshot(json_request(
            "/finance/shipping/calculate-multiple?service_types=standard,express",
            shipping_body(),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let results: serde_json::Value = decode_json(response).await;
    let results = results.as_array().expect("results");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["service_type"], "standard");
}

#[tokio::test]
async fn shipping_calculate_multiple_retains_rejected_entries() {
    let harness = TestHarness::setup();
    let mut body = shipping_body();
    body["weight_g"] = serde_json::json!(11_000);
    body["length_cm"] = serde_json::json!(20);
    let response = harness
        .router
        .clone()
        .oneshot(json_request("/finance/shipping/calculate-multiple", body))
        .await
        .expect("response");
    let results: serde_json::Value = decode_json(response).await;

    let results = results.as_array().expect("results");
    let economy = results
        .iter()
        .find(|r| r["service_type"] == "economy")
        .expect("economy entry");
    assert_eq!(economy["rejected"], true);
    assert_eq!(economy["rejection_reason"], "WEIGHT_EXCEEDED");
    assert!(economy.get("total_cost").is_none());
}

#[tokio::test]
async fn shipping_batch_isolates_items() {
    let harness = TestHarness::setup();
    let body = serde_json::json!({
        "requests": [
            shipping_body(),
            {
                "platform": "shopee",
                "weight_g": -5,
                "length_cm": 30,
                "width_cm": 20,
                "height_cm": 15
            },
            shipping_body()
        ]
    });
    let response = harness
        .router
        .clone()
        .oneshot(json_request("/finance/shipping/batch", body))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let payload: serde_json::Value = decode_json(response).await;
    let items = payload.as_array().expect("items");
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["status"], "ok");
    assert_eq!(items[1]["status"], "error");
    assert_eq!(items[1]["error"]["code"], "VALIDATION_FAILED");
    assert_eq!(items[2]["status"], "ok");
    assert_eq!(items[2]["result"]["total_cost"], 22.5);
}

#[tokio::test]
async fn malformed_top_level_body_fails_outright() {
    let harness = TestHarness::setup();
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/finance/shipping/batch")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .expect("request");
    let response = harness.router.clone().oneshot(request).await.expect("response");
    assert!(response.status().is_client_error());
}
