use axum::http::StatusCode;
use tower::util::ServiceExt;

use super::harness::{TestHarness, decode_json, json_request, profit_body};

#[tokio::test]
async fn profit_calculate_reports_margin_and_classification() {
    let harness = TestHarness::setup();
    let response = harness
        .router
        .clone()
        .oneshot(json_request("/finance/profit/calculate", profit_body()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let payload: serde_json::Value = decode_json(response).await;
    assert_eq!(payload["platform_fee"], 8.0);
    assert_eq!(payload["selected_shipping_cost"], 22.5);
    assert_eq!(payload["profit_amount"], 29.5);
    assert_eq!(payload["profit_rate"], 0.295);
    assert_eq!(payload["margin_analysis"]["margin_level"], "strong");
    assert_eq!(
        payload["margin_analysis"]["cost_breakdown"]["shipping_cost"],
        22.5
    );
    assert!(payload.get("warnings").is_none());
}

#[tokio::test]
async fn profit_calculate_with_comparison_exposes_all_options() {
    let harness = TestHarness::setup();
    let mut body = profit_body();
    body["platform"] = serde_json::json!("shopee");
    body["compare_shipping"] = serde_json::json!(true);
    let response = harness
        .router
        .clone()
        .oneshot(json_request("/finance/profit/calculate", body))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let payload: serde_json::Value = decode_json(response).await;
    assert_eq!(payload["scenario"], "comparison");
    assert_eq!(payload["recommended_shipping"], "economy");
    assert_eq!(payload["selected_shipping_cost"], 12.5);
    let options = payload["shipping_options"].as_object().expect("options");
    assert_eq!(options.len(), 3);
    assert!(options.contains_key("standard"));
    assert!(options.contains_key("express"));
}

#[tokio::test]
async fn unshippable_profit_returns_null_shipping_cost_and_a_warning() {
    let harness = TestHarness::setup();
    let mut body = profit_body();
    body["platform"] = serde_json::json!("shopee");
    body["compare_shipping"] = serde_json::json!(true);
    body["weight_g"] = serde_json::json!(90_000);
    let response = harness
        .router
        .clone()
        .oneshot(json_request("/finance/profit/calculate", body))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let payload: serde_json::Value = decode_json(response).await;
    assert_eq!(payload["scenario"], "unshippable");
    // The field is present and explicitly null: never a fabricated zero.
    let object = payload.as_object().expect("object");
    assert!(object.contains_key("selected_shipping_cost"));
    assert!(payload["selected_shipping_cost"].is_null());
    assert!(payload.get("profit_amount").is_none());
    let warnings = payload["warnings"].as_array().expect("warnings");
    assert!(warnings
        .iter()
        .any(|w| w.as_str().is_some_and(|w| w.starts_with("UNSHIPPABLE"))));
}

#[tokio::test]
async fn profit_batch_isolates_items() {
    let harness = TestHarness::setup();
    let mut bad = profit_body();
    bad["selling_price"] = serde_json::json!(0);
    let body = serde_json::json!({ "requests": [profit_body(), bad] });
    let response = harness
        .router
        .clone()
        .oneshot(json_request("/finance/profit/batch", body))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let payload: serde_json::Value = decode_json(response).await;
    let items = payload.as_array().expect("items");
    assert_eq!(items[0]["status"], "ok");
    assert_eq!(items[0]["result"]["profit_amount"], 29.5);
    assert_eq!(items[1]["status"], "error");
    assert_eq!(items[1]["error"]["code"], "VALIDATION_FAILED");
    assert_eq!(items[1]["error"]["operation"], "profit.calculate");
}
