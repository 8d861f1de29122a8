use tower::util::ServiceExt;

use super::harness::{TestHarness, get_request};

#[tokio::test]
async fn responses_carry_security_and_no_store_headers() {
    let harness = TestHarness::setup();
    let response = harness
        .router
        .clone()
        .oneshot(get_request("/health"))
        .await
        .expect("response");

    let headers = response.headers();
    assert_eq!(
        headers.get("x-content-type-options").and_then(|v| v.to_str().ok()),
        Some("nosniff")
    );
    assert_eq!(
        headers.get("x-frame-options").and_then(|v| v.to_str().ok()),
        Some("DENY")
    );
    assert_eq!(
        headers.get("cache-control").and_then(|v| v.to_str().ok()),
        Some("no-store")
    );
    assert!(headers.contains_key("content-security-policy"));
    assert_eq!(
        headers.get("referrer-policy").and_then(|v| v.to_str().ok()),
        Some("no-referrer")
    );
}
