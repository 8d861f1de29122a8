use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use freightline_core::FreightError;
use freightline_core::models::{ProfitRequest, ShippingRequest};

use crate::WebState;
use crate::dto::{BatchEnvelope, ServiceTypesQuery, VersionsResponse};
use crate::error::freight_error_response;

pub async fn shipping_calculate(
    State(state): State<WebState>,
    Json(request): Json<ShippingRequest>,
) -> Response {
    match state.engine.calculate_shipping(&request) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => freight_error_response(err, "shipping.calculate"),
    }
}

pub async fn shipping_calculate_multiple(
    State(state): State<WebState>,
    Query(query): Query<ServiceTypesQuery>,
    Json(request): Json<ShippingRequest>,
) -> Response {
    let services = query.parse();
    match state
        .engine
        .compare_shipping(&request, services.as_deref())
    {
        // One entry per candidate service, best first; the head is the
        // recommendation.
        Ok(comparison) => (StatusCode::OK, Json(comparison.results)).into_response(),
        Err(err) => freight_error_response(err, "shipping.calculate-multiple"),
    }
}

pub async fn shipping_batch(
    State(state): State<WebState>,
    Json(envelope): Json<BatchEnvelope<ShippingRequest>>,
) -> Response {
    let items = state.engine.calculate_shipping_batch(&envelope.requests);
    (StatusCode::OK, Json(items)).into_response()
}

pub async fn profit_calculate(
    State(state): State<WebState>,
    Json(request): Json<ProfitRequest>,
) -> Response {
    match state.engine.calculate_profit(&request) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => freight_error_response(err, "profit.calculate"),
    }
}

pub async fn profit_batch(
    State(state): State<WebState>,
    Json(envelope): Json<BatchEnvelope<ProfitRequest>>,
) -> Response {
    let items = state.engine.calculate_profit_batch(&envelope.requests);
    (StatusCode::OK, Json(items)).into_response()
}

pub async fn rates_versions(State(state): State<WebState>) -> Response {
    match state.engine.rate_versions() {
        Ok(versions) => (StatusCode::OK, Json(VersionsResponse { versions })).into_response(),
        Err(err) => freight_error_response(err, "rates.versions"),
    }
}

pub async fn rates_reload(State(state): State<WebState>) -> Response {
    // Reload may fetch the rate source over blocking I/O; keep it off the
    // async worker threads.
    let engine = state.engine.clone();
    let reloaded = tokio::task::spawn_blocking(move || engine.reload_rates()).await;
    match reloaded {
        Ok(Ok(report)) => (StatusCode::OK, Json(report)).into_response(),
        Ok(Err(err)) => freight_error_response(err, "rates.reload"),
        Err(join_err) => freight_error_response(
            FreightError::Internal(format!("reload task failed: {join_err}")),
            "rates.reload",
        ),
    }
}

pub async fn health(State(state): State<WebState>) -> Response {
    match state.engine.health() {
        Ok(health) => (StatusCode::OK, Json(health)).into_response(),
        Err(err) => freight_error_response(err, "health"),
    }
}
