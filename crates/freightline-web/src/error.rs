use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use freightline_core::FreightError;

#[expect(
    clippy::needless_pass_by_value,
    reason = "handlers naturally own error values from `Result` and pass them through"
)]
pub fn freight_error_response(err: FreightError, operation: &str) -> Response {
    let status = status_for_freight_error(&err);
    let payload = err.to_payload(operation.to_string());
    (status, Json(payload)).into_response()
}

fn status_for_freight_error(err: &FreightError) -> StatusCode {
    match err {
        FreightError::Validation(_) => StatusCode::BAD_REQUEST,
        FreightError::RateNotFound(_) => StatusCode::NOT_FOUND,
        // A failed reload leaves the previous snapshot serving; the gateway
        // status points at the rate source, not this service.
        FreightError::ReloadFailed(_) => StatusCode::BAD_GATEWAY,
        FreightError::Io(_)
        | FreightError::Json(_)
        | FreightError::Toml(_)
        | FreightError::Http(_)
        | FreightError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
