use anyhow::{Context, Result};
use axum::{
    Router, middleware,
    routing::{get, post},
};

use freightline_core::Freightline;

mod dto;
mod error;
mod handlers;
mod security;

#[cfg(test)]
mod tests;

#[derive(Clone)]
pub(crate) struct WebState {
    pub(crate) engine: Freightline,
}

impl WebState {
    const fn new(engine: Freightline) -> Self {
        Self { engine }
    }
}

/// Start the calculation service and block until shutdown.
///
/// # Errors
/// Returns an error when the runtime cannot be created, the socket cannot be
/// bound, or the server exits with a runtime failure.
pub fn serve_web(engine: Freightline, host: &str, port: u16) -> Result<()> {
    let health = engine
        .health()
        .context("rate registry is not serving; refusing to start")?;
    let state = WebState::new(engine);
    let bind_addr = format!("{host}:{port}");
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build web runtime")?;

    println!(
        "rate snapshot loaded: rate_version={} platforms={} services={}",
        health.rate_version, health.platforms, health.services
    );

    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("failed to bind calculation service at {bind_addr}"))?;
        println!("freightline listening on http://{}", listener.local_addr()?);

        axum::serve(listener, app_router(state))
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
            .context("calculation service failed")
    })
}

pub(crate) fn app_router(state: WebState) -> Router {
    Router::new()
        .route(
            "/finance/shipping/calculate",
            post(handlers::shipping_calculate),
        )
        .route(
            "/finance/shipping/calculate-multiple",
            post(handlers::shipping_calculate_multiple),
        )
        .route("/finance/shipping/batch", post(handlers::shipping_batch))
        .route("/finance/profit/calculate", post(handlers::profit_calculate))
        .route("/finance/profit/batch", post(handlers::profit_batch))
        .route("/finance/rates/versions", get(handlers::rates_versions))
        .route("/finance/rates/reload", get(handlers::rates_reload))
        .route("/health", get(handlers::health))
        .layer(middleware::from_fn(security::security_headers_middleware))
        .with_state(state)
}
