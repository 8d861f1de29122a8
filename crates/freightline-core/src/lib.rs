// Public fallible APIs in this crate share one concrete error contract (`FreightError`).
// Repeating per-function `# Errors` boilerplate obscures behavior more than it clarifies.
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod optimizer;
pub mod profit;
pub mod rates;
pub mod shipping;
pub mod weight;

pub use config::EngineConfig;
pub use engine::Freightline;
pub use error::{FreightError, Result};
pub use rates::{RateRegistry, RateSnapshot, ResolvedService};
