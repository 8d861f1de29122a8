use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::MarginLevel;

mod env;

pub(crate) const RATES_SOURCE_ENV: &str = "FREIGHTLINE_RATES_SOURCE";
pub(crate) const RELOAD_TIMEOUT_MS_ENV: &str = "FREIGHTLINE_RELOAD_TIMEOUT_MS";
const MARGIN_THIN_ENV: &str = "FREIGHTLINE_MARGIN_THIN";
const MARGIN_HEALTHY_ENV: &str = "FREIGHTLINE_MARGIN_HEALTHY";
const TARGET_MARGIN_ENV: &str = "FREIGHTLINE_TARGET_MARGIN";

const DEFAULT_RELOAD_TIMEOUT_MS: u64 = 10_000;

/// Margin-rate ceilings separating the qualitative margin levels. These are
/// business configuration, overridable per deployment, not hard-coded truth.
#[derive(Debug, Clone, Copy)]
pub struct MarginThresholds {
    /// Gross margin rates in `[0, thin)` classify as thin.
    pub thin: Decimal,
    /// Gross margin rates in `[thin, healthy)` classify as healthy; anything
    /// at or above is strong. Negative margins are always a loss.
    pub healthy: Decimal,
}

impl Default for MarginThresholds {
    fn default() -> Self {
        Self {
            thin: dec!(0.10),
            healthy: dec!(0.25),
        }
    }
}

impl MarginThresholds {
    #[must_use]
    pub fn classify(&self, margin_rate: Decimal) -> MarginLevel {
        if margin_rate < Decimal::ZERO {
            MarginLevel::Loss
        } else if margin_rate < self.thin {
            MarginLevel::Thin
        } else if margin_rate < self.healthy {
            MarginLevel::Healthy
        } else {
            MarginLevel::Strong
        }
    }
}

/// Price-optimization targets. One break-even suggestion is always considered;
/// `target_margin_rate` drives the aspirational tier and doubles as the
/// threshold below which suggestions are attached to a profit result.
#[derive(Debug, Clone, Copy)]
pub struct OptimizerConfig {
    pub target_margin_rate: Decimal,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            target_margin_rate: dec!(0.25),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// File path or HTTP(S) URL of the rate source; the embedded default rate
    /// card is used when unset.
    pub rates_source: Option<String>,
    pub reload_timeout_ms: u64,
    pub margin: MarginThresholds,
    pub optimizer: OptimizerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rates_source: None,
            reload_timeout_ms: DEFAULT_RELOAD_TIMEOUT_MS,
            margin: MarginThresholds::default(),
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let mut margin = MarginThresholds::default();
        if let Some(thin) = env::read_env_decimal(MARGIN_THIN_ENV) {
            margin.thin = thin;
        }
        if let Some(healthy) = env::read_env_decimal(MARGIN_HEALTHY_ENV) {
            margin.healthy = healthy;
        }
        let mut optimizer = OptimizerConfig::default();
        if let Some(target) = env::read_env_decimal(TARGET_MARGIN_ENV) {
            optimizer.target_margin_rate = target;
        }
        Self {
            rates_source: env::read_non_empty_env(RATES_SOURCE_ENV),
            reload_timeout_ms: env::read_env_u64(
                RELOAD_TIMEOUT_MS_ENV,
                DEFAULT_RELOAD_TIMEOUT_MS,
                100,
            ),
            margin,
            optimizer,
        }
    }
}
