//! Versioned, immutable rate tables with atomic hot-reload.
//!
//! The registry publishes `Arc<RateSnapshot>` values and swaps a single
//! pointer on reload; a published snapshot is never mutated, so any
//! calculation holding a reference completes against a fully consistent
//! table even when a reload lands mid-flight.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{FreightError, Result};

mod source;

pub(crate) use source::RateSource;

/// A weight-range-scoped pricing rule. A tier covers
/// `[weight_floor_kg, next tier floor)` and carries its own rounding
/// granularity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTier {
    pub weight_floor_kg: Decimal,
    pub weight_step_kg: Decimal,
    pub base_rate: Decimal,
    pub weight_rate: Decimal,
}

/// One surcharge kind with its computation rule. Adding a kind is a local
/// change here plus one arm in the cost composer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SurchargeRule {
    Battery { fee: Decimal },
    Fragile { rate: Decimal },
    Liquid { fee: Decimal },
    Insurance { rate: Decimal },
}

impl SurchargeRule {
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Battery { .. } => "battery",
            Self::Fragile { .. } => "fragile",
            Self::Liquid { .. } => "liquid",
            Self::Insurance { .. } => "insurance",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRateCard {
    pub carrier: String,
    pub volumetric_divisor: Decimal,
    pub max_weight_kg: Decimal,
    pub max_dimension_cm: Decimal,
    pub oversize_dimension_cm: Decimal,
    pub oversize_fee: Decimal,
    pub min_charge: Decimal,
    pub delivery_days_min: u32,
    pub delivery_days_max: u32,
    /// Sorted ascending by floor, validated non-overlapping at load time.
    pub tiers: Vec<RateTier>,
    pub surcharges: Vec<SurchargeRule>,
}

impl ServiceRateCard {
    /// The tier whose `[floor, next floor)` range contains `weight_kg`.
    pub fn tier_for(&self, weight_kg: Decimal) -> Result<&RateTier> {
        self.tiers
            .iter()
            .rev()
            .find(|tier| weight_kg >= tier.weight_floor_kg)
            .ok_or_else(|| {
                FreightError::Internal(format!("no tier covers weight {weight_kg} kg"))
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformRates {
    pub default_service: String,
    pub default_fee_rate: Decimal,
    pub category_fee_rates: BTreeMap<String, Decimal>,
    pub services: BTreeMap<String, ServiceRateCard>,
}

/// An immutable published version of all rate tables. Replaying the same
/// inputs against the same snapshot reproduces the same figures forever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub rate_version: String,
    pub effective_from: DateTime<Utc>,
    pub platforms: BTreeMap<String, PlatformRates>,
}

impl RateSnapshot {
    pub fn platform(&self, name: &str) -> Result<&PlatformRates> {
        self.platforms
            .get(name)
            .ok_or_else(|| FreightError::RateNotFound(format!("unknown platform: {name}")))
    }

    /// Resolve a (platform, service) pair to its rate card, pinned to this
    /// snapshot's version. `None` selects the platform's default service.
    pub fn resolve(&self, platform: &str, service_type: Option<&str>) -> Result<ResolvedService> {
        let rates = self.platform(platform)?;
        let service = service_type.unwrap_or(&rates.default_service);
        let card = rates.services.get(service).ok_or_else(|| {
            FreightError::RateNotFound(format!(
                "platform {platform} has no service: {service}"
            ))
        })?;
        Ok(ResolvedService {
            platform: platform.to_string(),
            service_type: service.to_string(),
            rate_version: self.rate_version.clone(),
            effective_from: self.effective_from,
            card: card.clone(),
        })
    }

    #[must_use]
    pub fn service_count(&self) -> usize {
        self.platforms.values().map(|p| p.services.len()).sum()
    }
}

/// A rate card pinned to the snapshot version it was resolved from.
#[derive(Debug, Clone)]
pub struct ResolvedService {
    pub platform: String,
    pub service_type: String,
    pub rate_version: String,
    pub effective_from: DateTime<Utc>,
    pub card: ServiceRateCard,
}

impl ResolvedService {
    #[must_use]
    pub fn rate_id(&self) -> String {
        format!(
            "{}/{}@{}",
            self.platform, self.service_type, self.rate_version
        )
    }
}

/// Audit record for one published version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateVersionInfo {
    pub rate_version: String,
    pub effective_from: DateTime<Utc>,
    pub loaded_at: DateTime<Utc>,
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadReport {
    pub rate_version: String,
    pub effective_from: DateTime<Utc>,
    pub platforms: usize,
    pub services: usize,
    /// False when the source produced the version already serving.
    pub changed: bool,
}

pub struct RateRegistry {
    source: RateSource,
    reload_timeout: Duration,
    current: RwLock<Arc<RateSnapshot>>,
    history: Mutex<Vec<RateVersionInfo>>,
}

impl std::fmt::Debug for RateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateRegistry").finish_non_exhaustive()
    }
}

impl RateRegistry {
    /// Build a registry and perform the initial load. A registry never
    /// starts empty: construction fails if the configured source cannot be
    /// loaded.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let source = RateSource::from_config(config.rates_source.as_deref());
        let reload_timeout = Duration::from_millis(config.reload_timeout_ms);
        let text = source.fetch(reload_timeout)?;
        let snapshot = Arc::new(source::build_snapshot(&text)?);
        let info = RateVersionInfo {
            rate_version: snapshot.rate_version.clone(),
            effective_from: snapshot.effective_from,
            loaded_at: Utc::now(),
            source: source.describe(),
        };
        Ok(Self {
            source,
            reload_timeout,
            current: RwLock::new(snapshot),
            history: Mutex::new(vec![info]),
        })
    }

    /// The active snapshot. Callers pin this `Arc` for the whole of one
    /// calculation so a concurrent reload cannot change the version
    /// mid-request.
    pub fn current(&self) -> Result<Arc<RateSnapshot>> {
        let guard = self
            .current
            .read()
            .map_err(|_| FreightError::Internal("rate registry lock poisoned".to_string()))?;
        Ok(Arc::clone(&guard))
    }

    pub fn resolve(&self, platform: &str, service_type: Option<&str>) -> Result<ResolvedService> {
        self.current()?.resolve(platform, service_type)
    }

    /// Re-read the rate source and atomically publish a new snapshot. On any
    /// fetch, parse or validation failure the previous snapshot stays
    /// active: the registry fails closed to the last known-good table, never
    /// to an empty one.
    pub fn reload(&self) -> Result<ReloadReport> {
        let text = self
            .source
            .fetch(self.reload_timeout)
            .map_err(|err| FreightError::ReloadFailed(err.to_string()))?;
        let snapshot = match source::build_snapshot(&text) {
            Ok(snapshot) => Arc::new(snapshot),
            Err(err @ FreightError::ReloadFailed(_)) => return Err(err),
            Err(err) => return Err(FreightError::ReloadFailed(err.to_string())),
        };

        let mut guard = self
            .current
            .write()
            .map_err(|_| FreightError::Internal("rate registry lock poisoned".to_string()))?;
        let changed = guard.rate_version != snapshot.rate_version;
        let report = ReloadReport {
            rate_version: snapshot.rate_version.clone(),
            effective_from: snapshot.effective_from,
            platforms: snapshot.platforms.len(),
            services: snapshot.service_count(),
            changed,
        };
        if changed {
            let info = RateVersionInfo {
                rate_version: snapshot.rate_version.clone(),
                effective_from: snapshot.effective_from,
                loaded_at: Utc::now(),
                source: self.source.describe(),
            };
            *guard = snapshot;
            drop(guard);
            self.history
                .lock()
                .map_err(|_| FreightError::Internal("rate history lock poisoned".to_string()))?
                .push(info);
        }
        Ok(report)
    }

    /// Publication history, oldest first.
    pub fn list_versions(&self) -> Result<Vec<RateVersionInfo>> {
        Ok(self
            .history
            .lock()
            .map_err(|_| FreightError::Internal("rate history lock poisoned".to_string()))?
            .clone())
    }
}
