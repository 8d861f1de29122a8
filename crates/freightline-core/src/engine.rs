//! The engine facade: one shared rate registry plus configuration, exposing
//! every calculation flow. All calculation paths are pure over their inputs
//! and a snapshot pinned at entry, so a concurrent reload never changes the
//! version a request is served under.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::{
    BatchItem, HealthStatus, ProfitRequest, ProfitResult, ServiceComparison, ShippingRequest,
    ShippingResult,
};
use crate::rates::{RateRegistry, RateVersionInfo, ReloadReport};
use crate::{profit, shipping};

#[derive(Clone)]
pub struct Freightline {
    registry: Arc<RateRegistry>,
    config: Arc<EngineConfig>,
}

impl std::fmt::Debug for Freightline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Freightline").finish_non_exhaustive()
    }
}

impl Freightline {
    /// Build an engine with a freshly loaded registry.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let registry = Arc::new(RateRegistry::from_config(&config)?);
        Ok(Self {
            registry,
            config: Arc::new(config),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(EngineConfig::from_env())
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn calculate_shipping(&self, request: &ShippingRequest) -> Result<ShippingResult> {
        request.validate()?;
        let resolved = self
            .registry
            .resolve(&request.platform, request.service_type.as_deref())?;
        shipping::calculate(request, &resolved)
    }

    pub fn compare_shipping(
        &self,
        request: &ShippingRequest,
        service_types: Option<&[String]>,
    ) -> Result<ServiceComparison> {
        let snapshot = self.registry.current()?;
        shipping::compare(request, &snapshot, service_types)
    }

    #[must_use]
    pub fn calculate_shipping_batch(
        &self,
        requests: &[ShippingRequest],
    ) -> Vec<BatchItem<ShippingResult>> {
        requests
            .iter()
            .enumerate()
            .map(|(index, request)| match self.calculate_shipping(request) {
                Ok(result) => BatchItem::Ok { index, result },
                Err(err) => BatchItem::Error {
                    index,
                    error: err.to_payload("shipping.calculate"),
                },
            })
            .collect()
    }

    pub fn calculate_profit(&self, request: &ProfitRequest) -> Result<ProfitResult> {
        let snapshot = self.registry.current()?;
        profit::calculate(request, &snapshot, &self.config)
    }

    #[must_use]
    pub fn calculate_profit_batch(
        &self,
        requests: &[ProfitRequest],
    ) -> Vec<BatchItem<ProfitResult>> {
        requests
            .iter()
            .enumerate()
            .map(|(index, request)| match self.calculate_profit(request) {
                Ok(result) => BatchItem::Ok { index, result },
                Err(err) => BatchItem::Error {
                    index,
                    error: err.to_payload("profit.calculate"),
                },
            })
            .collect()
    }

    pub fn reload_rates(&self) -> Result<ReloadReport> {
        self.registry.reload()
    }

    pub fn rate_versions(&self) -> Result<Vec<RateVersionInfo>> {
        self.registry.list_versions()
    }

    pub fn health(&self) -> Result<HealthStatus> {
        let snapshot = self.registry.current()?;
        Ok(HealthStatus {
            status: "ok".to_string(),
            rate_version: snapshot.rate_version.clone(),
            effective_from: snapshot.effective_from,
            platforms: snapshot.platforms.len(),
            services: snapshot.service_count(),
        })
    }
}
