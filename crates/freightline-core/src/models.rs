use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorPayload, FreightError, Result};

pub(crate) const MONEY_DP: u32 = 2;
pub(crate) const WEIGHT_DP: u32 = 3;
pub(crate) const RATE_DP: u32 = 4;

pub(crate) fn round_money(value: Decimal) -> Decimal {
    value.round_dp(MONEY_DP)
}

pub(crate) fn round_weight(value: Decimal) -> Decimal {
    value.round_dp(WEIGHT_DP)
}

pub(crate) fn round_rate(value: Decimal) -> Decimal {
    value.round_dp(RATE_DP)
}

/// One package to price against a platform's carrier services.
///
/// Weights are grams, dimensions centimeters; all monetary fields are
/// decimal-precision values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingRequest {
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    pub weight_g: Decimal,
    pub length_cm: Decimal,
    pub width_cm: Decimal,
    pub height_cm: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_value: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selling_price: Option<Decimal>,
    #[serde(default)]
    pub battery: bool,
    #[serde(default)]
    pub fragile: bool,
    #[serde(default)]
    pub liquid: bool,
    #[serde(default)]
    pub insurance: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_value: Option<Decimal>,
}

impl ShippingRequest {
    /// Input validation happens before any rate lookup; malformed fields are
    /// never silently defaulted.
    pub fn validate(&self) -> Result<()> {
        if self.platform.trim().is_empty() {
            return Err(FreightError::Validation(
                "platform must not be empty".to_string(),
            ));
        }
        require_positive("weight_g", self.weight_g)?;
        require_positive("length_cm", self.length_cm)?;
        require_positive("width_cm", self.width_cm)?;
        require_positive("height_cm", self.height_cm)?;
        if let Some(value) = self.declared_value {
            require_non_negative("declared_value", value)?;
        }
        if self.insurance {
            match self.insurance_value {
                Some(value) => require_positive("insurance_value", value)?,
                None => {
                    return Err(FreightError::Validation(
                        "insurance_value is required when insurance is requested".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Why a carrier service cannot take a package. A rejection is a normal
/// calculation outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    WeightExceeded,
    DimensionExceeded,
    ServiceNotAvailable,
}

impl RejectionReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WeightExceeded => "WEIGHT_EXCEEDED",
            Self::DimensionExceeded => "DIMENSION_EXCEEDED",
            Self::ServiceNotAvailable => "SERVICE_NOT_AVAILABLE",
        }
    }
}

/// Fully audited outcome of pricing one package against one carrier service.
///
/// Every result pins the `rate_version` it was computed under so the figure
/// can be reproduced against that snapshot later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingResult {
    pub request_id: String,
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier_service: Option<String>,
    pub service_type: String,
    pub actual_weight_kg: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_weight_kg: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chargeable_weight_kg: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_step_kg: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rounded_weight_kg: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_rate: Option<Decimal>,
    /// Only surcharges that actually applied appear here; a zero surcharge is
    /// omitted rather than recorded.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub surcharges: BTreeMap<String, Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_days_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_days_max: Option<u32>,
    pub min_charge_applied: bool,
    pub oversize_applied: bool,
    pub rejected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<RejectionReason>,
    /// Which pricing branch fired: `standard`, `oversize`, `min_charge` or
    /// `rejected`.
    pub scenario: String,
    pub rate_id: String,
    pub rate_version: String,
    pub effective_from: DateTime<Utc>,
}

/// Comparator output: one entry per candidate service, best first, rejected
/// entries retained at the tail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceComparison {
    pub results: Vec<ShippingResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentModel {
    #[default]
    CrossBorder,
    OverseasWarehouse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitRequest {
    pub sku: String,
    pub platform: String,
    pub cost: Decimal,
    pub selling_price: Decimal,
    pub weight_g: Decimal,
    pub length_cm: Decimal,
    pub width_cm: Decimal,
    pub height_cm: Decimal,
    #[serde(default)]
    pub fulfillment_model: FulfillmentModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_fee_rate: Option<Decimal>,
    #[serde(default)]
    pub compare_shipping: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_service: Option<String>,
}

impl ProfitRequest {
    pub fn validate(&self) -> Result<()> {
        if self.sku.trim().is_empty() {
            return Err(FreightError::Validation("sku must not be empty".to_string()));
        }
        if self.platform.trim().is_empty() {
            return Err(FreightError::Validation(
                "platform must not be empty".to_string(),
            ));
        }
        require_non_negative("cost", self.cost)?;
        require_positive("selling_price", self.selling_price)?;
        require_positive("weight_g", self.weight_g)?;
        require_positive("length_cm", self.length_cm)?;
        require_positive("width_cm", self.width_cm)?;
        require_positive("height_cm", self.height_cm)?;
        if let Some(rate) = self.platform_fee_rate {
            require_fee_rate("platform_fee_rate", rate)?;
        }
        Ok(())
    }

    /// The shipping sub-request a profit calculation prices against. The
    /// selling price doubles as the declared customs value.
    #[must_use]
    pub fn shipping_request(&self) -> ShippingRequest {
        ShippingRequest {
            platform: self.platform.clone(),
            service_type: self.preferred_service.clone(),
            weight_g: self.weight_g,
            length_cm: self.length_cm,
            width_cm: self.width_cm,
            height_cm: self.height_cm,
            declared_value: Some(self.selling_price),
            selling_price: Some(self.selling_price),
            battery: false,
            fragile: false,
            liquid: false,
            insurance: false,
            insurance_value: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginLevel {
    Loss,
    Thin,
    Healthy,
    Strong,
}

impl MarginLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Loss => "loss",
            Self::Thin => "thin",
            Self::Healthy => "healthy",
            Self::Strong => "strong",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub product_cost: Decimal,
    pub platform_fee: Decimal,
    pub shipping_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginAnalysis {
    pub gross_margin: Decimal,
    pub gross_margin_rate: Decimal,
    pub cost_breakdown: CostBreakdown,
    pub margin_level: MarginLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSuggestion {
    pub suggested_price: Decimal,
    pub expected_profit: Decimal,
    pub expected_profit_rate: Decimal,
    pub price_adjustment: Decimal,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitResult {
    pub request_id: String,
    pub sku: String,
    pub platform: String,
    pub fulfillment_model: FulfillmentModel,
    pub cost: Decimal,
    pub selling_price: Decimal,
    pub platform_fee: Decimal,
    pub platform_fee_rate: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_options: Option<BTreeMap<String, ShippingResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_shipping: Option<String>,
    /// `null` when no candidate service could take the package; a missing
    /// shipping cost is never replaced by zero.
    pub selected_shipping_cost: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_rate: Option<Decimal>,
    pub scenario: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_analysis: Option<MarginAnalysis>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<PriceSuggestion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub rate_version: String,
}

/// Per-item outcome inside a batch; one bad item never fails its siblings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchItem<T> {
    Ok { index: usize, result: T },
    Error { index: usize, error: ErrorPayload },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub rate_version: String,
    pub effective_from: DateTime<Utc>,
    pub platforms: usize,
    pub services: usize,
}

fn require_positive(field: &str, value: Decimal) -> Result<()> {
    if value <= Decimal::ZERO {
        return Err(FreightError::Validation(format!(
            "{field} must be positive, got {value}"
        )));
    }
    Ok(())
}

fn require_non_negative(field: &str, value: Decimal) -> Result<()> {
    if value < Decimal::ZERO {
        return Err(FreightError::Validation(format!(
            "{field} must not be negative, got {value}"
        )));
    }
    Ok(())
}

fn require_fee_rate(field: &str, value: Decimal) -> Result<()> {
    if value < Decimal::ZERO || value >= Decimal::ONE {
        return Err(FreightError::Validation(format!(
            "{field} must be within [0, 1), got {value}"
        )));
    }
    Ok(())
}
