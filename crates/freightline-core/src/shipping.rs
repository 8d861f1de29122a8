//! Shipping cost calculation: tier resolution, surcharge composition,
//! min-charge and rejection policy, and the multi-service comparator.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    RejectionReason, ServiceComparison, ShippingRequest, ShippingResult, round_money, round_weight,
};
use crate::rates::{RateSnapshot, ResolvedService, SurchargeRule};
use crate::weight::{self, NormalizedWeight};

const SCENARIO_STANDARD: &str = "standard";
const SCENARIO_OVERSIZE: &str = "oversize";
const SCENARIO_MIN_CHARGE: &str = "min_charge";
const SCENARIO_REJECTED: &str = "rejected";

/// Price one package against one resolved carrier service.
///
/// Validation failures are errors; a package the carrier cannot take is a
/// normal result with `rejected=true` and a machine-readable reason.
pub fn calculate(request: &ShippingRequest, resolved: &ResolvedService) -> Result<ShippingResult> {
    request.validate()?;

    let card = &resolved.card;
    let normalized = weight::normalize(
        request.weight_g,
        request.length_cm,
        request.width_cm,
        request.height_cm,
        card.volumetric_divisor,
    )?;

    // Rounding granularity comes from the tier covering the chargeable
    // weight; if the step pushes the weight across the next floor the final
    // tier is re-resolved against the rounded value.
    let step = card.tier_for(normalized.chargeable_kg)?.weight_step_kg;
    let rounded = weight::round_up_to_step(normalized.chargeable_kg, step)?;
    let tier = card.tier_for(rounded)?;

    let max_dimension = request
        .length_cm
        .max(request.width_cm)
        .max(request.height_cm);
    if rounded > card.max_weight_kg {
        return Ok(rejected_result(
            request,
            resolved,
            &normalized,
            step,
            rounded,
            RejectionReason::WeightExceeded,
        ));
    }
    if max_dimension > card.max_dimension_cm {
        return Ok(rejected_result(
            request,
            resolved,
            &normalized,
            step,
            rounded,
            RejectionReason::DimensionExceeded,
        ));
    }

    let weight_rate_cost = tier.weight_rate * (rounded - tier.weight_floor_kg);
    let subtotal = tier.base_rate + weight_rate_cost;

    let mut surcharges = BTreeMap::new();
    let mut apply = |key: &str, amount: Decimal| {
        let amount = round_money(amount);
        if amount > Decimal::ZERO {
            surcharges.insert(key.to_string(), amount);
        }
    };
    for rule in &card.surcharges {
        match rule {
            SurchargeRule::Battery { fee } if request.battery => apply(rule.key(), *fee),
            SurchargeRule::Fragile { rate } if request.fragile => apply(rule.key(), rate * subtotal),
            SurchargeRule::Liquid { fee } if request.liquid => apply(rule.key(), *fee),
            SurchargeRule::Insurance { rate } if request.insurance => {
                if let Some(insured) = request.insurance_value {
                    apply(rule.key(), rate * insured);
                }
            }
            _ => {}
        }
    }

    let oversize_applied = max_dimension > card.oversize_dimension_cm;
    if oversize_applied {
        apply("oversize", card.oversize_fee);
    }

    let surcharge_total: Decimal = surcharges.values().copied().sum();
    let raw_total = subtotal + surcharge_total;
    let min_charge_applied = card.min_charge > raw_total;
    let total_cost = round_money(raw_total.max(card.min_charge));

    let scenario = if min_charge_applied {
        SCENARIO_MIN_CHARGE
    } else if oversize_applied {
        SCENARIO_OVERSIZE
    } else {
        SCENARIO_STANDARD
    };

    Ok(ShippingResult {
        request_id: Uuid::new_v4().to_string(),
        platform: resolved.platform.clone(),
        carrier_service: Some(card.carrier.clone()),
        service_type: resolved.service_type.clone(),
        actual_weight_kg: round_weight(normalized.actual_kg),
        volume_weight_kg: Some(round_weight(normalized.volume_kg)),
        chargeable_weight_kg: Some(round_weight(normalized.chargeable_kg)),
        weight_step_kg: Some(step),
        rounded_weight_kg: Some(round_weight(rounded)),
        base_rate: Some(tier.base_rate),
        weight_rate: Some(tier.weight_rate),
        surcharges,
        total_cost: Some(total_cost),
        delivery_days_min: Some(card.delivery_days_min),
        delivery_days_max: Some(card.delivery_days_max),
        min_charge_applied,
        oversize_applied,
        rejected: false,
        rejection_reason: None,
        scenario: scenario.to_string(),
        rate_id: resolved.rate_id(),
        rate_version: resolved.rate_version.clone(),
        effective_from: resolved.effective_from,
    })
}

/// Price one package against several candidate services independently and
/// rank the survivors. Rejected and unavailable services are retained in the
/// output so the caller can see why an option was off the table.
pub fn compare(
    request: &ShippingRequest,
    snapshot: &RateSnapshot,
    service_types: Option<&[String]>,
) -> Result<ServiceComparison> {
    request.validate()?;
    let platform = snapshot.platform(&request.platform)?;

    let candidates: Vec<String> = match service_types {
        Some(explicit) if !explicit.is_empty() => explicit.to_vec(),
        _ => platform.services.keys().cloned().collect(),
    };

    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    for service in &candidates {
        match snapshot.resolve(&request.platform, Some(service)) {
            Ok(resolved) => match calculate(request, &resolved) {
                Ok(result) if result.rejected => rejected.push(result),
                Ok(result) => accepted.push(result),
                // Per-service isolation: a failure inside one candidate must
                // not abort the comparison of the others.
                Err(_) => rejected.push(unavailable_result(request, snapshot, service)),
            },
            Err(_) => rejected.push(unavailable_result(request, snapshot, service)),
        }
    }

    accepted.sort_by(compare_cost_then_speed_then_name);
    rejected.sort_by(|a, b| a.service_type.cmp(&b.service_type));

    let recommended = accepted.first().map(|best| best.service_type.clone());
    let mut results = accepted;
    results.extend(rejected);
    Ok(ServiceComparison {
        results,
        recommended,
    })
}

fn compare_cost_then_speed_then_name(a: &ShippingResult, b: &ShippingResult) -> Ordering {
    let cost_a = a.total_cost.unwrap_or(Decimal::MAX);
    let cost_b = b.total_cost.unwrap_or(Decimal::MAX);
    cost_a
        .cmp(&cost_b)
        .then_with(|| {
            a.delivery_days_max
                .unwrap_or(u32::MAX)
                .cmp(&b.delivery_days_max.unwrap_or(u32::MAX))
        })
        .then_with(|| a.service_type.cmp(&b.service_type))
}

fn rejected_result(
    request: &ShippingRequest,
    resolved: &ResolvedService,
    normalized: &NormalizedWeight,
    step: Decimal,
    rounded: Decimal,
    reason: RejectionReason,
) -> ShippingResult {
    ShippingResult {
        request_id: Uuid::new_v4().to_string(),
        platform: resolved.platform.clone(),
        carrier_service: Some(resolved.card.carrier.clone()),
        service_type: resolved.service_type.clone(),
        actual_weight_kg: round_weight(normalized.actual_kg),
        volume_weight_kg: Some(round_weight(normalized.volume_kg)),
        chargeable_weight_kg: Some(round_weight(normalized.chargeable_kg)),
        weight_step_kg: Some(step),
        rounded_weight_kg: Some(round_weight(rounded)),
        base_rate: None,
        weight_rate: None,
        surcharges: BTreeMap::new(),
        total_cost: None,
        delivery_days_min: None,
        delivery_days_max: None,
        min_charge_applied: false,
        oversize_applied: false,
        rejected: true,
        rejection_reason: Some(reason),
        scenario: SCENARIO_REJECTED.to_string(),
        rate_id: resolved.rate_id(),
        rate_version: resolved.rate_version.clone(),
        effective_from: resolved.effective_from,
    }
}

/// Entry for a service the platform does not offer (or that failed
/// internally): retained in comparator output as a rejection so callers see
/// why the option was unavailable.
fn unavailable_result(
    request: &ShippingRequest,
    snapshot: &RateSnapshot,
    service: &str,
) -> ShippingResult {
    ShippingResult {
        request_id: Uuid::new_v4().to_string(),
        platform: request.platform.clone(),
        carrier_service: None,
        service_type: service.to_string(),
        actual_weight_kg: round_weight(request.weight_g / Decimal::from(1000)),
        volume_weight_kg: None,
        chargeable_weight_kg: None,
        weight_step_kg: None,
        rounded_weight_kg: None,
        base_rate: None,
        weight_rate: None,
        surcharges: BTreeMap::new(),
        total_cost: None,
        delivery_days_min: None,
        delivery_days_max: None,
        min_charge_applied: false,
        oversize_applied: false,
        rejected: true,
        rejection_reason: Some(RejectionReason::ServiceNotAvailable),
        scenario: SCENARIO_REJECTED.to_string(),
        rate_id: format!("{}/{}@{}", request.platform, service, snapshot.rate_version),
        rate_version: snapshot.rate_version.clone(),
        effective_from: snapshot.effective_from,
    }
}
