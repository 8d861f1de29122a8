//! Profit-margin calculation: platform fee resolution, shipping cost
//! selection (single service or comparator), margin analysis and
//! classification, and optimization suggestions.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::{
    CostBreakdown, MarginAnalysis, ProfitRequest, ProfitResult, ShippingResult, round_money,
    round_rate,
};
use crate::optimizer::{self, ProfitBasis};
use crate::rates::RateSnapshot;
use crate::shipping;

const SCENARIO_SINGLE: &str = "single";
const SCENARIO_COMPARISON: &str = "comparison";
const SCENARIO_UNSHIPPABLE: &str = "unshippable";

pub fn calculate(
    request: &ProfitRequest,
    snapshot: &RateSnapshot,
    config: &EngineConfig,
) -> Result<ProfitResult> {
    request.validate()?;
    let platform = snapshot.platform(&request.platform)?;

    let mut warnings = Vec::new();

    // Fee resolution: request override, then category rate, then the
    // platform default.
    let platform_fee_rate = match (request.platform_fee_rate, &request.category_code) {
        (Some(rate), _) => rate,
        (None, Some(category)) => match platform.category_fee_rates.get(category) {
            Some(rate) => *rate,
            None => {
                warnings.push(format!(
                    "CATEGORY_FEE_FALLBACK: no fee rate configured for category {category}, using platform default"
                ));
                platform.default_fee_rate
            }
        },
        (None, None) => platform.default_fee_rate,
    };
    let platform_fee = round_money(request.selling_price * platform_fee_rate);

    let shipping_request = request.shipping_request();
    let mut shipping_options: Option<BTreeMap<String, ShippingResult>> = None;
    let mut recommended_shipping = None;
    let mut scenario = SCENARIO_SINGLE;

    let selected: Option<ShippingResult> = if request.compare_shipping {
        scenario = SCENARIO_COMPARISON;
        let comparison = shipping::compare(&shipping_request, snapshot, None)?;
        recommended_shipping = comparison.recommended.clone();
        let selected = comparison.recommended.as_ref().and_then(|service| {
            comparison
                .results
                .iter()
                .find(|result| &result.service_type == service)
                .cloned()
        });
        shipping_options = Some(
            comparison
                .results
                .into_iter()
                .map(|result| (result.service_type.clone(), result))
                .collect(),
        );
        selected
    } else {
        let resolved = snapshot.resolve(
            &request.platform,
            request.preferred_service.as_deref(),
        )?;
        let result = shipping::calculate(&shipping_request, &resolved)?;
        if result.rejected {
            let reason = result
                .rejection_reason
                .map_or("unknown", |reason| reason.as_str());
            warnings.push(format!(
                "UNSHIPPABLE: service {} rejected the package ({reason})",
                result.service_type
            ));
            None
        } else {
            Some(result)
        }
    };

    let selected_shipping_cost = selected.as_ref().and_then(|result| result.total_cost);

    let Some(shipping_cost) = selected_shipping_cost else {
        // No usable shipping cost: profit cannot be computed and a zero cost
        // would silently overstate it.
        if request.compare_shipping {
            warnings.push(
                "UNSHIPPABLE: all candidate services rejected the package".to_string(),
            );
            scenario = SCENARIO_UNSHIPPABLE;
        }
        return Ok(ProfitResult {
            request_id: Uuid::new_v4().to_string(),
            sku: request.sku.clone(),
            platform: request.platform.clone(),
            fulfillment_model: request.fulfillment_model,
            cost: request.cost,
            selling_price: request.selling_price,
            platform_fee,
            platform_fee_rate,
            shipping_options,
            recommended_shipping,
            selected_shipping_cost: None,
            profit_amount: None,
            profit_rate: None,
            scenario: scenario.to_string(),
            margin_analysis: None,
            suggestions: Vec::new(),
            warnings,
            rate_version: snapshot.rate_version.clone(),
        });
    };

    let profit_amount = round_money(
        request.selling_price - request.cost - platform_fee - shipping_cost,
    );
    let profit_rate = round_rate(profit_amount / request.selling_price);
    if profit_amount < Decimal::ZERO {
        warnings.push(format!(
            "NEGATIVE_MARGIN: selling at {} loses {} per unit",
            request.selling_price,
            profit_amount.abs()
        ));
    }

    let margin_level = config.margin.classify(profit_rate);
    let margin_analysis = MarginAnalysis {
        gross_margin: profit_amount,
        gross_margin_rate: profit_rate,
        cost_breakdown: CostBreakdown {
            product_cost: round_money(request.cost),
            platform_fee,
            shipping_cost,
        },
        margin_level,
    };

    let suggestions = if profit_rate < config.optimizer.target_margin_rate {
        optimizer::suggest(
            &ProfitBasis {
                cost: request.cost,
                platform_fee_rate,
                shipping_cost,
                selling_price: request.selling_price,
            },
            &config.optimizer,
        )
    } else {
        Vec::new()
    };

    Ok(ProfitResult {
        request_id: Uuid::new_v4().to_string(),
        sku: request.sku.clone(),
        platform: request.platform.clone(),
        fulfillment_model: request.fulfillment_model,
        cost: request.cost,
        selling_price: request.selling_price,
        platform_fee,
        platform_fee_rate,
        shipping_options,
        recommended_shipping,
        selected_shipping_cost: Some(shipping_cost),
        profit_amount: Some(profit_amount),
        profit_rate: Some(profit_rate),
        scenario: scenario.to_string(),
        margin_analysis: Some(margin_analysis),
        suggestions,
        warnings,
        rate_version: snapshot.rate_version.clone(),
    })
}
