//! Closed-form price optimization. Platform fee scales linearly with price
//! while cost and shipping are fixed, so target prices solve directly:
//! iterating would only add nondeterminism. Shipping cost is weight- and
//! dimension-driven and does not change with the suggested price.

use rust_decimal::Decimal;

use crate::config::OptimizerConfig;
use crate::models::{PriceSuggestion, round_money, round_rate};

/// Fixed cost structure a suggestion is computed against.
#[derive(Debug, Clone, Copy)]
pub struct ProfitBasis {
    pub cost: Decimal,
    pub platform_fee_rate: Decimal,
    pub shipping_cost: Decimal,
    pub selling_price: Decimal,
}

/// One suggestion per configured target tier: break-even, then the target
/// margin rate. Targets the current price already meets are skipped, as are
/// targets the fee structure makes unreachable.
#[must_use]
pub fn suggest(basis: &ProfitBasis, config: &OptimizerConfig) -> Vec<PriceSuggestion> {
    let mut suggestions = Vec::new();

    if let Some(price) = price_for_profit(basis, Decimal::ZERO) {
        push_suggestion(
            &mut suggestions,
            basis,
            price,
            "break even at the current cost structure",
        );
    }

    let target = config.target_margin_rate;
    if let Some(price) = price_for_margin_rate(basis, target) {
        push_suggestion(
            &mut suggestions,
            basis,
            price,
            &format!("reach the target margin rate of {target}"),
        );
    }

    suggestions
}

/// `price * (1 - fee) - cost - shipping = target_profit`, solved for price.
fn price_for_profit(basis: &ProfitBasis, target_profit: Decimal) -> Option<Decimal> {
    let denominator = Decimal::ONE - basis.platform_fee_rate;
    if denominator <= Decimal::ZERO {
        return None;
    }
    Some((target_profit + basis.cost + basis.shipping_cost) / denominator)
}

/// `price * (1 - fee - margin) = cost + shipping`, solved for price.
fn price_for_margin_rate(basis: &ProfitBasis, margin_rate: Decimal) -> Option<Decimal> {
    let denominator = Decimal::ONE - basis.platform_fee_rate - margin_rate;
    if denominator <= Decimal::ZERO {
        return None;
    }
    Some((basis.cost + basis.shipping_cost) / denominator)
}

fn push_suggestion(
    suggestions: &mut Vec<PriceSuggestion>,
    basis: &ProfitBasis,
    raw_price: Decimal,
    reason: &str,
) {
    let suggested_price = round_money(raw_price);
    if suggested_price <= basis.selling_price {
        return;
    }
    let expected_profit = round_money(
        suggested_price * (Decimal::ONE - basis.platform_fee_rate)
            - basis.cost
            - basis.shipping_cost,
    );
    let expected_profit_rate = round_rate(expected_profit / suggested_price);
    suggestions.push(PriceSuggestion {
        suggested_price,
        expected_profit,
        expected_profit_rate,
        price_adjustment: round_money(suggested_price - basis.selling_price),
        reason: reason.to_string(),
    });
}
