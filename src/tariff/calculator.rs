use rust_decimal::{Decimal, RoundingStrategy};

/// Tariff and landed-cost figures for one shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostBreakdown {
    pub tariff_amount: Decimal,
    pub total_cost: Decimal,
}

/// Landed-cost arithmetic.
///
/// `tariff_amount = round(declared_value * base_rate, 2, HALF_UP)` and
/// `total_cost = round(declared_value + tariff_amount + additional_fee, 2,
/// HALF_UP)`. Only the product and the final sum are rounded, in that order;
/// inputs are taken as given. Callers guarantee `declared_value > 0`.
///
/// Pure: identical inputs yield identical decimal outputs.
pub fn compute(declared_value: Decimal, base_rate: Decimal, additional_fee: Decimal) -> CostBreakdown {
    let tariff_amount = (declared_value * base_rate)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let total_cost = (declared_value + tariff_amount + additional_fee)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    CostBreakdown {
        tariff_amount,
        total_cost,
    }
}
