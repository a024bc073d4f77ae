use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use super::catalog::{CatalogError, RateCatalog};
use super::domain::{CategoryCode, CountryCode, TariffRule};

/// The governing rule for a query plus the rate values in force. When the
/// zero-rate policy fires, `base_rate`/`additional_fee` come from the
/// category benchmark while `rule` keeps the originally resolved identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRate {
    pub rule: TariffRule,
    pub base_rate: Decimal,
    pub additional_fee: Decimal,
    pub fallback_applied: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error(
        "No applicable tariff rate found for route {origin} -> {destination}, category {category} on {date}"
    )]
    RateNotFound {
        origin: CountryCode,
        destination: CountryCode,
        category: CategoryCode,
        date: NaiveDate,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Selects the single rule governing the triple on `as_of`.
///
/// The most recently started covering window wins; overlapping windows are
/// tolerated and decided by the same ordering. Equal `effective_from` rows
/// are a data-quality violation, tie-broken by descending rule id so repeated
/// calls over unchanged data stay deterministic.
pub fn resolve<C: RateCatalog>(
    catalog: &C,
    origin: &CountryCode,
    destination: &CountryCode,
    category: &CategoryCode,
    as_of: NaiveDate,
) -> Result<ResolvedRate, ResolutionError> {
    let mut candidates = catalog.applicable_rules(origin, destination, category, as_of)?;
    // The catalog contract already orders by effective_from descending;
    // re-sorting keeps the tie-break independent of the backing store.
    candidates.sort_by(|a, b| {
        b.effective_from
            .cmp(&a.effective_from)
            .then(b.id.cmp(&a.id))
    });

    let Some(rule) = candidates.into_iter().next() else {
        return Err(ResolutionError::RateNotFound {
            origin: origin.clone(),
            destination: destination.clone(),
            category: category.clone(),
            date: as_of,
        });
    };

    if rule.base_rate.is_zero() && rule.additional_fee.is_zero() {
        if let Some(benchmark) = zero_rate_fallback(catalog, category)? {
            debug!(
                rule_id = rule.id.0,
                benchmark_id = benchmark.id.0,
                category = %category,
                "zero-rate rule substituted with category benchmark values"
            );
            return Ok(ResolvedRate {
                base_rate: benchmark.base_rate,
                additional_fee: benchmark.additional_fee,
                rule,
                fallback_applied: true,
            });
        }
    }

    let (base_rate, additional_fee) = (rule.base_rate, rule.additional_fee);
    Ok(ResolvedRate {
        rule,
        base_rate,
        additional_fee,
        fallback_applied: false,
    })
}

/// Zero-rate substitution policy: an all-zero placeholder row must not quote
/// a free shipment, so the most recently started rule for the same category
/// with a strictly positive base rate supplies the working values. The
/// benchmark's origin/destination are deliberately ignored; the policy is
/// scoped by category alone.
pub fn zero_rate_fallback<C: RateCatalog>(
    catalog: &C,
    category: &CategoryCode,
) -> Result<Option<TariffRule>, CatalogError> {
    catalog.fallback_rule(category, Decimal::ZERO)
}
