//! Tariff rule resolution, landed-cost calculation, and the operation
//! surface the hosting service exposes over HTTP.

pub mod calculator;
pub mod catalog;
pub mod domain;
pub mod resolver;
pub mod service;

#[cfg(test)]
mod tests;

pub use calculator::{compute, CostBreakdown};
pub use catalog::{CatalogError, RateCatalog};
pub use domain::{
    CalculationResult, CategoryCode, Country, CountryCode, NewTariffRule, ProductCategory, RuleId,
    TariffRule, TariffRuleDraft, TariffRuleView,
};
pub use resolver::{resolve, zero_rate_fallback, ResolutionError, ResolvedRate};
pub use service::{CalculationRequest, TariffError, TariffService};
