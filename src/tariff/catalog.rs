use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::domain::{
    CategoryCode, Country, CountryCode, NewTariffRule, ProductCategory, RuleId, TariffRule,
};

/// Access to the rate reference data, owned by an external store.
///
/// Read methods back resolution and search; write methods carry the
/// administrative mutations through. Serialization of concurrent writes is
/// the implementor's concern, not the engine's.
pub trait RateCatalog: Send + Sync {
    fn country_by_code(&self, code: &CountryCode) -> Result<Option<Country>, CatalogError>;

    fn category_by_code(&self, code: &CategoryCode) -> Result<Option<ProductCategory>, CatalogError>;

    /// Rules for the exact triple whose window covers `date`, ordered by
    /// `effective_from` descending.
    fn applicable_rules(
        &self,
        origin: &CountryCode,
        destination: &CountryCode,
        category: &CategoryCode,
        date: NaiveDate,
    ) -> Result<Vec<TariffRule>, CatalogError>;

    /// The most recently started rule for `category` with
    /// `base_rate > min_base_rate`, across any origin/destination.
    fn fallback_rule(
        &self,
        category: &CategoryCode,
        min_base_rate: Decimal,
    ) -> Result<Option<TariffRule>, CatalogError>;

    /// Rules matching every provided filter; a `None` filter matches all.
    fn search(
        &self,
        origin: Option<&CountryCode>,
        destination: Option<&CountryCode>,
        category: Option<&CategoryCode>,
    ) -> Result<Vec<TariffRule>, CatalogError>;

    fn rule_by_id(&self, id: RuleId) -> Result<Option<TariffRule>, CatalogError>;

    /// Persists a new rule, assigning its identifier.
    fn insert(&self, rule: NewTariffRule) -> Result<TariffRule, CatalogError>;

    fn update(&self, rule: TariffRule) -> Result<TariffRule, CatalogError>;

    fn delete(&self, id: RuleId) -> Result<(), CatalogError>;
}

/// Error enumeration for catalog failures.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("rule not found")]
    NotFound,
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}
