use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Explanation attached to every calculation result.
pub const COST_FORMULA_NOTE: &str =
    "Total = declaredValue + (declaredValue * baseRate) + additionalFee";

/// Three-letter uppercase country code, e.g. `SGP`. Construction normalizes
/// case and surrounding whitespace so catalog lookups are uniform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CountryCode(String);

impl CountryCode {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Short uppercase product-category code, e.g. `ELEC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryCode(String);

impl CategoryCode {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference country entity, seeded and administered outside the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub code: CountryCode,
    pub name: String,
}

/// Reference product-category entity, same lifecycle as [`Country`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCategory {
    pub code: CategoryCode,
    pub name: String,
}

/// Catalog-assigned tariff rule identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleId(pub u64);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A rate record governing one (origin, destination, category) triple over a
/// date window. `effective_to` of `None` means open-ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffRule {
    pub id: RuleId,
    pub origin: CountryCode,
    pub destination: CountryCode,
    pub category: CategoryCode,
    /// Fractional rate: 0.05 means 5%.
    pub base_rate: Decimal,
    /// Flat per-shipment fee in destination-currency units.
    pub additional_fee: Decimal,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}

impl TariffRule {
    /// Whether the rule's effective window covers `date` (bounds inclusive).
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.effective_from <= date && self.effective_to.map_or(true, |until| until >= date)
    }
}

/// A validated rule awaiting a catalog-assigned identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTariffRule {
    pub origin: CountryCode,
    pub destination: CountryCode,
    pub category: CategoryCode,
    pub base_rate: Decimal,
    pub additional_fee: Decimal,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}

/// Raw administrative mutation payload. Codes are unvalidated caller input;
/// the service resolves them against the catalog before any write.
#[derive(Debug, Clone, Deserialize)]
pub struct TariffRuleDraft {
    pub origin: String,
    pub destination: String,
    pub category: String,
    pub base_rate: Decimal,
    pub additional_fee: Decimal,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}

/// Serialized representation of a rule for search results and admin reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffRuleView {
    pub id: RuleId,
    pub origin: CountryCode,
    pub destination: CountryCode,
    pub category: CategoryCode,
    pub base_rate: Decimal,
    pub additional_fee: Decimal,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}

impl TariffRuleView {
    pub fn from_rule(rule: &TariffRule) -> Self {
        Self {
            id: rule.id,
            origin: rule.origin.clone(),
            destination: rule.destination.clone(),
            category: rule.category.clone(),
            base_rate: rule.base_rate,
            additional_fee: rule.additional_fee,
            effective_from: rule.effective_from,
            effective_to: rule.effective_to,
        }
    }
}

/// Outcome of one calculation. Built fresh per request and immutable once
/// returned; the audit trail stores a serialized snapshot of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub origin: CountryCode,
    pub destination: CountryCode,
    pub category: CategoryCode,
    pub effective_date: NaiveDate,
    pub declared_value: Decimal,
    pub base_rate: Decimal,
    pub additional_fee: Decimal,
    pub tariff_amount: Decimal,
    pub total_cost: Decimal,
    pub notes: String,
    pub ai_summary: Option<String>,
}
