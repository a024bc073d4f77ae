use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::audit::{AuditSink, AuditSinkError, QueryAuditEntry};
use crate::summary::{GenerationError, TextGenerator};
use crate::tariff::catalog::{CatalogError, RateCatalog};
use crate::tariff::domain::{
    CategoryCode, Country, CountryCode, NewTariffRule, ProductCategory, RuleId, TariffRule,
};
use crate::tariff::service::{CalculationRequest, TariffService};

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn rule(
    id: u64,
    origin: &str,
    destination: &str,
    category: &str,
    base_rate: Decimal,
    additional_fee: Decimal,
    effective_from: NaiveDate,
    effective_to: Option<NaiveDate>,
) -> TariffRule {
    TariffRule {
        id: RuleId(id),
        origin: CountryCode::new(origin),
        destination: CountryCode::new(destination),
        category: CategoryCode::new(category),
        base_rate,
        additional_fee,
        effective_from,
        effective_to,
    }
}

/// The standard SGP -> USA electronics rule used across the suite: 5% base
/// rate, $10 flat fee, open-ended from 2025-01-01.
pub(super) fn sample_rule() -> TariffRule {
    rule(
        1,
        "SGP",
        "USA",
        "ELEC",
        dec!(0.05),
        dec!(10.00),
        date(2025, 1, 1),
        None,
    )
}

pub(super) fn calc_request(declared_value: Decimal) -> CalculationRequest {
    CalculationRequest {
        origin: "SGP".to_string(),
        destination: "USA".to_string(),
        category: "ELEC".to_string(),
        declared_value,
        as_of: Some(date(2025, 6, 1)),
        include_summary: false,
    }
}

/// In-memory catalog with call counters so tests can assert which
/// collaborators an operation touched.
pub(super) struct MemoryCatalog {
    countries: Vec<Country>,
    categories: Vec<ProductCategory>,
    rules: Mutex<Vec<TariffRule>>,
    next_id: AtomicU64,
    pub(super) reference_lookups: AtomicUsize,
    pub(super) rule_queries: AtomicUsize,
}

impl MemoryCatalog {
    pub(super) fn seeded(rules: Vec<TariffRule>) -> Self {
        let next_id = rules.iter().map(|r| r.id.0).max().unwrap_or(0) + 1;
        Self {
            countries: vec![
                Country {
                    code: CountryCode::new("SGP"),
                    name: "Singapore".to_string(),
                },
                Country {
                    code: CountryCode::new("USA"),
                    name: "United States".to_string(),
                },
                Country {
                    code: CountryCode::new("CHN"),
                    name: "China".to_string(),
                },
            ],
            categories: vec![
                ProductCategory {
                    code: CategoryCode::new("ELEC"),
                    name: "Electronics".to_string(),
                },
                ProductCategory {
                    code: CategoryCode::new("STEEL"),
                    name: "Steel Products".to_string(),
                },
            ],
            rules: Mutex::new(rules),
            next_id: AtomicU64::new(next_id),
            reference_lookups: AtomicUsize::new(0),
            rule_queries: AtomicUsize::new(0),
        }
    }

    pub(super) fn collaborator_calls(&self) -> usize {
        self.reference_lookups.load(Ordering::Relaxed) + self.rule_queries.load(Ordering::Relaxed)
    }

    pub(super) fn stored_rules(&self) -> Vec<TariffRule> {
        self.rules.lock().expect("catalog mutex poisoned").clone()
    }
}

impl RateCatalog for MemoryCatalog {
    fn country_by_code(&self, code: &CountryCode) -> Result<Option<Country>, CatalogError> {
        self.reference_lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .countries
            .iter()
            .find(|country| &country.code == code)
            .cloned())
    }

    fn category_by_code(
        &self,
        code: &CategoryCode,
    ) -> Result<Option<ProductCategory>, CatalogError> {
        self.reference_lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .categories
            .iter()
            .find(|category| &category.code == code)
            .cloned())
    }

    fn applicable_rules(
        &self,
        origin: &CountryCode,
        destination: &CountryCode,
        category: &CategoryCode,
        covering: NaiveDate,
    ) -> Result<Vec<TariffRule>, CatalogError> {
        self.rule_queries.fetch_add(1, Ordering::Relaxed);
        let mut matches: Vec<TariffRule> = self
            .rules
            .lock()
            .expect("catalog mutex poisoned")
            .iter()
            .filter(|rule| {
                &rule.origin == origin
                    && &rule.destination == destination
                    && &rule.category == category
                    && rule.covers(covering)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.effective_from.cmp(&a.effective_from));
        Ok(matches)
    }

    fn fallback_rule(
        &self,
        category: &CategoryCode,
        min_base_rate: Decimal,
    ) -> Result<Option<TariffRule>, CatalogError> {
        self.rule_queries.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .rules
            .lock()
            .expect("catalog mutex poisoned")
            .iter()
            .filter(|rule| &rule.category == category && rule.base_rate > min_base_rate)
            .max_by_key(|rule| (rule.effective_from, rule.id))
            .cloned())
    }

    fn search(
        &self,
        origin: Option<&CountryCode>,
        destination: Option<&CountryCode>,
        category: Option<&CategoryCode>,
    ) -> Result<Vec<TariffRule>, CatalogError> {
        self.rule_queries.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .rules
            .lock()
            .expect("catalog mutex poisoned")
            .iter()
            .filter(|rule| {
                origin.map_or(true, |code| &rule.origin == code)
                    && destination.map_or(true, |code| &rule.destination == code)
                    && category.map_or(true, |code| &rule.category == code)
            })
            .cloned()
            .collect())
    }

    fn rule_by_id(&self, id: RuleId) -> Result<Option<TariffRule>, CatalogError> {
        self.rule_queries.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .rules
            .lock()
            .expect("catalog mutex poisoned")
            .iter()
            .find(|rule| rule.id == id)
            .cloned())
    }

    fn insert(&self, rule: NewTariffRule) -> Result<TariffRule, CatalogError> {
        let id = RuleId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let stored = TariffRule {
            id,
            origin: rule.origin,
            destination: rule.destination,
            category: rule.category,
            base_rate: rule.base_rate,
            additional_fee: rule.additional_fee,
            effective_from: rule.effective_from,
            effective_to: rule.effective_to,
        };
        self.rules
            .lock()
            .expect("catalog mutex poisoned")
            .push(stored.clone());
        Ok(stored)
    }

    fn update(&self, rule: TariffRule) -> Result<TariffRule, CatalogError> {
        let mut rules = self.rules.lock().expect("catalog mutex poisoned");
        let slot = rules
            .iter_mut()
            .find(|existing| existing.id == rule.id)
            .ok_or(CatalogError::NotFound)?;
        *slot = rule.clone();
        Ok(rule)
    }

    fn delete(&self, id: RuleId) -> Result<(), CatalogError> {
        let mut rules = self.rules.lock().expect("catalog mutex poisoned");
        let before = rules.len();
        rules.retain(|rule| rule.id != id);
        if rules.len() == before {
            return Err(CatalogError::NotFound);
        }
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemorySink {
    entries: Mutex<Vec<QueryAuditEntry>>,
}

impl MemorySink {
    pub(super) fn entries(&self) -> Vec<QueryAuditEntry> {
        self.entries.lock().expect("sink mutex poisoned").clone()
    }
}

impl AuditSink for MemorySink {
    fn append(&self, entry: QueryAuditEntry) -> Result<(), AuditSinkError> {
        self.entries.lock().expect("sink mutex poisoned").push(entry);
        Ok(())
    }
}

pub(super) struct OfflineSink;

impl AuditSink for OfflineSink {
    fn append(&self, _entry: QueryAuditEntry) -> Result<(), AuditSinkError> {
        Err(AuditSinkError::Unavailable("audit store offline".to_string()))
    }
}

pub(super) struct ScriptedGenerator {
    response: String,
    pub(super) calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub(super) fn replying(response: &str) -> Self {
        Self {
            response: response.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.response.clone())
    }
}

pub(super) struct FailingGenerator;

impl TextGenerator for FailingGenerator {
    fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Transport("api error".to_string()))
    }
}

pub(super) type TestService = TariffService<MemoryCatalog, MemorySink, ScriptedGenerator>;

pub(super) fn build_service(
    rules: Vec<TariffRule>,
) -> (
    TestService,
    Arc<MemoryCatalog>,
    Arc<MemorySink>,
    Arc<ScriptedGenerator>,
) {
    let catalog = Arc::new(MemoryCatalog::seeded(rules));
    let sink = Arc::new(MemorySink::default());
    let generator = Arc::new(ScriptedGenerator::replying("<p>Test summary</p>"));
    let service = TariffService::new(catalog.clone(), sink.clone(), generator.clone());
    (service, catalog, sink, generator)
}
