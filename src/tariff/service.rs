use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::info;

use crate::audit::{ActorId, AuditRecorder, AuditSink, QueryKind};
use crate::summary::{SummaryPipeline, TextGenerator};

use super::calculator;
use super::catalog::{CatalogError, RateCatalog};
use super::domain::{
    CalculationResult, CategoryCode, Country, CountryCode, NewTariffRule, ProductCategory, RuleId,
    TariffRule, TariffRuleDraft, TariffRuleView, COST_FORMULA_NOTE,
};
use super::resolver::{self, ResolutionError};

/// Input for one calculation. Codes are raw caller input; an `as_of` of
/// `None` means "today", substituted here before resolution.
#[derive(Debug, Clone)]
pub struct CalculationRequest {
    pub origin: String,
    pub destination: String,
    pub category: String,
    pub declared_value: Decimal,
    pub as_of: Option<NaiveDate>,
    pub include_summary: bool,
}

/// Error surface of the engine's operations.
#[derive(Debug, thiserror::Error)]
pub enum TariffError {
    /// Malformed request or unknown reference code; the message names the
    /// failing field or value. Raised before any catalog write or audit.
    #[error("{0}")]
    InvalidInput(String),
    /// Identities were valid but no rule governs the request.
    #[error("{0}")]
    RateNotFound(String),
    /// Catalog backend failure.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl From<ResolutionError> for TariffError {
    fn from(value: ResolutionError) -> Self {
        match value {
            err @ ResolutionError::RateNotFound { .. } => Self::RateNotFound(err.to_string()),
            ResolutionError::Catalog(err) => Self::Catalog(err),
        }
    }
}

/// Orchestrates resolution, calculation, auditing, and summarization over
/// the collaborator traits. Stateless per request; safe to share.
pub struct TariffService<C, A, G> {
    catalog: Arc<C>,
    audit: AuditRecorder<A>,
    summary: SummaryPipeline<G>,
}

impl<C, A, G> TariffService<C, A, G>
where
    C: RateCatalog,
    A: AuditSink,
    G: TextGenerator,
{
    pub fn new(catalog: Arc<C>, audit_sink: Arc<A>, generator: Arc<G>) -> Self {
        Self {
            catalog,
            audit: AuditRecorder::new(audit_sink),
            summary: SummaryPipeline::new(generator),
        }
    }

    /// Quotes the landed cost for one shipment. Audited on success; the
    /// summary stage runs after the audit write and only when requested.
    pub fn calculate(
        &self,
        request: &CalculationRequest,
        actor: Option<&ActorId>,
    ) -> Result<CalculationResult, TariffError> {
        let origin_raw = require_code(&request.origin, "Origin country code")?;
        let destination_raw = require_code(&request.destination, "Destination country code")?;
        let category_raw = require_code(&request.category, "Product category code")?;
        if request.declared_value <= Decimal::ZERO {
            return Err(TariffError::InvalidInput(
                "Declared value must be greater than 0".to_string(),
            ));
        }

        let as_of = request.as_of.unwrap_or_else(|| Utc::now().date_naive());

        let origin = self.known_country(origin_raw, "origin")?;
        let destination = self.known_country(destination_raw, "destination")?;
        let category = self.known_category(category_raw)?;

        let resolved = resolver::resolve(
            self.catalog.as_ref(),
            &origin.code,
            &destination.code,
            &category.code,
            as_of,
        )?;
        let costs = calculator::compute(
            request.declared_value,
            resolved.base_rate,
            resolved.additional_fee,
        );

        let mut result = CalculationResult {
            origin: origin.code,
            destination: destination.code,
            category: category.code,
            effective_date: as_of,
            declared_value: request.declared_value,
            base_rate: resolved.base_rate,
            additional_fee: resolved.additional_fee,
            tariff_amount: costs.tariff_amount,
            total_cost: costs.total_cost,
            notes: COST_FORMULA_NOTE.to_string(),
            ai_summary: None,
        };

        let params = json!({
            "origin": result.origin.as_str(),
            "dest": result.destination.as_str(),
            "cat": result.category.as_str(),
            "val": result.declared_value,
            "date": result.effective_date,
        })
        .to_string();
        self.audit.record(
            QueryKind::Calculate,
            &params,
            Some(&result),
            Some(result.origin.as_str()),
            Some(result.destination.as_str()),
            actor,
        );

        if request.include_summary {
            result.ai_summary = Some(self.summary.summarize(&result));
        }

        Ok(result)
    }

    /// Finds rules matching the provided filters; every filter is optional
    /// and a filterless search returns the whole table. Audited even when
    /// nothing matches.
    pub fn search(
        &self,
        origin: Option<&str>,
        destination: Option<&str>,
        category: Option<&str>,
        actor: Option<&ActorId>,
    ) -> Result<Vec<TariffRuleView>, TariffError> {
        let origin = self.optional_country(origin, "origin")?;
        let destination = self.optional_country(destination, "destination")?;
        let category = self.optional_category(category)?;

        let rules = self.catalog.search(
            origin.as_ref().map(|country| &country.code),
            destination.as_ref().map(|country| &country.code),
            category.as_ref().map(|cat| &cat.code),
        )?;
        let views: Vec<TariffRuleView> = rules.iter().map(TariffRuleView::from_rule).collect();

        let params = json!({
            "origin": origin.as_ref().map(|country| country.code.as_str()),
            "dest": destination.as_ref().map(|country| country.code.as_str()),
            "cat": category.as_ref().map(|cat| cat.code.as_str()),
        })
        .to_string();
        self.audit.record(
            QueryKind::Search,
            &params,
            Some(&views),
            origin.as_ref().map(|country| country.code.as_str()),
            destination.as_ref().map(|country| country.code.as_str()),
            actor,
        );

        Ok(views)
    }

    /// Creates a new rule after validating every referenced code.
    pub fn create_rule(
        &self,
        draft: &TariffRuleDraft,
        actor: Option<&ActorId>,
    ) -> Result<TariffRuleView, TariffError> {
        let rule = self.validated_rule(draft)?;
        let saved = self.catalog.insert(rule)?;
        let view = TariffRuleView::from_rule(&saved);

        let params = json!({
            "id": saved.id.0,
            "origin": saved.origin.as_str(),
            "dest": saved.destination.as_str(),
            "cat": saved.category.as_str(),
            "from": saved.effective_from,
        })
        .to_string();
        self.audit.record(
            QueryKind::CreateTariff,
            &params,
            Some(&view),
            Some(saved.origin.as_str()),
            Some(saved.destination.as_str()),
            actor,
        );
        info!(rule_id = saved.id.0, "tariff rule created");

        Ok(view)
    }

    /// Reads one rule by id.
    pub fn get_rule(&self, id: RuleId) -> Result<TariffRuleView, TariffError> {
        let rule = self
            .catalog
            .rule_by_id(id)?
            .ok_or_else(|| rule_missing(id))?;
        Ok(TariffRuleView::from_rule(&rule))
    }

    /// Replaces an existing rule's route, rates, and window.
    pub fn update_rule(
        &self,
        id: RuleId,
        draft: &TariffRuleDraft,
        actor: Option<&ActorId>,
    ) -> Result<TariffRuleView, TariffError> {
        self.catalog
            .rule_by_id(id)?
            .ok_or_else(|| rule_missing(id))?;
        let validated = self.validated_rule(draft)?;

        let updated = self.catalog.update(TariffRule {
            id,
            origin: validated.origin,
            destination: validated.destination,
            category: validated.category,
            base_rate: validated.base_rate,
            additional_fee: validated.additional_fee,
            effective_from: validated.effective_from,
            effective_to: validated.effective_to,
        })?;
        let view = TariffRuleView::from_rule(&updated);

        let params = json!({
            "id": id.0,
            "origin": updated.origin.as_str(),
            "dest": updated.destination.as_str(),
            "cat": updated.category.as_str(),
        })
        .to_string();
        self.audit.record(
            QueryKind::UpdateTariff,
            &params,
            Some(&view),
            Some(updated.origin.as_str()),
            Some(updated.destination.as_str()),
            actor,
        );
        info!(rule_id = id.0, "tariff rule updated");

        Ok(view)
    }

    /// Removes a rule, failing with `RateNotFound` when the id is unknown.
    pub fn delete_rule(&self, id: RuleId, actor: Option<&ActorId>) -> Result<(), TariffError> {
        let existing = self
            .catalog
            .rule_by_id(id)?
            .ok_or_else(|| rule_missing(id))?;
        self.catalog.delete(id)?;

        let params = json!({ "id": id.0 }).to_string();
        self.audit.record::<TariffRuleView>(
            QueryKind::DeleteTariff,
            &params,
            None,
            Some(existing.origin.as_str()),
            Some(existing.destination.as_str()),
            actor,
        );
        info!(rule_id = id.0, "tariff rule deleted");

        Ok(())
    }

    /// Standalone, re-callable summarization of an already-computed result.
    /// Never fails; degrades to the fixed fallback string.
    pub fn generate_summary(&self, result: &CalculationResult) -> String {
        self.summary.summarize(result)
    }

    fn known_country(&self, raw: &str, role: &str) -> Result<Country, TariffError> {
        let code = CountryCode::new(raw);
        self.catalog
            .country_by_code(&code)?
            .ok_or_else(|| TariffError::InvalidInput(format!("Unknown {role} country code: {raw}")))
    }

    fn known_category(&self, raw: &str) -> Result<ProductCategory, TariffError> {
        let code = CategoryCode::new(raw);
        self.catalog
            .category_by_code(&code)?
            .ok_or_else(|| {
                TariffError::InvalidInput(format!("Unknown product category code: {raw}"))
            })
    }

    fn optional_country(
        &self,
        raw: Option<&str>,
        role: &str,
    ) -> Result<Option<Country>, TariffError> {
        match raw {
            Some(value) if !value.trim().is_empty() => {
                Ok(Some(self.known_country(value.trim(), role)?))
            }
            _ => Ok(None),
        }
    }

    fn optional_category(&self, raw: Option<&str>) -> Result<Option<ProductCategory>, TariffError> {
        match raw {
            Some(value) if !value.trim().is_empty() => {
                Ok(Some(self.known_category(value.trim())?))
            }
            _ => Ok(None),
        }
    }

    fn validated_rule(&self, draft: &TariffRuleDraft) -> Result<NewTariffRule, TariffError> {
        let origin_raw = require_code(&draft.origin, "Origin country code")?;
        let destination_raw = require_code(&draft.destination, "Destination country code")?;
        let category_raw = require_code(&draft.category, "Product category code")?;

        if let Some(until) = draft.effective_to {
            if until < draft.effective_from {
                return Err(TariffError::InvalidInput(
                    "Effective window must not end before it starts".to_string(),
                ));
            }
        }

        let origin = self.known_country(origin_raw, "origin")?;
        let destination = self.known_country(destination_raw, "destination")?;
        let category = self.known_category(category_raw)?;

        Ok(NewTariffRule {
            origin: origin.code,
            destination: destination.code,
            category: category.code,
            base_rate: draft.base_rate,
            additional_fee: draft.additional_fee,
            effective_from: draft.effective_from,
            effective_to: draft.effective_to,
        })
    }
}

fn require_code<'a>(value: &'a str, field: &str) -> Result<&'a str, TariffError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TariffError::InvalidInput(format!("{field} is required")));
    }
    Ok(trimmed)
}

fn rule_missing(id: RuleId) -> TariffError {
    TariffError::RateNotFound(format!("Tariff rule not found with id {id}"))
}
