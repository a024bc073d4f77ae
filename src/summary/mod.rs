//! AI summary pipeline: prompt construction, a single bounded call to the
//! external text-generation collaborator, and normalization/sanitization of
//! whatever comes back into a `<p>`/`<b>`-only HTML subset.

mod gemini;
mod sanitize;

pub use gemini::GeminiClient;
pub use sanitize::to_constrained_html;

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::tariff::domain::CalculationResult;

/// Fixed response surfaced whenever generation fails for any reason.
pub const SUMMARY_FALLBACK: &str = "AI summary unavailable.";

/// External text-generation collaborator. One call per summarization, with
/// the implementor honoring a bounded timeout.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation credentials are not configured")]
    MissingCredentials,
    #[error("generation request failed: {0}")]
    Transport(String),
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
    #[error("generation response was not in the expected shape")]
    MalformedResponse,
}

/// Turns a computed result into sanitized summary HTML. Never fails: any
/// collaborator error degrades to [`SUMMARY_FALLBACK`], with the cause
/// logged rather than surfaced.
pub struct SummaryPipeline<G> {
    generator: Arc<G>,
}

impl<G: TextGenerator> SummaryPipeline<G> {
    pub fn new(generator: Arc<G>) -> Self {
        Self { generator }
    }

    pub fn summarize(&self, result: &CalculationResult) -> String {
        let prompt = build_prompt(result);
        match self.generator.generate(&prompt) {
            Ok(raw) => to_constrained_html(&raw),
            Err(err) => {
                warn!(error = %err, "ai summary generation failed");
                SUMMARY_FALLBACK.to_string()
            }
        }
    }
}

/// Deterministic prompt embedding exactly the resolved values, with the
/// response format and length instruction up front.
pub fn build_prompt(result: &CalculationResult) -> String {
    format!(
        "Summarize this tariff calculation for a trade analyst in fewer than 120 words. \
         Respond with HTML limited to <p> and <b> tags only. \
         Shipment: origin {origin}, destination {destination}, product category {category}, \
         effective date {date}. Declared value {declared}, base rate {rate}, \
         tariff amount {tariff}, additional fee {fee}, total landed cost {total}.",
        origin = result.origin,
        destination = result.destination,
        category = result.category,
        date = result.effective_date,
        declared = result.declared_value,
        rate = result.base_rate,
        tariff = result.tariff_amount,
        fee = result.additional_fee,
        total = result.total_cost,
    )
}
