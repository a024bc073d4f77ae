//! Tariff resolution and landed-cost calculation engine.
//!
//! Given an origin country, destination country, product category, declared
//! value, and an as-of date, [`TariffService`] resolves the single governing
//! tariff rule, computes a deterministic landed cost, records an audit entry
//! for every query, and can attach an AI-generated summary sanitized down to
//! a `<p>`/`<b>` HTML subset.
//!
//! The crate owns no HTTP surface. Reference data, audit persistence, and
//! text generation are reached through the [`tariff::catalog::RateCatalog`],
//! [`audit::AuditSink`], and [`summary::TextGenerator`] traits so the hosting
//! service can wire its own backends.

pub mod audit;
pub mod config;
pub mod summary;
pub mod tariff;
pub mod telemetry;

pub use audit::{ActorId, AuditRecorder, AuditSink, AuditSinkError, QueryAuditEntry, QueryKind};
pub use summary::{GenerationError, SummaryPipeline, TextGenerator, SUMMARY_FALLBACK};
pub use tariff::service::{CalculationRequest, TariffError, TariffService};
