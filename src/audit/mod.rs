//! Append-only audit trail for every core operation.
//!
//! The engine constructs [`QueryAuditEntry`] values and hands them to an
//! [`AuditSink`]; storage, identifiers, and retention belong to the sink. A
//! failing sink is logged and swallowed so audit problems can never fail the
//! user-facing request.

pub mod params;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Identifier of the authenticated actor an operation is attributed to.
/// Supplied by the external auth layer; `None` means anonymous.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Operation classes recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryKind {
    Calculate,
    Search,
    CreateTariff,
    UpdateTariff,
    DeleteTariff,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calculate => "CALCULATE",
            Self::Search => "SEARCH",
            Self::CreateTariff => "CREATE_TARIFF",
            Self::UpdateTariff => "UPDATE_TARIFF",
            Self::DeleteTariff => "DELETE_TARIFF",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable record of a query or mutation. The sink assigns storage
/// identifiers; the engine never updates or deletes entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAuditEntry {
    pub actor: Option<ActorId>,
    pub kind: QueryKind,
    pub params_snapshot: String,
    pub result_snapshot: Option<String>,
    pub origin_code: Option<String>,
    pub destination_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append-only store accepting audit entries.
pub trait AuditSink: Send + Sync {
    fn append(&self, entry: QueryAuditEntry) -> Result<(), AuditSinkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuditSinkError {
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Upper bound on a stored result snapshot, in characters.
pub const RESULT_SNAPSHOT_MAX_CHARS: usize = 4096;

const TRUNCATION_MARKER: &str = "…[truncated]";

/// Builds audit entries and hands them to the sink.
pub struct AuditRecorder<S> {
    sink: Arc<S>,
}

impl<S: AuditSink> AuditRecorder<S> {
    pub fn new(sink: Arc<S>) -> Self {
        Self { sink }
    }

    /// Appends one entry. Sink failures are logged, never propagated: the
    /// calculation or search result still goes back to the caller.
    pub fn record<T: Serialize>(
        &self,
        kind: QueryKind,
        params: &str,
        result: Option<&T>,
        origin_code: Option<&str>,
        destination_code: Option<&str>,
        actor: Option<&ActorId>,
    ) {
        let entry = QueryAuditEntry {
            actor: actor.cloned(),
            kind,
            params_snapshot: params.to_string(),
            result_snapshot: result.map(serialize_snapshot),
            origin_code: origin_code.map(str::to_string),
            destination_code: destination_code.map(str::to_string),
            created_at: Utc::now(),
        };

        if let Err(err) = self.sink.append(entry) {
            warn!(kind = kind.as_str(), error = %err, "audit write failed; operation continues");
        }
    }
}

fn serialize_snapshot<T: Serialize>(value: &T) -> String {
    let raw = serde_json::to_string(value)
        .unwrap_or_else(|err| format!("{{\"snapshot_error\":\"{err}\"}}"));
    truncate_snapshot(raw)
}

/// Caps a snapshot at [`RESULT_SNAPSHOT_MAX_CHARS`] characters, replacing the
/// tail with a visible marker so readers know the payload was cut rather
/// than stored incomplete without notice.
fn truncate_snapshot(raw: String) -> String {
    if raw.chars().count() <= RESULT_SNAPSHOT_MAX_CHARS {
        return raw;
    }

    let keep = RESULT_SNAPSHOT_MAX_CHARS - TRUNCATION_MARKER.chars().count();
    let mut capped: String = raw.chars().take(keep).collect();
    capped.push_str(TRUNCATION_MARKER);
    capped
}
