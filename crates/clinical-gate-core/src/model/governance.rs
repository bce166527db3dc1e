// crates/clinical-gate-core/src/model/governance.rs
// ============================================================================
// Module: Governance Records
// Description: Interaction session, governance log, and governance event rows.
// Purpose: Define the append-only audit trail written after each audit.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! One governance log row is written per audit call; one governance event row
//! is added only when the verdict is `CRITICAL`. Both hang off an interaction
//! session record keyed by the upstream [`SessionRef`].
//!
//! Security posture: rows carry verdict metadata and the rehydrated verdict
//! JSON; they never carry the raw transcript or note.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::model::identifiers::GovernanceEventId;
use crate::model::identifiers::GovernanceLogId;
use crate::model::identifiers::InteractionSessionId;
use crate::model::identifiers::PatientHash;
use crate::model::identifiers::SessionRef;
use crate::model::verdict::AuditCategory;
use crate::model::verdict::RiskLevel;

// ============================================================================
// SECTION: Sessions
// ============================================================================

/// Upstream session resolved from a [`SessionRef`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamSession {
    /// Upstream session reference.
    pub session_ref: SessionRef,
    /// Hashed patient identifier.
    pub patient_hash: PatientHash,
    /// Clinician responsible for the session, when known.
    pub clinician_id: Option<String>,
}

/// Interaction session record owned by the governance store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionSession {
    /// Store-assigned identifier.
    pub id: InteractionSessionId,
    /// Upstream session reference (unique).
    pub session_ref: SessionRef,
    /// Hashed patient identifier.
    pub patient_hash: PatientHash,
    /// Clinician responsible for the session, when known.
    pub clinician_id: Option<String>,
    /// Creation time (milliseconds since epoch).
    pub created_at_ms: u64,
}

// ============================================================================
// SECTION: Governance Log
// ============================================================================

/// Governance log entry written for every audit call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceLogEntry {
    /// Owning interaction session.
    pub session_id: InteractionSessionId,
    /// Record time (milliseconds since epoch).
    pub recorded_at_ms: u64,
    /// Verdict safety score.
    pub safety_score: u8,
    /// Verdict risk level.
    pub risk_level: RiskLevel,
    /// Verdict categories.
    pub categories: Vec<AuditCategory>,
    /// Model identifier, when known.
    pub model_id: Option<String>,
    /// Gateway latency in milliseconds.
    pub latency_ms: u64,
    /// Whether the prompt crossed the anonymization boundary.
    pub anonymized: bool,
    /// Serialized verdict as returned to the caller.
    pub verdict_json: String,
}

/// Stored governance log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceLogRecord {
    /// Store-assigned identifier.
    pub id: GovernanceLogId,
    /// Logged entry.
    pub entry: GovernanceLogEntry,
}

// ============================================================================
// SECTION: Governance Events
// ============================================================================

/// Governance event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernanceEventKind {
    /// Auditor reported a critical discrepancy.
    CriticalAuditFinding,
}

impl GovernanceEventKind {
    /// Returns a stable label for the event kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CriticalAuditFinding => "critical_audit_finding",
        }
    }
}

/// Governance event entry written for critical verdicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceEventEntry {
    /// Owning interaction session.
    pub session_id: InteractionSessionId,
    /// Governance log row that produced the event.
    pub log_id: GovernanceLogId,
    /// Record time (milliseconds since epoch).
    pub recorded_at_ms: u64,
    /// Event kind.
    pub kind: GovernanceEventKind,
    /// Verdict categories.
    pub categories: Vec<AuditCategory>,
    /// Clinician-facing intervention message.
    pub message: String,
}

/// Stored governance event row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceEventRecord {
    /// Store-assigned identifier.
    pub id: GovernanceEventId,
    /// Logged entry.
    pub entry: GovernanceEventEntry,
}
