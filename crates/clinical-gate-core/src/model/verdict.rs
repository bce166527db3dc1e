// crates/clinical-gate-core/src/model/verdict.rs
// ============================================================================
// Module: Auditor Verdicts
// Description: Integrity auditor verdict model and fail-safe instance.
// Purpose: Define the wire contract returned by the asynchronous auditor.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An [`AuditorVerdict`] compares an AI-generated clinical note against its
//! source transcript. Field names are snake_case on the wire because the same
//! shape is requested from the remote model and returned to callers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::de::Error as _;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Safety score carried by the fail-safe verdict.
pub const FAIL_SAFE_SAFETY_SCORE: u8 = 50;
/// Reasoning trace carried by the fail-safe verdict.
pub const FAIL_SAFE_REASONING: &str =
    "Automated integrity audit unavailable; verdict could not be computed or trusted.";
/// Clinical intervention message carried by the fail-safe verdict.
pub const FAIL_SAFE_INTERVENTION: &str =
    "Manual review required: compare the proposed note against the source transcript before signing.";
/// Maximum safety score.
pub const MAX_SAFETY_SCORE: u8 = 100;

// ============================================================================
// SECTION: Enumerations
// ============================================================================

/// Audit risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// Note is consistent with the transcript.
    Low,
    /// Minor discrepancies or an untrusted result; review advised.
    Moderate,
    /// Discrepancy that could harm the patient.
    Critical,
}

impl RiskLevel {
    /// Returns a stable label for the risk level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Moderate => "MODERATE",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discrepancy category detected by the auditor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditCategory {
    /// Dose in the note differs from the transcript.
    DosageError,
    /// Left/right mismatch.
    LateralityMismatch,
    /// Clinically relevant content omitted from the note.
    Omission,
    /// Content in the note absent from the transcript.
    Fabrication,
    /// Prescribed item conflicts with a stated allergy.
    AllergyConflict,
}

impl AuditCategory {
    /// Every category, in wire order.
    pub const ALL: [Self; 5] = [
        Self::DosageError,
        Self::LateralityMismatch,
        Self::Omission,
        Self::Fabrication,
        Self::AllergyConflict,
    ];

    /// Returns the wire label for the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DosageError => "DOSAGE_ERROR",
            Self::LateralityMismatch => "LATERALITY_MISMATCH",
            Self::Omission => "OMISSION",
            Self::Fabrication => "FABRICATION",
            Self::AllergyConflict => "ALLERGY_CONFLICT",
        }
    }
}

// ============================================================================
// SECTION: Verdict
// ============================================================================

/// Execution metadata attached to every verdict.
///
/// # Invariants
/// - All fields are `None`/zero on the orchestrator fail-safe verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    /// Model identifier that produced the verdict.
    #[serde(default)]
    pub model_id: Option<String>,
    /// Gateway latency in milliseconds.
    #[serde(default)]
    pub latency_ms: u64,
    /// Prompt tokens consumed.
    #[serde(default)]
    pub input_tokens: u64,
    /// Completion tokens produced.
    #[serde(default)]
    pub output_tokens: u64,
}

/// Integrity auditor verdict.
///
/// # Invariants
/// - `safety_score` is within `0..=100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditorVerdict {
    /// Safety score from 0 (unsafe) to 100 (safe).
    #[serde(deserialize_with = "deserialize_safety_score")]
    pub safety_score: u8,
    /// Risk level.
    pub risk_level: RiskLevel,
    /// Detected discrepancy categories.
    pub categories_detected: Vec<AuditCategory>,
    /// Model reasoning trace.
    pub reasoning_trace: String,
    /// Clinician-facing intervention message.
    pub clinical_intervention: String,
    /// Execution metadata.
    #[serde(default)]
    pub execution_metadata: ExecutionMetadata,
}

/// Decodes a safety score, accepting integral floats such as `20.0`.
fn deserialize_safety_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    (0 ..= MAX_SAFETY_SCORE)
        .find(|candidate| (f64::from(*candidate) - raw).abs() < f64::EPSILON)
        .ok_or_else(|| {
            D::Error::custom(format!(
                "safety_score {raw} is not an integer within 0..={MAX_SAFETY_SCORE}"
            ))
        })
}

impl AuditorVerdict {
    /// Returns the fixed fail-safe verdict used whenever a result cannot be trusted.
    #[must_use]
    pub fn fail_safe() -> Self {
        Self {
            safety_score: FAIL_SAFE_SAFETY_SCORE,
            risk_level: RiskLevel::Moderate,
            categories_detected: Vec::new(),
            reasoning_trace: FAIL_SAFE_REASONING.to_string(),
            clinical_intervention: FAIL_SAFE_INTERVENTION.to_string(),
            execution_metadata: ExecutionMetadata::default(),
        }
    }

    /// Returns true when the verdict is the fixed fail-safe instance (ignoring metadata).
    #[must_use]
    pub fn is_fail_safe(&self) -> bool {
        self.safety_score == FAIL_SAFE_SAFETY_SCORE
            && self.risk_level == RiskLevel::Moderate
            && self.categories_detected.is_empty()
            && self.clinical_intervention == FAIL_SAFE_INTERVENTION
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test assertions use unwrap for clarity.")]

    use serde_json::json;

    use super::*;

    fn verdict_with_score(score: serde_json::Value) -> serde_json::Value {
        json!({
            "safety_score": score,
            "risk_level": "CRITICAL",
            "categories_detected": ["DOSAGE_ERROR"],
            "reasoning_trace": "dose differs",
            "clinical_intervention": "confirm dose"
        })
    }

    #[test]
    fn integral_float_score_decodes() {
        let verdict: AuditorVerdict =
            serde_json::from_value(verdict_with_score(json!(20.0))).unwrap();
        assert_eq!(verdict.safety_score, 20);
        assert_eq!(verdict.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn fractional_or_out_of_range_score_is_rejected() {
        for score in [json!(20.5), json!(101), json!(-1), json!("20")] {
            let result = serde_json::from_value::<AuditorVerdict>(verdict_with_score(score.clone()));
            assert!(result.is_err(), "score {score} should be rejected");
        }
    }
}
