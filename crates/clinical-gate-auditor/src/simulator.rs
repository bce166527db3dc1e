// crates/clinical-gate-auditor/src/simulator.rs
// ============================================================================
// Module: Simulated Model
// Description: Deterministic local stand-in for the remote auditor model.
// Purpose: Run audits offline for tests and demos.
// Dependencies: async-trait, clinical-gate-core, regex, serde_json
// ============================================================================

//! ## Overview
//! Returns a fixed clean verdict for every prompt except one adversarial
//! fixture: a transcript stating a 5 mg dose paired with a note stating
//! 50 mg yields a `CRITICAL` verdict with `DOSAGE_ERROR`. Prompts never leave
//! the process, so no anonymization is applied upstream.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::LazyLock;

use async_trait::async_trait;
use clinical_gate_core::AuditCategory;
use clinical_gate_core::AuditorVerdict;
use clinical_gate_core::ExecutionMetadata;
use clinical_gate_core::RiskLevel;
use regex::Regex;

use crate::gateway::ModelClient;
use crate::gateway::fail_safe_json;
use crate::prompt::split_user_prompt;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Model identifier reported by the simulator.
pub const SIMULATED_MODEL_ID: &str = "local-simulator";

/// Transcript side of the dosage fixture.
static TRANSCRIPT_DOSE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\b5[ ]?mg\b").ok());
/// Note side of the dosage fixture.
static NOTE_DOSE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?i)\b50[ ]?mg\b").ok());

// ============================================================================
// SECTION: Simulator
// ============================================================================

/// Deterministic local model.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedModel;

impl SimulatedModel {
    /// Creates a simulator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Produces the verdict for a transcript and note pair.
    #[must_use]
    pub fn verdict_for(transcript: &str, proposed_note: &str) -> AuditorVerdict {
        let metadata = ExecutionMetadata {
            model_id: Some(SIMULATED_MODEL_ID.to_string()),
            latency_ms: 0,
            input_tokens: 0,
            output_tokens: 0,
        };
        let dosage_mismatch = pattern_matches(&TRANSCRIPT_DOSE, transcript)
            && pattern_matches(&NOTE_DOSE, proposed_note)
            && !pattern_matches(&NOTE_DOSE, transcript);
        if dosage_mismatch {
            return AuditorVerdict {
                safety_score: 10,
                risk_level: RiskLevel::Critical,
                categories_detected: vec![AuditCategory::DosageError],
                reasoning_trace: "Transcript states a 5mg dose; the proposed note records 50mg, a tenfold increase."
                    .to_string(),
                clinical_intervention: "Correct the dose in the note to 5mg before signing.".to_string(),
                execution_metadata: metadata,
            };
        }
        AuditorVerdict {
            safety_score: 95,
            risk_level: RiskLevel::Low,
            categories_detected: Vec::new(),
            reasoning_trace: "No discrepancies found between transcript and proposed note.".to_string(),
            clinical_intervention: "No action required.".to_string(),
            execution_metadata: metadata,
        }
    }
}

#[async_trait]
impl ModelClient for SimulatedModel {
    async fn complete(&self, _system_prompt: &str, user_prompt: &str) -> String {
        let (transcript, note) = split_user_prompt(user_prompt).unwrap_or((user_prompt, ""));
        let verdict = Self::verdict_for(transcript, note);
        serde_json::to_string(&verdict)
            .unwrap_or_else(|_| fail_safe_json(&verdict.execution_metadata))
    }

    fn is_remote(&self) -> bool {
        false
    }

    fn model_id(&self) -> &str {
        SIMULATED_MODEL_ID
    }
}

/// Tests a lazily compiled pattern.
fn pattern_matches(pattern: &LazyLock<Option<Regex>>, text: &str) -> bool {
    (**pattern).as_ref().is_some_and(|regex| regex.is_match(text))
}
