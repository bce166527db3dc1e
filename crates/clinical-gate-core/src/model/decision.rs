// crates/clinical-gate-core/src/model/decision.rs
// ============================================================================
// Module: Clinical Gate Decisions
// Description: Evaluation context, signals, override policy, and decisions.
// Purpose: Define the input and output contracts of the rule gate.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! An [`EvaluationContext`] carries one proposed action and the rule set the
//! caller is authorized to see. The gate answers with a [`Decision`] built
//! from ephemeral [`Signal`] values, one per triggered rule. Signals are never
//! persisted by the gate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::model::identifiers::ActionType;
use crate::model::identifiers::PatientHash;
use crate::model::identifiers::RuleId;
use crate::model::rule::GlosaRisk;
use crate::model::rule::RuleCategory;
use crate::model::rule::RuleMessages;
use crate::model::rule::RuleRecord;
use crate::model::rule::SignalColor;

// ============================================================================
// SECTION: Evaluation Context
// ============================================================================

/// Input to one rule gate evaluation.
///
/// # Invariants
/// - `rules` is exactly the set the caller is authorized to see; the gate
///   performs no authorization.
/// - `patient_hash` is a digest, never a raw identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationContext {
    /// Hashed patient identifier.
    pub patient_hash: PatientHash,
    /// Proposed action type.
    pub action_type: ActionType,
    /// Arbitrary nested action payload.
    pub payload: Value,
    /// Rule set to evaluate against.
    #[serde(default)]
    pub rules: Vec<RuleRecord>,
}

// ============================================================================
// SECTION: Signals
// ============================================================================

/// Output of one triggered rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    /// Triggered rule identifier.
    pub rule_id: RuleId,
    /// Triggered rule name.
    pub rule_name: String,
    /// Triggered rule version.
    pub rule_version: u32,
    /// Rule category.
    pub category: RuleCategory,
    /// Signal color.
    pub color: SignalColor,
    /// Human-facing message.
    pub message: RuleMessages,
    /// Literal evidence strings that justified the trigger.
    pub evidence: Vec<String>,
    /// Optional regulatory reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regulatory_reference: Option<String>,
    /// Optional suggested correction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_correction: Option<String>,
    /// Optional glosa risk estimate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glosa_risk: Option<GlosaRisk>,
}

// ============================================================================
// SECTION: Override Policy
// ============================================================================

/// Justification required to override a non-green decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideRequirement {
    /// Supervisor sign-off.
    Supervisor,
    /// Free-text written justification.
    Justification,
    /// Hard block; no override is possible.
    Blocked,
}

/// Override policy derived from a signal set.
///
/// # Invariants
/// - `can_override == false` iff `requires == Some(Blocked)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverridePolicy {
    /// Whether the clinician may proceed with an override.
    pub can_override: bool,
    /// Required justification, absent when the action is freely allowed.
    pub requires: Option<OverrideRequirement>,
}

impl OverridePolicy {
    /// Action may proceed without justification.
    pub const FREE: Self = Self {
        can_override: true,
        requires: None,
    };
    /// Action requires a written justification.
    pub const JUSTIFICATION: Self = Self {
        can_override: true,
        requires: Some(OverrideRequirement::Justification),
    };
    /// Action requires supervisor sign-off.
    pub const SUPERVISOR: Self = Self {
        can_override: true,
        requires: Some(OverrideRequirement::Supervisor),
    };
    /// Action is blocked outright.
    pub const BLOCKED: Self = Self {
        can_override: false,
        requires: Some(OverrideRequirement::Blocked),
    };
}

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Aggregate glosa risk across all signals carrying an estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlosaRiskSummary {
    /// Summed monetary amount at risk, rounded to cents.
    pub total_amount: f64,
    /// Union probability `1 - prod(1 - p_i)`, rounded to 2 decimals.
    pub probability: f64,
    /// Denial code of the highest-probability signal.
    pub denial_code: String,
    /// Number of signals that contributed an estimate.
    pub contributing_signals: usize,
}

/// Rule gate decision.
///
/// # Invariants
/// - `color == Green` implies no signal is `Red` or `Yellow`.
/// - `can_override` and `override_requires` are a pure function of `signals`.
/// - `needs_chat_assistance == (color != Green)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    /// Worst-wins overall color.
    pub color: SignalColor,
    /// Triggered signals in rule order.
    pub signals: Vec<Signal>,
    /// Whether the clinician may override.
    pub can_override: bool,
    /// Required justification for an override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_requires: Option<OverrideRequirement>,
    /// Aggregate glosa risk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_glosa_risk: Option<GlosaRiskSummary>,
    /// True whenever the decision is not green.
    pub needs_chat_assistance: bool,
    /// Wall-clock evaluation time in milliseconds.
    pub evaluation_ms: f64,
}

impl Decision {
    /// Returns the override policy carried by the decision.
    #[must_use]
    pub const fn override_policy(&self) -> OverridePolicy {
        OverridePolicy {
            can_override: self.can_override,
            requires: self.override_requires,
        }
    }

    /// Returns a copy with the latency measurement zeroed, for content comparison.
    #[must_use]
    pub fn without_timing(&self) -> Self {
        Self {
            evaluation_ms: 0.0,
            ..self.clone()
        }
    }
}
