// crates/clinical-gate-core/src/model/rule.rs
// ============================================================================
// Module: Clinical Gate Rules
// Description: Rule records, rule logic documents, and condition operators.
// Purpose: Model externally authored, versioned policy units.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Rules arrive from the rules collaborator as [`RuleRecord`] rows whose
//! `ruleLogic` column is a JSON string. The gate parses that string per
//! evaluation with [`RuleRecord::parse_logic`]; malformed documents are
//! reported as [`RuleLogicError`] and skipped by the caller.
//!
//! Security posture: rule logic is untrusted input bounded by
//! [`MAX_RULE_LOGIC_BYTES`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::model::identifiers::ActionType;
use crate::model::identifiers::RuleId;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum accepted size of a single rule logic document in bytes.
pub const MAX_RULE_LOGIC_BYTES: usize = 64 * 1024;

// ============================================================================
// SECTION: Enumerations
// ============================================================================

/// Rule category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    /// Clinical safety rule (dosage, allergy, interaction).
    Clinical,
    /// Administrative completeness rule.
    Administrative,
    /// Billing rule (TISS coding, glosa prevention).
    Billing,
}

impl RuleCategory {
    /// Returns a stable label for the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clinical => "clinical",
            Self::Administrative => "administrative",
            Self::Billing => "billing",
        }
    }
}

/// Traffic-light color attached to a rule outcome.
///
/// # Invariants
/// - Ordering is by severity: `Green < Yellow < Red`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalColor {
    /// Action may proceed.
    Green,
    /// Action may proceed with a written justification.
    Yellow,
    /// Action is stopped pending supervisor sign-off or blocked outright.
    Red,
}

impl SignalColor {
    /// Returns a stable label for the color.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Green => "GREEN",
            Self::Yellow => "YELLOW",
            Self::Red => "RED",
        }
    }
}

impl fmt::Display for SignalColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condition operator.
///
/// Unrecognized operator names are preserved in [`ConditionOperator::Unknown`]
/// so evaluation can report them instead of failing the whole document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionOperator {
    /// Strict value equality.
    Equals,
    /// Case-insensitive substring or sequence membership.
    Contains,
    /// Field value is a member of the condition's sequence.
    In,
    /// Field value is not a member of the condition's sequence.
    NotIn,
    /// Numeric greater-than.
    GreaterThan,
    /// Numeric less-than.
    LessThan,
    /// Field resolves to a non-null value.
    Exists,
    /// Field is missing or null.
    NotExists,
    /// Field matches a regular expression.
    Matches,
    /// Operator name not recognized by this engine.
    Unknown(String),
}

impl ConditionOperator {
    /// Returns the wire name of the operator.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Equals => "equals",
            Self::Contains => "contains",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::Exists => "exists",
            Self::NotExists => "not_exists",
            Self::Matches => "matches",
            Self::Unknown(name) => name,
        }
    }
}

impl From<String> for ConditionOperator {
    fn from(value: String) -> Self {
        match value.as_str() {
            "equals" => Self::Equals,
            "contains" => Self::Contains,
            "in" => Self::In,
            "not_in" => Self::NotIn,
            "greater_than" => Self::GreaterThan,
            "less_than" => Self::LessThan,
            "exists" => Self::Exists,
            "not_exists" => Self::NotExists,
            "matches" => Self::Matches,
            _ => Self::Unknown(value),
        }
    }
}

impl From<ConditionOperator> for String {
    fn from(value: ConditionOperator) -> Self {
        match value {
            ConditionOperator::Unknown(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Rule Logic
// ============================================================================

/// Single typed predicate over a dot-path into the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Dot-separated path into the evaluation payload.
    pub field: String,
    /// Comparison operator.
    pub operator: ConditionOperator,
    /// Comparison operand (ignored by `exists` / `not_exists`).
    #[serde(default)]
    pub value: Value,
}

/// Bilingual human-facing rule message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMessages {
    /// Portuguese message.
    pub pt: String,
    /// English message.
    pub en: String,
}

/// Billing denial (glosa) risk estimate attached to a rule.
///
/// # Invariants
/// - `probability` is finite and within `[0, 1]`.
/// - `amount` is finite and non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlosaRisk {
    /// Probability that the insurer denies the billed item.
    pub probability: f64,
    /// Base monetary amount at risk.
    pub amount: f64,
    /// TISS denial code.
    pub code: String,
}

impl GlosaRisk {
    /// Validates probability range and amount sign.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violated invariant.
    pub fn validate(&self) -> Result<(), String> {
        if !self.probability.is_finite() || !(0.0..=1.0).contains(&self.probability) {
            return Err(format!("glosa probability {} outside [0, 1]", self.probability));
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(format!("glosa amount {} must be finite and non-negative", self.amount));
        }
        Ok(())
    }
}

/// Parsed rule logic document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleLogic {
    /// Action types the rule applies to; empty or null applies to every action.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub applicable_to: Vec<ActionType>,
    /// Conditions combined with AND semantics.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub conditions: Vec<Condition>,
    /// Color emitted when every condition holds.
    pub color: SignalColor,
    /// Human-facing message.
    pub message: RuleMessages,
    /// Optional regulatory reference (ANVISA, CFM, ANS, TISS).
    #[serde(default)]
    pub regulatory_reference: Option<String>,
    /// Optional suggested correction for the clinician.
    #[serde(default)]
    pub suggested_correction: Option<String>,
    /// Optional glosa risk estimate.
    #[serde(default)]
    pub glosa_risk: Option<GlosaRisk>,
}

/// Decodes an optional list, treating `null` as empty.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl RuleLogic {
    /// Returns true when the rule applies to the given action type.
    #[must_use]
    pub fn applies_to(&self, action: &ActionType) -> bool {
        self.applicable_to.is_empty() || self.applicable_to.contains(action)
    }
}

// ============================================================================
// SECTION: Rule Records
// ============================================================================

/// Rule row as delivered by the rules collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleRecord {
    /// Rule identifier.
    pub rule_id: RuleId,
    /// Human-readable rule name.
    pub name: String,
    /// Rule version.
    pub version: u32,
    /// Rule category.
    pub category: RuleCategory,
    /// Whether the rule participates in evaluation.
    pub is_active: bool,
    /// Serialized [`RuleLogic`] document.
    pub rule_logic: String,
}

impl RuleRecord {
    /// Parses the rule logic document.
    ///
    /// # Errors
    ///
    /// Returns [`RuleLogicError`] when the document is oversized, is not valid
    /// JSON for [`RuleLogic`], or carries an out-of-range glosa estimate.
    pub fn parse_logic(&self) -> Result<RuleLogic, RuleLogicError> {
        if self.rule_logic.len() > MAX_RULE_LOGIC_BYTES {
            return Err(RuleLogicError::TooLarge {
                actual_bytes: self.rule_logic.len(),
                max_bytes: MAX_RULE_LOGIC_BYTES,
            });
        }
        let logic: RuleLogic = serde_json::from_str(&self.rule_logic)
            .map_err(|err| RuleLogicError::Json(err.to_string()))?;
        if let Some(risk) = &logic.glosa_risk {
            risk.validate().map_err(RuleLogicError::GlosaRisk)?;
        }
        Ok(logic)
    }
}

/// Rule logic parse errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleLogicError {
    /// Document is not valid rule logic JSON.
    #[error("rule logic json invalid: {0}")]
    Json(String),
    /// Glosa estimate violates its invariants.
    #[error("rule logic glosa risk invalid: {0}")]
    GlosaRisk(String),
    /// Document exceeds the size limit.
    #[error("rule logic too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Actual document size in bytes.
        actual_bytes: usize,
        /// Maximum allowed bytes.
        max_bytes: usize,
    },
}
