// crates/clinical-gate-core/src/runtime/lint.rs
// ============================================================================
// Module: Rule Logic Lint
// Description: Load-time checks for rule logic documents.
// Purpose: Report constructs that evaluate silently to false or fail open.
// Dependencies: crate::model, regex, serde
// ============================================================================

//! ## Overview
//! Runtime evaluation never rejects a rule: unknown operators and invalid
//! patterns quietly evaluate to `false`, and `not_in` with a non-sequence
//! operand evaluates to `true`. The linter surfaces those cases before rules
//! are deployed. Findings are advisory and never change gate behavior.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::model::Condition;
use crate::model::ConditionOperator;
use crate::model::RuleId;
use crate::model::RuleLogicError;
use crate::model::RuleRecord;

// ============================================================================
// SECTION: Findings
// ============================================================================

/// Lint finding kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleLintKind {
    /// Rule logic is not a valid document or is oversized.
    MalformedDocument,
    /// Glosa estimate outside its invariants.
    InvalidGlosaRisk,
    /// Operator name not recognized.
    UnknownOperator,
    /// `matches` operand is not a valid regular expression.
    InvalidPattern,
    /// `in` / `not_in` operand is not a sequence.
    ExpectedSequence,
    /// Range operand is not numeric.
    ExpectedNumber,
    /// Rule has no conditions and triggers on every applicable action.
    EmptyConditions,
    /// Condition field path is empty.
    EmptyField,
}

impl RuleLintKind {
    /// Returns a stable label for the finding kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MalformedDocument => "malformed_document",
            Self::InvalidGlosaRisk => "invalid_glosa_risk",
            Self::UnknownOperator => "unknown_operator",
            Self::InvalidPattern => "invalid_pattern",
            Self::ExpectedSequence => "expected_sequence",
            Self::ExpectedNumber => "expected_number",
            Self::EmptyConditions => "empty_conditions",
            Self::EmptyField => "empty_field",
        }
    }
}

impl fmt::Display for RuleLintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lint finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleLintFinding {
    /// Rule the finding belongs to.
    pub rule_id: RuleId,
    /// Zero-based condition index, when the finding is condition-specific.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_index: Option<usize>,
    /// Finding kind.
    pub kind: RuleLintKind,
    /// Human-readable detail.
    pub detail: String,
}

// ============================================================================
// SECTION: Lint
// ============================================================================

/// Lints every rule in a set.
#[must_use]
pub fn lint_rules(rules: &[RuleRecord]) -> Vec<RuleLintFinding> {
    rules.iter().flat_map(lint_rule).collect()
}

/// Lints a single rule record.
#[must_use]
pub fn lint_rule(rule: &RuleRecord) -> Vec<RuleLintFinding> {
    let logic = match rule.parse_logic() {
        Ok(logic) => logic,
        Err(err) => {
            let kind = match err {
                RuleLogicError::GlosaRisk(_) => RuleLintKind::InvalidGlosaRisk,
                RuleLogicError::Json(_) | RuleLogicError::TooLarge { .. } => {
                    RuleLintKind::MalformedDocument
                }
            };
            return vec![RuleLintFinding {
                rule_id: rule.rule_id.clone(),
                condition_index: None,
                kind,
                detail: err.to_string(),
            }];
        }
    };

    let mut findings = Vec::new();
    if logic.conditions.is_empty() {
        findings.push(RuleLintFinding {
            rule_id: rule.rule_id.clone(),
            condition_index: None,
            kind: RuleLintKind::EmptyConditions,
            detail: "rule has no conditions and triggers on every applicable action".to_string(),
        });
    }
    for (index, condition) in logic.conditions.iter().enumerate() {
        if let Some((kind, detail)) = lint_condition(condition) {
            findings.push(RuleLintFinding {
                rule_id: rule.rule_id.clone(),
                condition_index: Some(index),
                kind,
                detail,
            });
        }
    }
    findings
}

/// Checks one condition for a construct the evaluator silently tolerates.
fn lint_condition(condition: &Condition) -> Option<(RuleLintKind, String)> {
    if condition.field.trim().is_empty() {
        return Some((RuleLintKind::EmptyField, "condition field path is empty".to_string()));
    }
    match &condition.operator {
        ConditionOperator::Unknown(name) => Some((
            RuleLintKind::UnknownOperator,
            format!("operator `{name}` is not recognized and always evaluates to false"),
        )),
        ConditionOperator::In if !condition.value.is_array() => Some((
            RuleLintKind::ExpectedSequence,
            "`in` operand is not a sequence; condition never holds".to_string(),
        )),
        ConditionOperator::NotIn if !condition.value.is_array() => Some((
            RuleLintKind::ExpectedSequence,
            "`not_in` operand is not a sequence; condition always holds".to_string(),
        )),
        ConditionOperator::GreaterThan | ConditionOperator::LessThan
            if !is_numeric_operand(&condition.value) =>
        {
            Some((
                RuleLintKind::ExpectedNumber,
                format!("`{}` operand is not numeric; condition never holds", condition.operator),
            ))
        }
        ConditionOperator::Matches => match &condition.value {
            Value::String(pattern) => Regex::new(pattern).err().map(|err| {
                (RuleLintKind::InvalidPattern, format!("pattern does not compile: {err}"))
            }),
            _ => Some((
                RuleLintKind::InvalidPattern,
                "`matches` operand is not a string; condition never holds".to_string(),
            )),
        },
        _ => None,
    }
}

/// Returns true when the operand is a number or decimal text.
fn is_numeric_operand(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(text) => BigDecimal::from_str(text.trim()).is_ok(),
        _ => false,
    }
}
