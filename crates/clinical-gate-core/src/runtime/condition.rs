// crates/clinical-gate-core/src/runtime/condition.rs
// ============================================================================
// Module: Condition Evaluation
// Description: Typed predicate evaluation against nested JSON payloads.
// Purpose: Convert one rule condition and a payload into a boolean outcome.
// Dependencies: crate::model, bigdecimal, regex, tracing
// ============================================================================

//! ## Overview
//! A condition resolves its dot-path against the payload and applies one
//! operator. Evaluation never fails: missing paths resolve to "undefined",
//! type mismatches and invalid patterns evaluate to `false`, and unknown
//! operators evaluate to `false` with a warning. Numeric comparison is
//! decimal-aware so `5` and `5.0` compare equal.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use regex::Regex;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

use crate::model::Condition;
use crate::model::ConditionOperator;

// ============================================================================
// SECTION: Path Resolution
// ============================================================================

/// Resolves a dot-separated path inside a payload.
///
/// Objects are walked by key and arrays by decimal index. Any missing key or
/// scalar intermediate yields `None`.
#[must_use]
pub fn resolve_path<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    let mut current = payload;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

// ============================================================================
// SECTION: Condition Evaluation
// ============================================================================

/// Evaluates a single condition against a payload.
#[must_use]
pub fn evaluate_condition(condition: &Condition, payload: &Value) -> bool {
    let actual = resolve_path(payload, &condition.field);
    let expected = &condition.value;
    match &condition.operator {
        ConditionOperator::Equals => actual.is_some_and(|actual| json_equals(actual, expected)),
        ConditionOperator::Contains => compare_contains(actual, expected),
        ConditionOperator::In => compare_in(actual, expected),
        ConditionOperator::NotIn => compare_not_in(actual, expected),
        ConditionOperator::GreaterThan => compare_numeric(actual, expected, Ordering::is_gt),
        ConditionOperator::LessThan => compare_numeric(actual, expected, Ordering::is_lt),
        ConditionOperator::Exists => is_present(actual),
        ConditionOperator::NotExists => !is_present(actual),
        ConditionOperator::Matches => compare_matches(actual, expected),
        ConditionOperator::Unknown(name) => {
            warn!(
                operator = %name,
                field = %condition.field,
                "unknown condition operator evaluates to false"
            );
            false
        }
    }
}

/// Renders the observed field value for evidence strings.
#[must_use]
pub fn render_observed(payload: &Value, path: &str) -> String {
    resolve_path(payload, path).map_or_else(|| "undefined".to_string(), Value::to_string)
}

// ============================================================================
// SECTION: Operators
// ============================================================================

/// Returns true when the resolved value is present and not null.
const fn is_present(actual: Option<&Value>) -> bool {
    !matches!(actual, None | Some(Value::Null))
}

/// Case-insensitive substring match for strings, membership for sequences.
fn compare_contains(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        Some(Value::String(haystack)) => scalar_text(expected)
            .is_some_and(|needle| haystack.to_lowercase().contains(&needle.to_lowercase())),
        Some(Value::Array(items)) => items.iter().any(|item| json_equals(item, expected)),
        _ => false,
    }
}

/// Sequence membership; a non-sequence operand never matches.
fn compare_in(actual: Option<&Value>, expected: &Value) -> bool {
    let Value::Array(values) = expected else {
        return false;
    };
    actual.is_some_and(|actual| values.iter().any(|value| json_equals(actual, value)))
}

/// Negated sequence membership; a non-sequence operand is treated as "not in".
fn compare_not_in(actual: Option<&Value>, expected: &Value) -> bool {
    let Value::Array(values) = expected else {
        return true;
    };
    !actual.is_some_and(|actual| values.iter().any(|value| json_equals(actual, value)))
}

/// Numeric ordering; non-numeric fields never match.
fn compare_numeric(
    actual: Option<&Value>,
    expected: &Value,
    predicate: fn(Ordering) -> bool,
) -> bool {
    let Some(Value::Number(actual)) = actual else {
        return false;
    };
    let Some(left) = decimal_from_text(&actual.to_string()) else {
        return false;
    };
    let right = match expected {
        Value::Number(number) => decimal_from_text(&number.to_string()),
        Value::String(text) => decimal_from_text(text.trim()),
        _ => None,
    };
    right.is_some_and(|right| predicate(left.cmp(&right)))
}

/// Regular expression test; invalid patterns never match.
fn compare_matches(actual: Option<&Value>, expected: &Value) -> bool {
    let Value::String(pattern) = expected else {
        return false;
    };
    let Some(subject) = actual.and_then(scalar_text) else {
        return false;
    };
    match Regex::new(pattern) {
        Ok(regex) => regex.is_match(&subject),
        Err(err) => {
            debug!(error = %err, "invalid condition pattern evaluates to false");
            false
        }
    }
}

// ============================================================================
// SECTION: Value Helpers
// ============================================================================

/// Strict equality with decimal-aware numbers.
pub(crate) fn json_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => {
            match (decimal_from_text(&left.to_string()), decimal_from_text(&right.to_string())) {
                (Some(left), Some(right)) => left == right,
                _ => false,
            }
        }
        _ => left == right,
    }
}

/// Renders scalar JSON values as text; compound values and null yield `None`.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Parses decimal text into `BigDecimal`.
fn decimal_from_text(text: &str) -> Option<BigDecimal> {
    BigDecimal::from_str(text).ok()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
