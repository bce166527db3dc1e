// crates/clinical-gate-auditor/src/schema.rs
// ============================================================================
// Module: Verdict Schema
// Description: Strict JSON-schema validation for model verdicts.
// Purpose: Refuse any model output that does not match the verdict contract.
// Dependencies: clinical-gate-core, jsonschema, serde, serde_json
// ============================================================================

//! ## Overview
//! Model output is untrusted. [`validate_verdict_text`] strips markdown code
//! fences, parses JSON, and validates it against the Draft 2020-12 verdict
//! schema. [`parse_verdict`] additionally decodes the typed
//! [`AuditorVerdict`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::LazyLock;

use clinical_gate_core::AuditCategory;
use clinical_gate_core::AuditorVerdict;
use jsonschema::Draft;
use jsonschema::Validator;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Verdict parsing and validation errors.
///
/// # Invariants
/// - Messages never embed the raw model output.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerdictError {
    /// Output was empty after fence stripping.
    #[error("verdict output is empty")]
    Empty,
    /// Output is not JSON.
    #[error("verdict json invalid: {0}")]
    Json(String),
    /// Output failed schema validation.
    #[error("verdict schema violation: {0}")]
    Schema(String),
    /// Schema could not be compiled.
    #[error("verdict schema unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Returns the verdict JSON schema.
#[must_use]
pub fn verdict_schema() -> Value {
    let categories: Vec<&str> = AuditCategory::ALL.iter().map(|category| category.as_str()).collect();
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "AuditorVerdict",
        "type": "object",
        "additionalProperties": false,
        "required": [
            "safety_score",
            "risk_level",
            "categories_detected",
            "reasoning_trace",
            "clinical_intervention"
        ],
        "properties": {
            "safety_score": {"type": "integer", "minimum": 0, "maximum": 100},
            "risk_level": {"enum": ["LOW", "MODERATE", "CRITICAL"]},
            "categories_detected": {
                "type": "array",
                "items": {"enum": categories},
                "uniqueItems": true
            },
            "reasoning_trace": {"type": "string"},
            "clinical_intervention": {"type": "string"},
            "execution_metadata": {
                "type": "object",
                "properties": {
                    "model_id": {"type": ["string", "null"]},
                    "latency_ms": {"type": "integer", "minimum": 0},
                    "input_tokens": {"type": "integer", "minimum": 0},
                    "output_tokens": {"type": "integer", "minimum": 0}
                }
            }
        }
    })
}

/// Compiled verdict validator.
static VERDICT_VALIDATOR: LazyLock<Result<Validator, String>> = LazyLock::new(|| {
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&verdict_schema())
        .map_err(|err| format!("verdict schema compilation failed: {err}"))
});

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Removes a surrounding markdown code fence, if any.
///
/// Handles both multi-line fences and single-line fences such as
/// ```` ```json {"a":1}``` ````.
#[must_use]
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    let body = body.trim();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parses and schema-validates raw model output.
///
/// # Errors
///
/// Returns [`VerdictError`] when the output is empty, not JSON, or violates
/// the verdict schema.
pub fn validate_verdict_text(raw: &str) -> Result<Value, VerdictError> {
    let body = strip_code_fences(raw);
    if body.is_empty() {
        return Err(VerdictError::Empty);
    }
    let value: Value =
        serde_json::from_str(body).map_err(|err| VerdictError::Json(err.to_string()))?;
    validate_verdict_value(&value)?;
    Ok(value)
}

/// Schema-validates a parsed verdict value.
///
/// # Errors
///
/// Returns [`VerdictError::Schema`] listing every violation.
pub fn validate_verdict_value(value: &Value) -> Result<(), VerdictError> {
    let validator = (*VERDICT_VALIDATOR).as_ref().map_err(|err| VerdictError::Unavailable(err.clone()))?;
    let errors: Vec<String> = validator.iter_errors(value).map(|err| err.to_string()).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(VerdictError::Schema(errors.join("; ")))
    }
}

/// Decodes a schema-valid verdict value into the typed verdict.
///
/// # Errors
///
/// Returns [`VerdictError::Json`] when the value does not decode.
pub fn decode_verdict_value(value: &Value) -> Result<AuditorVerdict, VerdictError> {
    AuditorVerdict::deserialize(value).map_err(|err| VerdictError::Json(err.to_string()))
}

/// Parses, validates, and decodes raw model output.
///
/// # Errors
///
/// Returns [`VerdictError`] when validation or decoding fails.
pub fn parse_verdict(raw: &str) -> Result<AuditorVerdict, VerdictError> {
    let value = validate_verdict_text(raw)?;
    decode_verdict_value(&value)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
