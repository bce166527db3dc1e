// crates/clinical-gate-core/src/runtime/glosa.rs
// ============================================================================
// Module: Glosa Risk Aggregation
// Description: Combines per-signal billing denial estimates into one summary.
// Purpose: Provide the financial risk block of a rule gate decision.
// Dependencies: crate::model, thiserror
// ============================================================================

//! ## Overview
//! Amounts are summed; probabilities are combined as the union of
//! independent events, `1 - prod(1 - p_i)`. Both are rounded to two decimals
//! in the summary. The representative denial code is taken from the signal
//! with the highest individual probability (first wins on ties).

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::model::GlosaRisk;
use crate::model::GlosaRiskSummary;
use crate::model::RuleId;
use crate::model::Signal;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Rule gate evaluation errors.
///
/// # Invariants
/// - Never surfaced to gate callers; converted to the fail-safe decision.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    /// A signal carried a glosa estimate outside its invariants.
    #[error("invalid glosa risk on rule {rule_id}: {reason}")]
    InvalidGlosaRisk {
        /// Offending rule.
        rule_id: RuleId,
        /// Violated invariant.
        reason: String,
    },
    /// Aggregation produced a non-finite value.
    #[error("glosa aggregate is not finite: {0}")]
    NonFiniteAggregate(String),
}

// ============================================================================
// SECTION: Aggregation
// ============================================================================

/// Union probability of independent events, clamped to `[0, 1]`.
#[must_use]
pub fn combined_probability<I>(probabilities: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let complement: f64 = probabilities.into_iter().map(|p| 1.0 - p).product();
    (1.0 - complement).clamp(0.0, 1.0)
}

/// Aggregates glosa risk across signals carrying an estimate.
///
/// Returns `Ok(None)` when no signal carries an estimate.
///
/// # Errors
///
/// Returns [`GateError`] when an estimate violates its invariants or the
/// aggregate is not finite.
pub fn aggregate_glosa(signals: &[Signal]) -> Result<Option<GlosaRiskSummary>, GateError> {
    let risks: Vec<(&RuleId, &GlosaRisk)> = signals
        .iter()
        .filter_map(|signal| signal.glosa_risk.as_ref().map(|risk| (&signal.rule_id, risk)))
        .collect();
    if risks.is_empty() {
        return Ok(None);
    }
    for (rule_id, risk) in &risks {
        risk.validate().map_err(|reason| GateError::InvalidGlosaRisk {
            rule_id: (*rule_id).clone(),
            reason,
        })?;
    }

    let total_amount: f64 = risks.iter().map(|(_, risk)| risk.amount).sum();
    if !total_amount.is_finite() {
        return Err(GateError::NonFiniteAggregate(format!("amount {total_amount}")));
    }
    let probability = combined_probability(risks.iter().map(|(_, risk)| risk.probability));

    let Some(representative) = risks.iter().map(|(_, risk)| *risk).reduce(|best, risk| {
        if risk.probability > best.probability { risk } else { best }
    }) else {
        return Ok(None);
    };

    Ok(Some(GlosaRiskSummary {
        total_amount: round2(total_amount),
        probability: round2(probability),
        denial_code: representative.code.clone(),
        contributing_signals: risks.len(),
    }))
}

/// Rounds to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// SECTION: Tests
// ============================================================================
