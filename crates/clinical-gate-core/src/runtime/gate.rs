// crates/clinical-gate-core/src/runtime/gate.rs
// ============================================================================
// Module: Rule Gate
// Description: Traffic-light classification of a proposed clinical action.
// Purpose: Turn an evaluation context into a worst-wins decision with override policy.
// Dependencies: crate::{model, runtime}, tracing
// ============================================================================

//! ## Overview
//! [`RuleGate::evaluate`] filters the supplied rules to the active ones that
//! apply to the action type, evaluates each rule's conditions with AND
//! semantics, and assembles the triggered signals into a [`Decision`].
//!
//! The gate sits on a blocking path and must always answer. Malformed rule
//! documents are skipped. Any other evaluation fault, including a panic, is
//! converted into a single advisory `YELLOW` signal that allows an override
//! with written justification.
//!
//! Security posture: the gate performs no authorization; the caller passes
//! exactly the rules it may see.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::panic::AssertUnwindSafe;
use std::panic::catch_unwind;
use std::time::Duration;
use std::time::Instant;

use tracing::debug;
use tracing::error;
use tracing::warn;

use crate::model::Decision;
use crate::model::EvaluationContext;
use crate::model::OverridePolicy;
use crate::model::RuleCategory;
use crate::model::RuleId;
use crate::model::RuleLogic;
use crate::model::RuleMessages;
use crate::model::RuleRecord;
use crate::model::Signal;
use crate::model::SignalColor;
use crate::runtime::condition::evaluate_condition;
use crate::runtime::condition::render_observed;
use crate::runtime::glosa::GateError;
use crate::runtime::glosa::aggregate_glosa;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default latency budget for one evaluation.
pub const DEFAULT_LATENCY_BUDGET: Duration = Duration::from_millis(10);

/// Default markers identifying a lethal-risk message (matched case-insensitively).
pub const DEFAULT_LETHAL_MARKERS: [&str; 5] =
    ["letal", "lethal", "fatal", "risco de morte", "life-threatening"];

/// Rule identifier carried by the synthetic evaluation-error signal.
pub const EVALUATION_ERROR_RULE_ID: &str = "system.evaluation-error";

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Rule gate policy knobs.
///
/// # Invariants
/// - `lethal_markers` are stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatePolicy {
    /// Lower-cased substrings marking a red signal as lethal.
    lethal_markers: Vec<String>,
    /// Evaluation time above which a warning is logged.
    latency_budget: Duration,
}

impl GatePolicy {
    /// Builds a policy from markers and a latency budget.
    #[must_use]
    pub fn new<I, S>(lethal_markers: I, latency_budget: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            lethal_markers: lethal_markers
                .into_iter()
                .map(|marker| marker.as_ref().trim().to_lowercase())
                .filter(|marker| !marker.is_empty())
                .collect(),
            latency_budget,
        }
    }

    /// Returns the lower-cased lethal markers.
    #[must_use]
    pub fn lethal_markers(&self) -> &[String] {
        &self.lethal_markers
    }

    /// Returns the latency budget.
    #[must_use]
    pub const fn latency_budget(&self) -> Duration {
        self.latency_budget
    }

    /// Returns true when either message language contains a lethal marker.
    #[must_use]
    pub fn is_lethal(&self, message: &RuleMessages) -> bool {
        let pt = message.pt.to_lowercase();
        let en = message.en.to_lowercase();
        self.lethal_markers
            .iter()
            .any(|marker| pt.contains(marker.as_str()) || en.contains(marker.as_str()))
    }
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_LETHAL_MARKERS, DEFAULT_LATENCY_BUDGET)
    }
}

// ============================================================================
// SECTION: Rule Gate
// ============================================================================

/// Synchronous rule gate.
#[derive(Debug, Clone, Default)]
pub struct RuleGate {
    /// Gate policy.
    policy: GatePolicy,
}

impl RuleGate {
    /// Creates a gate with the provided policy.
    #[must_use]
    pub const fn new(policy: GatePolicy) -> Self {
        Self { policy }
    }

    /// Returns the gate policy.
    #[must_use]
    pub const fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    /// Evaluates a context and always returns a decision.
    ///
    /// Internal faults yield the advisory fail-safe decision.
    #[must_use]
    pub fn evaluate(&self, context: &EvaluationContext) -> Decision {
        let started = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| self.try_evaluate(context)));
        let mut decision = match outcome {
            Ok(Ok(decision)) => decision,
            Ok(Err(err)) => {
                error!(
                    error = %err,
                    action_type = %context.action_type,
                    "rule gate evaluation failed; returning advisory decision"
                );
                self.evaluation_error_decision()
            }
            Err(_) => {
                error!(
                    action_type = %context.action_type,
                    "rule gate evaluation panicked; returning advisory decision"
                );
                self.evaluation_error_decision()
            }
        };
        let elapsed = started.elapsed();
        decision.evaluation_ms = elapsed.as_secs_f64() * 1000.0;
        if elapsed > self.policy.latency_budget {
            warn!(
                evaluation_ms = decision.evaluation_ms,
                budget_ms = self.policy.latency_budget.as_secs_f64() * 1000.0,
                rules = context.rules.len(),
                "rule gate evaluation exceeded latency budget"
            );
        }
        decision
    }

    /// Evaluates a context, surfacing internal faults.
    ///
    /// `evaluation_ms` is left at zero; [`RuleGate::evaluate`] fills it.
    ///
    /// # Errors
    ///
    /// Returns [`GateError`] when signal aggregation fails.
    pub fn try_evaluate(&self, context: &EvaluationContext) -> Result<Decision, GateError> {
        let mut signals = Vec::new();
        for rule in context.rules.iter().filter(|rule| rule.is_active) {
            let logic = match rule.parse_logic() {
                Ok(logic) => logic,
                Err(err) => {
                    warn!(
                        rule_id = %rule.rule_id,
                        rule_version = rule.version,
                        error = %err,
                        "skipping malformed rule"
                    );
                    continue;
                }
            };
            if !logic.applies_to(&context.action_type) {
                continue;
            }
            if let Some(signal) = evaluate_rule(rule, logic, &context.payload) {
                debug!(
                    rule_id = %signal.rule_id,
                    color = %signal.color,
                    "rule triggered"
                );
                signals.push(signal);
            }
        }
        self.assemble(signals)
    }

    /// Assembles a decision from triggered signals.
    ///
    /// # Errors
    ///
    /// Returns [`GateError`] when glosa aggregation fails.
    pub fn assemble(&self, signals: Vec<Signal>) -> Result<Decision, GateError> {
        let color = signals.iter().map(|signal| signal.color).max().unwrap_or(SignalColor::Green);
        let policy = self.override_policy(&signals);
        let total_glosa_risk = aggregate_glosa(&signals)?;
        Ok(Decision {
            color,
            signals,
            can_override: policy.can_override,
            override_requires: policy.requires,
            total_glosa_risk,
            needs_chat_assistance: color != SignalColor::Green,
            evaluation_ms: 0.0,
        })
    }

    /// Derives the override policy from a signal set.
    #[must_use]
    pub fn override_policy(&self, signals: &[Signal]) -> OverridePolicy {
        let mut reds = signals.iter().filter(|signal| signal.color == SignalColor::Red).peekable();
        if reds.peek().is_some() {
            if reds.any(|signal| self.policy.is_lethal(&signal.message)) {
                return OverridePolicy::BLOCKED;
            }
            return OverridePolicy::SUPERVISOR;
        }
        if signals.iter().any(|signal| signal.color == SignalColor::Yellow) {
            return OverridePolicy::JUSTIFICATION;
        }
        OverridePolicy::FREE
    }

    /// Builds the advisory decision returned on internal faults.
    fn evaluation_error_decision(&self) -> Decision {
        let signal = Signal {
            rule_id: RuleId::new(EVALUATION_ERROR_RULE_ID),
            rule_name: "Rule gate evaluation error".to_string(),
            rule_version: 0,
            category: RuleCategory::Administrative,
            color: SignalColor::Yellow,
            message: RuleMessages {
                pt: "Erro de avaliação: prossiga com cautela".to_string(),
                en: "Evaluation error: proceed with caution".to_string(),
            },
            evidence: Vec::new(),
            regulatory_reference: None,
            suggested_correction: None,
            glosa_risk: None,
        };
        let policy = self.override_policy(std::slice::from_ref(&signal));
        Decision {
            color: SignalColor::Yellow,
            signals: vec![signal],
            can_override: policy.can_override,
            override_requires: policy.requires,
            total_glosa_risk: None,
            needs_chat_assistance: true,
            evaluation_ms: 0.0,
        }
    }
}

// ============================================================================
// SECTION: Rule Evaluation
// ============================================================================

/// Evaluates one parsed rule, returning its signal when every condition holds.
fn evaluate_rule(rule: &RuleRecord, logic: RuleLogic, payload: &serde_json::Value) -> Option<Signal> {
    let mut evidence = Vec::with_capacity(logic.conditions.len());
    for condition in &logic.conditions {
        if !evaluate_condition(condition, payload) {
            return None;
        }
        evidence.push(format!(
            "{} {} {} (observed: {})",
            condition.field,
            condition.operator,
            condition.value,
            render_observed(payload, &condition.field)
        ));
    }
    Some(Signal {
        rule_id: rule.rule_id.clone(),
        rule_name: rule.name.clone(),
        rule_version: rule.version,
        category: rule.category,
        color: logic.color,
        message: logic.message,
        evidence,
        regulatory_reference: logic.regulatory_reference,
        suggested_correction: logic.suggested_correction,
        glosa_risk: logic.glosa_risk,
    })
}
