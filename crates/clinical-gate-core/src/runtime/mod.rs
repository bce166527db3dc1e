// crates/clinical-gate-core/src/runtime/mod.rs
// ============================================================================
// Module: Clinical Gate Runtime
// Description: Condition evaluation, rule gate, glosa aggregation, and linting.
// Purpose: Group the synchronous evaluation engine.
// Dependencies: crate::model
// ============================================================================

//! ## Overview
//! The runtime is pure: no network, no filesystem, no shared mutable state.
//! Every public entry point may be called concurrently from many threads.

pub mod condition;
pub mod gate;
pub mod glosa;
pub mod lint;

pub use condition::evaluate_condition;
pub use condition::resolve_path;
pub use gate::DEFAULT_LATENCY_BUDGET;
pub use gate::DEFAULT_LETHAL_MARKERS;
pub use gate::EVALUATION_ERROR_RULE_ID;
pub use gate::GatePolicy;
pub use gate::RuleGate;
pub use glosa::GateError;
pub use glosa::aggregate_glosa;
pub use glosa::combined_probability;
pub use lint::RuleLintFinding;
pub use lint::RuleLintKind;
pub use lint::lint_rule;
pub use lint::lint_rules;
