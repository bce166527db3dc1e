// crates/clinical-gate-core/src/lib.rs
// ============================================================================
// Module: Clinical Gate Core Library
// Description: Public API surface for the clinical safety gate.
// Purpose: Expose core types, collaborator interfaces, and the rule gate runtime.
// Dependencies: crate::{model, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Clinical Gate core classifies proposed clinical and billing actions as
//! allowed, conditionally allowed, or blocked before they proceed. Evaluation
//! is synchronous, local, and side-effect free. The crate also owns the
//! auditor verdict model and the persistence interfaces consumed by the
//! asynchronous integrity auditor.
//!
//! Security posture: rule documents and payloads are untrusted inputs and
//! patient identity only enters as a SHA-256 digest.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod model;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use model::*;

pub use interfaces::GovernanceStore;
pub use interfaces::PersistenceError;
pub use interfaces::SessionDirectory;
pub use interfaces::StaticSessionDirectory;
pub use runtime::DEFAULT_LATENCY_BUDGET;
pub use runtime::DEFAULT_LETHAL_MARKERS;
pub use runtime::EVALUATION_ERROR_RULE_ID;
pub use runtime::GateError;
pub use runtime::GatePolicy;
pub use runtime::RuleGate;
pub use runtime::RuleLintFinding;
pub use runtime::RuleLintKind;
pub use runtime::aggregate_glosa;
pub use runtime::combined_probability;
pub use runtime::evaluate_condition;
pub use runtime::lint_rule;
pub use runtime::lint_rules;
pub use runtime::resolve_path;
