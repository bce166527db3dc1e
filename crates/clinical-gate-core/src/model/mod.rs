// crates/clinical-gate-core/src/model/mod.rs
// ============================================================================
// Module: Clinical Gate Model
// Description: Rule, decision, verdict, and governance data types.
// Purpose: Group the serializable contracts shared across the workspace.
// Dependencies: serde, serde_json, sha2
// ============================================================================

//! ## Overview
//! Plain data types with stable wire forms. Nothing in this module performs
//! I/O or evaluation.

pub mod decision;
pub mod governance;
pub mod identifiers;
pub mod rule;
pub mod verdict;

pub use decision::Decision;
pub use decision::EvaluationContext;
pub use decision::GlosaRiskSummary;
pub use decision::OverridePolicy;
pub use decision::OverrideRequirement;
pub use decision::Signal;
pub use governance::GovernanceEventEntry;
pub use governance::GovernanceEventKind;
pub use governance::GovernanceEventRecord;
pub use governance::GovernanceLogEntry;
pub use governance::GovernanceLogRecord;
pub use governance::InteractionSession;
pub use governance::UpstreamSession;
pub use identifiers::ActionType;
pub use identifiers::GovernanceEventId;
pub use identifiers::GovernanceLogId;
pub use identifiers::InteractionSessionId;
pub use identifiers::PatientHash;
pub use identifiers::RuleId;
pub use identifiers::SessionRef;
pub use rule::Condition;
pub use rule::ConditionOperator;
pub use rule::GlosaRisk;
pub use rule::MAX_RULE_LOGIC_BYTES;
pub use rule::RuleCategory;
pub use rule::RuleLogic;
pub use rule::RuleLogicError;
pub use rule::RuleMessages;
pub use rule::RuleRecord;
pub use rule::SignalColor;
pub use verdict::AuditCategory;
pub use verdict::AuditorVerdict;
pub use verdict::ExecutionMetadata;
pub use verdict::RiskLevel;
