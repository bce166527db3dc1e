// crates/clinical-gate-auditor/src/lib.rs
// ============================================================================
// Module: Clinical Gate Auditor Library
// Description: Asynchronous post-hoc integrity auditor for AI clinical notes.
// Purpose: Compare a proposed note to its transcript behind a privacy boundary.
// Dependencies: clinical-gate-core, jsonschema, reqwest, tokio, tracing
// ============================================================================

//! ## Overview
//! The auditor drives one audit per call through [`AuditOrchestrator`]:
//! anonymize when the model is remote, call the model through a
//! breaker-guarded [`LlmGateway`] (or the local [`SimulatedModel`]), validate
//! the output against the verdict schema, rehydrate the reasoning trace, and
//! persist governance rows on a best-effort basis.
//! Invariants:
//! - [`AuditOrchestrator::audit_session`] always returns a verdict.
//! - Model output is untrusted until schema-validated.
//! - Breaker state is owned by one gateway instance and mutex-guarded.
//!
//! Security posture: identifying spans never leave the process when a remote
//! model is configured; rehydration maps are call-scoped and never logged.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod anonymize;
pub mod breaker;
pub mod client;
pub mod gateway;
pub mod http;
pub mod orchestrator;
pub mod prompt;
pub mod schema;
pub mod simulator;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use anonymize::AnonymizationResult;
pub use anonymize::AnonymizationStats;
pub use anonymize::Anonymizer;
pub use anonymize::EntityKind;
pub use anonymize::RehydrationMap;
pub use anonymize::rehydrate;
pub use breaker::BreakerSnapshot;
pub use breaker::CircuitBreaker;
pub use breaker::CircuitBreakerConfig;
pub use breaker::CircuitState;
pub use client::ModelSettings;
pub use client::build_model_client;
pub use gateway::Completion;
pub use gateway::CompletionRequest;
pub use gateway::CompletionTransport;
pub use gateway::GatewayConfig;
pub use gateway::GatewayError;
pub use gateway::LlmGateway;
pub use gateway::ModelClient;
pub use gateway::TransportError;
pub use http::HttpCompletionTransport;
pub use http::HttpTransportConfig;
pub use orchestrator::AuditClock;
pub use orchestrator::AuditOrchestrator;
pub use orchestrator::AuditReport;
pub use orchestrator::PersistenceReceipt;
pub use orchestrator::SkipReason;
pub use orchestrator::SystemClock;
pub use schema::VerdictError;
pub use schema::parse_verdict;
pub use simulator::SIMULATED_MODEL_ID;
pub use simulator::SimulatedModel;
pub use store::InMemoryGovernanceStore;
