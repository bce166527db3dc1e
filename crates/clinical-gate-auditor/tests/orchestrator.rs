// crates/clinical-gate-auditor/tests/orchestrator.rs
// ============================================================================
// Module: Audit Orchestrator Tests
// Description: End-to-end audits through simulator, fake, and gateway models.
// Purpose: Validate never-fail verdicts, rehydration, and governance writes.
// ============================================================================

//! ## Overview
//! Drives [`AuditOrchestrator`] with the local simulator, a recording remote
//! fake, and a gateway over a hanging transport. Persistence runs against the
//! in-memory store or a store that always fails.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use clinical_gate_auditor::AuditClock;
use clinical_gate_auditor::AuditOrchestrator;
use clinical_gate_auditor::CircuitBreakerConfig;
use clinical_gate_auditor::CircuitState;
use clinical_gate_auditor::Completion;
use clinical_gate_auditor::CompletionRequest;
use clinical_gate_auditor::CompletionTransport;
use clinical_gate_auditor::GatewayConfig;
use clinical_gate_auditor::InMemoryGovernanceStore;
use clinical_gate_auditor::LlmGateway;
use clinical_gate_auditor::ModelClient;
use clinical_gate_auditor::PersistenceReceipt;
use clinical_gate_auditor::SimulatedModel;
use clinical_gate_auditor::SkipReason;
use clinical_gate_auditor::TransportError;
use clinical_gate_core::AuditCategory;
use clinical_gate_core::GovernanceEventEntry;
use clinical_gate_core::GovernanceEventId;
use clinical_gate_core::GovernanceEventKind;
use clinical_gate_core::GovernanceEventRecord;
use clinical_gate_core::GovernanceLogEntry;
use clinical_gate_core::GovernanceLogId;
use clinical_gate_core::GovernanceLogRecord;
use clinical_gate_core::GovernanceStore;
use clinical_gate_core::InteractionSession;
use clinical_gate_core::PatientHash;
use clinical_gate_core::PersistenceError;
use clinical_gate_core::RiskLevel;
use clinical_gate_core::SessionRef;
use clinical_gate_core::StaticSessionDirectory;
use clinical_gate_core::UpstreamSession;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const SESSION: &str = "consult-001";

struct FixedClock(u64);

impl AuditClock for FixedClock {
    fn now_ms(&self) -> u64 {
        self.0
    }
}

fn directory() -> Arc<StaticSessionDirectory> {
    Arc::new(StaticSessionDirectory::new().with_session(UpstreamSession {
        session_ref: SessionRef::new(SESSION),
        patient_hash: PatientHash::from_identifier("patient-42"),
        clinician_id: Some("clinician-7".to_string()),
    }))
}

fn persisted(model: Arc<dyn ModelClient>, store: &InMemoryGovernanceStore) -> AuditOrchestrator {
    AuditOrchestrator::new(model)
        .with_persistence(Arc::new(store.clone()), directory())
        .with_clock(Arc::new(FixedClock(1_700_000_000_000)))
}

/// Remote fake that records prompts and echoes the first person token.
struct EchoingRemoteModel {
    prompts: Mutex<Vec<String>>,
}

impl EchoingRemoteModel {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ModelClient for EchoingRemoteModel {
    async fn complete(&self, _system_prompt: &str, user_prompt: &str) -> String {
        self.prompts.lock().unwrap().push(user_prompt.to_string());
        let token = user_prompt
            .find("[PERSON_")
            .and_then(|start| {
                user_prompt[start ..].find(']').map(|end| &user_prompt[start ..= start + end])
            })
            .unwrap_or("unknown");
        serde_json::json!({
            "safety_score": 35,
            "risk_level": "MODERATE",
            "categories_detected": ["OMISSION"],
            "reasoning_trace": format!("{token} reported penicillin allergy; note omits it."),
            "clinical_intervention": format!("Confirm allergy history with {token}."),
        })
        .to_string()
    }

    fn is_remote(&self) -> bool {
        true
    }

    fn model_id(&self) -> &str {
        "echo-remote"
    }
}

/// Model that answers with prose instead of JSON.
struct ChattyModel;

#[async_trait]
impl ModelClient for ChattyModel {
    async fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> String {
        "The note looks fine to me.".to_string()
    }

    fn is_remote(&self) -> bool {
        false
    }

    fn model_id(&self) -> &str {
        "chatty"
    }
}

/// Local model that reports its score as a JSON float.
struct FloatScoreModel;

#[async_trait]
impl ModelClient for FloatScoreModel {
    async fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> String {
        r#"{"safety_score": 20.0, "risk_level": "CRITICAL", "categories_detected": ["DOSAGE_ERROR"], "reasoning_trace": "5mg vs 50mg", "clinical_intervention": "Confirm the dose."}"#
            .to_string()
    }

    fn is_remote(&self) -> bool {
        false
    }

    fn model_id(&self) -> &str {
        "float-score"
    }
}

/// Transport that never answers.
struct HangingTransport;

#[async_trait]
impl CompletionTransport for HangingTransport {
    async fn complete(&self, _request: &CompletionRequest) -> Result<Completion, TransportError> {
        tokio::time::sleep(Duration::from_secs(3_600)).await;
        Err(TransportError::Request("unreachable".to_string()))
    }
}

/// Store whose every call fails.
struct UnavailableStore;

impl GovernanceStore for UnavailableStore {
    fn find_session(&self, _: &SessionRef) -> Result<Option<InteractionSession>, PersistenceError> {
        Err(PersistenceError::Unavailable("database offline".to_string()))
    }

    fn create_session(
        &self,
        _: &UpstreamSession,
        _: u64,
    ) -> Result<InteractionSession, PersistenceError> {
        Err(PersistenceError::Unavailable("database offline".to_string()))
    }

    fn append_log(&self, _: &GovernanceLogEntry) -> Result<GovernanceLogId, PersistenceError> {
        Err(PersistenceError::Unavailable("database offline".to_string()))
    }

    fn append_event(
        &self,
        _: &GovernanceEventEntry,
    ) -> Result<GovernanceEventId, PersistenceError> {
        Err(PersistenceError::Unavailable("database offline".to_string()))
    }

    fn list_logs(&self, _: &SessionRef) -> Result<Vec<GovernanceLogRecord>, PersistenceError> {
        Err(PersistenceError::Unavailable("database offline".to_string()))
    }

    fn list_events(&self, _: &SessionRef) -> Result<Vec<GovernanceEventRecord>, PersistenceError> {
        Err(PersistenceError::Unavailable("database offline".to_string()))
    }
}

// ============================================================================
// SECTION: Simulator Scenarios
// ============================================================================

#[tokio::test]
async fn dosage_mismatch_is_critical_and_records_event() {
    let store = InMemoryGovernanceStore::new();
    let orchestrator = persisted(Arc::new(SimulatedModel::new()), &store);
    let session = SessionRef::new(SESSION);

    let report = orchestrator
        .audit_session_detailed(
            &session,
            "Médico: vamos iniciar amlodipina 5mg uma vez ao dia.",
            "Plano: amlodipina 50mg VO 1x/dia.",
        )
        .await;

    assert_eq!(report.verdict.risk_level, RiskLevel::Critical);
    assert_eq!(report.verdict.categories_detected, vec![AuditCategory::DosageError]);
    assert!(!report.anonymized);
    let Ok(PersistenceReceipt::Recorded {
        event_id,
        ..
    }) = &report.persistence
    else {
        panic!("expected recorded persistence, got {:?}", report.persistence);
    };
    assert!(event_id.is_some());

    let logs = store.list_logs(&session).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].entry.risk_level, RiskLevel::Critical);
    assert_eq!(logs[0].entry.recorded_at_ms, 1_700_000_000_000);
    assert!(!logs[0].entry.anonymized);
    assert!(!logs[0].entry.verdict_json.contains("amlodipina 5mg uma vez"));

    let events = store.list_events(&session).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].entry.kind, GovernanceEventKind::CriticalAuditFinding);
    assert_eq!(events[0].entry.log_id, logs[0].id);
}

#[tokio::test]
async fn clean_audit_logs_without_event() {
    let store = InMemoryGovernanceStore::new();
    let orchestrator = persisted(Arc::new(SimulatedModel::new()), &store);
    let session = SessionRef::new(SESSION);

    let verdict = orchestrator
        .audit_session(&session, "Paciente relata cefaleia.", "Queixa: cefaleia.")
        .await;
    assert_eq!(verdict.risk_level, RiskLevel::Low);
    assert_eq!(store.list_logs(&session).unwrap().len(), 1);
    assert!(store.list_events(&session).unwrap().is_empty());
}

#[tokio::test]
async fn session_record_is_created_once() {
    let store = InMemoryGovernanceStore::new();
    let orchestrator = persisted(Arc::new(SimulatedModel::new()), &store);
    let session = SessionRef::new(SESSION);

    orchestrator.audit_session(&session, "a", "b").await;
    orchestrator.audit_session(&session, "c", "d").await;

    let logs = store.list_logs(&session).unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].entry.session_id, logs[1].entry.session_id);
    let stored = store.find_session(&session).unwrap().unwrap();
    assert_eq!(stored.clinician_id.as_deref(), Some("clinician-7"));
}

#[tokio::test]
async fn unknown_upstream_session_skips_persistence() {
    let store = InMemoryGovernanceStore::new();
    let orchestrator = persisted(Arc::new(SimulatedModel::new()), &store);
    let report = orchestrator
        .audit_session_detailed(&SessionRef::new("missing"), "5mg", "50mg")
        .await;
    assert_eq!(report.verdict.risk_level, RiskLevel::Critical);
    assert_eq!(report.persistence, Ok(PersistenceReceipt::Skipped(SkipReason::UnknownSession)));
    assert!(store.all_logs().unwrap().is_empty());
}

#[tokio::test]
async fn missing_store_is_reported_as_skipped() {
    let orchestrator = AuditOrchestrator::new(Arc::new(SimulatedModel::new()));
    let report = orchestrator.audit_session_detailed(&SessionRef::new(SESSION), "x", "y").await;
    assert_eq!(report.persistence, Ok(PersistenceReceipt::Skipped(SkipReason::NoStore)));
}

#[tokio::test]
async fn persistence_failure_does_not_change_the_verdict() {
    let orchestrator = AuditOrchestrator::new(Arc::new(SimulatedModel::new()))
        .with_persistence(Arc::new(UnavailableStore), directory());
    let report = orchestrator
        .audit_session_detailed(&SessionRef::new(SESSION), "5 mg", "50 mg")
        .await;
    assert_eq!(report.verdict.risk_level, RiskLevel::Critical);
    assert_eq!(
        report.persistence,
        Err(PersistenceError::Unavailable("database offline".to_string()))
    );
}

// ============================================================================
// SECTION: Remote Scenarios
// ============================================================================

#[tokio::test]
async fn remote_model_sees_only_anonymized_text() {
    let model = EchoingRemoteModel::new();
    let store = InMemoryGovernanceStore::new();
    let orchestrator = persisted(model.clone(), &store);

    let report = orchestrator
        .audit_session_detailed(
            &SessionRef::new(SESSION),
            "Paciente Joana Prado, CPF 111.222.333-44, refere alergia a penicilina.",
            "Paciente Joana Prado sem alergias conhecidas.",
        )
        .await;

    let prompt = model.last_prompt();
    assert!(!prompt.contains("Joana Prado"));
    assert!(!prompt.contains("111.222.333-44"));
    assert!(report.anonymized);

    assert_eq!(
        report.verdict.reasoning_trace,
        "Joana Prado reported penicillin allergy; note omits it."
    );
    assert!(report.verdict.clinical_intervention.contains("[PERSON_"));

    let logs = store.all_logs().unwrap();
    assert!(logs[0].entry.anonymized);
}

#[tokio::test]
async fn non_json_output_yields_fail_safe_without_persisting() {
    let store = InMemoryGovernanceStore::new();
    let orchestrator = persisted(Arc::new(ChattyModel), &store);
    let report = orchestrator.audit_session_detailed(&SessionRef::new(SESSION), "x", "y").await;

    assert!(report.verdict.is_fail_safe());
    assert_eq!(report.verdict.safety_score, 50);
    assert_eq!(report.verdict.execution_metadata.model_id, None);
    assert_eq!(report.persistence, Ok(PersistenceReceipt::Skipped(SkipReason::UntrustedVerdict)));
    assert!(store.all_logs().unwrap().is_empty());
}

#[tokio::test]
async fn integral_float_score_keeps_critical_verdict_and_records_event() {
    let store = InMemoryGovernanceStore::new();
    let orchestrator = persisted(Arc::new(FloatScoreModel), &store);
    let session = SessionRef::new(SESSION);
    let report = orchestrator.audit_session_detailed(&session, "x", "y").await;

    assert!(!report.verdict.is_fail_safe());
    assert_eq!(report.verdict.safety_score, 20);
    assert_eq!(report.verdict.risk_level, RiskLevel::Critical);
    assert_eq!(report.verdict.categories_detected, vec![AuditCategory::DosageError]);
    assert_eq!(store.list_events(&session).unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn timeouts_yield_fail_safe_and_open_the_breaker() {
    let gateway = Arc::new(LlmGateway::new(
        GatewayConfig {
            request_timeout: Duration::from_secs(2),
            breaker: CircuitBreakerConfig {
                failure_threshold: 3,
                reset_interval: Duration::from_secs(60),
            },
            ..GatewayConfig::new("remote-auditor")
        },
        Arc::new(HangingTransport),
    ));
    let orchestrator = AuditOrchestrator::new(gateway.clone());
    let session = SessionRef::new(SESSION);

    for _ in 0 .. 4 {
        let verdict = orchestrator.audit_session(&session, "5mg", "50mg").await;
        assert_eq!(verdict.risk_level, RiskLevel::Moderate);
        assert!(verdict.is_fail_safe());
        assert!(verdict.categories_detected.is_empty());
    }
    let snapshot = gateway.breaker();
    assert_eq!(snapshot.state, CircuitState::Open);
    assert_eq!(snapshot.consecutive_failures, 3);
}
