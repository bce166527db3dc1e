// crates/clinical-gate-auditor/src/orchestrator.rs
// ============================================================================
// Module: Audit Orchestrator
// Description: End-to-end driver for one integrity audit request.
// Purpose: Anonymize, call, validate, rehydrate, persist, and return a verdict.
// Dependencies: clinical-gate-core, tokio, tracing
// ============================================================================

//! ## Overview
//! [`AuditOrchestrator::audit_session`] is the only public entry point of the
//! asynchronous engine and never fails: any fault before a trusted verdict
//! exists yields [`AuditorVerdict::fail_safe`]. Persistence is best effort and
//! awaited internally; its outcome is reported on [`AuditReport`] by
//! [`AuditOrchestrator::audit_session_detailed`] and logged, never returned
//! as an error.
//!
//! Security posture: transcript and note text never appear in log fields.
//! Rehydration maps live only for the duration of one call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use clinical_gate_core::AuditorVerdict;
use clinical_gate_core::GovernanceEventEntry;
use clinical_gate_core::GovernanceEventId;
use clinical_gate_core::GovernanceEventKind;
use clinical_gate_core::GovernanceLogEntry;
use clinical_gate_core::GovernanceLogId;
use clinical_gate_core::GovernanceStore;
use clinical_gate_core::InteractionSessionId;
use clinical_gate_core::PersistenceError;
use clinical_gate_core::RiskLevel;
use clinical_gate_core::SessionDirectory;
use clinical_gate_core::SessionRef;
use clinical_gate_core::StaticSessionDirectory;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::anonymize::Anonymizer;
use crate::anonymize::RehydrationMap;
use crate::anonymize::rehydrate;
use crate::gateway::ModelClient;
use crate::prompt::SYSTEM_PROMPT;
use crate::prompt::build_user_prompt;
use crate::schema::parse_verdict;

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Host time source for governance timestamps.
pub trait AuditClock: Send + Sync {
    /// Returns milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// Wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl AuditClock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
    }
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Reason a persistence attempt was not made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No governance store is configured.
    NoStore,
    /// The upstream session reference could not be resolved.
    UnknownSession,
    /// The model output was untrusted and replaced by the fail-safe verdict.
    UntrustedVerdict,
}

impl SkipReason {
    /// Returns a stable label for the reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoStore => "no_store",
            Self::UnknownSession => "unknown_session",
            Self::UntrustedVerdict => "untrusted_verdict",
        }
    }
}

/// Outcome of a successful persistence step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceReceipt {
    /// Rows were written.
    Recorded {
        /// Interaction session the rows belong to.
        session_id: InteractionSessionId,
        /// Governance log row.
        log_id: GovernanceLogId,
        /// Governance event row, present only for critical verdicts.
        event_id: Option<GovernanceEventId>,
    },
    /// Nothing was written.
    Skipped(SkipReason),
}

/// Full outcome of one audit call.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditReport {
    /// Verdict returned to the caller.
    pub verdict: AuditorVerdict,
    /// Whether the prompt crossed the anonymization boundary.
    pub anonymized: bool,
    /// Best-effort persistence outcome.
    pub persistence: Result<PersistenceReceipt, PersistenceError>,
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Drives integrity audits against an injected model client.
///
/// # Invariants
/// - Prompts sent to a remote client contain only anonymized text.
/// - Only `reasoning_trace` is rehydrated.
/// - A governance event is written only for `CRITICAL` verdicts.
#[derive(Clone)]
pub struct AuditOrchestrator {
    /// Model client (remote gateway or local simulator).
    model: Arc<dyn ModelClient>,
    /// Anonymization boundary.
    anonymizer: Anonymizer,
    /// Governance persistence, when configured.
    store: Option<Arc<dyn GovernanceStore>>,
    /// Upstream session resolver.
    directory: Arc<dyn SessionDirectory>,
    /// Host time source.
    clock: Arc<dyn AuditClock>,
}

impl AuditOrchestrator {
    /// Creates an orchestrator without persistence.
    #[must_use]
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self {
            model,
            anonymizer: Anonymizer::new(),
            store: None,
            directory: Arc::new(StaticSessionDirectory::new()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Attaches a governance store and the directory used to create sessions.
    #[must_use]
    pub fn with_persistence(
        mut self,
        store: Arc<dyn GovernanceStore>,
        directory: Arc<dyn SessionDirectory>,
    ) -> Self {
        self.store = Some(store);
        self.directory = directory;
        self
    }

    /// Replaces the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn AuditClock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the model identifier in use.
    #[must_use]
    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    /// Audits a proposed note against its transcript. Never fails.
    pub async fn audit_session(
        &self,
        session_ref: &SessionRef,
        transcript: &str,
        proposed_note: &str,
    ) -> AuditorVerdict {
        self.audit_session_detailed(session_ref, transcript, proposed_note).await.verdict
    }

    /// Audits a proposed note and reports the persistence outcome.
    pub async fn audit_session_detailed(
        &self,
        session_ref: &SessionRef,
        transcript: &str,
        proposed_note: &str,
    ) -> AuditReport {
        let anonymized = self.model.is_remote();
        let (transcript_text, note_text, transcript_map) = if anonymized {
            let transcript_result = self.anonymizer.anonymize(transcript);
            let note_result = self.anonymizer.anonymize(proposed_note);
            info!(
                session_ref = %session_ref,
                transcript_entities = transcript_result.stats.total(),
                note_entities = note_result.stats.total(),
                "anonymized audit inputs"
            );
            (
                transcript_result.redacted_text,
                note_result.redacted_text,
                transcript_result.rehydration_map,
            )
        } else {
            (transcript.to_string(), proposed_note.to_string(), RehydrationMap::new())
        };

        let user_prompt = build_user_prompt(&transcript_text, &note_text);
        let raw = self.model.complete(SYSTEM_PROMPT, &user_prompt).await;
        let mut verdict = match parse_verdict(&raw) {
            Ok(verdict) => verdict,
            Err(err) => {
                warn!(
                    session_ref = %session_ref,
                    model_id = %self.model.model_id(),
                    error = %err,
                    "model output rejected; returning fail-safe verdict"
                );
                return AuditReport {
                    verdict: AuditorVerdict::fail_safe(),
                    anonymized,
                    persistence: Ok(PersistenceReceipt::Skipped(SkipReason::UntrustedVerdict)),
                };
            }
        };
        if anonymized {
            verdict.reasoning_trace = rehydrate(&verdict.reasoning_trace, &transcript_map);
        }

        let persistence = self.persist(session_ref, &verdict, anonymized).await;
        match &persistence {
            Ok(PersistenceReceipt::Recorded {
                log_id,
                event_id,
                ..
            }) => info!(
                session_ref = %session_ref,
                risk_level = %verdict.risk_level,
                log_id = %log_id,
                event_recorded = event_id.is_some(),
                "audit persisted"
            ),
            Ok(PersistenceReceipt::Skipped(reason)) => info!(
                session_ref = %session_ref,
                risk_level = %verdict.risk_level,
                reason = reason.as_str(),
                "audit persistence skipped"
            ),
            Err(err) => error!(
                session_ref = %session_ref,
                risk_level = %verdict.risk_level,
                error = %err,
                "audit persistence failed"
            ),
        }

        AuditReport {
            verdict,
            anonymized,
            persistence,
        }
    }

    /// Runs the blocking persistence step on the blocking pool.
    async fn persist(
        &self,
        session_ref: &SessionRef,
        verdict: &AuditorVerdict,
        anonymized: bool,
    ) -> Result<PersistenceReceipt, PersistenceError> {
        let Some(store) = self.store.clone() else {
            return Ok(PersistenceReceipt::Skipped(SkipReason::NoStore));
        };
        let directory = Arc::clone(&self.directory);
        let clock = Arc::clone(&self.clock);
        let session_ref = session_ref.clone();
        let verdict = verdict.clone();
        tokio::task::spawn_blocking(move || {
            persist_verdict(
                store.as_ref(),
                directory.as_ref(),
                clock.as_ref(),
                &session_ref,
                &verdict,
                anonymized,
            )
        })
        .await
        .map_err(|err| PersistenceError::Store(format!("persistence task failed: {err}")))?
    }
}

// ============================================================================
// SECTION: Persistence
// ============================================================================

/// Writes the governance rows for one verdict.
///
/// # Errors
///
/// Returns [`PersistenceError`] when any store or directory call fails.
pub fn persist_verdict(
    store: &dyn GovernanceStore,
    directory: &dyn SessionDirectory,
    clock: &dyn AuditClock,
    session_ref: &SessionRef,
    verdict: &AuditorVerdict,
    anonymized: bool,
) -> Result<PersistenceReceipt, PersistenceError> {
    let now_ms = clock.now_ms();
    let session = match store.find_session(session_ref)? {
        Some(session) => session,
        None => {
            let Some(upstream) = directory.resolve(session_ref)? else {
                return Ok(PersistenceReceipt::Skipped(SkipReason::UnknownSession));
            };
            store.create_session(&upstream, now_ms)?
        }
    };

    let verdict_json = serde_json::to_string(verdict)
        .map_err(|err| PersistenceError::Invalid(format!("verdict serialization failed: {err}")))?;
    let log_id = store.append_log(&GovernanceLogEntry {
        session_id: session.id,
        recorded_at_ms: now_ms,
        safety_score: verdict.safety_score,
        risk_level: verdict.risk_level,
        categories: verdict.categories_detected.clone(),
        model_id: verdict.execution_metadata.model_id.clone(),
        latency_ms: verdict.execution_metadata.latency_ms,
        anonymized,
        verdict_json,
    })?;

    let event_id = if verdict.risk_level == RiskLevel::Critical {
        Some(store.append_event(&GovernanceEventEntry {
            session_id: session.id,
            log_id,
            recorded_at_ms: now_ms,
            kind: GovernanceEventKind::CriticalAuditFinding,
            categories: verdict.categories_detected.clone(),
            message: verdict.clinical_intervention.clone(),
        })?)
    } else {
        None
    };

    Ok(PersistenceReceipt::Recorded {
        session_id: session.id,
        log_id,
        event_id,
    })
}
