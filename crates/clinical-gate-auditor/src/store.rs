// crates/clinical-gate-auditor/src/store.rs
// ============================================================================
// Module: In-Memory Governance Store
// Description: Mutex-guarded governance store for tests and local runs.
// Purpose: Provide a deterministic GovernanceStore without external deps.
// Dependencies: clinical-gate-core
// ============================================================================

//! ## Overview
//! Keeps interaction sessions, governance logs, and governance events in
//! process memory. Identifiers are assigned sequentially from 1. Not intended
//! for production use; see the SQLite store for durable persistence.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::num::NonZeroU64;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use clinical_gate_core::GovernanceEventEntry;
use clinical_gate_core::GovernanceEventId;
use clinical_gate_core::GovernanceEventRecord;
use clinical_gate_core::GovernanceLogEntry;
use clinical_gate_core::GovernanceLogId;
use clinical_gate_core::GovernanceLogRecord;
use clinical_gate_core::GovernanceStore;
use clinical_gate_core::InteractionSession;
use clinical_gate_core::InteractionSessionId;
use clinical_gate_core::PersistenceError;
use clinical_gate_core::SessionRef;
use clinical_gate_core::UpstreamSession;

// ============================================================================
// SECTION: State
// ============================================================================

/// Store contents.
#[derive(Debug, Default)]
struct GovernanceTables {
    /// Sessions keyed by upstream reference.
    sessions: BTreeMap<SessionRef, InteractionSession>,
    /// Log rows in insertion order.
    logs: Vec<GovernanceLogRecord>,
    /// Event rows in insertion order.
    events: Vec<GovernanceEventRecord>,
}

/// In-memory governance store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryGovernanceStore {
    /// Tables protected by a mutex.
    tables: Arc<Mutex<GovernanceTables>>,
}

impl InMemoryGovernanceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored log row.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the store mutex is poisoned.
    pub fn all_logs(&self) -> Result<Vec<GovernanceLogRecord>, PersistenceError> {
        Ok(self.lock()?.logs.clone())
    }

    /// Returns every stored event row.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the store mutex is poisoned.
    pub fn all_events(&self) -> Result<Vec<GovernanceEventRecord>, PersistenceError> {
        Ok(self.lock()?.events.clone())
    }

    /// Locks the tables.
    fn lock(&self) -> Result<MutexGuard<'_, GovernanceTables>, PersistenceError> {
        self.tables
            .lock()
            .map_err(|_| PersistenceError::Store("governance store mutex poisoned".to_string()))
    }
}

impl GovernanceStore for InMemoryGovernanceStore {
    fn find_session(
        &self,
        session_ref: &SessionRef,
    ) -> Result<Option<InteractionSession>, PersistenceError> {
        Ok(self.lock()?.sessions.get(session_ref).cloned())
    }

    fn create_session(
        &self,
        upstream: &UpstreamSession,
        created_at_ms: u64,
    ) -> Result<InteractionSession, PersistenceError> {
        let mut tables = self.lock()?;
        if let Some(existing) = tables.sessions.get(&upstream.session_ref) {
            return Ok(existing.clone());
        }
        let id = next_id(tables.sessions.len()).map(InteractionSessionId::new)?;
        let session = InteractionSession {
            id,
            session_ref: upstream.session_ref.clone(),
            patient_hash: upstream.patient_hash.clone(),
            clinician_id: upstream.clinician_id.clone(),
            created_at_ms,
        };
        tables.sessions.insert(upstream.session_ref.clone(), session.clone());
        Ok(session)
    }

    fn append_log(&self, entry: &GovernanceLogEntry) -> Result<GovernanceLogId, PersistenceError> {
        let mut tables = self.lock()?;
        ensure_session(&tables, entry.session_id)?;
        let id = next_id(tables.logs.len()).map(GovernanceLogId::new)?;
        tables.logs.push(GovernanceLogRecord {
            id,
            entry: entry.clone(),
        });
        Ok(id)
    }

    fn append_event(
        &self,
        entry: &GovernanceEventEntry,
    ) -> Result<GovernanceEventId, PersistenceError> {
        let mut tables = self.lock()?;
        ensure_session(&tables, entry.session_id)?;
        if !tables.logs.iter().any(|log| log.id == entry.log_id) {
            return Err(PersistenceError::Invalid(format!(
                "governance log {} does not exist",
                entry.log_id
            )));
        }
        let id = next_id(tables.events.len()).map(GovernanceEventId::new)?;
        tables.events.push(GovernanceEventRecord {
            id,
            entry: entry.clone(),
        });
        Ok(id)
    }

    fn list_logs(
        &self,
        session_ref: &SessionRef,
    ) -> Result<Vec<GovernanceLogRecord>, PersistenceError> {
        let tables = self.lock()?;
        let Some(session) = tables.sessions.get(session_ref) else {
            return Ok(Vec::new());
        };
        Ok(tables.logs.iter().filter(|log| log.entry.session_id == session.id).cloned().collect())
    }

    fn list_events(
        &self,
        session_ref: &SessionRef,
    ) -> Result<Vec<GovernanceEventRecord>, PersistenceError> {
        let tables = self.lock()?;
        let Some(session) = tables.sessions.get(session_ref) else {
            return Ok(Vec::new());
        };
        Ok(tables
            .events
            .iter()
            .filter(|event| event.entry.session_id == session.id)
            .cloned()
            .collect())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the identifier following `count` existing rows.
fn next_id(count: usize) -> Result<NonZeroU64, PersistenceError> {
    u64::try_from(count)
        .ok()
        .and_then(|count| count.checked_add(1))
        .and_then(NonZeroU64::new)
        .ok_or_else(|| PersistenceError::Store("identifier space exhausted".to_string()))
}

/// Rejects rows referencing an unknown session.
fn ensure_session(
    tables: &GovernanceTables,
    session_id: InteractionSessionId,
) -> Result<(), PersistenceError> {
    if tables.sessions.values().any(|session| session.id == session_id) {
        Ok(())
    } else {
        Err(PersistenceError::Invalid(format!("interaction session {session_id} does not exist")))
    }
}
