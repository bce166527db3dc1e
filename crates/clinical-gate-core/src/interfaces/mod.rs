// crates/clinical-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Clinical Gate Interfaces
// Description: Backend-agnostic persistence and session lookup contracts.
// Purpose: Define the collaborator surfaces consumed by the integrity auditor.
// Dependencies: crate::model, thiserror
// ============================================================================

//! ## Overview
//! The auditor never owns storage. It talks to a [`GovernanceStore`] for the
//! append-only governance trail and to a [`SessionDirectory`] to resolve an
//! upstream session reference when no interaction session exists yet.
//! Implementations are synchronous; async callers move them onto a blocking
//! thread.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::GovernanceEventEntry;
use crate::model::GovernanceEventId;
use crate::model::GovernanceEventRecord;
use crate::model::GovernanceLogEntry;
use crate::model::GovernanceLogId;
use crate::model::GovernanceLogRecord;
use crate::model::InteractionSession;
use crate::model::SessionRef;
use crate::model::UpstreamSession;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Persistence collaborator errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Messages never embed transcript or note text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// Backend reported an error.
    #[error("governance store error: {0}")]
    Store(String),
    /// Backend is unavailable.
    #[error("governance store unavailable: {0}")]
    Unavailable(String),
    /// Stored or supplied data is invalid.
    #[error("governance store invalid data: {0}")]
    Invalid(String),
    /// Upstream session lookup failed.
    #[error("session directory error: {0}")]
    Directory(String),
}

// ============================================================================
// SECTION: Governance Store
// ============================================================================

/// Append-only governance persistence.
pub trait GovernanceStore: Send + Sync {
    /// Looks up the interaction session for an upstream reference.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the lookup fails.
    fn find_session(
        &self,
        session_ref: &SessionRef,
    ) -> Result<Option<InteractionSession>, PersistenceError>;

    /// Creates the interaction session for an upstream session.
    ///
    /// Creation is idempotent: an existing record for the same reference is
    /// returned unchanged. `created_at_ms` is supplied by the host; stores
    /// never read the wall clock.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the record cannot be created.
    fn create_session(
        &self,
        upstream: &UpstreamSession,
        created_at_ms: u64,
    ) -> Result<InteractionSession, PersistenceError>;

    /// Appends a governance log row.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the row cannot be written.
    fn append_log(&self, entry: &GovernanceLogEntry) -> Result<GovernanceLogId, PersistenceError>;

    /// Appends a governance event row.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the row cannot be written.
    fn append_event(
        &self,
        entry: &GovernanceEventEntry,
    ) -> Result<GovernanceEventId, PersistenceError>;

    /// Lists governance log rows for a session, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the rows cannot be read.
    fn list_logs(
        &self,
        session_ref: &SessionRef,
    ) -> Result<Vec<GovernanceLogRecord>, PersistenceError>;

    /// Lists governance event rows for a session, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the rows cannot be read.
    fn list_events(
        &self,
        session_ref: &SessionRef,
    ) -> Result<Vec<GovernanceEventRecord>, PersistenceError>;
}

// ============================================================================
// SECTION: Session Directory
// ============================================================================

/// Resolves upstream session references.
pub trait SessionDirectory: Send + Sync {
    /// Resolves a session reference, returning `None` when it is unknown upstream.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Directory`] when the lookup itself fails.
    fn resolve(&self, session_ref: &SessionRef)
    -> Result<Option<UpstreamSession>, PersistenceError>;
}

/// Session directory backed by a fixed map.
#[derive(Debug, Clone, Default)]
pub struct StaticSessionDirectory {
    /// Known upstream sessions keyed by reference.
    sessions: BTreeMap<SessionRef, UpstreamSession>,
}

impl StaticSessionDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an upstream session.
    #[must_use]
    pub fn with_session(mut self, session: UpstreamSession) -> Self {
        self.sessions.insert(session.session_ref.clone(), session);
        self
    }
}

impl SessionDirectory for StaticSessionDirectory {
    fn resolve(
        &self,
        session_ref: &SessionRef,
    ) -> Result<Option<UpstreamSession>, PersistenceError> {
        Ok(self.sessions.get(session_ref).cloned())
    }
}
