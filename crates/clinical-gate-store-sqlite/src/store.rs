// crates/clinical-gate-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Governance Store
// Description: Durable GovernanceStore backed by SQLite WAL.
// Purpose: Persist the audit governance trail across restarts.
// Dependencies: clinical-gate-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`GovernanceStore`] using `SQLite`. Three
//! tables hold interaction sessions (unique per upstream reference),
//! governance logs, and governance events. Category sets are stored as JSON
//! arrays. Rows are decoded fail closed: an unknown risk level or a zero
//! identifier surfaces as [`SqliteStoreError::Corrupt`].
//! Security posture: database contents are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

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
use clinical_gate_core::InteractionSessionId;
use clinical_gate_core::PatientHash;
use clinical_gate_core::PersistenceError;
use clinical_gate_core::RiskLevel;
use clinical_gate_core::SessionRef;
use clinical_gate_core::UpstreamSession;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum serialized verdict size accepted by the store.
pub const MAX_VERDICT_BYTES: usize = 256 * 1024;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` governance store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Builds a configuration with defaults for the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding verdict payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored row could not be decoded.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data or configuration.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for PersistenceError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Unavailable(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Invalid(format!("corrupt row: {message}")),
            SqliteStoreError::VersionMismatch(message) => {
                Self::Unavailable(format!("schema version mismatch: {message}"))
            }
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

/// Maps an engine error into a store error.
#[allow(clippy::needless_pass_by_value, reason = "Used as a map_err function pointer.")]
fn db_error(err: rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed governance store with WAL support.
///
/// # Invariants
/// - `SQLite` connection access is serialized through a mutex.
/// - `session_ref` is unique in `interaction_sessions`.
#[derive(Clone)]
pub struct SqliteGovernanceStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared connection.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteGovernanceStore {
    /// Opens an `SQLite`-backed governance store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Verifies the store can execute a simple SQL statement.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] if the mutex is poisoned or the query fails.
    pub fn check_connection(&self) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard.query_row("SELECT 1", [], |_| Ok(())).map_err(db_error)
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite connection mutex poisoned".to_string()))
    }

    /// Looks up a session by reference.
    fn select_session(
        connection: &Connection,
        session_ref: &SessionRef,
    ) -> Result<Option<InteractionSession>, SqliteStoreError> {
        let row = connection
            .query_row(
                "SELECT id, session_ref, patient_hash, clinician_id, created_at_ms
                 FROM interaction_sessions WHERE session_ref = ?1",
                params![session_ref.as_str()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )
            .optional()
            .map_err(db_error)?;
        let Some((id, reference, patient_hash, clinician_id, created_at_ms)) = row else {
            return Ok(None);
        };
        Ok(Some(InteractionSession {
            id: decode_id(id).map(InteractionSessionId::new)?,
            session_ref: SessionRef::new(reference),
            patient_hash: PatientHash::from_digest(&patient_hash).ok_or_else(|| {
                SqliteStoreError::Corrupt("patient_hash is not a sha-256 digest".to_string())
            })?,
            clinician_id,
            created_at_ms: decode_u64(created_at_ms, "created_at_ms")?,
        }))
    }

    /// Lists log rows for a session reference.
    fn select_logs(
        &self,
        session_ref: &SessionRef,
    ) -> Result<Vec<GovernanceLogRecord>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare(
                "SELECT l.id, l.session_id, l.recorded_at_ms, l.safety_score, l.risk_level,
                        l.categories_json, l.model_id, l.latency_ms, l.anonymized, l.verdict_json
                 FROM governance_logs l
                 JOIN interaction_sessions s ON s.id = l.session_id
                 WHERE s.session_ref = ?1
                 ORDER BY l.id ASC",
            )
            .map_err(db_error)?;
        let rows = statement
            .query_map(params![session_ref.as_str()], RawLogRow::from_row)
            .map_err(db_error)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(db_error)?.decode()?);
        }
        Ok(records)
    }

    /// Lists event rows for a session reference.
    fn select_events(
        &self,
        session_ref: &SessionRef,
    ) -> Result<Vec<GovernanceEventRecord>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare(
                "SELECT e.id, e.session_id, e.log_id, e.recorded_at_ms, e.kind,
                        e.categories_json, e.message
                 FROM governance_events e
                 JOIN interaction_sessions s ON s.id = e.session_id
                 WHERE s.session_ref = ?1
                 ORDER BY e.id ASC",
            )
            .map_err(db_error)?;
        let rows = statement
            .query_map(params![session_ref.as_str()], RawEventRow::from_row)
            .map_err(db_error)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(db_error)?.decode()?);
        }
        Ok(records)
    }
}

impl GovernanceStore for SqliteGovernanceStore {
    fn find_session(
        &self,
        session_ref: &SessionRef,
    ) -> Result<Option<InteractionSession>, PersistenceError> {
        let guard = self.lock()?;
        Ok(Self::select_session(&guard, session_ref)?)
    }

    fn create_session(
        &self,
        upstream: &UpstreamSession,
        created_at_ms: u64,
    ) -> Result<InteractionSession, PersistenceError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(db_error)?;
        tx.execute(
            "INSERT OR IGNORE INTO interaction_sessions
                 (session_ref, patient_hash, clinician_id, created_at_ms)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                upstream.session_ref.as_str(),
                upstream.patient_hash.as_str(),
                upstream.clinician_id,
                encode_u64(created_at_ms, "created_at_ms")?,
            ],
        )
        .map_err(db_error)?;
        let session = Self::select_session(&tx, &upstream.session_ref)?.ok_or_else(|| {
            SqliteStoreError::Corrupt("session missing after insert".to_string())
        })?;
        tx.commit().map_err(db_error)?;
        Ok(session)
    }

    fn append_log(&self, entry: &GovernanceLogEntry) -> Result<GovernanceLogId, PersistenceError> {
        if entry.verdict_json.len() > MAX_VERDICT_BYTES {
            return Err(SqliteStoreError::Invalid(format!(
                "verdict_json exceeds size limit: {} bytes (max {MAX_VERDICT_BYTES})",
                entry.verdict_json.len()
            ))
            .into());
        }
        let categories = encode_json(&entry.categories)?;
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO governance_logs
                     (session_id, recorded_at_ms, safety_score, risk_level, categories_json,
                      model_id, latency_ms, anonymized, verdict_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    encode_u64(entry.session_id.get(), "session_id")?,
                    encode_u64(entry.recorded_at_ms, "recorded_at_ms")?,
                    i64::from(entry.safety_score),
                    entry.risk_level.as_str(),
                    categories,
                    entry.model_id,
                    encode_u64(entry.latency_ms, "latency_ms")?,
                    entry.anonymized,
                    entry.verdict_json,
                ],
            )
            .map_err(db_error)?;
        Ok(decode_id(guard.last_insert_rowid()).map(GovernanceLogId::new)?)
    }

    fn append_event(
        &self,
        entry: &GovernanceEventEntry,
    ) -> Result<GovernanceEventId, PersistenceError> {
        let categories = encode_json(&entry.categories)?;
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO governance_events
                     (session_id, log_id, recorded_at_ms, kind, categories_json, message)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    encode_u64(entry.session_id.get(), "session_id")?,
                    encode_u64(entry.log_id.get(), "log_id")?,
                    encode_u64(entry.recorded_at_ms, "recorded_at_ms")?,
                    entry.kind.as_str(),
                    categories,
                    entry.message,
                ],
            )
            .map_err(db_error)?;
        Ok(decode_id(guard.last_insert_rowid()).map(GovernanceEventId::new)?)
    }

    fn list_logs(
        &self,
        session_ref: &SessionRef,
    ) -> Result<Vec<GovernanceLogRecord>, PersistenceError> {
        Ok(self.select_logs(session_ref)?)
    }

    fn list_events(
        &self,
        session_ref: &SessionRef,
    ) -> Result<Vec<GovernanceEventRecord>, PersistenceError> {
        Ok(self.select_events(session_ref)?)
    }
}

// ============================================================================
// SECTION: Row Decoding
// ============================================================================

/// Undecoded governance log row.
struct RawLogRow {
    /// Row id.
    id: i64,
    /// Owning session id.
    session_id: i64,
    /// Record time.
    recorded_at_ms: i64,
    /// Safety score.
    safety_score: i64,
    /// Risk level label.
    risk_level: String,
    /// Categories as a JSON array.
    categories_json: String,
    /// Model identifier.
    model_id: Option<String>,
    /// Gateway latency.
    latency_ms: i64,
    /// Anonymization flag.
    anonymized: bool,
    /// Serialized verdict.
    verdict_json: String,
}

impl RawLogRow {
    /// Reads the raw columns.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            session_id: row.get(1)?,
            recorded_at_ms: row.get(2)?,
            safety_score: row.get(3)?,
            risk_level: row.get(4)?,
            categories_json: row.get(5)?,
            model_id: row.get(6)?,
            latency_ms: row.get(7)?,
            anonymized: row.get(8)?,
            verdict_json: row.get(9)?,
        })
    }

    /// Decodes the row into a typed record.
    fn decode(self) -> Result<GovernanceLogRecord, SqliteStoreError> {
        Ok(GovernanceLogRecord {
            id: decode_id(self.id).map(GovernanceLogId::new)?,
            entry: GovernanceLogEntry {
                session_id: decode_id(self.session_id).map(InteractionSessionId::new)?,
                recorded_at_ms: decode_u64(self.recorded_at_ms, "recorded_at_ms")?,
                safety_score: u8::try_from(self.safety_score).map_err(|_| {
                    SqliteStoreError::Corrupt(format!("safety_score out of range: {}", self.safety_score))
                })?,
                risk_level: decode_label::<RiskLevel>(&self.risk_level, "risk_level")?,
                categories: decode_json::<Vec<AuditCategory>>(&self.categories_json)?,
                model_id: self.model_id,
                latency_ms: decode_u64(self.latency_ms, "latency_ms")?,
                anonymized: self.anonymized,
                verdict_json: self.verdict_json,
            },
        })
    }
}

/// Undecoded governance event row.
struct RawEventRow {
    /// Row id.
    id: i64,
    /// Owning session id.
    session_id: i64,
    /// Originating log id.
    log_id: i64,
    /// Record time.
    recorded_at_ms: i64,
    /// Event kind label.
    kind: String,
    /// Categories as a JSON array.
    categories_json: String,
    /// Intervention message.
    message: String,
}

impl RawEventRow {
    /// Reads the raw columns.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            session_id: row.get(1)?,
            log_id: row.get(2)?,
            recorded_at_ms: row.get(3)?,
            kind: row.get(4)?,
            categories_json: row.get(5)?,
            message: row.get(6)?,
        })
    }

    /// Decodes the row into a typed record.
    fn decode(self) -> Result<GovernanceEventRecord, SqliteStoreError> {
        Ok(GovernanceEventRecord {
            id: decode_id(self.id).map(GovernanceEventId::new)?,
            entry: GovernanceEventEntry {
                session_id: decode_id(self.session_id).map(InteractionSessionId::new)?,
                log_id: decode_id(self.log_id).map(GovernanceLogId::new)?,
                recorded_at_ms: decode_u64(self.recorded_at_ms, "recorded_at_ms")?,
                kind: decode_label::<GovernanceEventKind>(&self.kind, "kind")?,
                categories: decode_json::<Vec<AuditCategory>>(&self.categories_json)?,
                message: self.message,
            },
        })
    }
}

/// Converts a stored rowid into a non-zero identifier.
fn decode_id(raw: i64) -> Result<std::num::NonZeroU64, SqliteStoreError> {
    u64::try_from(raw)
        .ok()
        .and_then(std::num::NonZeroU64::new)
        .ok_or_else(|| SqliteStoreError::Corrupt(format!("invalid row id: {raw}")))
}

/// Converts a stored integer into `u64`.
fn decode_u64(raw: i64, column: &str) -> Result<u64, SqliteStoreError> {
    u64::try_from(raw)
        .map_err(|_| SqliteStoreError::Corrupt(format!("{column} is negative: {raw}")))
}

/// Converts a `u64` into an `SQLite` integer.
fn encode_u64(value: u64, column: &str) -> Result<i64, SqliteStoreError> {
    i64::try_from(value)
        .map_err(|_| SqliteStoreError::Invalid(format!("{column} out of range: {value}")))
}

/// Decodes a serde string label (e.g. `CRITICAL`).
fn decode_label<T: DeserializeOwned>(raw: &str, column: &str) -> Result<T, SqliteStoreError> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| SqliteStoreError::Corrupt(format!("unknown {column}: {raw}")))
}

/// Decodes a JSON column.
fn decode_json<T: DeserializeOwned>(raw: &str) -> Result<T, SqliteStoreError> {
    serde_json::from_str(raw).map_err(|err| SqliteStoreError::Corrupt(err.to_string()))
}

/// Encodes a JSON column.
fn encode_json<T: Serialize>(value: &T) -> Result<String, SqliteStoreError> {
    serde_json::to_string(value).map_err(|err| SqliteStoreError::Invalid(err.to_string()))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection.execute_batch("PRAGMA foreign_keys = ON;").map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_error)?;
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms)).map_err(db_error)?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(db_error)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_error)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_error)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_error)?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS interaction_sessions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    session_ref TEXT NOT NULL UNIQUE,
                    patient_hash TEXT NOT NULL,
                    clinician_id TEXT,
                    created_at_ms INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS governance_logs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    session_id INTEGER NOT NULL
                        REFERENCES interaction_sessions(id) ON DELETE CASCADE,
                    recorded_at_ms INTEGER NOT NULL,
                    safety_score INTEGER NOT NULL,
                    risk_level TEXT NOT NULL,
                    categories_json TEXT NOT NULL,
                    model_id TEXT,
                    latency_ms INTEGER NOT NULL,
                    anonymized INTEGER NOT NULL,
                    verdict_json TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_governance_logs_session
                    ON governance_logs (session_id, id);
                CREATE TABLE IF NOT EXISTS governance_events (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    session_id INTEGER NOT NULL
                        REFERENCES interaction_sessions(id) ON DELETE CASCADE,
                    log_id INTEGER NOT NULL
                        REFERENCES governance_logs(id) ON DELETE CASCADE,
                    recorded_at_ms INTEGER NOT NULL,
                    kind TEXT NOT NULL,
                    categories_json TEXT NOT NULL,
                    message TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_governance_events_session
                    ON governance_events (session_id, id);",
            )
            .map_err(db_error)?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(db_error)?;
    Ok(())
}
