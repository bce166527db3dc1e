// crates/clinical-gate-store-sqlite/src/lib.rs
// ============================================================================
// Module: Clinical Gate SQLite Store Library
// Description: Durable governance persistence on SQLite.
// Purpose: Provide the production GovernanceStore implementation.
// Dependencies: clinical-gate-core, rusqlite
// ============================================================================

//! ## Overview
//! Persists interaction sessions, governance logs, and governance events in a
//! single `SQLite` database with a versioned schema.
//! Invariants:
//! - Session creation is idempotent per upstream session reference.
//! - Log and event tables are append-only.
//!
//! Security posture: database contents are untrusted on load and decoded
//! fail closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteGovernanceStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
