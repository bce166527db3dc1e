// crates/clinical-gate-cli/src/lib.rs
// ============================================================================
// Module: Clinical Gate CLI Library
// Description: Shared helpers for the clinical gate command-line interface.
// Purpose: Provide reusable components (logging setup) for the binary and tests.
// Dependencies: clinical-gate-config, tracing-subscriber
// ============================================================================

//! ## Overview
//! This library houses helpers the binary entry point (`src/main.rs`) shares
//! with tests. Security posture: CLI inputs are untrusted and must be
//! validated before they reach the gate or the auditor.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Tracing subscriber installation.
pub mod logging;
