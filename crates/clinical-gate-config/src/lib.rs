// crates/clinical-gate-config/src/lib.rs
// ============================================================================
// Module: Clinical Gate Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for clinical-gate.toml semantics.
// Dependencies: clinical-gate-core, clinical-gate-auditor, serde, toml
// ============================================================================

//! ## Overview
//! `clinical-gate-config` defines the configuration model for the rule gate,
//! the integrity auditor, the governance store, and logging. It provides
//! strict, fail-closed validation and converts validated sections into the
//! runtime types of the other crates.
//!
//! Security posture: config inputs are untrusted. Credentials are never read
//! from the file, only the name of the environment variable that holds them.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
