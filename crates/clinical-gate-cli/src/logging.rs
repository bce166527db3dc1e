// crates/clinical-gate-cli/src/logging.rs
// ============================================================================
// Module: CLI Logging
// Description: Installs the process-wide tracing subscriber.
// Purpose: Route structured logs to stderr so stdout stays machine-readable.
// Dependencies: clinical-gate-config, tracing-subscriber
// ============================================================================

//! ## Overview
//! `RUST_LOG` takes precedence over `logging.level`. Output always goes to
//! stderr; stdout is reserved for command results.

// ============================================================================
// SECTION: Imports
// ============================================================================

use clinical_gate_config::LogFormat;
use clinical_gate_config::LoggingConfig;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Logging setup failures.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Filter directive could not be parsed.
    #[error("invalid log filter `{directive}`: {message}")]
    Filter {
        /// Offending directive.
        directive: String,
        /// Parser message.
        message: String,
    },
    /// A global subscriber was already installed.
    #[error("failed to install log subscriber: {0}")]
    Install(String),
}

// ============================================================================
// SECTION: Setup
// ============================================================================

/// Builds the filter from `RUST_LOG`, falling back to the configured level.
///
/// # Errors
///
/// Returns [`LoggingError::Filter`] when the configured directive is invalid.
pub fn build_filter(
    config: &LoggingConfig,
    rust_log: Option<&str>,
) -> Result<EnvFilter, LoggingError> {
    if let Some(directive) = rust_log.map(str::trim).filter(|value| !value.is_empty())
        && let Ok(filter) = EnvFilter::try_new(directive)
    {
        return Ok(filter);
    }
    EnvFilter::try_new(config.level.trim()).map_err(|err| LoggingError::Filter {
        directive: config.level.clone(),
        message: err.to_string(),
    })
}

/// Installs the global subscriber writing to stderr.
///
/// # Errors
///
/// Returns [`LoggingError`] when the filter is invalid or a subscriber is
/// already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = build_filter(config, rust_log.as_deref())?;
    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
    result.map_err(|err| LoggingError::Install(err.to_string()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
