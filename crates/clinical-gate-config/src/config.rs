// crates/clinical-gate-config/src/config.rs
// ============================================================================
// Module: Clinical Gate Configuration
// Description: Configuration loading and validation for the clinical gate.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: clinical-gate-core, clinical-gate-auditor, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Unknown keys are rejected and every numeric knob is bounded. Environment
//! reads go through an injectable lookup so callers (and tests) decide where
//! values come from.
//!
//! Invariants:
//! - A config returned by [`ClinicalGateConfig::load`] has passed
//!   [`ClinicalGateConfig::validate`].
//! - Credentials never appear in the file; only the env var name does.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use clinical_gate_auditor::CircuitBreakerConfig;
use clinical_gate_auditor::ModelSettings;
use clinical_gate_auditor::breaker::DEFAULT_FAILURE_THRESHOLD;
use clinical_gate_auditor::breaker::DEFAULT_RESET_INTERVAL;
use clinical_gate_auditor::client::DEFAULT_API_KEY_ENV;
use clinical_gate_auditor::client::DEFAULT_ENDPOINT;
use clinical_gate_auditor::client::DEFAULT_MODEL_ID;
use clinical_gate_auditor::gateway::DEFAULT_MAX_OUTPUT_TOKENS;
use clinical_gate_auditor::gateway::DEFAULT_REQUEST_TIMEOUT;
use clinical_gate_auditor::gateway::DEFAULT_TEMPERATURE;
use clinical_gate_core::DEFAULT_LATENCY_BUDGET;
use clinical_gate_core::DEFAULT_LETHAL_MARKERS;
use clinical_gate_core::GatePolicy;
use clinical_gate_store_sqlite::SqliteStoreConfig;
use clinical_gate_store_sqlite::SqliteStoreMode;
use clinical_gate_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "clinical-gate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "CLINICAL_GATE_CONFIG";
/// Environment variable overriding `auditor.use_real_model`.
pub const USE_REAL_LLM_ENV_VAR: &str = "CLINICAL_GATE_USE_REAL_LLM";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Minimum model request timeout in milliseconds.
pub(crate) const MIN_REQUEST_TIMEOUT_MS: u64 = 100;
/// Maximum model request timeout in milliseconds.
pub(crate) const MAX_REQUEST_TIMEOUT_MS: u64 = 120_000;
/// Minimum breaker failure threshold.
pub(crate) const MIN_FAILURE_THRESHOLD: u32 = 1;
/// Maximum breaker failure threshold.
pub(crate) const MAX_FAILURE_THRESHOLD: u32 = 100;
/// Minimum breaker reset interval in milliseconds.
pub(crate) const MIN_RESET_INTERVAL_MS: u64 = 1_000;
/// Maximum breaker reset interval in milliseconds.
pub(crate) const MAX_RESET_INTERVAL_MS: u64 = 3_600_000;
/// Maximum completion token cap.
pub(crate) const MAX_OUTPUT_TOKENS: u32 = 32_768;
/// Maximum sampling temperature.
pub(crate) const MAX_TEMPERATURE: f32 = 2.0;
/// Maximum gate latency budget in milliseconds.
pub(crate) const MAX_LATENCY_BUDGET_MS: u64 = 60_000;
/// Maximum number of lethal markers.
pub(crate) const MAX_LETHAL_MARKERS: usize = 64;
/// Maximum length of a single lethal marker.
pub(crate) const MAX_LETHAL_MARKER_LENGTH: usize = 128;
/// Maximum identifier length (model ids, env var names).
pub(crate) const MAX_IDENTIFIER_LENGTH: usize = 256;
/// Maximum endpoint URL length.
pub(crate) const MAX_ENDPOINT_LENGTH: usize = 2048;
/// Maximum `SQLite` busy timeout in milliseconds.
pub(crate) const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;
/// Default `SQLite` busy timeout in milliseconds.
pub(crate) const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of the logging filter directive.
pub(crate) const MAX_LOG_FILTER_LENGTH: usize = 1024;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Clinical gate configuration.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClinicalGateConfig {
    /// Rule gate configuration.
    #[serde(default)]
    pub gate: GateConfig,
    /// Integrity auditor configuration.
    #[serde(default)]
    pub auditor: AuditorConfig,
    /// Governance store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Path the config was loaded from, when any (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl ClinicalGateConfig {
    /// Loads configuration using the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| env::var(key).ok())
    }

    /// Loads configuration with an explicit environment lookup.
    ///
    /// Resolution order: explicit path, then [`CONFIG_ENV_VAR`], then
    /// `./clinical-gate.toml`. Only the implicit default file may be absent;
    /// defaults apply in that case.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load_with_env<F>(path: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (resolved, implicit) = resolve_path(path, &env)?;
        validate_path(&resolved)?;
        let mut config = if implicit && !resolved.exists() {
            Self::default()
        } else {
            let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
            if bytes.len() > MAX_CONFIG_FILE_SIZE {
                return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
            }
            let content = std::str::from_utf8(&bytes)
                .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
            let mut config: Self =
                toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
            config.source_path = Some(resolved);
            config
        };
        config.apply_env_overrides(&env)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if content.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides (currently the real-model flag).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when an override value is not a
    /// recognised boolean.
    pub fn apply_env_overrides<F>(&mut self, env: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = env(USE_REAL_LLM_ENV_VAR) {
            self.auditor.use_real_model = parse_env_bool(USE_REAL_LLM_ENV_VAR, &raw)?;
        }
        Ok(())
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gate.validate()?;
        self.auditor.validate()?;
        self.store.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Rule gate configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateConfig {
    /// Evaluation time above which a warning is logged.
    #[serde(default = "default_latency_budget_ms")]
    pub latency_budget_ms: u64,
    /// Case-insensitive substrings marking a red signal as lethal.
    #[serde(default = "default_lethal_markers")]
    pub lethal_markers: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            latency_budget_ms: default_latency_budget_ms(),
            lethal_markers: default_lethal_markers(),
        }
    }
}

impl GateConfig {
    /// Validates gate configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.latency_budget_ms == 0 || self.latency_budget_ms > MAX_LATENCY_BUDGET_MS {
            return Err(ConfigError::Invalid(format!(
                "gate.latency_budget_ms must be between 1 and {MAX_LATENCY_BUDGET_MS}"
            )));
        }
        if self.lethal_markers.len() > MAX_LETHAL_MARKERS {
            return Err(ConfigError::Invalid(format!(
                "gate.lethal_markers exceeds {MAX_LETHAL_MARKERS} entries"
            )));
        }
        for marker in &self.lethal_markers {
            let trimmed = marker.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::Invalid(
                    "gate.lethal_markers entries must be non-empty".to_string(),
                ));
            }
            if trimmed.len() > MAX_LETHAL_MARKER_LENGTH {
                return Err(ConfigError::Invalid(
                    "gate.lethal_markers entry exceeds max length".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Builds the runtime gate policy.
    #[must_use]
    pub fn policy(&self) -> GatePolicy {
        GatePolicy::new(&self.lethal_markers, Duration::from_millis(self.latency_budget_ms))
    }
}

/// Integrity auditor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditorConfig {
    /// Requests the remote model (still requires a credential).
    #[serde(default)]
    pub use_real_model: bool,
    /// Chat-completions endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Remote model identifier.
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Name of the env var holding the credential.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Timeout raced against each remote call.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Consecutive failures that open the breaker.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Time after the last failure before a probe call is allowed.
    #[serde(default = "default_reset_interval_ms")]
    pub reset_interval_ms: u64,
    /// Completion token cap.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Permits a plain `http://` endpoint (local development only).
    #[serde(default)]
    pub allow_http: bool,
}

impl Default for AuditorConfig {
    fn default() -> Self {
        Self {
            use_real_model: false,
            endpoint: default_endpoint(),
            model_id: default_model_id(),
            api_key_env: default_api_key_env(),
            request_timeout_ms: default_request_timeout_ms(),
            failure_threshold: default_failure_threshold(),
            reset_interval_ms: default_reset_interval_ms(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            allow_http: false,
        }
    }
}

impl AuditorConfig {
    /// Validates auditor configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_endpoint(&self.endpoint, self.allow_http)?;
        validate_identifier("auditor.model_id", &self.model_id)?;
        validate_env_var_name("auditor.api_key_env", &self.api_key_env)?;
        if !(MIN_REQUEST_TIMEOUT_MS ..= MAX_REQUEST_TIMEOUT_MS).contains(&self.request_timeout_ms)
        {
            return Err(ConfigError::Invalid(format!(
                "auditor.request_timeout_ms must be between {MIN_REQUEST_TIMEOUT_MS} and \
                 {MAX_REQUEST_TIMEOUT_MS}"
            )));
        }
        if !(MIN_FAILURE_THRESHOLD ..= MAX_FAILURE_THRESHOLD).contains(&self.failure_threshold) {
            return Err(ConfigError::Invalid(format!(
                "auditor.failure_threshold must be between {MIN_FAILURE_THRESHOLD} and \
                 {MAX_FAILURE_THRESHOLD}"
            )));
        }
        if !(MIN_RESET_INTERVAL_MS ..= MAX_RESET_INTERVAL_MS).contains(&self.reset_interval_ms) {
            return Err(ConfigError::Invalid(format!(
                "auditor.reset_interval_ms must be between {MIN_RESET_INTERVAL_MS} and \
                 {MAX_RESET_INTERVAL_MS}"
            )));
        }
        if self.max_output_tokens == 0 || self.max_output_tokens > MAX_OUTPUT_TOKENS {
            return Err(ConfigError::Invalid(format!(
                "auditor.max_output_tokens must be between 1 and {MAX_OUTPUT_TOKENS}"
            )));
        }
        if !self.temperature.is_finite() || !(0.0 ..= MAX_TEMPERATURE).contains(&self.temperature)
        {
            return Err(ConfigError::Invalid(format!(
                "auditor.temperature must be between 0 and {MAX_TEMPERATURE}"
            )));
        }
        Ok(())
    }

    /// Builds the model client settings.
    #[must_use]
    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings {
            use_real_model: self.use_real_model,
            endpoint: self.endpoint.clone(),
            model_id: self.model_id.clone(),
            api_key_env: self.api_key_env.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            max_output_tokens: self.max_output_tokens,
            temperature: self.temperature,
            breaker: CircuitBreakerConfig {
                failure_threshold: self.failure_threshold,
                reset_interval: Duration::from_millis(self.reset_interval_ms),
            },
        }
    }
}

/// Governance store configuration.
///
/// # Invariants
/// - Without a `path`, audits run without durable persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// `SQLite` database path.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("store.path", &path.to_string_lossy())?;
        }
        if self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "store.busy_timeout_ms must be at most {MAX_BUSY_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }

    /// Returns the `SQLite` store configuration when a path is configured.
    #[must_use]
    pub fn sqlite_config(&self) -> Option<SqliteStoreConfig> {
        self.path.as_ref().map(|path| SqliteStoreConfig {
            path: path.clone(),
            busy_timeout_ms: self.busy_timeout_ms,
            journal_mode: self.journal_mode,
            sync_mode: self.sync_mode,
        })
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Validates logging configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let trimmed = self.level.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::Invalid("logging.level must be non-empty".to_string()));
        }
        if trimmed.len() > MAX_LOG_FILTER_LENGTH {
            return Err(ConfigError::Invalid("logging.level exceeds max length".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default gate latency budget.
fn default_latency_budget_ms() -> u64 {
    u64::try_from(DEFAULT_LATENCY_BUDGET.as_millis()).unwrap_or(u64::MAX)
}

/// Default lethal markers.
fn default_lethal_markers() -> Vec<String> {
    DEFAULT_LETHAL_MARKERS.iter().map(ToString::to_string).collect()
}

/// Default model endpoint.
fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

/// Default model identifier.
fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

/// Default credential env var name.
fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

/// Default request timeout.
fn default_request_timeout_ms() -> u64 {
    u64::try_from(DEFAULT_REQUEST_TIMEOUT.as_millis()).unwrap_or(u64::MAX)
}

/// Default breaker threshold.
const fn default_failure_threshold() -> u32 {
    DEFAULT_FAILURE_THRESHOLD
}

/// Default breaker reset interval.
fn default_reset_interval_ms() -> u64 {
    u64::try_from(DEFAULT_RESET_INTERVAL.as_millis()).unwrap_or(u64::MAX)
}

/// Default completion token cap.
const fn default_max_output_tokens() -> u32 {
    DEFAULT_MAX_OUTPUT_TOKENS
}

/// Default sampling temperature.
const fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

/// Default `SQLite` busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Default log filter.
fn default_log_level() -> String {
    "info".to_string()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path; the flag is true for the implicit default.
fn resolve_path<F>(path: Option<&Path>, env: &F) -> Result<(PathBuf, bool), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = path {
        return Ok((path.to_path_buf(), false));
    }
    if let Some(env_path) = env(CONFIG_ENV_VAR).filter(|value| !value.trim().is_empty()) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), false));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), true))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates the model endpoint URL scheme.
fn validate_endpoint(endpoint: &str, allow_http: bool) -> Result<(), ConfigError> {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid("auditor.endpoint must be non-empty".to_string()));
    }
    if trimmed.len() > MAX_ENDPOINT_LENGTH {
        return Err(ConfigError::Invalid("auditor.endpoint exceeds max length".to_string()));
    }
    let rest = if let Some(rest) = trimmed.strip_prefix("https://") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        if !allow_http {
            return Err(ConfigError::Invalid(
                "auditor.endpoint must use https unless auditor.allow_http = true".to_string(),
            ));
        }
        rest
    } else {
        return Err(ConfigError::Invalid(
            "auditor.endpoint must be an http(s) url".to_string(),
        ));
    };
    if rest.is_empty() || rest.starts_with('/') {
        return Err(ConfigError::Invalid("auditor.endpoint is missing a host".to_string()));
    }
    Ok(())
}

/// Validates a non-empty bounded identifier.
fn validate_identifier(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if value.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    Ok(())
}

/// Validates an environment variable name (`[A-Za-z_][A-Za-z0-9_]*`).
fn validate_env_var_name(field: &str, value: &str) -> Result<(), ConfigError> {
    validate_identifier(field, value)?;
    let mut chars = value.chars();
    let valid_head = chars.next().is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_');
    if !valid_head || !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err(ConfigError::Invalid(format!("{field} is not a valid env var name")));
    }
    Ok(())
}

/// Parses a boolean environment override.
fn parse_env_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid(format!("{key} must be true or false"))),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
