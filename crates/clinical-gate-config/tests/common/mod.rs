// crates/clinical-gate-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for clinical-gate-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::collections::BTreeMap;

use clinical_gate_config::ClinicalGateConfig;
use clinical_gate_config::ConfigError;

/// Test result type carrying a failure message.
pub type TestResult = Result<(), String>;

/// Parses a TOML string without validation.
pub fn config_from_toml(toml_str: &str) -> Result<ClinicalGateConfig, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Returns a minimal config with all defaults applied.
pub fn minimal_config() -> Result<ClinicalGateConfig, toml::de::Error> {
    config_from_toml("")
}

/// Builds an environment lookup backed by a fixed map.
pub fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
    let map: BTreeMap<String, String> =
        pairs.iter().map(|(key, value)| ((*key).to_string(), (*value).to_string())).collect();
    move |key| map.get(key).cloned()
}

/// Asserts that a result is a config error whose message contains `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}
