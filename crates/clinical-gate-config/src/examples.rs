// crates/clinical-gate-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and the CLI.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for `clinical-gate.toml`. The output is deterministic
//! and must always pass validation.

/// Returns a canonical example `clinical-gate.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[gate]
latency_budget_ms = 10
lethal_markers = ["letal", "lethal", "fatal", "risco de morte", "life-threatening"]

[auditor]
use_real_model = false
endpoint = "https://api.openai.com/v1/chat/completions"
model_id = "gpt-4o-mini"
api_key_env = "CLINICAL_GATE_LLM_API_KEY"
request_timeout_ms = 20000
failure_threshold = 3
reset_interval_ms = 60000
max_output_tokens = 1024
temperature = 0.0
# allow_http = false

[store]
path = "clinical-gate.db"
journal_mode = "wal"
sync_mode = "full"
busy_timeout_ms = 5000

[logging]
level = "info"
format = "text"
"#,
    )
}
