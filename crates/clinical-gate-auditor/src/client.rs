// crates/clinical-gate-auditor/src/client.rs
// ============================================================================
// Module: Model Client Selection
// Description: Chooses between the remote gateway and the local simulator.
// Purpose: Build the model client from settings and an environment lookup.
// Dependencies: tracing
// ============================================================================

//! ## Overview
//! The remote gateway is selected only when `use_real_model` is set **and**
//! the credential variable named by the settings holds a non-empty value.
//! Every other combination yields the deterministic [`SimulatedModel`].
//! Environment access goes through a caller-supplied lookup so tests never
//! touch process state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing::warn;

use crate::breaker::CircuitBreakerConfig;
use crate::gateway::DEFAULT_MAX_OUTPUT_TOKENS;
use crate::gateway::DEFAULT_REQUEST_TIMEOUT;
use crate::gateway::DEFAULT_TEMPERATURE;
use crate::gateway::GatewayConfig;
use crate::gateway::LlmGateway;
use crate::gateway::ModelClient;
use crate::gateway::TransportError;
use crate::http::HttpCompletionTransport;
use crate::http::HttpTransportConfig;
use crate::simulator::SimulatedModel;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Default env var holding the provider credential.
pub const DEFAULT_API_KEY_ENV: &str = "CLINICAL_GATE_LLM_API_KEY";
/// Default chat-completions endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
/// Default remote model identifier.
pub const DEFAULT_MODEL_ID: &str = "gpt-4o-mini";

/// Settings consumed by [`build_model_client`].
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    /// Requests the remote model.
    pub use_real_model: bool,
    /// Chat-completions endpoint.
    pub endpoint: String,
    /// Remote model identifier.
    pub model_id: String,
    /// Name of the env var holding the credential.
    pub api_key_env: String,
    /// Timeout raced against each remote call.
    pub request_timeout: Duration,
    /// Completion token cap.
    pub max_output_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Breaker configuration.
    pub breaker: CircuitBreakerConfig,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            use_real_model: false,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            breaker: CircuitBreakerConfig::default(),
        }
    }
}

// ============================================================================
// SECTION: Factory
// ============================================================================

/// Builds the model client selected by `settings` and the environment.
///
/// # Errors
///
/// Returns [`TransportError::Config`] when the remote model is selected but
/// the HTTP transport cannot be built.
pub fn build_model_client<F>(
    settings: &ModelSettings,
    env: F,
) -> Result<Arc<dyn ModelClient>, TransportError>
where
    F: Fn(&str) -> Option<String>,
{
    if !settings.use_real_model {
        info!("using local simulated model");
        return Ok(Arc::new(SimulatedModel::new()));
    }
    let Some(api_key) = env(&settings.api_key_env).filter(|value| !value.trim().is_empty()) else {
        warn!(
            api_key_env = %settings.api_key_env,
            "real model requested but credential is missing; using local simulated model"
        );
        return Ok(Arc::new(SimulatedModel::new()));
    };
    let transport = HttpCompletionTransport::new(&HttpTransportConfig {
        endpoint: settings.endpoint.clone(),
        api_key,
        timeout: settings.request_timeout,
        user_agent: format!("clinical-gate/{}", env!("CARGO_PKG_VERSION")),
    })?;
    let gateway = LlmGateway::new(
        GatewayConfig {
            model_id: settings.model_id.clone(),
            request_timeout: settings.request_timeout,
            max_output_tokens: settings.max_output_tokens,
            temperature: settings.temperature,
            breaker: settings.breaker,
        },
        Arc::new(transport),
    );
    info!(model_id = %settings.model_id, "using remote model gateway");
    Ok(Arc::new(gateway))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
