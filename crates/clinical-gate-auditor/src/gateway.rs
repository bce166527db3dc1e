// crates/clinical-gate-auditor/src/gateway.rs
// ============================================================================
// Module: LLM Gateway
// Description: Timeout-raced, schema-checked, breaker-guarded model calls.
// Purpose: Turn one remote completion into trusted verdict JSON or a fail-safe.
// Dependencies: async-trait, clinical-gate-core, serde_json, tokio, tracing
// ============================================================================

//! ## Overview
//! [`LlmGateway`] wraps a [`CompletionTransport`]. Every call consults the
//! [`CircuitBreaker`] first; an open breaker short-circuits without touching
//! the network. Otherwise the transport call races a fixed timeout. Timeouts,
//! transport errors, and schema-invalid output all count as breaker failures.
//! Execution metadata (model id, latency, token counts) is attached to the
//! JSON on every path.
//!
//! [`ModelClient::complete`] never fails: any fault yields the fail-safe
//! verdict JSON. [`LlmGateway::try_complete`] exposes the underlying error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clinical_gate_core::AuditorVerdict;
use clinical_gate_core::ExecutionMetadata;
use serde_json::Value;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;
use tracing::warn;

use crate::breaker::BreakerSnapshot;
use crate::breaker::CircuitBreaker;
use crate::breaker::CircuitBreakerConfig;
use crate::schema::VerdictError;
use crate::schema::decode_verdict_value;
use crate::schema::validate_verdict_text;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default timeout for one remote completion.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
/// Default completion token cap.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1_024;
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Transport-level failures.
///
/// # Invariants
/// - Messages never embed prompt content.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Transport could not be configured.
    #[error("transport configuration error: {0}")]
    Config(String),
    /// Request could not be delivered or the connection failed.
    #[error("transport request failed: {0}")]
    Request(String),
    /// Provider answered with a non-success status.
    #[error("provider returned status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Provider message preview.
        message: String,
    },
    /// Provider response did not match the expected envelope.
    #[error("provider response invalid: {0}")]
    Protocol(String),
    /// Provider response exceeded the size limit.
    #[error("provider response exceeds {limit} bytes")]
    ResponseTooLarge {
        /// Maximum allowed bytes.
        limit: usize,
    },
}

/// Gateway failures. Every variant counts against the breaker except
/// [`GatewayError::CircuitOpen`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Breaker is open; no request was attempted.
    #[error("circuit breaker open")]
    CircuitOpen,
    /// Remote call exceeded the timeout.
    #[error("remote model timed out after {0} ms")]
    Timeout(u64),
    /// Transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Output failed validation.
    #[error(transparent)]
    Verdict(#[from] VerdictError),
}

// ============================================================================
// SECTION: Transport
// ============================================================================

/// One completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier.
    pub model_id: String,
    /// System prompt.
    pub system_prompt: String,
    /// User prompt.
    pub user_prompt: String,
    /// Completion token cap.
    pub max_output_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Completion returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Raw message content.
    pub content: String,
    /// Model identifier reported by the provider.
    pub model: Option<String>,
    /// Prompt tokens consumed.
    pub input_tokens: u64,
    /// Completion tokens produced.
    pub output_tokens: u64,
}

/// Remote completion transport.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Sends one completion request.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the request fails.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, TransportError>;
}

// ============================================================================
// SECTION: Model Client
// ============================================================================

/// Model client consumed by the audit orchestrator.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Returns raw verdict JSON. Never fails; faults produce fail-safe JSON.
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> String;

    /// Returns true when prompts leave the process.
    fn is_remote(&self) -> bool;

    /// Returns the model identifier.
    fn model_id(&self) -> &str;
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// Gateway configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// Model identifier sent to the provider.
    pub model_id: String,
    /// Timeout raced against each call.
    pub request_timeout: Duration,
    /// Completion token cap.
    pub max_output_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Breaker configuration.
    pub breaker: CircuitBreakerConfig,
}

impl GatewayConfig {
    /// Builds a configuration with defaults for everything but the model id.
    #[must_use]
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            breaker: CircuitBreakerConfig::default(),
        }
    }
}

/// Breaker-guarded remote model gateway.
pub struct LlmGateway {
    /// Gateway configuration.
    config: GatewayConfig,
    /// Remote transport.
    transport: Arc<dyn CompletionTransport>,
    /// Breaker owned by this gateway.
    breaker: CircuitBreaker,
}

impl LlmGateway {
    /// Creates a gateway over a transport.
    #[must_use]
    pub fn new(config: GatewayConfig, transport: Arc<dyn CompletionTransport>) -> Self {
        let breaker = CircuitBreaker::new(config.breaker);
        Self {
            config,
            transport,
            breaker,
        }
    }

    /// Returns the gateway configuration.
    #[must_use]
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Returns a breaker snapshot.
    #[must_use]
    pub fn breaker(&self) -> BreakerSnapshot {
        self.breaker.snapshot()
    }

    /// Performs one guarded call, returning validated JSON with metadata.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] on breaker short-circuit, timeout, transport
    /// failure, or schema rejection.
    pub async fn try_complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<Value, GatewayError> {
        let started = Instant::now();
        self.guarded_call(system_prompt, user_prompt, started).await.map(|(value, _)| value)
    }

    /// Runs the breaker check, the timeout race, and validation.
    async fn guarded_call(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        started: Instant,
    ) -> Result<(Value, ExecutionMetadata), GatewayError> {
        if !self.breaker.try_acquire() {
            return Err(GatewayError::CircuitOpen);
        }
        let request = CompletionRequest {
            model_id: self.config.model_id.clone(),
            system_prompt: system_prompt.to_string(),
            user_prompt: user_prompt.to_string(),
            max_output_tokens: self.config.max_output_tokens,
            temperature: self.config.temperature,
        };
        let outcome =
            tokio::time::timeout(self.config.request_timeout, self.transport.complete(&request))
                .await;
        let result = match outcome {
            Err(_) => Err(GatewayError::Timeout(millis(self.config.request_timeout))),
            Ok(Err(err)) => Err(GatewayError::Transport(err)),
            Ok(Ok(completion)) => match validate_verdict_text(&completion.content)
                .and_then(|value| decode_verdict_value(&value).map(|_| value))
            {
                Ok(mut value) => {
                    let metadata = ExecutionMetadata {
                        model_id: Some(
                            completion.model.clone().unwrap_or_else(|| self.config.model_id.clone()),
                        ),
                        latency_ms: millis(started.elapsed()),
                        input_tokens: completion.input_tokens,
                        output_tokens: completion.output_tokens,
                    };
                    attach_metadata(&mut value, &metadata);
                    Ok((value, metadata))
                }
                Err(err) => Err(GatewayError::Verdict(err)),
            },
        };
        match &result {
            Ok(_) => self.breaker.record_success(),
            Err(err) => {
                self.breaker.record_failure();
                warn!(
                    error = %err,
                    model_id = %self.config.model_id,
                    "remote model call failed"
                );
            }
        }
        result
    }
}

#[async_trait]
impl ModelClient for LlmGateway {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> String {
        let started = Instant::now();
        match self.guarded_call(system_prompt, user_prompt, started).await {
            Ok((value, metadata)) => {
                debug!(
                    latency_ms = metadata.latency_ms,
                    input_tokens = metadata.input_tokens,
                    output_tokens = metadata.output_tokens,
                    "remote model call succeeded"
                );
                value.to_string()
            }
            Err(err) => {
                if matches!(err, GatewayError::CircuitOpen) {
                    warn!(model_id = %self.config.model_id, "circuit open; returning fail-safe verdict");
                }
                fail_safe_json(&ExecutionMetadata {
                    model_id: Some(self.config.model_id.clone()),
                    latency_ms: millis(started.elapsed()),
                    input_tokens: 0,
                    output_tokens: 0,
                })
            }
        }
    }

    fn is_remote(&self) -> bool {
        true
    }

    fn model_id(&self) -> &str {
        &self.config.model_id
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Serializes the fail-safe verdict with the supplied metadata.
#[must_use]
pub fn fail_safe_json(metadata: &ExecutionMetadata) -> String {
    let verdict = AuditorVerdict {
        execution_metadata: metadata.clone(),
        ..AuditorVerdict::fail_safe()
    };
    serde_json::to_string(&verdict).unwrap_or_else(|_| {
        let mut value = fail_safe_value();
        attach_metadata(&mut value, metadata);
        value.to_string()
    })
}

/// Fail-safe verdict as a JSON value without metadata.
fn fail_safe_value() -> Value {
    let verdict = AuditorVerdict::fail_safe();
    serde_json::json!({
        "safety_score": verdict.safety_score,
        "risk_level": verdict.risk_level.as_str(),
        "categories_detected": [],
        "reasoning_trace": verdict.reasoning_trace,
        "clinical_intervention": verdict.clinical_intervention,
    })
}

/// Overwrites `execution_metadata` on a verdict object.
pub(crate) fn attach_metadata(value: &mut Value, metadata: &ExecutionMetadata) {
    if let Value::Object(map) = value {
        map.insert(
            "execution_metadata".to_string(),
            serde_json::json!({
                "model_id": metadata.model_id,
                "latency_ms": metadata.latency_ms,
                "input_tokens": metadata.input_tokens,
                "output_tokens": metadata.output_tokens,
            }),
        );
    }
}

/// Converts a duration to whole milliseconds, saturating.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
