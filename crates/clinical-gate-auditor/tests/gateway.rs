// crates/clinical-gate-auditor/tests/gateway.rs
// ============================================================================
// Module: LLM Gateway Tests
// Description: Timeout race, schema discipline, and breaker integration.
// Purpose: Validate that every fault degrades to a fail-safe verdict.
// ============================================================================

//! ## Overview
//! Uses an in-process scripted transport that counts network attempts, on a
//! paused tokio clock.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use clinical_gate_auditor::CircuitBreakerConfig;
use clinical_gate_auditor::CircuitState;
use clinical_gate_auditor::Completion;
use clinical_gate_auditor::CompletionRequest;
use clinical_gate_auditor::CompletionTransport;
use clinical_gate_auditor::GatewayConfig;
use clinical_gate_auditor::GatewayError;
use clinical_gate_auditor::LlmGateway;
use clinical_gate_auditor::ModelClient;
use clinical_gate_auditor::TransportError;
use clinical_gate_auditor::VerdictError;
use clinical_gate_auditor::parse_verdict;
use clinical_gate_core::RiskLevel;

// ============================================================================
// SECTION: Scripted Transport
// ============================================================================

const VALID_VERDICT: &str = r#"{"safety_score":92,"risk_level":"LOW","categories_detected":[],"reasoning_trace":"ok","clinical_intervention":"none"}"#;

#[derive(Clone)]
enum Behavior {
    Reply(String),
    Hang,
    Fail,
}

struct ScriptedTransport {
    behavior: std::sync::Mutex<Behavior>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior: std::sync::Mutex::new(behavior),
            calls: AtomicUsize::new(0),
        })
    }

    fn set(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionTransport for ScriptedTransport {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            Behavior::Reply(content) => Ok(Completion {
                content,
                model: Some(format!("{}-2024", request.model_id)),
                input_tokens: 120,
                output_tokens: 40,
            }),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3_600)).await;
                Err(TransportError::Request("unreachable".to_string()))
            }
            Behavior::Fail => Err(TransportError::Status {
                status: 503,
                message: "unavailable".to_string(),
            }),
        }
    }
}

fn gateway(transport: Arc<ScriptedTransport>, threshold: u32) -> LlmGateway {
    let config = GatewayConfig {
        request_timeout: Duration::from_secs(5),
        breaker: CircuitBreakerConfig {
            failure_threshold: threshold,
            reset_interval: Duration::from_secs(60),
        },
        ..GatewayConfig::new("audit-model")
    };
    LlmGateway::new(config, transport)
}

// ============================================================================
// SECTION: Success Path
// ============================================================================

#[tokio::test(start_paused = true)]
async fn valid_output_gets_metadata_attached() {
    let transport = ScriptedTransport::new(Behavior::Reply(VALID_VERDICT.to_string()));
    let gateway = gateway(Arc::clone(&transport), 3);

    let value = gateway.try_complete("system", "user").await.unwrap();
    let metadata = &value["execution_metadata"];
    assert_eq!(metadata["model_id"], "audit-model-2024");
    assert_eq!(metadata["input_tokens"], 120);
    assert_eq!(metadata["output_tokens"], 40);

    let verdict = parse_verdict(&value.to_string()).unwrap();
    assert_eq!(verdict.risk_level, RiskLevel::Low);
    assert_eq!(verdict.safety_score, 92);
}

#[tokio::test(start_paused = true)]
async fn fenced_output_is_accepted() {
    let fenced = format!("```json\n{VALID_VERDICT}\n```");
    let transport = ScriptedTransport::new(Behavior::Reply(fenced));
    let gateway = gateway(transport, 3);
    let raw = gateway.complete("system", "user").await;
    let verdict = parse_verdict(&raw).unwrap();
    assert!(!verdict.is_fail_safe());
    assert_eq!(verdict.safety_score, 92);
}

#[tokio::test(start_paused = true)]
async fn integral_float_score_is_a_success() {
    let transport = ScriptedTransport::new(Behavior::Reply(
        r#"{"safety_score":20.0,"risk_level":"CRITICAL","categories_detected":["DOSAGE_ERROR"],"reasoning_trace":"5mg vs 50mg","clinical_intervention":"confirm dose"}"#
            .to_string(),
    ));
    let gateway = gateway(transport, 3);
    let raw = gateway.complete("system", "user").await;
    let verdict = parse_verdict(&raw).unwrap();
    assert_eq!(verdict.safety_score, 20);
    assert_eq!(verdict.risk_level, RiskLevel::Critical);
    assert_eq!(gateway.breaker().consecutive_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn fractional_score_is_a_failure() {
    let transport = ScriptedTransport::new(Behavior::Reply(
        r#"{"safety_score":20.5,"risk_level":"LOW","categories_detected":[],"reasoning_trace":"","clinical_intervention":""}"#
            .to_string(),
    ));
    let gateway = gateway(transport, 3);
    assert!(gateway.try_complete("system", "user").await.is_err());
    assert_eq!(gateway.breaker().consecutive_failures, 1);
}

// ============================================================================
// SECTION: Faults
// ============================================================================

#[tokio::test(start_paused = true)]
async fn schema_invalid_output_is_a_failure() {
    let transport = ScriptedTransport::new(Behavior::Reply(
        r#"{"safety_score":140,"risk_level":"LOW","categories_detected":[],"reasoning_trace":"","clinical_intervention":""}"#
            .to_string(),
    ));
    let gateway = gateway(transport, 3);

    let err = gateway.try_complete("system", "user").await.unwrap_err();
    assert!(matches!(err, GatewayError::Verdict(VerdictError::Schema(_))));
    assert_eq!(gateway.breaker().consecutive_failures, 1);
}

#[tokio::test(start_paused = true)]
async fn unknown_fields_are_rejected() {
    let transport = ScriptedTransport::new(Behavior::Reply(
        r#"{"safety_score":90,"risk_level":"LOW","categories_detected":[],"reasoning_trace":"","clinical_intervention":"","patient":"x"}"#
            .to_string(),
    ));
    let gateway = gateway(transport, 3);
    let err = gateway.try_complete("system", "user").await.unwrap_err();
    assert!(matches!(err, GatewayError::Verdict(VerdictError::Schema(_))));
}

#[tokio::test(start_paused = true)]
async fn slow_transport_times_out() {
    let transport = ScriptedTransport::new(Behavior::Hang);
    let gateway = gateway(transport, 3);
    let err = gateway.try_complete("system", "user").await.unwrap_err();
    assert_eq!(err, GatewayError::Timeout(5_000));
}

#[tokio::test(start_paused = true)]
async fn model_client_returns_fail_safe_json_with_metadata() {
    let transport = ScriptedTransport::new(Behavior::Fail);
    let gateway = gateway(transport, 3);
    let raw = gateway.complete("system", "user").await;
    let verdict = parse_verdict(&raw).unwrap();
    assert!(verdict.is_fail_safe());
    assert_eq!(verdict.risk_level, RiskLevel::Moderate);
    assert_eq!(verdict.execution_metadata.model_id.as_deref(), Some("audit-model"));
    assert_eq!(verdict.execution_metadata.input_tokens, 0);
}

// ============================================================================
// SECTION: Breaker
// ============================================================================

#[tokio::test(start_paused = true)]
async fn open_breaker_short_circuits_without_network() {
    let transport = ScriptedTransport::new(Behavior::Hang);
    let gateway = gateway(Arc::clone(&transport), 3);

    for _ in 0 .. 3 {
        let verdict = parse_verdict(&gateway.complete("system", "user").await).unwrap();
        assert!(verdict.is_fail_safe());
    }
    assert_eq!(transport.calls(), 3);
    assert_eq!(gateway.breaker().state, CircuitState::Open);

    let err = gateway.try_complete("system", "user").await.unwrap_err();
    assert_eq!(err, GatewayError::CircuitOpen);
    let verdict = parse_verdict(&gateway.complete("system", "user").await).unwrap();
    assert!(verdict.is_fail_safe());
    assert_eq!(transport.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn call_is_attempted_again_after_reset_interval() {
    let transport = ScriptedTransport::new(Behavior::Fail);
    let gateway = gateway(Arc::clone(&transport), 2);
    let _ = gateway.complete("system", "user").await;
    let _ = gateway.complete("system", "user").await;
    assert_eq!(gateway.breaker().state, CircuitState::Open);

    tokio::time::advance(Duration::from_secs(61)).await;
    transport.set(Behavior::Reply(VALID_VERDICT.to_string()));
    let verdict = parse_verdict(&gateway.complete("system", "user").await).unwrap();
    assert!(!verdict.is_fail_safe());
    assert_eq!(transport.calls(), 3);

    let snapshot = gateway.breaker();
    assert_eq!(snapshot.state, CircuitState::Closed);
    assert_eq!(snapshot.consecutive_failures, 0);
}
