// crates/clinical-gate-auditor/tests/http_transport.rs
// ============================================================================
// Module: HTTP Completion Transport Tests
// Description: Wire-level checks against a local fake completion endpoint.
// Purpose: Validate request shape, envelope decoding, and error mapping.
// ============================================================================

//! ## Overview
//! Each test serves exactly one response from a `tiny_http` server on a
//! loopback port and inspects what the transport sent.

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

use std::io::Read;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use clinical_gate_auditor::CompletionRequest;
use clinical_gate_auditor::CompletionTransport;
use clinical_gate_auditor::GatewayConfig;
use clinical_gate_auditor::HttpCompletionTransport;
use clinical_gate_auditor::HttpTransportConfig;
use clinical_gate_auditor::LlmGateway;
use clinical_gate_auditor::TransportError;
use clinical_gate_auditor::parse_verdict;
use clinical_gate_core::RiskLevel;
use serde_json::Value;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Helpers
// ============================================================================

struct Captured {
    authorization: Option<String>,
    body: Value,
}

fn serve_once(status: u16, body: String) -> (String, mpsc::Receiver<Captured>, thread::JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        if let Ok(mut request) = server.recv() {
            let authorization = request
                .headers()
                .iter()
                .find(|header| header.field.equiv("Authorization"))
                .map(|header| header.value.as_str().to_string());
            let mut raw = String::new();
            let _ = request.as_reader().read_to_string(&mut raw);
            let _ = tx.send(Captured {
                authorization,
                body: serde_json::from_str(&raw).unwrap_or(Value::Null),
            });
            let response = Response::from_string(body)
                .with_status_code(status)
                .with_header(Header::from_bytes("Content-Type", "application/json").unwrap());
            let _ = request.respond(response);
        }
    });
    (format!("http://{addr}/v1/chat/completions"), rx, handle)
}

fn transport(endpoint: String) -> HttpCompletionTransport {
    HttpCompletionTransport::new(&HttpTransportConfig {
        endpoint,
        api_key: "sk-local-test".to_string(),
        timeout: Duration::from_secs(5),
        user_agent: "clinical-gate-tests".to_string(),
    })
    .unwrap()
}

fn request() -> CompletionRequest {
    CompletionRequest {
        model_id: "audit-model".to_string(),
        system_prompt: "system".to_string(),
        user_prompt: "user".to_string(),
        max_output_tokens: 256,
        temperature: 0.0,
    }
}

fn envelope(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-1",
        "model": "audit-model-0613",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 77, "completion_tokens": 19, "total_tokens": 96}
    })
    .to_string()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[tokio::test]
async fn sends_structured_output_request_with_bearer() {
    let (endpoint, rx, handle) = serve_once(200, envelope("{}"));
    let completion = transport(endpoint).complete(&request()).await.unwrap();
    handle.join().unwrap();

    let captured = rx.recv().unwrap();
    assert_eq!(captured.authorization.as_deref(), Some("Bearer sk-local-test"));
    assert_eq!(captured.body["model"], "audit-model");
    assert_eq!(captured.body["max_tokens"], 256);
    assert_eq!(captured.body["response_format"]["type"], "json_object");
    assert_eq!(captured.body["messages"][0]["role"], "system");
    assert_eq!(captured.body["messages"][1]["content"], "user");

    assert_eq!(completion.content, "{}");
    assert_eq!(completion.model.as_deref(), Some("audit-model-0613"));
    assert_eq!(completion.input_tokens, 77);
    assert_eq!(completion.output_tokens, 19);
}

#[tokio::test]
async fn non_success_status_maps_to_status_error() {
    let (endpoint, _rx, handle) = serve_once(429, r#"{"error":"rate limited"}"#.to_string());
    let err = transport(endpoint).complete(&request()).await.unwrap_err();
    handle.join().unwrap();
    match err {
        TransportError::Status {
            status,
            message,
        } => {
            assert_eq!(status, 429);
            assert!(message.contains("rate limited"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn missing_choices_is_a_protocol_error() {
    let (endpoint, _rx, handle) = serve_once(200, r#"{"choices":[]}"#.to_string());
    let err = transport(endpoint).complete(&request()).await.unwrap_err();
    handle.join().unwrap();
    assert!(matches!(err, TransportError::Protocol(_)));
}

#[tokio::test]
async fn gateway_over_http_returns_validated_verdict() {
    let verdict = r#"{"safety_score":12,"risk_level":"CRITICAL","categories_detected":["LATERALITY_MISMATCH"],"reasoning_trace":"left vs right","clinical_intervention":"Confirm side."}"#;
    let (endpoint, _rx, handle) = serve_once(200, envelope(verdict));
    let gateway = LlmGateway::new(GatewayConfig::new("audit-model"), Arc::new(transport(endpoint)));

    let value = gateway.try_complete("system", "user").await.unwrap();
    handle.join().unwrap();
    let parsed = parse_verdict(&value.to_string()).unwrap();
    assert_eq!(parsed.risk_level, RiskLevel::Critical);
    assert_eq!(parsed.execution_metadata.model_id.as_deref(), Some("audit-model-0613"));
    assert_eq!(parsed.execution_metadata.input_tokens, 77);
}

#[test]
fn debug_output_redacts_credential() {
    let config = HttpTransportConfig {
        endpoint: "https://models.invalid/v1/chat/completions".to_string(),
        api_key: "sk-very-secret".to_string(),
        timeout: Duration::from_secs(1),
        user_agent: "ua".to_string(),
    };
    let rendered = format!("{config:?}");
    assert!(!rendered.contains("sk-very-secret"));
    assert!(rendered.contains("<redacted>"));
}
