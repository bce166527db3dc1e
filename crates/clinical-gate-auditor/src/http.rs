// crates/clinical-gate-auditor/src/http.rs
// ============================================================================
// Module: HTTP Completion Transport
// Description: OpenAI-compatible chat completions over reqwest.
// Purpose: Deliver audit prompts to a remote model and decode the envelope.
// Dependencies: reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! Sends one `POST {endpoint}` with a chat-completions body requesting
//! `response_format = json_object`, authenticated with a bearer credential.
//! Redirects are disabled and the response body is read under a hard byte
//! limit. Only the first choice's message content and the usage block are
//! decoded.
//!
//! Security posture: the credential is never logged; `Debug` output redacts
//! it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde::Serialize;

use crate::gateway::Completion;
use crate::gateway::CompletionRequest;
use crate::gateway::CompletionTransport;
use crate::gateway::TransportError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum provider response size accepted.
pub const MAX_COMPLETION_RESPONSE_BYTES: usize = 1024 * 1024;
/// Maximum characters of an error body echoed into errors.
const ERROR_PREVIEW_CHARS: usize = 256;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// HTTP transport configuration.
#[derive(Clone)]
pub struct HttpTransportConfig {
    /// Full chat-completions endpoint URL.
    pub endpoint: String,
    /// Bearer credential.
    pub api_key: String,
    /// Client-level timeout (the gateway races its own timeout as well).
    pub timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl fmt::Debug for HttpTransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransportConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Chat completions request body.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    /// Model identifier.
    model: &'a str,
    /// Conversation messages.
    messages: [ChatMessage<'a>; 2],
    /// Completion token cap.
    max_tokens: u32,
    /// Sampling temperature.
    temperature: f32,
    /// Structured output request.
    response_format: ResponseFormat,
}

/// One chat message.
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    /// Message role.
    role: &'static str,
    /// Message content.
    content: &'a str,
}

/// Response format selector.
#[derive(Debug, Serialize)]
struct ResponseFormat {
    /// Format type.
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Chat completions response envelope.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    /// Model reported by the provider.
    #[serde(default)]
    model: Option<String>,
    /// Completion choices.
    #[serde(default)]
    choices: Vec<ChatChoice>,
    /// Token usage.
    #[serde(default)]
    usage: Option<ChatUsage>,
}

/// One completion choice.
#[derive(Debug, Deserialize)]
struct ChatChoice {
    /// Assistant message.
    message: ChatResponseMessage,
}

/// Assistant message.
#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    /// Message content.
    #[serde(default)]
    content: Option<String>,
}

/// Token usage block.
#[derive(Debug, Default, Deserialize)]
struct ChatUsage {
    /// Prompt tokens.
    #[serde(default)]
    prompt_tokens: u64,
    /// Completion tokens.
    #[serde(default)]
    completion_tokens: u64,
}

// ============================================================================
// SECTION: Transport
// ============================================================================

/// reqwest-backed chat completions transport.
pub struct HttpCompletionTransport {
    /// Endpoint URL.
    endpoint: String,
    /// Pre-built request headers.
    headers: HeaderMap,
    /// HTTP client.
    client: Client,
}

impl HttpCompletionTransport {
    /// Builds a transport.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Config`] when the credential is not a valid
    /// header value or the client cannot be built.
    pub fn new(config: &HttpTransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(Policy::none())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| TransportError::Config(err.to_string()))?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| TransportError::Config("invalid bearer credential header".to_string()))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
        Ok(Self {
            endpoint: config.endpoint.clone(),
            headers,
            client,
        })
    }
}

#[async_trait]
impl CompletionTransport for HttpCompletionTransport {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, TransportError> {
        let body = ChatRequest {
            model: &request.model_id,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            max_tokens: request.max_output_tokens,
            temperature: request.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };
        let payload = serde_json::to_vec(&body)
            .map_err(|err| TransportError::Protocol(format!("request serialization failed: {err}")))?;
        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .body(payload)
            .send()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;
        let status = response.status();
        let bytes = read_response_body_with_limit(response, MAX_COMPLETION_RESPONSE_BYTES).await?;
        if !status.is_success() {
            let preview: String =
                String::from_utf8_lossy(&bytes).trim().chars().take(ERROR_PREVIEW_CHARS).collect();
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: preview,
            });
        }
        let envelope: ChatResponse = serde_json::from_slice(&bytes)
            .map_err(|err| TransportError::Protocol(format!("invalid completion envelope: {err}")))?;
        let content = envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TransportError::Protocol("completion has no message content".to_string()))?;
        let usage = envelope.usage.unwrap_or_default();
        Ok(Completion {
            content,
            model: envelope.model,
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads a response body while enforcing a hard byte limit.
async fn read_response_body_with_limit(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, TransportError> {
    let mut body = Vec::new();
    while let Some(chunk) =
        response.chunk().await.map_err(|err| TransportError::Request(err.to_string()))?
    {
        if body.len().saturating_add(chunk.len()) > limit {
            return Err(TransportError::ResponseTooLarge {
                limit,
            });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
