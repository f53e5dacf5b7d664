//! Text generation backend.
//!
//! `GeminiClient` talks to Google's `generateContent` endpoint with a single
//! fixed model. Everything above this module only sees the `TextGenerator`
//! trait and `GenerationError`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

pub const GEMINI_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("generation API credential missing or rejected: {0}")]
    Auth(String),
    #[error("could not reach generation API: {0}")]
    Network(String),
    #[error("generation API returned an unusable response: {0}")]
    Upstream(String),
}

impl GenerationError {
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::Auth(_) => "AuthError",
            GenerationError::Network(_) => "NetworkError",
            GenerationError::Upstream(_) => "UpstreamError",
        }
    }

    /// Only transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::Network(_))
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

// ============================================================================
// Client
// ============================================================================

pub struct GeminiClient {
    client: Client,
    api_key: Result<HeaderValue, GenerationError>,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, api_base: &str, timeout: Duration) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: key_header(api_key),
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                api_base.trim_end_matches('/'),
                GEMINI_MODEL
            ),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, GenerationError> {
        Self::new(config.api_key.clone(), &config.api_base, config.upstream_timeout)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self.api_key.clone()?;

        let request = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Network(transport_reason(&e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::Network(transport_reason(&e)))?;

        debug!(%status, bytes = body.len(), "Gemini responded");
        interpret_response(status, &body)
    }
}

/// A key that cannot travel as a header value is as unusable as a missing one.
fn key_header(api_key: Option<String>) -> Result<HeaderValue, GenerationError> {
    let key = api_key
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| GenerationError::Auth("GEMINI_API_KEY not set".to_string()))?;
    let mut value = HeaderValue::from_str(key.trim())
        .map_err(|_| GenerationError::Auth("GEMINI_API_KEY is not a valid header value".to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

fn transport_reason(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    }
}

/// Map a raw upstream answer to generated text or an error kind.
fn interpret_response(status: StatusCode, body: &str) -> Result<String, GenerationError> {
    if !status.is_success() {
        let detail = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|env| {
                if env.error.status.is_empty() {
                    env.error.message
                } else {
                    format!("{}: {}", env.error.status, env.error.message)
                }
            })
            .unwrap_or_else(|_| body.chars().take(200).collect());

        let rejected_key = status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
            || (status == StatusCode::BAD_REQUEST && body.contains("API_KEY_INVALID"));

        return if rejected_key {
            Err(GenerationError::Auth(format!("{status} - {detail}")))
        } else {
            Err(GenerationError::Upstream(format!("{status} - {detail}")))
        };
    }

    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::Upstream(format!("malformed response body: {e}")))?;

    if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GenerationError::Upstream(format!("prompt blocked: {reason}")));
    }

    let candidate = parsed
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::Upstream("no candidates returned".to_string()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "UNKNOWN".to_string());
        return Err(GenerationError::Upstream(format!(
            "empty text (finish reason {reason})"
        )));
    }

    Ok(text)
}
