//! Language-model collaborator
//!
//! Provides a `LanguageModel` trait with an HTTP implementation that posts a
//! free-text prompt and reads back a free-text reply. Failures are returned
//! once; there is no retry and no request timeout. A rate-limit answer is
//! surfaced as its own error variant so callers can show it verbatim.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error statuses some providers use for rate limiting in the JSON body.
const RATE_LIMIT_STATUSES: [&str; 2] = ["resource_exhausted", "rate_limit_exceeded"];

// ============================================================================
// LanguageModel trait
// ============================================================================

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send a prompt and return the model's reply text.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limit exceeded: {message}")]
    RateLimited { message: String },

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Missing reply in response")]
    MissingReply,

    #[error("Missing API key")]
    MissingApiKey,
}

impl LlmError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, LlmError::RateLimited { .. })
    }
}

// ============================================================================
// Config
// ============================================================================

#[derive(Debug, Clone)]
pub struct LlmClientConfig {
    pub api_key: String,
    pub endpoint: String,
}

impl LlmClientConfig {
    /// Falls back to the `AI_API_TOKEN` environment variable when no key is given.
    pub fn new(api_key: Option<String>, endpoint: String) -> Self {
        let api_key = api_key
            .or_else(|| std::env::var("AI_API_TOKEN").ok())
            .unwrap_or_default();

        Self { api_key, endpoint }
    }
}

// ============================================================================
// Wire structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct PromptRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct PromptResponse {
    response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Detailed {
        message: String,
        #[serde(default)]
        status: Option<String>,
    },
    Plain(String),
}

// ============================================================================
// HttpLanguageModel
// ============================================================================

#[derive(Debug, Clone)]
pub struct HttpLanguageModel {
    client: Client,
    config: LlmClientConfig,
}

impl HttpLanguageModel {
    pub fn new(config: LlmClientConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let client = Client::builder().build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl LanguageModel for HttpLanguageModel {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&PromptRequest { prompt })
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, error_body));
        }

        let body: PromptResponse = response.json().await?;
        body.response.ok_or(LlmError::MissingReply)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Map a non-2xx answer to an `LlmError`, recognising rate limits by HTTP code
/// or by the provider's error status.
fn classify_error(status: StatusCode, error_body: String) -> LlmError {
    let detail = serde_json::from_str::<ErrorEnvelope>(&error_body)
        .ok()
        .and_then(|e| e.error);

    let (message, provider_status) = match detail {
        Some(ErrorBody::Detailed { message, status }) => (message, status),
        Some(ErrorBody::Plain(message)) => (message, None),
        None => (error_body, None),
    };

    let rate_limited = status == StatusCode::TOO_MANY_REQUESTS
        || provider_status
            .as_deref()
            .map(|s| RATE_LIMIT_STATUSES.contains(&s.to_ascii_lowercase().as_str()))
            .unwrap_or(false);

    tracing::error!(
        code = status.as_u16(),
        message = %message,
        rate_limited,
        "Language model API error"
    );

    if rate_limited {
        LlmError::RateLimited { message }
    } else {
        LlmError::Api {
            code: status.as_u16(),
            message,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> HttpLanguageModel {
        let config = LlmClientConfig {
            api_key: "test-token".to_string(),
            endpoint: format!("{}/llm", server.uri()),
        };
        HttpLanguageModel::new(config).expect("Failed to create client")
    }

    #[tokio::test]
    async fn test_complete_posts_prompt_and_returns_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/llm"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_json(serde_json::json!({ "prompt": "olá" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "response": "Oi!" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let reply = test_client(&server).complete("olá").await.unwrap();
        assert_eq!(reply, "Oi!");
    }

    #[tokio::test]
    async fn test_http_429_is_rate_limited_and_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "message": "Too many requests", "status": "RESOURCE_EXHAUSTED" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server).complete("hi").await.unwrap_err();
        match err {
            LlmError::RateLimited { message } => assert_eq!(message, "Too many requests"),
            other => panic!("Expected RateLimited, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_status_in_body_is_recognised() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": { "message": "quota", "status": "rate_limit_exceeded" }
            })))
            .mount(&server)
            .await;

        let err = test_client(&server).complete("hi").await.unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_server_error_keeps_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let err = test_client(&server).complete("hi").await.unwrap_err();
        match err {
            LlmError::Api { code, message } => {
                assert_eq!(code, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_reply_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let err = test_client(&server).complete("hi").await.unwrap_err();
        assert!(matches!(err, LlmError::MissingReply));
    }

    #[test]
    fn test_missing_api_key() {
        let config = LlmClientConfig {
            api_key: String::new(),
            endpoint: "http://localhost/llm".to_string(),
        };
        assert!(matches!(HttpLanguageModel::new(config), Err(LlmError::MissingApiKey)));
    }
}
