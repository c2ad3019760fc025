use crate::config::Config;
use crate::retry::{with_retry_if, RetryPolicy};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Message shown when the provider could not be reached at all.
pub const UNAVAILABLE_MESSAGE: &str =
    "Our translator service is temporarily unavailable. Please try again later.";

/// Failure of a single translation call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The provider answered with an error it described.
    #[error("{message}")]
    Provider { status: Option<u16>, message: String },

    /// Transport failure or a reply we could not make sense of.
    /// The detail is for logs only.
    #[error("translation provider unavailable: {0}")]
    Unavailable(String),
}

impl GatewayError {
    /// Text suitable for the end user.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Provider { message, .. } => format!(
                "Oops! Something went wrong while translating your text: {}",
                message
            ),
            GatewayError::Unavailable(_) => UNAVAILABLE_MESSAGE.to_string(),
        }
    }

    /// Transport failures, 429 and 5xx are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Unavailable(_) => true,
            GatewayError::Provider {
                status: Some(status),
                ..
            } => *status == 429 || *status >= 500,
            GatewayError::Provider { status: None, .. } => false,
        }
    }
}

/// Sends a prompt to a generative-language provider and returns its text.
#[async_trait]
pub trait TranslationGateway: Send + Sync {
    /// One completion for `prompt`. The text is returned exactly as the provider produced it.
    async fn translate(&self, prompt: &str) -> Result<String, GatewayError>;

    /// Model the gateway talks to, for logging.
    fn model(&self) -> &str;
}

// ==================== Gemini wire types ====================

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Gateway backed by the Google Generative Language REST API.
pub struct GeminiGateway {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    retry: RetryPolicy,
}

impl GeminiGateway {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            retry: RetryPolicy::none(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.gemini_api_url.clone(),
            config.gemini_api_key.clone(),
            config.ai_model.clone(),
        )
        .with_retry(RetryPolicy::gateway(config.gateway_max_attempts))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        )
    }

    async fn generate_once(&self, request: &GenerateContentRequest) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(GatewayError::Provider {
                status: Some(status.as_u16()),
                message: format!("[{}] {}", status, provider_error_message(&body)),
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Unavailable(format!("failed to parse response: {}", e)))?;

        extract_text(parsed)
    }
}

#[async_trait]
impl TranslationGateway for GeminiGateway {
    async fn translate(&self, prompt: &str) -> Result<String, GatewayError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        debug!("Calling {} ({} prompt bytes)", self.model, prompt.len());

        with_retry_if(
            &self.retry,
            &format!("Gemini {}", self.model),
            || self.generate_once(&request),
            GatewayError::is_retryable,
        )
        .await
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Pull the human-readable part out of an error body.
fn provider_error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body) {
        return parsed.error.message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no details provided".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Finish reasons that mean the candidate text is cut short or withheld.
const BLOCKED_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
    "LANGUAGE",
];

/// Concatenate the text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Result<String, GatewayError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!("Response was blocked due to {}", r))
            .unwrap_or_else(|| "Response contained no candidates".to_string());
        return Err(GatewayError::Provider {
            status: None,
            message: reason,
        });
    };

    let blocked = candidate
        .finish_reason
        .as_deref()
        .filter(|reason| BLOCKED_FINISH_REASONS.contains(reason));
    if let Some(reason) = blocked {
        return Err(GatewayError::Provider {
            status: None,
            message: format!("Candidate was blocked due to {}", reason),
        });
    }

    match candidate.content {
        Some(content) => Ok(content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<String>()),
        None => Err(GatewayError::Provider {
            status: None,
            message: format!(
                "Candidate was blocked due to {}",
                candidate.finish_reason.as_deref().unwrap_or("an unknown reason")
            ),
        }),
    }
}
