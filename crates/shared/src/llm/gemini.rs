use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use url::Url;

use super::assistant::{ConnectError, ModelConnector};
use super::gateway::{
    ConversationTurn, LlmGateway, LlmGatewayError, LlmGatewayFuture, LlmGatewayRequest,
    LlmGatewayResponse, LlmTokenUsage, TurnRole,
};
use crate::config::ConfigError;
use crate::config_env::{optional_trimmed_env, parse_f32_env, parse_u64_env, require_env};

const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_TEMPERATURE: f32 = 0.4;
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub struct GeminiGatewayConfig {
    pub api_base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_ms: u64,
    pub temperature: f32,
}

impl GeminiGatewayConfig {
    pub fn from_env() -> Result<Self, GeminiConfigError> {
        let api_key = require_env("GEMINI_API_KEY")?;
        let api_base_url = optional_trimmed_env("GEMINI_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let config = Self {
            api_base_url,
            api_key,
            model: optional_trimmed_env("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout_ms: parse_u64_env("GEMINI_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?,
            temperature: parse_f32_env("GEMINI_TEMPERATURE", DEFAULT_TEMPERATURE)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GeminiConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingVar("GEMINI_API_KEY".to_string()).into());
        }

        let parsed = Url::parse(&self.api_base_url).map_err(|err| {
            ConfigError::InvalidConfiguration(format!("GEMINI_API_BASE_URL is not a url: {err}"))
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ConfigError::InvalidConfiguration(
                "GEMINI_API_BASE_URL must start with http:// or https://".to_string(),
            )
            .into());
        }

        if self.model.is_empty() || self.model.contains('/') {
            return Err(ConfigError::InvalidConfiguration(format!(
                "GEMINI_MODEL '{}' is not a bare model name",
                self.model
            ))
            .into());
        }

        Ok(())
    }

    fn generate_content_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Debug, Error)]
pub enum GeminiConfigError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build Gemini http client: {0}")]
    HttpClient(String),
}

#[derive(Clone)]
pub struct GeminiGateway {
    client: reqwest::Client,
    config: GeminiGatewayConfig,
}

impl GeminiGateway {
    pub fn new(config: GeminiGatewayConfig) -> Result<Self, GeminiConfigError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| GeminiConfigError::HttpClient(err.to_string()))?;

        Ok(Self { client, config })
    }

    async fn send_once(
        &self,
        request: &LlmGatewayRequest,
    ) -> Result<LlmGatewayResponse, LlmGatewayError> {
        let pending_turn = ConversationTurn::user(request.prompt.clone());
        let contents = request
            .history
            .iter()
            .chain(std::iter::once(&pending_turn))
            .map(|turn| {
                json!({
                    "role": role_label(turn.role),
                    "parts": [{ "text": turn.text }]
                })
            })
            .collect::<Vec<_>>();

        let request_body = json!({
            "systemInstruction": {
                "parts": [{ "text": request.system_instruction }]
            },
            "contents": contents,
            "generationConfig": {
                "responseMimeType": "application/json",
                "temperature": self.config.temperature
            }
        });

        let response = self
            .client
            .post(self.config.generate_content_url())
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    LlmGatewayError::Timeout
                } else {
                    LlmGatewayError::ProviderFailure("request_unavailable".to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            if err.is_timeout() {
                LlmGatewayError::Timeout
            } else {
                LlmGatewayError::InvalidProviderPayload("response_body_read_failed".to_string())
            }
        })?;

        if !status.is_success() {
            let provider_error = parse_provider_error(&body);
            let detail = format!("status={} code={}", status.as_u16(), provider_error.code);
            if is_credential_rejection(status, &provider_error) {
                return Err(LlmGatewayError::Unauthorized(detail));
            }
            return Err(LlmGatewayError::ProviderFailure(detail));
        }

        let parsed: GeminiSuccessResponse = serde_json::from_str(&body).map_err(|_| {
            LlmGatewayError::InvalidProviderPayload("response_json_parse_failed".to_string())
        })?;

        let candidate = parsed.candidates.first().ok_or_else(|| {
            LlmGatewayError::InvalidProviderPayload(match parsed.prompt_feedback.as_ref() {
                Some(feedback) => format!(
                    "missing_candidate block_reason={}",
                    feedback.block_reason.as_deref().unwrap_or("unknown")
                ),
                None => "missing_candidate".to_string(),
            })
        })?;

        let text = candidate
            .content
            .as_ref()
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                LlmGatewayError::InvalidProviderPayload(format!(
                    "empty_candidate finish_reason={}",
                    candidate.finish_reason.as_deref().unwrap_or("unknown")
                ))
            })?;

        Ok(LlmGatewayResponse {
            model: parsed
                .model_version
                .unwrap_or_else(|| self.config.model.clone()),
            provider_request_id: parsed.response_id,
            text,
            usage: parsed.usage_metadata.map(|usage| LlmTokenUsage {
                prompt_tokens: clamp_u64_to_u32(usage.prompt_token_count.unwrap_or(0)),
                completion_tokens: clamp_u64_to_u32(usage.candidates_token_count.unwrap_or(0)),
                total_tokens: clamp_u64_to_u32(usage.total_token_count.unwrap_or(0)),
            }),
        })
    }
}

impl LlmGateway for GeminiGateway {
    fn generate<'a>(&'a self, request: LlmGatewayRequest) -> LlmGatewayFuture<'a> {
        Box::pin(async move { self.send_once(&request).await })
    }
}

/// Builds a [`GeminiGateway`] when the assistant opens its session.
#[derive(Debug, Clone, Default)]
pub struct GeminiConnector {
    config: Option<GeminiGatewayConfig>,
}

impl GeminiConnector {
    /// Reads `GEMINI_*` variables at connect time.
    pub fn from_env() -> Self {
        Self { config: None }
    }

    pub fn with_config(config: GeminiGatewayConfig) -> Self {
        Self {
            config: Some(config),
        }
    }
}

impl ModelConnector for GeminiConnector {
    fn connect(&self) -> Result<Arc<dyn LlmGateway>, ConnectError> {
        let config = match self.config.clone() {
            Some(config) => config,
            None => GeminiGatewayConfig::from_env()?,
        };

        Ok(Arc::new(GeminiGateway::new(config)?))
    }
}

impl From<GeminiConfigError> for ConnectError {
    fn from(err: GeminiConfigError) -> Self {
        match err {
            GeminiConfigError::Config(config_err) => Self::NotConfigured(config_err.to_string()),
            GeminiConfigError::HttpClient(message) => Self::ClientInit(message),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiSuccessResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    model_version: Option<String>,
    response_id: Option<String>,
    usage_metadata: Option<GeminiUsage>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
    total_token_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug)]
struct ProviderError {
    code: String,
    reasons: Vec<String>,
}

fn parse_provider_error(body: &str) -> ProviderError {
    #[derive(Deserialize)]
    struct ProviderErrorEnvelope {
        error: Option<ProviderErrorDetails>,
    }

    #[derive(Deserialize)]
    struct ProviderErrorDetails {
        status: Option<String>,
        #[serde(default)]
        details: Vec<Value>,
    }

    let Some(details) = serde_json::from_str::<ProviderErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
    else {
        return ProviderError {
            code: "unknown".to_string(),
            reasons: Vec::new(),
        };
    };

    ProviderError {
        code: details.status.unwrap_or_else(|| "unknown".to_string()),
        reasons: details
            .details
            .iter()
            .filter_map(|detail| detail.get("reason").and_then(Value::as_str))
            .map(ToString::to_string)
            .collect(),
    }
}

/// Gemini reports a bad key as 400 INVALID_ARGUMENT with an `API_KEY_INVALID`
/// reason rather than 401.
fn is_credential_rejection(status: StatusCode, provider_error: &ProviderError) -> bool {
    status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || provider_error
            .reasons
            .iter()
            .any(|reason| reason == "API_KEY_INVALID")
}

const fn role_label(role: TurnRole) -> &'static str {
    match role {
        TurnRole::User => "user",
        TurnRole::Model => "model",
    }
}

fn clamp_u64_to_u32(value: u64) -> u32 {
    value.min(u32::MAX as u64) as u32
}
