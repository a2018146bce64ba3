/// LLM Client: the single point of entry for all model API calls.
///
/// ARCHITECTURAL RULE: No other module may call Anthropic, Gemini or OpenAI
/// directly. Handlers build a provider-neutral `Prompt`, pick a `ModelSpec`
/// from the catalog, and get back either raw text or parsed JSON in one
/// normalized shape.
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

mod anthropic;
pub mod catalog;
mod gemini;
pub mod json;
mod openai;
pub mod prompts;

pub use catalog::{ModelSpec, Provider};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx from the provider. The raw body is kept so callers can
    /// translate the provider's own error envelope.
    #[error("{provider} API error (status {status}): {body}")]
    Api {
        provider: Provider,
        status: u16,
        body: String,
    },

    #[error("Failed to parse {provider} response: {message}")]
    Response { provider: Provider, message: String },

    #[error("{provider} does not support {feature}")]
    Unsupported {
        provider: Provider,
        feature: &'static str,
    },

    #[error("Rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A provider-neutral prompt.
///
/// `context` is the large, stable part (attendee database, instructions) and
/// goes first so provider-side prompt caching can reuse it. `question` is the
/// small per-request tail.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub system: String,
    pub context: String,
    pub question: String,
    /// Base64-encoded PDF attached ahead of the text.
    pub document: Option<String>,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub cache_context: bool,
    pub timeout: Duration,
}

impl Prompt {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            system: String::new(),
            context: context.into(),
            question: String::new(),
            document: None,
            max_tokens: 4000,
            temperature: None,
            cache_context: false,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = system.into();
        self
    }

    pub fn question(mut self, question: impl Into<String>) -> Self {
        self.question = question.into();
        self
    }

    pub fn document(mut self, pdf_base64: impl Into<String>) -> Self {
        self.document = Some(pdf_base64.into());
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn cached(mut self) -> Self {
        self.cache_context = true;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Context and question as one block of text, for providers that take a
    /// single user turn.
    fn joined_text(&self) -> String {
        if self.question.is_empty() {
            self.context.clone()
        } else {
            format!("{}\n\n{}\n", self.context, self.question)
        }
    }
}

/// Model text plus the provider's usage block (or `{}` when absent).
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: Value,
}

#[derive(Debug, Clone)]
pub struct JsonCompletion {
    pub value: Value,
    pub usage: Value,
}

impl JsonCompletion {
    /// Re-serializes the parsed JSON into the Anthropic message shape every
    /// client already understands.
    pub fn into_message(self) -> MessageResponse {
        MessageResponse {
            content: vec![ContentBlock::text(self.value.to_string())],
            usage: Some(self.usage),
        }
    }
}

/// Normalized response returned by every search endpoint regardless of the
/// provider that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub content: Vec<ContentBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
}

impl MessageResponse {
    /// A message whose single text block is `value`, with no usage.
    pub fn from_value(value: &Value) -> Self {
        Self {
            content: vec![ContentBlock::text(value.to_string())],
            usage: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: &'static str,
    pub text: String,
}

impl ContentBlock {
    pub fn text(text: String) -> Self {
        Self {
            block_type: "text",
            text,
        }
    }
}

/// The single LLM client shared by all handlers.
/// Wraps the three providers' HTTP APIs with retry logic and JSON coercion.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    anthropic_base_url: String,
    gemini_base_url: String,
    openai_base_url: String,
    max_attempts: u32,
}

impl LlmClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            anthropic_base_url: trim_base(&config.anthropic_base_url),
            gemini_base_url: trim_base(&config.gemini_base_url),
            openai_base_url: trim_base(&config.openai_base_url),
            max_attempts: config.llm_max_attempts.max(1),
        }
    }

    /// Makes one logical call to the model, returning its text.
    /// Retries on 429, 5xx and transport failures with exponential backoff.
    pub async fn complete(
        &self,
        spec: &ModelSpec,
        api_key: &str,
        prompt: &Prompt,
    ) -> Result<Completion, LlmError> {
        let provider = spec.provider;
        let (url, body) = match provider {
            Provider::Anthropic => (
                format!("{}/v1/messages", self.anthropic_base_url),
                anthropic::request_body(spec, prompt)?,
            ),
            Provider::Gemini => (
                format!(
                    "{}/v1beta/models/{}:generateContent",
                    self.gemini_base_url, spec.model_id
                ),
                gemini::request_body(prompt)?,
            ),
            Provider::OpenAi => (
                format!("{}/v1/chat/completions", self.openai_base_url),
                openai::request_body(spec, prompt)?,
            ),
        };

        debug!(
            provider = %provider,
            model = spec.model_id,
            estimated_tokens = prompts::estimate_tokens(&prompt.context)
                + prompts::estimate_tokens(&prompt.question),
            "Calling LLM"
        );

        let response = self
            .send_with_retries(provider, api_key, &url, &body, prompt.timeout)
            .await?;

        let completion = match provider {
            Provider::Anthropic => anthropic::extract(response),
            Provider::Gemini => gemini::extract(response),
            Provider::OpenAi => openai::extract(response),
        }
        .map_err(|message| LlmError::Response { provider, message })?;

        debug!(provider = %provider, usage = %completion.usage, "LLM call succeeded");
        Ok(completion)
    }

    /// Calls the model and coerces its text into JSON.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn complete_json(
        &self,
        spec: &ModelSpec,
        api_key: &str,
        prompt: &Prompt,
    ) -> Result<JsonCompletion, LlmError> {
        let completion = self.complete(spec, api_key, prompt).await?;
        let value = json::parse_llm_json(&completion.text).map_err(|e| LlmError::Response {
            provider: spec.provider,
            message: e.to_string(),
        })?;
        Ok(JsonCompletion {
            value,
            usage: completion.usage,
        })
    }

    async fn send_with_retries(
        &self,
        provider: Provider,
        api_key: &str,
        url: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<Value, LlmError> {
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1).min(5)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let request = self.client.post(url).timeout(timeout).json(body);
            let request = match provider {
                Provider::Anthropic => request
                    .header("x-api-key", api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION),
                Provider::Gemini => request.query(&[("key", api_key)]),
                Provider::OpenAi => request.bearer_auth(api_key),
            };

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    warn!(provider = %provider, "LLM request failed: {e}");
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("{} API returned {}: {}", provider, status, body);
                last_error = Some(LlmError::Api {
                    provider,
                    status: status.as_u16(),
                    body,
                });
                continue;
            }

            let text = response.text().await?;

            if !status.is_success() {
                return Err(LlmError::Api {
                    provider,
                    status: status.as_u16(),
                    body: text,
                });
            }

            return serde_json::from_str(&text).map_err(|e| LlmError::Response {
                provider,
                message: format!("response body is not JSON: {e}"),
            });
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            attempts: self.max_attempts,
        }))
    }
}

/// The `{"error": {"type", "message"}}` envelope Anthropic, OpenAI and Gemini
/// all roughly share on non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    #[serde(default)]
    error: ApiErrorDetail,
}

/// Parses a provider error body. `None` when the body is not a JSON object
/// or its `error` member is not an object.
pub fn parse_api_error(body: &str) -> Option<ApiErrorDetail> {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error)
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

fn empty_usage() -> Value {
    json!({})
}
