//! Axum route handlers for the Search API.

use std::time::Duration;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::attendees::text::format_for_ai;
use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::{
    catalog, parse_api_error, prompts::estimate_tokens, LlmError, MessageResponse, ModelSpec,
    Prompt, Provider,
};
use crate::search::prompts::{
    attendees_text, prefiltered_context, search_context, search_question, BASE_PROMPT,
    NO_VECTOR_MATCHES, SCORE_REMINDER, SEARCH_SYSTEM,
};
use crate::state::AppState;
use crate::vector::VectorError;

const DEFAULT_SEARCH_MODEL: &str = "gemini-3-flash";
const DEFAULT_MATCH_COUNT: u32 = 50;
/// Similarity floor for the prefilter.
const MATCH_THRESHOLD: f32 = 0.2;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);
const VECTOR_LLM_TIMEOUT: Duration = Duration::from_secs(55);

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    /// Pre-serialized string or any JSON value.
    #[serde(default)]
    pub attendees: Value,
    #[serde(default)]
    pub model: Option<String>,
    /// Caller-supplied key; takes precedence over the server's key.
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VectorSearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub match_count: Option<u32>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenEstimateRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub attendees: Value,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TokenEstimate {
    pub base_prompt_tokens: usize,
    pub attendee_tokens: usize,
    pub query_tokens: usize,
    pub total_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_per_profile: Option<usize>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/search
///
/// Sends the whole attendee list plus the query to the chosen model and
/// returns its scored matches in the normalized message shape.
pub async fn handle_search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(request) = payload?;

    let query = required_query(request.query.as_deref())?;
    let alias = request.model.as_deref().unwrap_or(DEFAULT_SEARCH_MODEL);
    let spec = catalog::resolve(alias)
        .ok_or_else(|| AppError::Validation(format!("Invalid model: {alias}")))?;

    let api_key = request
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .or_else(|| server_key(&state.config, spec.provider))
        .ok_or_else(|| {
            AppError::NotConfigured(format!(
                "{} API key not configured on server",
                spec.provider.key_owner()
            ))
        })?;

    let attendees = attendees_text(&request.attendees);
    info!(
        model = spec.model_id,
        query_len = query.len(),
        attendees_len = attendees.len(),
        "Running attendee search"
    );

    let prompt = Prompt::new(search_context(&attendees))
        .system(SEARCH_SYSTEM)
        .question(search_question(query))
        .temperature(0.5)
        .max_tokens(4000)
        .timeout(SEARCH_TIMEOUT)
        .cached();

    let completion = state
        .llm
        .complete_json(spec, api_key, &prompt)
        .await
        .map_err(translate_search_error)?;

    Ok(Json(completion.into_message()))
}

/// POST /api/vector-search
///
/// Embeds the query, pulls the nearest profiles from Supabase, then asks the
/// model to score only those.
pub async fn handle_vector_search(
    State(state): State<AppState>,
    payload: Result<Json<VectorSearchRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(request) = payload?;

    let query = required_query(request.query.as_deref())?;
    let store = state
        .store
        .as_ref()
        .ok_or_else(|| AppError::NotConfigured("Supabase not configured".to_string()))?;
    let embedder = state
        .embedder
        .as_ref()
        .ok_or_else(|| AppError::NotConfigured("Google API key not configured".to_string()))?;

    let spec = vector_model(request.model.as_deref());
    let api_key = server_key(&state.config, spec.provider).ok_or_else(|| {
        AppError::NotConfigured(format!(
            "{} API key not configured",
            spec.provider.key_owner()
        ))
    })?;

    let match_count = request.match_count.unwrap_or(DEFAULT_MATCH_COUNT);

    let embedding = embedder.embed(query).await.map_err(translate_vector_error)?;
    let rows = store
        .match_attendees(&embedding, match_count, MATCH_THRESHOLD)
        .await
        .map_err(translate_vector_error)?;

    info!(
        model = spec.model_id,
        candidates = rows.len(),
        "Vector prefilter complete"
    );

    if rows.is_empty() {
        return Ok(Json(MessageResponse::from_value(&json!({
            "summary": NO_VECTOR_MATCHES,
            "matches": []
        }))));
    }

    let formatted = format_for_ai(&rows);
    let attendees = serde_json::to_string_pretty(&formatted).map_err(anyhow::Error::from)?;

    let prompt = Prompt::new(prefiltered_context(&attendees))
        .system(SEARCH_SYSTEM)
        .question(search_question(query))
        .temperature(0.5)
        .max_tokens(16000)
        .timeout(VECTOR_LLM_TIMEOUT);

    let completion = state
        .llm
        .complete_json(spec, api_key, &prompt)
        .await
        .map_err(translate_vector_llm_error)?;

    Ok(Json(completion.into_message()))
}

/// POST /api/token-estimate
///
/// Rough prompt-size breakdown for a search, without calling any model.
pub async fn handle_token_estimate(
    payload: Result<Json<TokenEstimateRequest>, JsonRejection>,
) -> Result<Json<TokenEstimate>, AppError> {
    let Json(request) = payload?;
    Ok(Json(estimate_search_tokens(&request.query, &request.attendees)))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Only a missing or empty query is rejected; the text is forwarded as sent.
fn required_query(query: Option<&str>) -> Result<&str, AppError> {
    query
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::Validation("Search query is required".to_string()))
}

fn server_key(config: &Config, provider: Provider) -> Option<&str> {
    match provider {
        Provider::Anthropic => config.anthropic_api_key.as_deref(),
        Provider::Gemini => config.google_api_key.as_deref(),
        Provider::OpenAi => config.openai_api_key.as_deref(),
    }
}

/// Unknown aliases fall back to the default rather than failing the search.
fn vector_model(alias: Option<&str>) -> &'static ModelSpec {
    let Some(alias) = alias else {
        return &catalog::GEMINI_FLASH;
    };
    catalog::resolve(alias).unwrap_or_else(|| {
        warn!(
            "Unknown vector-search model '{alias}', using {}",
            catalog::GEMINI_FLASH.alias
        );
        &catalog::GEMINI_FLASH
    })
}

pub fn estimate_search_tokens(query: &str, attendees: &Value) -> TokenEstimate {
    let base_prompt_tokens = estimate_tokens(SEARCH_SYSTEM)
        + estimate_tokens(SCORE_REMINDER)
        + estimate_tokens(BASE_PROMPT);
    let attendee_tokens = estimate_tokens(&attendees_text(attendees));
    let query_tokens = estimate_tokens(&search_question(query));

    let profile_count = match attendees {
        Value::Array(list) => Some(list.len()),
        Value::String(text) => serde_json::from_str::<Value>(text)
            .ok()
            .and_then(|v| v.as_array().map(Vec::len)),
        _ => None,
    };
    let tokens_per_profile = profile_count
        .filter(|&n| n > 0)
        .map(|n| attendee_tokens.div_ceil(n));

    TokenEstimate {
        base_prompt_tokens,
        attendee_tokens,
        query_tokens,
        total_tokens: base_prompt_tokens + attendee_tokens + query_tokens,
        profile_count,
        tokens_per_profile,
    }
}

/// Maps a provider failure on `/api/search` to the client contract:
/// auth problems become 401 "Invalid API key", other provider errors keep
/// their status with the provider's message as details.
fn translate_search_error(err: LlmError) -> AppError {
    let LlmError::Api {
        provider,
        status,
        body,
    } = err
    else {
        return AppError::Llm(err.to_string());
    };

    let Some(detail) = parse_api_error(&body) else {
        return AppError::Upstream {
            status,
            error: format!("API request failed: {status}"),
            details: Some(body),
        };
    };

    let message = detail.message.unwrap_or_else(|| "Unknown error".to_string());
    let error_type = match provider {
        Provider::Gemini => "api_error".to_string(),
        _ => detail.error_type.unwrap_or_else(|| "unknown".to_string()),
    };

    if error_type.to_lowercase().contains("authentication")
        || message.to_lowercase().contains("auth")
    {
        return AppError::InvalidApiKey(message);
    }

    AppError::Upstream {
        status,
        error: format!("API error ({error_type})"),
        details: Some(message),
    }
}

fn translate_vector_error(err: VectorError) -> AppError {
    match err {
        VectorError::Api { status, body } => upstream_with_body(status, body),
        other => AppError::Llm(other.to_string()),
    }
}

fn translate_vector_llm_error(err: LlmError) -> AppError {
    match err {
        LlmError::Api { status, body, .. } => upstream_with_body(status, body),
        other => AppError::Llm(other.to_string()),
    }
}

fn upstream_with_body(status: u16, body: String) -> AppError {
    AppError::Upstream {
        status,
        error: format!("API error: {status}"),
        details: Some(body),
    }
}
