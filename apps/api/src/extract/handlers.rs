use std::time::Duration;

use axum::{
    extract::multipart::MultipartRejection,
    extract::rejection::JsonRejection,
    extract::{Multipart, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::extract::prompts::extraction_prompt;
use crate::llm_client::{catalog, parse_api_error, LlmError, Prompt};
use crate::state::AppState;

const EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    /// Base64-encoded PDF.
    #[serde(default)]
    pub pdf: Option<String>,
    #[serde(default)]
    pub school: Option<String>,
}

/// POST /api/extract-pdf
pub async fn handle_extract_pdf(
    State(state): State<AppState>,
    payload: Result<Json<ExtractRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload?;

    let pdf = request
        .pdf
        .as_deref()
        .map(str::trim)
        .filter(|pdf| !pdf.is_empty())
        .ok_or_else(pdf_required)?;
    if STANDARD.decode(pdf).is_err() {
        return Err(AppError::Validation(
            "PDF data is not valid base64".to_string(),
        ));
    }

    let profile = extract_profile(&state, pdf.to_string(), request.school.as_deref()).await?;
    Ok(Json(profile))
}

/// POST /api/extract-pdf/upload
///
/// Multipart variant: a `file` part with the raw PDF and an optional
/// `school` text part.
pub async fn handle_extract_pdf_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, AppError> {
    let mut multipart = multipart?;
    let mut file: Option<Vec<u8>> = None;
    let mut school: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("file") => file = Some(field.bytes().await?.to_vec()),
            Some("school") => school = Some(field.text().await?),
            _ => {}
        }
    }

    let file = file.filter(|bytes| !bytes.is_empty()).ok_or_else(pdf_required)?;
    info!(bytes = file.len(), "Received PDF upload");

    let profile = extract_profile(&state, STANDARD.encode(&file), school.as_deref()).await?;
    Ok(Json(profile))
}

fn pdf_required() -> AppError {
    AppError::Validation("PDF data is required".to_string())
}

/// Sends the PDF to Claude and stamps the parsed profile with the school and
/// extraction time.
async fn extract_profile(
    state: &AppState,
    pdf_base64: String,
    school: Option<&str>,
) -> Result<Value, AppError> {
    let api_key = state.config.anthropic_api_key.as_deref().ok_or_else(|| {
        AppError::NotConfigured("Anthropic API key not configured on server".to_string())
    })?;

    let spec = catalog::extraction_model();
    let prompt = Prompt::new(extraction_prompt())
        .document(pdf_base64)
        .max_tokens(4000)
        .timeout(EXTRACT_TIMEOUT);

    let completion = state
        .llm
        .complete_json(spec, api_key, &prompt)
        .await
        .map_err(translate_extract_error)?;

    let Value::Object(mut profile) = completion.value else {
        return Err(AppError::Llm(format!(
            "Failed to parse {} response: expected a JSON object",
            spec.provider
        )));
    };

    if let Some(school) = school.map(str::trim).filter(|s| !s.is_empty()) {
        profile.insert("school".to_string(), Value::String(school.to_string()));
    }
    profile.insert(
        "timestamp".to_string(),
        Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
    );

    let name = profile
        .get("name")
        .and_then(|name| name.as_str())
        .unwrap_or_default();
    info!(name, "Extracted profile from PDF");
    Ok(Value::Object(profile))
}

fn translate_extract_error(err: LlmError) -> AppError {
    let LlmError::Api { status, body, .. } = err else {
        return AppError::Llm(err.to_string());
    };

    match parse_api_error(&body) {
        Some(detail) => AppError::Upstream {
            status,
            error: format!(
                "API error: {}",
                detail.message.as_deref().unwrap_or("Unknown error")
            ),
            details: None,
        },
        None => AppError::Upstream {
            status,
            error: format!("API request failed: {status}"),
            details: Some(body),
        },
    }
}
