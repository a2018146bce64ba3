use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{empty_usage, Completion, LlmError, Prompt, Provider};

/// Openings that mean Gemini answered in prose instead of JSON.
const REFUSAL_PREFIXES: &[&str] = &["an error", "i apologize", "i cannot", "sorry"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent<'a>>,
    contents: Vec<GeminiContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_output_tokens: u32,
}

pub(super) fn request_body(prompt: &Prompt) -> Result<Value, LlmError> {
    if prompt.document.is_some() {
        return Err(LlmError::Unsupported {
            provider: Provider::Gemini,
            feature: "document input",
        });
    }

    let system_instruction = (!prompt.system.is_empty()).then(|| GeminiContent {
        role: None,
        parts: vec![RequestPart {
            text: prompt.system.clone(),
        }],
    });

    let request = GeminiRequest {
        system_instruction,
        contents: vec![GeminiContent {
            role: Some("user"),
            parts: vec![RequestPart {
                text: prompt.joined_text(),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: prompt.temperature,
            max_output_tokens: prompt.max_tokens,
        },
    };

    Ok(serde_json::to_value(request)?)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ErrorBody>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

pub(super) fn extract(response: Value) -> Result<Completion, String> {
    let response: GeminiResponse = serde_json::from_value(response).map_err(|e| e.to_string())?;

    let Some(candidate) = response.candidates.into_iter().next() else {
        if let Some(error) = response.error {
            return Err(format!(
                "Gemini API error: {}",
                error.message.as_deref().unwrap_or("Unknown error")
            ));
        }
        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(format!("Request blocked: {reason}"));
        }
        return Err("No candidates in Gemini response - the model may have hit output limits or safety filters".to_string());
    };

    let finish_reason = candidate.finish_reason.unwrap_or_default();
    match finish_reason.as_str() {
        "MAX_TOKENS" => {
            return Err("Gemini response was cut off due to max output tokens limit. Try reducing the number of profiles or using a model with higher limits.".to_string())
        }
        "SAFETY" => return Err("Gemini blocked the response due to safety filters".to_string()),
        "RECITATION" => {
            return Err("Gemini blocked the response due to recitation concerns".to_string())
        }
        _ => {}
    }

    let text = candidate
        .content
        .and_then(|c| c.parts)
        .and_then(|parts| parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or_else(|| format!("Unexpected response structure. Finish reason: {finish_reason}"))?;

    let lowered = text.trim().to_lowercase();
    if REFUSAL_PREFIXES.iter().any(|p| lowered.starts_with(p)) {
        let preview: String = text.chars().take(200).collect();
        return Err(format!(
            "Gemini returned an error message instead of JSON: {preview}..."
        ));
    }

    Ok(Completion {
        text,
        usage: response.usage_metadata.unwrap_or_else(empty_usage),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate(text: &str, finish: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }], "role": "model" },
                "finishReason": finish
            }]
        })
    }

    #[test]
    fn test_request_body_shape() {
        let prompt = Prompt::new("ctx")
            .system("sys")
            .question("Search query: \"q\"")
            .temperature(0.5)
            .max_tokens(16000);
        let body = request_body(&prompt).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(
            body["contents"][0]["parts"][0]["text"],
            "ctx\n\nSearch query: \"q\"\n"
        );
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 16000);
        assert_eq!(body["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn test_document_is_rejected() {
        let prompt = Prompt::new("ctx").document("JVBERi0=");
        assert!(matches!(
            request_body(&prompt),
            Err(LlmError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_extract_text() {
        let completion = extract(candidate("{\"matches\": []}", "STOP")).unwrap();
        assert_eq!(completion.text, "{\"matches\": []}");
    }

    #[test]
    fn test_no_candidates_reports_block_reason() {
        let err = extract(json!({ "promptFeedback": { "blockReason": "SAFETY" } })).unwrap_err();
        assert_eq!(err, "Request blocked: SAFETY");
    }

    #[test]
    fn test_no_candidates_reports_api_error() {
        let err = extract(json!({ "error": { "message": "quota exceeded" } })).unwrap_err();
        assert_eq!(err, "Gemini API error: quota exceeded");
    }

    #[test]
    fn test_no_candidates_generic() {
        let err = extract(json!({ "candidates": [] })).unwrap_err();
        assert!(err.starts_with("No candidates in Gemini response"));
    }

    #[test]
    fn test_max_tokens_finish_reason() {
        let err = extract(candidate("{\"summary\": \"trunc", "MAX_TOKENS")).unwrap_err();
        assert!(err.contains("max output tokens"));
    }

    #[test]
    fn test_recitation_finish_reason() {
        let err = extract(candidate("", "RECITATION")).unwrap_err();
        assert!(err.contains("recitation"));
    }

    #[test]
    fn test_missing_parts() {
        let err = extract(json!({ "candidates": [{ "finishReason": "OTHER" }] })).unwrap_err();
        assert_eq!(err, "Unexpected response structure. Finish reason: OTHER");
    }

    #[test]
    fn test_refusal_is_rejected() {
        let err = extract(candidate("  I apologize, but I can't do that.", "STOP")).unwrap_err();
        assert!(err.starts_with("Gemini returned an error message instead of JSON:"));
    }
}
