use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{empty_usage, Completion, LlmError, ModelSpec, Prompt};

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    system: Vec<ContentPart<'a>>,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text {
        text: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        cache_control: Option<CacheControl>,
    },
    Document {
        source: DocumentSource<'a>,
    },
}

#[derive(Debug, Serialize)]
struct DocumentSource<'a> {
    #[serde(rename = "type")]
    source_type: &'a str,
    media_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
struct CacheControl {
    #[serde(rename = "type")]
    kind: &'static str,
}

fn cache_control(enabled: bool) -> Option<CacheControl> {
    enabled.then_some(CacheControl { kind: "ephemeral" })
}

pub(super) fn request_body(spec: &ModelSpec, prompt: &Prompt) -> Result<Value, LlmError> {
    let mut system = Vec::new();
    if !prompt.system.is_empty() {
        system.push(ContentPart::Text {
            text: &prompt.system,
            cache_control: cache_control(prompt.cache_context),
        });
    }

    let mut content = Vec::new();
    if let Some(data) = prompt.document.as_deref() {
        content.push(ContentPart::Document {
            source: DocumentSource {
                source_type: "base64",
                media_type: "application/pdf",
                data,
            },
        });
    }
    content.push(ContentPart::Text {
        text: &prompt.context,
        cache_control: cache_control(prompt.cache_context),
    });
    if !prompt.question.is_empty() {
        content.push(ContentPart::Text {
            text: &prompt.question,
            cache_control: None,
        });
    }

    let request = AnthropicRequest {
        model: spec.model_id,
        max_tokens: prompt.max_tokens,
        temperature: prompt.temperature,
        system,
        messages: vec![AnthropicMessage {
            role: "user",
            content,
        }],
    };

    Ok(serde_json::to_value(request)?)
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
    usage: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

/// Takes the first text block. Thinking or tool blocks ahead of it are skipped.
pub(super) fn extract(response: Value) -> Result<Completion, String> {
    let response: AnthropicResponse =
        serde_json::from_value(response).map_err(|e| e.to_string())?;

    let text = response
        .content
        .into_iter()
        .find(|b| b.block_type == "text")
        .and_then(|b| b.text)
        .ok_or_else(|| "response contained no text content".to_string())?;

    Ok(Completion {
        text,
        usage: response.usage.unwrap_or_else(empty_usage),
    })
}
