use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{empty_usage, Completion, LlmError, ModelSpec, Prompt, Provider};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

/// The context rides in the system message so OpenAI's automatic prefix
/// caching can reuse it across queries.
pub(super) fn request_body(spec: &ModelSpec, prompt: &Prompt) -> Result<Value, LlmError> {
    if prompt.document.is_some() {
        return Err(LlmError::Unsupported {
            provider: Provider::OpenAi,
            feature: "document input",
        });
    }

    let system = if prompt.system.is_empty() {
        prompt.context.clone()
    } else {
        format!("{}\n\n{}", prompt.system, prompt.context)
    };

    let mut messages = vec![ChatMessage {
        role: "system",
        content: system,
    }];
    if !prompt.question.is_empty() {
        messages.push(ChatMessage {
            role: "user",
            content: prompt.question.clone(),
        });
    }

    let request = ChatRequest {
        model: spec.model_id,
        messages,
        temperature: prompt.temperature,
        max_tokens: prompt.max_tokens,
    };

    Ok(serde_json::to_value(request)?)
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub(super) fn extract(response: Value) -> Result<Completion, String> {
    let response: ChatResponse = serde_json::from_value(response).map_err(|e| e.to_string())?;

    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| "response contained no message content".to_string())?;

    Ok(Completion {
        text,
        usage: response.usage.unwrap_or_else(empty_usage),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::catalog;
    use serde_json::json;

    #[test]
    fn test_context_goes_into_system_message() {
        let prompt = Prompt::new("Attendee database:\n[]")
            .system("You are a precise JSON generator.")
            .question("Search query: \"ml\"")
            .temperature(0.5);
        let body = request_body(catalog::resolve("gpt-4o").unwrap(), &prompt).unwrap();

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 4000);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(
            messages[0]["content"],
            "You are a precise JSON generator.\n\nAttendee database:\n[]"
        );
        assert_eq!(messages[1]["content"], "Search query: \"ml\"");
    }

    #[test]
    fn test_extract_first_choice() {
        let completion = extract(json!({
            "choices": [{ "message": { "role": "assistant", "content": "{}" } }],
            "usage": { "total_tokens": 9 }
        }))
        .unwrap();
        assert_eq!(completion.text, "{}");
        assert_eq!(completion.usage["total_tokens"], 9);
    }

    #[test]
    fn test_extract_null_content_fails() {
        assert!(extract(json!({ "choices": [{ "message": { "content": null } }] })).is_err());
    }
}
