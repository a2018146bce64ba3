//! Coercing LLM free text into JSON.
//!
//! Models are told to return bare JSON but regularly wrap it in markdown
//! fences, leave raw newlines inside string literals, or add a sentence of
//! chatter around the object. `parse_llm_json` undoes each of those in turn
//! and reports the first parse error if nothing works.

use serde_json::Value;

/// Strips a leading ```` ```json ```` / ```` ``` ```` fence and a trailing
/// ```` ``` ```` fence. Either side may be missing.
pub fn strip_json_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    }
    if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

pub fn parse_llm_json(text: &str) -> Result<Value, serde_json::Error> {
    let text = strip_json_fences(text);

    let first_error = match serde_json::from_str(text) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let escaped = escape_control_chars_in_strings(text);
    if let Ok(value) = serde_json::from_str(&escaped) {
        return Ok(value);
    }

    if let Some(object) = outermost_object(text) {
        if let Ok(value) = serde_json::from_str(object) {
            return Ok(value);
        }
        if let Ok(value) = serde_json::from_str(&escape_control_chars_in_strings(object)) {
            return Ok(value);
        }
    }

    Err(first_error)
}

/// Escapes raw newlines, carriage returns and tabs that appear inside string
/// literals. Characters outside strings are left alone.
fn escape_control_chars_in_strings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(c);
                continue;
            }
            match c {
                '\\' => {
                    escaped = true;
                    out.push(c);
                }
                '"' => {
                    in_string = false;
                    out.push(c);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                _ => out.push(c),
            }
        } else {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
        }
    }

    out
}

/// The span from the first `{` to the last `}`, inclusive.
fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
