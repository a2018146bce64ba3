// Shared prompt fragments and prompt-sizing utilities.
// Each feature that calls the LLM keeps its own prompts.rs alongside it;
// this file only holds what more than one of them needs.

/// Closing instruction for prompts that must yield bare JSON.
pub const JSON_ONLY_SUFFIX: &str =
    "Return ONLY valid JSON, no markdown code blocks, no explanations.";

/// Rough token count: one token per four characters of English text.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}
