use std::fmt;

/// Upstream LLM vendor. Each one has its own request body, response shape and
/// error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    Gemini,
    OpenAi,
}

impl Provider {
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Anthropic => "Anthropic",
            Provider::Gemini => "Gemini",
            Provider::OpenAi => "OpenAI",
        }
    }

    /// Vendor name used in "API key not configured" messages.
    pub fn key_owner(&self) -> &'static str {
        match self {
            Provider::Anthropic => "Anthropic",
            Provider::Gemini => "Google",
            Provider::OpenAi => "OpenAI",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A client-facing model alias and the upstream model it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    pub alias: &'static str,
    pub provider: Provider,
    pub model_id: &'static str,
}

pub const CLAUDE_SONNET: &str = "claude-sonnet-4-20250514";

/// Default model for vector-prefiltered search.
pub const GEMINI_FLASH: ModelSpec = ModelSpec {
    alias: "gemini-flash",
    provider: Provider::Gemini,
    model_id: "gemini-2.0-flash",
};

const CATALOG: &[ModelSpec] = &[
    ModelSpec {
        alias: "claude-sonnet",
        provider: Provider::Anthropic,
        model_id: CLAUDE_SONNET,
    },
    ModelSpec {
        alias: "claude",
        provider: Provider::Anthropic,
        model_id: CLAUDE_SONNET,
    },
    ModelSpec {
        alias: "gemini-3-pro",
        provider: Provider::Gemini,
        model_id: "gemini-3-pro-preview",
    },
    ModelSpec {
        alias: "gemini-3-flash",
        provider: Provider::Gemini,
        model_id: "gemini-3-flash-preview",
    },
    ModelSpec {
        alias: "gemini-pro",
        provider: Provider::Gemini,
        model_id: "gemini-2.5-pro-preview-06-05",
    },
    GEMINI_FLASH,
    ModelSpec {
        alias: "gpt-4o",
        provider: Provider::OpenAi,
        model_id: "gpt-4o",
    },
    ModelSpec {
        alias: "gpt-4o-mini",
        provider: Provider::OpenAi,
        model_id: "gpt-4o-mini",
    },
];

/// Looks up a model alias. Matching is exact.
pub fn resolve(alias: &str) -> Option<&'static ModelSpec> {
    CATALOG.iter().find(|spec| spec.alias == alias)
}

/// The Claude model used for PDF extraction.
pub fn extraction_model() -> &'static ModelSpec {
    &CATALOG[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_aliases() {
        let spec = resolve("gemini-3-flash").unwrap();
        assert_eq!(spec.provider, Provider::Gemini);
        assert_eq!(spec.model_id, "gemini-3-flash-preview");

        assert_eq!(resolve("claude").unwrap().model_id, CLAUDE_SONNET);
        assert_eq!(resolve("gpt-4o-mini").unwrap().provider, Provider::OpenAi);
    }

    #[test]
    fn test_resolve_unknown_alias() {
        assert!(resolve("llama-3").is_none());
        assert!(resolve("Claude-Sonnet").is_none());
    }

    #[test]
    fn test_gemini_flash_is_listed() {
        assert_eq!(resolve(GEMINI_FLASH.alias), Some(&GEMINI_FLASH));
    }

    #[test]
    fn test_extraction_model_is_claude() {
        assert_eq!(extraction_model().provider, Provider::Anthropic);
    }
}
