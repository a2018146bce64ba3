use anyhow::{Context, Result};

pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Application configuration loaded from environment variables.
///
/// Provider keys are optional: handlers report a "not configured" error for
/// the specific key they need instead of refusing to start.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub anthropic_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_service_key: Option<String>,
    /// Password checked by `POST /api/auth`.
    pub handenheit_password: Option<String>,
    /// When set, every route except health and login sits behind the site gate.
    pub site_password: Option<String>,
    pub anthropic_base_url: String,
    pub gemini_base_url: String,
    pub openai_base_url: String,
    pub llm_max_attempts: u32,
    pub max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: parse_env("PORT", 8000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            google_api_key: optional_env("GOOGLE_API_KEY"),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            supabase_url: optional_env("SUPABASE_URL"),
            supabase_service_key: optional_env("SUPABASE_SERVICE_KEY"),
            handenheit_password: optional_env("HANDENHEIT_PASSWORD"),
            site_password: optional_env("SITE_PASSWORD"),
            anthropic_base_url: optional_env("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_BASE_URL.to_string()),
            gemini_base_url: optional_env("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            openai_base_url: optional_env("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            llm_max_attempts: parse_env::<u32>("LLM_MAX_ATTEMPTS", 1)?.max(1),
            max_body_bytes: parse_env("MAX_BODY_BYTES", 25 * 1024 * 1024)?,
        })
    }

    /// Supabase URL and service key, only when both are present.
    pub fn supabase(&self) -> Option<(&str, &str)> {
        match (&self.supabase_url, &self.supabase_service_key) {
            (Some(url), Some(key)) => Some((url.as_str(), key.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
impl Default for Config {
    fn default() -> Self {
        Config {
            port: 0,
            rust_log: "debug".to_string(),
            anthropic_api_key: None,
            google_api_key: None,
            openai_api_key: None,
            supabase_url: None,
            supabase_service_key: None,
            handenheit_password: None,
            site_password: None,
            anthropic_base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            llm_max_attempts: 1,
            max_body_bytes: 25 * 1024 * 1024,
        }
    }
}

/// Empty values are treated the same as unset ones.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}
