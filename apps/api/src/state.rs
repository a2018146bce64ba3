use std::sync::Arc;

use reqwest::Client;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::vector::{AttendeeStore, Embedder, GeminiEmbedder, SupabaseStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub llm: LlmClient,
    /// Present when `GOOGLE_API_KEY` is set.
    pub embedder: Option<Arc<dyn Embedder>>,
    /// Present when both Supabase variables are set.
    pub store: Option<Arc<dyn AttendeeStore>>,
}

impl AppState {
    /// Wires the real provider clients from config, sharing one HTTP
    /// connection pool between them.
    pub fn from_config(config: Config, client: Client) -> Self {
        let llm = LlmClient::new(client.clone(), &config);

        let embedder = config.google_api_key.clone().map(|key| {
            Arc::new(GeminiEmbedder::new(client.clone(), &config.gemini_base_url, key))
                as Arc<dyn Embedder>
        });

        let store = config.supabase().map(|(url, key)| {
            Arc::new(SupabaseStore::new(client.clone(), url, key.to_string()))
                as Arc<dyn AttendeeStore>
        });

        Self {
            config,
            llm,
            embedder,
            store,
        }
    }
}
