//! Embedding and vector storage.
//!
//! Both sides are traits so handlers hold `Arc<dyn Embedder>` /
//! `Arc<dyn AttendeeStore>` and tests can swap in in-memory fakes:
//!
//! - [`Embedder`] - text → vector (Gemini `text-embedding-004`)
//! - [`AttendeeStore`] - upsert profiles and run the similarity RPC (Supabase)

use std::time::Duration;

use thiserror::Error;

pub mod embedder;
pub mod store;

pub use embedder::{Embedder, GeminiEmbedder};
pub use store::{AttendeeStore, SupabaseStore};

/// Timeout for every embedding and Supabase call.
pub const VECTOR_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx from the embedding API or Supabase, raw body kept.
    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    Response(String),
}

pub type VectorResult<T> = Result<T, VectorError>;

/// Turns a non-2xx response into `VectorError::Api`, passing successes through.
pub(crate) async fn check_status(response: reqwest::Response) -> VectorResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(VectorError::Api {
        status: status.as_u16(),
        body,
    })
}
