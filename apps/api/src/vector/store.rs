use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{check_status, VectorError, VectorResult, VECTOR_TIMEOUT};
use crate::attendees::models::AttendeeRow;

/// Persistence for attendee profiles and their embeddings.
#[async_trait]
pub trait AttendeeStore: Send + Sync {
    /// Rows whose embedding similarity to `embedding` is above `threshold`,
    /// best first, at most `count`.
    async fn match_attendees(
        &self,
        embedding: &[f32],
        count: u32,
        threshold: f32,
    ) -> VectorResult<Vec<Value>>;

    /// Insert or replace by primary key.
    async fn upsert(&self, row: &AttendeeRow) -> VectorResult<()>;
}

/// Supabase over PostgREST: the `attendees` table plus the
/// `match_attendees` pgvector RPC.
#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseStore {
    pub fn new(client: Client, base_url: &str, service_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        }
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}/rest/v1/{path}", self.base_url))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .timeout(VECTOR_TIMEOUT)
    }
}

#[derive(Debug, Serialize)]
struct MatchParams<'a> {
    query_embedding: &'a [f32],
    match_threshold: f32,
    match_count: u32,
}

#[async_trait]
impl AttendeeStore for SupabaseStore {
    async fn match_attendees(
        &self,
        embedding: &[f32],
        count: u32,
        threshold: f32,
    ) -> VectorResult<Vec<Value>> {
        let params = MatchParams {
            query_embedding: embedding,
            match_threshold: threshold,
            match_count: count,
        };
        let response = self.post("rpc/match_attendees").json(&params).send().await?;
        let response = check_status(response).await?;

        let rows = match response.json::<Value>().await? {
            Value::Array(rows) => rows,
            Value::Null => Vec::new(),
            other => {
                return Err(VectorError::Response(format!(
                    "match_attendees returned {other}, expected an array"
                )))
            }
        };

        debug!(count = rows.len(), "Supabase similarity search returned rows");
        Ok(rows)
    }

    async fn upsert(&self, row: &AttendeeRow) -> VectorResult<()> {
        let response = self
            .post("attendees")
            .header("Prefer", "resolution=merge-duplicates")
            .json(row)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}
