use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::attendees::models::{Attendee, AttendeeRow};
use crate::attendees::text::embedding_text;
use crate::errors::AppError;
use crate::state::AppState;
use crate::vector::{AttendeeStore, Embedder};

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    /// Raw values; each profile is decoded on its own.
    #[serde(default)]
    pub attendees: Option<Vec<Value>>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SyncFailure {
    pub id: Value,
    pub name: Value,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<SyncFailure>,
}

/// POST /api/sync-attendees
///
/// Embeds each profile and upserts it into Supabase, one at a time and in
/// order. Per-profile failures are collected rather than aborting the batch.
pub async fn handle_sync_attendees(
    State(state): State<AppState>,
    payload: Result<Json<SyncRequest>, JsonRejection>,
) -> Result<Json<SyncResponse>, AppError> {
    let Json(request) = payload?;

    let attendees = request
        .attendees
        .filter(|list| !list.is_empty())
        .ok_or_else(|| AppError::Validation("No attendees provided".to_string()))?;
    let store = state
        .store
        .as_ref()
        .ok_or_else(|| AppError::NotConfigured("Supabase not configured".to_string()))?;
    let embedder = state
        .embedder
        .as_ref()
        .ok_or_else(|| AppError::NotConfigured("Google API key not configured".to_string()))?;

    info!(count = attendees.len(), "Syncing attendees");

    let mut response = SyncResponse {
        success: 0,
        failed: 0,
        errors: Vec::new(),
    };

    for raw in &attendees {
        match sync_one(embedder.as_ref(), store.as_ref(), raw).await {
            Ok(()) => response.success += 1,
            Err(error) => {
                let id = raw.get("id").cloned().unwrap_or_default();
                warn!(id = %id, "Attendee sync failed: {error}");
                response.failed += 1;
                response.errors.push(SyncFailure {
                    id,
                    name: raw.get("name").cloned().unwrap_or(Value::Null),
                    error,
                });
            }
        }
    }

    info!(
        success = response.success,
        failed = response.failed,
        "Attendee sync finished"
    );
    Ok(Json(response))
}

async fn sync_one(
    embedder: &dyn Embedder,
    store: &dyn AttendeeStore,
    raw: &Value,
) -> Result<(), String> {
    let attendee: Attendee =
        serde_json::from_value(raw.clone()).map_err(|e| format!("Invalid attendee: {e}"))?;
    let id = attendee
        .id_string()
        .ok_or_else(|| "Attendee is missing an id".to_string())?;

    let embedding = embedder
        .embed(&embedding_text(&attendee))
        .await
        .map_err(|e| e.to_string())?;
    let row = AttendeeRow::new(id, &attendee, embedding).map_err(|e| e.to_string())?;
    store.upsert(&row).await.map_err(|e| e.to_string())
}
