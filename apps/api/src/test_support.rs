//! Test doubles shared by handler and client tests.
//!
//! `MockUpstream` is a throwaway axum server on an ephemeral port that stands
//! in for Anthropic, Gemini, OpenAI or Supabase: it records every request and
//! answers from a queue of canned replies.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::attendees::models::AttendeeRow;
use crate::vector::{AttendeeStore, Embedder, VectorError, VectorResult};

#[derive(Debug, Clone)]
pub struct Reply {
    status: u16,
    body: String,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    /// A non-JSON body, e.g. an HTML error page from a proxy.
    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Value,
}

impl SeenRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Clone, Default)]
struct Shared {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

pub struct MockUpstream {
    addr: SocketAddr,
    shared: Shared,
}

impl MockUpstream {
    pub async fn start(replies: Vec<Reply>) -> Self {
        let shared = Shared {
            replies: Arc::new(Mutex::new(replies.into())),
            seen: Arc::default(),
        };
        let app = Router::new().fallback(record).with_state(shared.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, shared }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.shared.seen.lock().unwrap().clone()
    }
}

async fn record(
    State(shared): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    shared.seen.lock().unwrap().push(SeenRequest {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    let reply = shared
        .replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Reply::status(500, json!({ "error": { "message": "no reply queued" } })));

    (
        StatusCode::from_u16(reply.status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        reply.body,
    )
        .into_response()
}

/// Embedder that returns a fixed vector, or fails for texts containing
/// `fail_on`.
pub struct FakeEmbedder {
    pub vector: Vec<f32>,
    pub fail_on: Option<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            fail_on: None,
            calls: Mutex::default(),
        }
    }

    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> VectorResult<Vec<f32>> {
        self.calls.lock().unwrap().push(text.to_string());
        if let Some(needle) = &self.fail_on {
            if text.contains(needle.as_str()) {
                return Err(VectorError::Api {
                    status: 429,
                    body: "Resource has been exhausted".to_string(),
                });
            }
        }
        Ok(self.vector.clone())
    }
}

/// In-memory store: returns canned match rows and records upserts.
#[derive(Default)]
pub struct FakeStore {
    pub rows: Vec<Value>,
    pub upserts: Mutex<Vec<AttendeeRow>>,
    pub match_calls: Mutex<Vec<(u32, f32)>>,
}

impl FakeStore {
    pub fn with_rows(rows: Vec<Value>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }
}

#[async_trait]
impl AttendeeStore for FakeStore {
    async fn match_attendees(
        &self,
        _embedding: &[f32],
        count: u32,
        threshold: f32,
    ) -> VectorResult<Vec<Value>> {
        self.match_calls.lock().unwrap().push((count, threshold));
        Ok(self.rows.iter().take(count as usize).cloned().collect())
    }

    async fn upsert(&self, row: &AttendeeRow) -> VectorResult<()> {
        self.upserts.lock().unwrap().push(row.clone());
        Ok(())
    }
}

/// Sends one request through the router and returns status, headers and the
/// JSON body (`Value::Null` when the body is empty or not JSON).
pub async fn call(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
