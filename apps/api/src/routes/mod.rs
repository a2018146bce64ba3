pub mod health;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::attendees::handlers as attendees;
use crate::auth::{gate::site_gate, handlers as auth};
use crate::extract::handlers as extract;
use crate::search::handlers as search;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let site_password = state.config.site_password.clone();
    let body_limit = state.config.max_body_bytes;

    let router = Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/auth", post(auth::handle_auth))
        // Search
        .route("/api/search", post(search::handle_search))
        .route("/api/vector-search", post(search::handle_vector_search))
        .route("/api/token-estimate", post(search::handle_token_estimate))
        // Attendee profiles
        .route(
            "/api/sync-attendees",
            post(attendees::handle_sync_attendees),
        )
        .route("/api/extract-pdf", post(extract::handle_extract_pdf))
        .route(
            "/api/extract-pdf/upload",
            post(extract::handle_extract_pdf_upload),
        )
        .with_state(state);

    let router = match site_password {
        Some(password) => {
            info!("Site gate enabled");
            router.layer(middleware::from_fn_with_state(
                Arc::<str>::from(password),
                site_gate,
            ))
        }
        None => router,
    };

    // CORS stays outermost: preflights never reach the gate.
    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
}
