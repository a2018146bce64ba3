//! Site-wide password gate.
//!
//! When `SITE_PASSWORD` is set every request must carry either the
//! `site-auth` cookie or HTTP Basic credentials with that password. A
//! successful Basic login also sets the cookie so the browser stops asking.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

use crate::errors::error_body;

pub const COOKIE_NAME: &str = "site-auth";
const COOKIE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 7;
const EXEMPT_PATHS: &[&str] = &["/health", "/api/auth"];

/// Middleware for `axum::middleware::from_fn_with_state`, with the site
/// password as state.
pub async fn site_gate(
    State(password): State<Arc<str>>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || EXEMPT_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    if cookie_value(request.headers(), COOKIE_NAME).as_deref() == Some(&*password) {
        return next.run(request).await;
    }

    if basic_password(request.headers()).as_deref() == Some(&*password) {
        let mut response = next.run(request).await;
        if let Ok(cookie) = HeaderValue::from_str(&auth_cookie(&password)) {
            response.headers_mut().append(header::SET_COOKIE, cookie);
        }
        return response;
    }

    debug!(path = request.uri().path(), "Site gate rejected request");
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"handenheit\"")],
        error_body("Authentication required"),
    )
        .into_response()
}

fn auth_cookie(password: &str) -> String {
    format!(
        "{COOKIE_NAME}={password}; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age={COOKIE_MAX_AGE_SECS}"
    )
}

/// Value of the named cookie across all `Cookie` headers.
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Password half of `Authorization: Basic base64(user:password)`. The user
/// name is ignored.
fn basic_password(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?.trim();
    let decoded = String::from_utf8(STANDARD.decode(encoded).ok()?).ok()?;
    let (_, password) = decoded.split_once(':')?;
    Some(password.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use reqwest::Client;
    use serde_json::json;

    use crate::config::Config;
    use crate::routes::build_router;
    use crate::state::AppState;
    use crate::test_support::{call, post_json};

    fn gated_app() -> axum::Router {
        let config = Config {
            site_password: Some("open sesame".to_string()),
            handenheit_password: Some("login".to_string()),
            ..Config::default()
        };
        build_router(AppState::from_config(config, Client::new()))
    }

    fn get(uri: &str, header: Option<(header::HeaderName, String)>) -> Request {
        let mut builder = axum::http::Request::builder().method(Method::GET).uri(uri);
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_cookie_value_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; site-auth=abc=def ; other=1"),
        );
        assert_eq!(cookie_value(&headers, "site-auth").as_deref(), Some("abc=def"));
        assert!(cookie_value(&headers, "missing").is_none());
    }

    #[test]
    fn test_basic_password_keeps_colons() {
        let mut headers = HeaderMap::new();
        let encoded = STANDARD.encode("anyone:pa:ss");
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {encoded}")).unwrap(),
        );
        assert_eq!(basic_password(&headers).as_deref(), Some("pa:ss"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer x"));
        assert!(basic_password(&headers).is_none());
    }

    #[tokio::test]
    async fn test_health_is_exempt() {
        let (status, _, body) = call(gated_app(), get("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_login_is_exempt() {
        let (status, _, _) = call(
            gated_app(),
            post_json("/api/auth", json!({ "password": "login" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unauthenticated_request_is_challenged() {
        let (status, headers, body) = call(
            gated_app(),
            post_json("/api/token-estimate", json!({ "query": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Authentication required" }));
        assert_eq!(
            headers.get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"handenheit\""
        );
    }

    #[tokio::test]
    async fn test_cookie_passes() {
        let mut request = post_json("/api/token-estimate", json!({ "query": "x" }));
        request.headers_mut().insert(
            header::COOKIE,
            HeaderValue::from_static("site-auth=open sesame"),
        );
        let (status, headers, _) = call(gated_app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_basic_auth_sets_cookie() {
        let encoded = STANDARD.encode("guest:open sesame");
        let mut request = post_json("/api/token-estimate", json!({ "query": "x" }));
        request.headers_mut().insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {encoded}")).unwrap(),
        );

        let (status, headers, _) = call(gated_app(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers.get(header::SET_COOKIE).unwrap(),
            "site-auth=open sesame; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age=604800"
        );
    }

    #[tokio::test]
    async fn test_wrong_basic_password_is_rejected() {
        let encoded = STANDARD.encode("guest:nope");
        let (status, _, _) = call(
            gated_app(),
            get(
                "/api/search",
                Some((header::AUTHORIZATION, format!("Basic {encoded}"))),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_preflight_is_exempt() {
        let request = axum::http::Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/search")
            .header(header::ORIGIN, "https://example.org")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let (status, headers, _) = call(gated_app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
            "GET,POST,OPTIONS"
        );
        assert!(headers.get(header::WWW_AUTHENTICATE).is_none());
    }
}
