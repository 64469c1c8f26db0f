//! Server-side sessions.
//!
//! The browser holds an opaque random token in an `HttpOnly` cookie; the
//! store only ever sees its SHA-256 hash, so a leaked database dump cannot
//! be replayed as cookies. Expiry is enforced by the store at lookup time.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    Extension,
};
use tracing::{error, warn};
use url::Url;
use uuid::Uuid;

use super::{
    state::AuthState,
    types::{SessionResponse, SignoutResponse},
    utils::{generate_session_token, hash_session_token},
};

pub const SESSION_COOKIE_NAME: &str = "fakturo_session";

/// What a valid session resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub user_id: Uuid,
    pub email: String,
}

/// Persistence for sessions, keyed by token hash.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, user_id: Uuid, token_hash: Vec<u8>, ttl_seconds: i64) -> Result<()>;
    /// Expired sessions must resolve to `None`.
    async fn lookup(&self, token_hash: &[u8]) -> Result<Option<SessionRecord>>;
    async fn delete(&self, token_hash: &[u8]) -> Result<()>;
}

/// Create a session for `user_id` and return the raw token for the cookie.
pub async fn issue(state: &AuthState, user_id: Uuid) -> Result<String> {
    let token = generate_session_token()?;
    state
        .sessions()
        .insert(
            user_id,
            hash_session_token(&token),
            state.config().session_ttl_seconds(),
        )
        .await?;
    Ok(token)
}

/// Pick a safe post-login redirect target.
///
/// Only same-origin relative paths pass through; anything absolute,
/// scheme-relative, or otherwise odd falls back to `fallback` so the login
/// form can never be abused as an open redirector.
pub fn resolve_redirect<'a>(requested: Option<&'a str>, fallback: &'a str) -> &'a str {
    let Some(target) = requested.map(str::trim).filter(|target| !target.is_empty()) else {
        return fallback;
    };
    // Absolute URLs parse; relative paths do not.
    if Url::parse(target).is_ok() {
        return fallback;
    }
    if !target.starts_with('/') || target.starts_with("//") {
        return fallback;
    }
    if target.contains('\\') || target.chars().any(char::is_control) {
        return fallback;
    }
    target
}

/// Build the `Set-Cookie` header for a freshly issued session.
pub fn session_cookie(state: &AuthState, token: &str) -> Result<HeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        state.config().session_ttl_seconds()
    );
    if state.config().session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).context("Failed to build session cookie")
}

/// Build the `Set-Cookie` header that removes the session cookie.
pub fn clear_session_cookie(state: &AuthState) -> Result<HeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if state.config().session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).context("Failed to build session cookie")
}

/// Pull the session token out of the request, cookie first, then
/// `Authorization: Bearer` for non-browser clients.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get(axum::http::header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                (name == SESSION_COOKIE_NAME).then(|| value.to_string())
            })
        });
    if from_cookie.is_some() {
        return from_cookie;
    }

    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(ToString::to_string)
}

/// Resolve the request's session token to a live session, if any.
///
/// # Errors
/// Returns an error when the store fails; absence of a token or an expired
/// session is `Ok(None)`.
pub async fn authenticate_session(
    headers: &HeaderMap,
    state: &AuthState,
) -> Result<Option<SessionRecord>> {
    let Some(token) = extract_session_token(headers) else {
        return Ok(None);
    };
    state
        .sessions()
        .lookup(&hash_session_token(&token))
        .await
        .context("Session lookup failed")
}

// axum handler for session introspection
#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "A valid session is present", body = SessionResponse),
        (status = 204, description = "No valid session")
    ),
    tag = "auth"
)]
pub async fn session(
    Extension(state): Extension<Arc<AuthState>>,
    headers: HeaderMap,
) -> Response {
    match authenticate_session(&headers, &state).await {
        Ok(Some(record)) => Json(SessionResponse {
            user_id: record.user_id.to_string(),
            email: record.email,
        })
        .into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => {
            error!("Session introspection failed: {error:#}");
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

// axum handler for signout
#[utoipa::path(
    post,
    path = "/api/auth/signout",
    responses(
        (status = 200, description = "Session removed and cookie cleared", body = SignoutResponse)
    ),
    tag = "auth"
)]
pub async fn signout(
    Extension(state): Extension<Arc<AuthState>>,
    headers: HeaderMap,
) -> Response {
    // Best effort: the cookie is cleared even if the store is unreachable,
    // and signing out twice is not an error.
    if let Some(token) = extract_session_token(&headers) {
        if let Err(error) = state.sessions().delete(&hash_session_token(&token)).await {
            warn!("Failed to delete session on signout: {error:#}");
        }
    }

    let mut response = Json(SignoutResponse { success: true }).into_response();
    match clear_session_cookie(&state) {
        Ok(cookie) => {
            response.headers_mut().insert(SET_COOKIE, cookie);
        }
        Err(error) => error!("Failed to build clearing cookie: {error:#}"),
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::test_support::auth_state;

    #[test]
    fn resolve_redirect_defaults_when_absent_or_empty() {
        assert_eq!(resolve_redirect(None, "/home"), "/home");
        assert_eq!(resolve_redirect(Some(""), "/home"), "/home");
        assert_eq!(resolve_redirect(Some("   "), "/home"), "/home");
    }

    #[test]
    fn resolve_redirect_keeps_relative_paths() {
        assert_eq!(
            resolve_redirect(Some("/home/invoices"), "/home"),
            "/home/invoices"
        );
        assert_eq!(
            resolve_redirect(Some("/home/customers?page=2"), "/home"),
            "/home/customers?page=2"
        );
    }

    #[test]
    fn resolve_redirect_rejects_absolute_and_scheme_relative() {
        assert_eq!(
            resolve_redirect(Some("https://attacker.example/"), "/home"),
            "/home"
        );
        assert_eq!(resolve_redirect(Some("//evil.example"), "/home"), "/home");
        assert_eq!(
            resolve_redirect(Some("javascript:alert(1)"), "/home"),
            "/home"
        );
    }

    #[test]
    fn resolve_redirect_rejects_backslash_and_controls() {
        assert_eq!(resolve_redirect(Some("/\\evil.example"), "/home"), "/home");
        assert_eq!(resolve_redirect(Some("/home\r\nx"), "/home"), "/home");
        assert_eq!(resolve_redirect(Some("relative"), "/home"), "/home");
    }

    #[test]
    fn session_cookie_attributes() {
        let state = auth_state("http://localhost:3000");
        let cookie = session_cookie(&state, "tok").unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("fakturo_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(!cookie.contains("Secure"));

        let state = auth_state("https://admin.fakturo.dev");
        let cookie = session_cookie(&state, "tok").unwrap();
        assert!(cookie.to_str().unwrap().contains("Secure"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let state = auth_state("http://localhost:3000");
        let cookie = clear_session_cookie(&state).unwrap();
        assert!(cookie.to_str().unwrap().contains("Max-Age=0"));
    }

    #[test]
    fn extract_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("theme=dark; fakturo_session=abc123; lang=en"),
        );
        assert_eq!(extract_session_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn extract_token_falls_back_to_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc123"),
        );
        assert_eq!(extract_session_token(&headers).as_deref(), Some("abc123"));

        assert_eq!(extract_session_token(&HeaderMap::new()), None);
    }
}
