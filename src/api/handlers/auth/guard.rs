//! Request perimeter.
//!
//! Every routed request is classified against an ordered rule list before
//! its handler runs. Protected paths without a live session are answered
//! with a redirect to the login page carrying the original path, never with
//! an error page.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, warn};

use super::{session, state::AuthState};

pub const LOGIN_PATH: &str = "/login";

/// How a path is treated by the perimeter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Never challenged; asset and auth endpoints live here.
    Excluded,
    /// Requires a live session.
    Protected,
    /// Reachable without a session.
    Public,
}

/// One pattern in the rule list.
///
/// Patterns are deliberately simple: `prefix/*` matches the prefix itself
/// and everything under it, `*suffix` matches by ending, anything else is
/// an exact path.
#[derive(Debug, Clone)]
pub struct RouteMatchRule {
    pattern: String,
    class: RouteClass,
}

impl RouteMatchRule {
    #[must_use]
    pub fn new(pattern: &str, class: RouteClass) -> Self {
        Self {
            pattern: pattern.to_string(),
            class,
        }
    }

    fn matches(&self, path: &str) -> bool {
        if let Some(suffix) = self.pattern.strip_prefix('*') {
            return path.ends_with(suffix);
        }
        if let Some(prefix) = self.pattern.strip_suffix("/*") {
            return path == prefix || path.starts_with(&self.pattern[..self.pattern.len() - 1]);
        }
        path == self.pattern
    }
}

/// Ordered, first-match-wins path classifier.
///
/// Exclusions are listed before protections so `/api/auth/login` can never
/// be shadowed by a broad protected prefix; order in the rule list is the
/// only precedence mechanism.
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    rules: Vec<RouteMatchRule>,
    default_class: RouteClass,
}

impl RouteMatcher {
    #[must_use]
    pub fn new(rules: Vec<RouteMatchRule>, default_class: RouteClass) -> Self {
        Self {
            rules,
            default_class,
        }
    }

    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        self.rules
            .iter()
            .find(|rule| rule.matches(path))
            .map_or(self.default_class, |rule| rule.class)
    }
}

impl Default for RouteMatcher {
    fn default() -> Self {
        Self::new(
            vec![
                RouteMatchRule::new("/api/auth/*", RouteClass::Excluded),
                RouteMatchRule::new(LOGIN_PATH, RouteClass::Excluded),
                RouteMatchRule::new("/health", RouteClass::Excluded),
                RouteMatchRule::new("/openapi.json", RouteClass::Excluded),
                RouteMatchRule::new("/_next/*", RouteClass::Excluded),
                RouteMatchRule::new("*.png", RouteClass::Excluded),
                RouteMatchRule::new("*.ico", RouteClass::Excluded),
                RouteMatchRule::new("*.css", RouteClass::Excluded),
                RouteMatchRule::new("*.js", RouteClass::Excluded),
                RouteMatchRule::new("/home/*", RouteClass::Protected),
                RouteMatchRule::new("/api/invoices/*", RouteClass::Protected),
                RouteMatchRule::new("/api/customers/*", RouteClass::Protected),
            ],
            RouteClass::Public,
        )
    }
}

/// Middleware enforcing the rule list on every routed request.
pub async fn perimeter(
    State(state): State<Arc<AuthState>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    match state.rules().classify(&path) {
        RouteClass::Excluded | RouteClass::Public => next.run(request).await,
        RouteClass::Protected => {
            match session::authenticate_session(request.headers(), &state).await {
                Ok(Some(_)) => next.run(request).await,
                Ok(None) => {
                    debug!("No session for protected path {path}");
                    deny(&state, &path)
                }
                // A store failure must not expose the protected resource.
                Err(error) => {
                    warn!("Session check failed for {path}: {error:#}");
                    deny(&state, &path)
                }
            }
        }
    }
}

/// Redirect to the login page, preserving the originally requested path.
fn deny(state: &AuthState, path: &str) -> Response {
    let target = session::resolve_redirect(Some(path), state.config().default_redirect());
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("callbackUrl", target)
        .finish();
    Redirect::to(&format!("{LOGIN_PATH}?{query}")).into_response()
}
