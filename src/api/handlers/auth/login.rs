//! The login action.

use std::sync::Arc;

use axum::{
    http::{
        header::{LOCATION, SET_COOKIE},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Json, Response},
    Extension,
};
use tracing::error;

use super::{
    session,
    state::AuthState,
    types::{AuthActionState, LoginRequest},
    verifier::VerificationOutcome,
};

/// Shown for unknown emails, wrong passwords, and malformed input alike.
pub const CREDENTIALS_ERROR: &str = "Invalid credentials.";
/// Shown when the attempt could not be evaluated at all.
pub const GENERIC_ERROR: &str = "Something went wrong.";

/// What the login action decided.
///
/// Rejections are `200 OK` with a state body the form re-renders from, not
/// an HTTP error; only the successful branch leaves the page.
pub enum LoginOutcome {
    Rejected(AuthActionState),
    Redirecting { target: String, cookie: HeaderValue },
}

impl IntoResponse for LoginOutcome {
    fn into_response(self) -> Response {
        match self {
            Self::Rejected(state) => Json(state).into_response(),
            Self::Redirecting { target, cookie } => {
                let mut response = StatusCode::SEE_OTHER.into_response();
                if let Ok(location) = HeaderValue::from_str(&target) {
                    response.headers_mut().insert(LOCATION, location);
                }
                response.headers_mut().insert(SET_COOKIE, cookie);
                response
            }
        }
    }
}

fn rejected(message: &str) -> LoginOutcome {
    LoginOutcome::Rejected(AuthActionState::rejected(message))
}

// axum handler for login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Attempt rejected, form state to re-render", body = AuthActionState),
        (status = 303, description = "Authenticated, session cookie set, redirect target in Location")
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(state): Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> LoginOutcome {
    let Some(Json(request)) = payload else {
        return rejected(CREDENTIALS_ERROR);
    };

    let user = match state.verifier().verify(&request.email, request.password).await {
        Ok(VerificationOutcome::Verified(user)) => user,
        Ok(VerificationOutcome::InvalidCredentials | VerificationOutcome::MalformedInput) => {
            return rejected(CREDENTIALS_ERROR);
        }
        Err(error) => {
            error!("Credential verification failed: {error:#}");
            return rejected(GENERIC_ERROR);
        }
    };

    let token = match session::issue(&state, user.id).await {
        Ok(token) => token,
        Err(error) => {
            error!("Failed to issue session: {error:#}");
            return rejected(GENERIC_ERROR);
        }
    };

    let cookie = match session::session_cookie(&state, &token) {
        Ok(cookie) => cookie,
        Err(error) => {
            error!("Failed to build session cookie: {error:#}");
            return rejected(GENERIC_ERROR);
        }
    };

    let target = session::resolve_redirect(
        request.redirect_to.as_deref(),
        state.config().default_redirect(),
    );

    LoginOutcome::Redirecting {
        target: target.to_string(),
        cookie,
    }
}
