use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Login form payload.
#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    #[schema(value_type = String, format = Password)]
    pub password: SecretString,
    #[serde(rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

/// State the login form re-renders with when the attempt is rejected.
///
/// `success` stays `false` for every rejection; `error_msg` carries the
/// user-facing message and is omitted on success.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct AuthActionState {
    pub success: bool,
    #[serde(rename = "errorMsg", skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
}

impl AuthActionState {
    #[must_use]
    pub fn rejected(message: &str) -> Self {
        Self {
            success: false,
            error_msg: Some(message.to_string()),
        }
    }
}

/// Body of `GET /api/auth/session` when a valid session is presented.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct SessionResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub email: String,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct SignoutResponse {
    pub success: bool,
}
