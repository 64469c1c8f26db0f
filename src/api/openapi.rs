use axum::response::Json;
use utoipa::OpenApi;

use super::handlers::auth::types::{
    AuthActionState, LoginRequest, SessionResponse, SignoutResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "fakturo",
        description = "Invoice and customer administration API"
    ),
    paths(
        crate::api::handlers::health::health,
        crate::api::handlers::auth::login::login,
        crate::api::handlers::auth::session::session,
        crate::api::handlers::auth::session::signout,
    ),
    components(schemas(LoginRequest, AuthActionState, SessionResponse, SignoutResponse)),
    tags(
        (name = "auth", description = "Login, session, and signout"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

// axum handler serving the generated document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::ApiDoc;
    use utoipa::OpenApi;

    #[test]
    fn document_covers_the_auth_surface() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/api/auth/login"));
        assert!(paths.contains_key("/api/auth/session"));
        assert!(paths.contains_key("/api/auth/signout"));
        assert!(paths.contains_key("/health"));
    }
}
