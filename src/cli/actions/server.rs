use crate::api;
use crate::api::handlers::auth::AuthConfig;
use crate::cli::actions::Action;
use anyhow::Result;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            base_url,
            session_ttl,
        } => {
            let config = AuthConfig::new(base_url).with_session_ttl_seconds(session_ttl);

            api::new(port, dsn, config).await?;
        }
    }

    Ok(())
}
