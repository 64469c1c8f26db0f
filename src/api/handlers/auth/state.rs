use std::sync::Arc;

use super::{
    guard::RouteMatcher,
    session::SessionStore,
    verifier::{CredentialVerifier, PasswordScheme, UserStore},
};

pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 43200;
pub const DEFAULT_REDIRECT: &str = "/home";

/// Static configuration for the auth surface.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    public_base_url: String,
    session_ttl_seconds: i64,
    default_redirect: String,
}

impl AuthConfig {
    #[must_use]
    pub fn new(public_base_url: String) -> Self {
        Self {
            public_base_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            default_redirect: DEFAULT_REDIRECT.to_string(),
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, ttl_seconds: i64) -> Self {
        self.session_ttl_seconds = ttl_seconds;
        self
    }

    #[must_use]
    pub fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    #[must_use]
    pub const fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn default_redirect(&self) -> &str {
        &self.default_redirect
    }

    /// Cookies carry `Secure` only when the site is served over TLS,
    /// so local HTTP development keeps working.
    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.public_base_url.starts_with("https://")
    }
}

/// Shared state injected into handlers and the perimeter guard.
///
/// Stores and the password scheme are trait objects so tests can swap in
/// in-memory or failing implementations.
pub struct AuthState {
    config: AuthConfig,
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    passwords: Arc<dyn PasswordScheme>,
    rules: RouteMatcher,
}

impl AuthState {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        passwords: Arc<dyn PasswordScheme>,
    ) -> Self {
        Self {
            config,
            users,
            sessions,
            passwords,
            rules: RouteMatcher::default(),
        }
    }

    #[must_use]
    pub fn with_rules(mut self, rules: RouteMatcher) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    #[must_use]
    pub const fn rules(&self) -> &RouteMatcher {
        &self.rules
    }

    #[must_use]
    pub fn verifier(&self) -> CredentialVerifier {
        CredentialVerifier::new(self.users.clone(), self.passwords.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = AuthConfig::new("http://localhost:3000".to_string());
        assert_eq!(config.session_ttl_seconds(), DEFAULT_SESSION_TTL_SECONDS);
        assert_eq!(config.default_redirect(), "/home");
        assert!(!config.session_cookie_secure());
    }

    #[test]
    fn config_ttl_override_and_secure_cookie() {
        let config =
            AuthConfig::new("https://admin.fakturo.dev".to_string()).with_session_ttl_seconds(60);
        assert_eq!(config.session_ttl_seconds(), 60);
        assert!(config.session_cookie_secure());
    }
}
