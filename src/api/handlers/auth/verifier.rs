//! Credential verification.
//!
//! Every non-infrastructure failure collapses into an outcome the caller
//! renders as the same generic message, so a response never reveals whether
//! an email is registered.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;
use uuid::Uuid;

use super::utils::{normalize_email, valid_email};

const MIN_PASSWORD_LEN: usize = 6;

// Hash of a throwaway password, verified against when the email is unknown
// so both rejection paths do comparable work.
const DUMMY_HASH: &str = "$2a$12$R9h/cIPz0gi.URNNX3kh2OPST9/PgBkqquzi.Ss7KIUgO2t0jWMUW";

/// A user row as the verifier needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Lookup of users by normalized email.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;
}

/// Password hash verification.
pub trait PasswordScheme: Send + Sync {
    fn verify(&self, password: &SecretString, hash: &str) -> bool;
}

/// bcrypt-backed [`PasswordScheme`].
///
/// A malformed stored hash is treated as a mismatch rather than an error;
/// it is logged because it means the users table holds bad data.
pub struct BcryptScheme;

impl PasswordScheme for BcryptScheme {
    fn verify(&self, password: &SecretString, hash: &str) -> bool {
        match bcrypt::verify(password.expose_secret(), hash) {
            Ok(matches) => matches,
            Err(error) => {
                warn!("Stored password hash could not be verified: {error}");
                false
            }
        }
    }
}

/// Parsed and validated login input.
#[derive(Debug)]
struct Credentials {
    email: String,
    password: SecretString,
}

impl Credentials {
    /// Normalize and validate raw form input. `None` means malformed input,
    /// which callers must not distinguish from a wrong password.
    fn parse(raw_email: &str, raw_password: SecretString) -> Option<Self> {
        let email = normalize_email(raw_email);
        if !valid_email(&email) {
            return None;
        }
        if raw_password.expose_secret().len() < MIN_PASSWORD_LEN {
            return None;
        }
        Some(Self {
            email,
            password: raw_password,
        })
    }
}

/// Outcome of a verification attempt. Infrastructure failures are not an
/// outcome; they surface as `Err` from [`CredentialVerifier::verify`].
#[derive(Debug)]
pub enum VerificationOutcome {
    Verified(UserRecord),
    InvalidCredentials,
    MalformedInput,
}

/// Checks an email/password pair against the user store.
pub struct CredentialVerifier {
    users: Arc<dyn UserStore>,
    passwords: Arc<dyn PasswordScheme>,
}

impl CredentialVerifier {
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, passwords: Arc<dyn PasswordScheme>) -> Self {
        Self { users, passwords }
    }

    /// Verify raw form input.
    ///
    /// # Errors
    /// Returns an error only for infrastructure failures (store errors,
    /// blocking-task failures), never for bad credentials.
    pub async fn verify(
        &self,
        raw_email: &str,
        raw_password: SecretString,
    ) -> Result<VerificationOutcome> {
        let Some(credentials) = Credentials::parse(raw_email, raw_password) else {
            return Ok(VerificationOutcome::MalformedInput);
        };

        let Some(user) = self.users.find_by_email(&credentials.email).await? else {
            // Burn a hash check anyway so unknown emails take as long as
            // wrong passwords.
            self.check_password(credentials.password, DUMMY_HASH.to_string())
                .await?;
            return Ok(VerificationOutcome::InvalidCredentials);
        };

        if self
            .check_password(credentials.password, user.password_hash.clone())
            .await?
        {
            Ok(VerificationOutcome::Verified(user))
        } else {
            Ok(VerificationOutcome::InvalidCredentials)
        }
    }

    // bcrypt is CPU-bound, keep it off the async workers.
    async fn check_password(&self, password: SecretString, hash: String) -> Result<bool> {
        let passwords = self.passwords.clone();
        tokio::task::spawn_blocking(move || passwords.verify(&password, &hash))
            .await
            .context("Password verification task failed")
    }
}
