//! Credential authentication and route protection.
//!
//! The flow has four pieces, wired together through [`AuthState`]:
//!
//! - [`verifier`] checks a raw email/password pair against the user store and
//!   collapses every failure into an indistinguishable outcome, so responses
//!   never reveal whether an email is registered.
//! - [`session`] issues and validates server-side sessions: a random token
//!   goes into an `HttpOnly` cookie, only its SHA-256 hash is stored, and
//!   expiry is enforced in SQL. It also owns redirect-target validation.
//! - [`login`] is the form-facing action. Its result is either a rejection
//!   state the UI re-renders, or an explicit redirect instruction.
//! - [`guard`] classifies every request path against an ordered rule list and
//!   bounces unauthenticated requests on protected paths to the login page,
//!   preserving the originally requested path.
//!
//! The user store, session store, and password scheme are injected trait
//! objects; production wiring uses Postgres and bcrypt ([`storage`],
//! [`BcryptScheme`]).

pub mod guard;
pub mod login;
pub mod session;
mod state;
pub mod storage;
pub mod types;
mod utils;
pub mod verifier;

pub use state::{AuthConfig, AuthState};
pub use verifier::{BcryptScheme, CredentialVerifier, PasswordScheme, UserRecord, UserStore};

#[cfg(test)]
pub(crate) mod test_support;
