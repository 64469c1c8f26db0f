//! In-memory stores and fixtures for the auth tests.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    session::{SessionRecord, SessionStore},
    state::{AuthConfig, AuthState},
    verifier::{BcryptScheme, UserRecord, UserStore},
};

pub(crate) struct MemoryUserStore {
    users: Vec<UserRecord>,
}

impl MemoryUserStore {
    pub(crate) fn new() -> Self {
        Self { users: Vec::new() }
    }

    // Cost 4 is the lowest bcrypt accepts; keeps the test suite fast.
    pub(crate) fn with_user(mut self, name: &str, email: &str, password: &str) -> Self {
        let hash = bcrypt::hash(password, 4).unwrap();
        self.users.push(UserRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash,
        });
        self
    }

    pub(crate) fn find(&self, email: &str) -> Option<&UserRecord> {
        self.users.iter().find(|user| user.email == email)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self.users.iter().find(|user| user.email == email).cloned())
    }
}

pub(crate) struct FailingUserStore;

#[async_trait]
impl UserStore for FailingUserStore {
    async fn find_by_email(&self, _email: &str) -> Result<Option<UserRecord>> {
        Err(anyhow!("database unreachable"))
    }
}

pub(crate) struct MemorySessionStore {
    sessions: Mutex<HashMap<Vec<u8>, (SessionRecord, Instant)>>,
    emails: Mutex<HashMap<Uuid, String>>,
}

impl MemorySessionStore {
    pub(crate) fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            emails: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) async fn register_email(&self, user_id: Uuid, email: &str) {
        self.emails.lock().await.insert(user_id, email.to_string());
    }

    pub(crate) async fn count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub(crate) async fn insert_raw(&self, token_hash: Vec<u8>, record: SessionRecord) {
        let expires_at = Instant::now() + Duration::from_secs(3600);
        self.sessions
            .lock()
            .await
            .insert(token_hash, (record, expires_at));
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, user_id: Uuid, token_hash: Vec<u8>, ttl_seconds: i64) -> Result<()> {
        let email = self
            .emails
            .lock()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| "unknown@example.com".to_string());
        let ttl = u64::try_from(ttl_seconds.max(0)).unwrap_or(0);
        let expires_at = Instant::now() + Duration::from_secs(ttl);
        self.sessions
            .lock()
            .await
            .insert(token_hash, (SessionRecord { user_id, email }, expires_at));
        Ok(())
    }

    async fn lookup(&self, token_hash: &[u8]) -> Result<Option<SessionRecord>> {
        // Same contract as the SQL predicate: expired rows look absent.
        Ok(self
            .sessions
            .lock()
            .await
            .get(token_hash)
            .filter(|(_, expires_at)| Instant::now() < *expires_at)
            .map(|(record, _)| record.clone()))
    }

    async fn delete(&self, token_hash: &[u8]) -> Result<()> {
        self.sessions.lock().await.remove(token_hash);
        Ok(())
    }
}

pub(crate) struct FailingSessionStore;

#[async_trait]
impl SessionStore for FailingSessionStore {
    async fn insert(&self, _user_id: Uuid, _token_hash: Vec<u8>, _ttl_seconds: i64) -> Result<()> {
        Err(anyhow!("database unreachable"))
    }

    async fn lookup(&self, _token_hash: &[u8]) -> Result<Option<SessionRecord>> {
        Err(anyhow!("database unreachable"))
    }

    async fn delete(&self, _token_hash: &[u8]) -> Result<()> {
        Err(anyhow!("database unreachable"))
    }
}

pub(crate) fn auth_state(base_url: &str) -> AuthState {
    AuthState::new(
        AuthConfig::new(base_url.to_string()),
        Arc::new(MemoryUserStore::new()),
        Arc::new(MemorySessionStore::new()),
        Arc::new(BcryptScheme),
    )
}

pub(crate) fn auth_state_with(
    users: MemoryUserStore,
    sessions: Arc<MemorySessionStore>,
) -> AuthState {
    AuthState::new(
        AuthConfig::new("http://localhost:3000".to_string()),
        Arc::new(users),
        sessions,
        Arc::new(BcryptScheme),
    )
}
