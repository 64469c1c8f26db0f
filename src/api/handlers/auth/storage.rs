//! Postgres-backed stores.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::{
    session::{SessionRecord, SessionStore},
    verifier::{UserRecord, UserStore},
};

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let query = "SELECT id, name, email, password FROM users WHERE email = $1";

        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(info_span!(
                "db.query",
                db.system = "postgresql",
                db.operation = "SELECT",
                db.statement = query
            ))
            .await
            .context("Failed to query user by email")?;

        row.map(|row| {
            anyhow::Ok(UserRecord {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                email: row.try_get("email")?,
                password_hash: row.try_get("password")?,
            })
        })
        .transpose()
        .context("Failed to decode user row")
    }
}

pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn insert(&self, user_id: Uuid, token_hash: Vec<u8>, ttl_seconds: i64) -> Result<()> {
        let query = "INSERT INTO sessions (token_hash, user_id, expires_at) \
                     VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))";

        sqlx::query(query)
            .bind(token_hash)
            .bind(user_id)
            .bind(ttl_seconds)
            .execute(&self.pool)
            .instrument(info_span!(
                "db.query",
                db.system = "postgresql",
                db.operation = "INSERT",
                db.statement = query
            ))
            .await
            .context("Failed to insert session")?;

        Ok(())
    }

    async fn lookup(&self, token_hash: &[u8]) -> Result<Option<SessionRecord>> {
        // Expiry is enforced here, in the database's clock, so no background
        // sweeper is needed for correctness.
        let query = "SELECT s.user_id, u.email FROM sessions s \
                     JOIN users u ON u.id = s.user_id \
                     WHERE s.token_hash = $1 AND s.expires_at > NOW()";

        let row = sqlx::query(query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .instrument(info_span!(
                "db.query",
                db.system = "postgresql",
                db.operation = "SELECT",
                db.statement = query
            ))
            .await
            .context("Failed to query session")?;

        row.map(|row| {
            anyhow::Ok(SessionRecord {
                user_id: row.try_get("user_id")?,
                email: row.try_get("email")?,
            })
        })
        .transpose()
        .context("Failed to decode session row")
    }

    async fn delete(&self, token_hash: &[u8]) -> Result<()> {
        let query = "DELETE FROM sessions WHERE token_hash = $1";

        sqlx::query(query)
            .bind(token_hash)
            .execute(&self.pool)
            .instrument(info_span!(
                "db.query",
                db.system = "postgresql",
                db.operation = "DELETE",
                db.statement = query
            ))
            .await
            .context("Failed to delete session")?;

        Ok(())
    }
}
