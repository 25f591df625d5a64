//! Visitor session state and the stores that persist it.
//!
//! Stores key sessions by the SHA-256 of the cookie token; the raw token only
//! lives in the visitor's cookie.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::error::AuthError;
use super::utils::hash_session_token;

/// Per-visitor session fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// Identity that passed the password step but not the challenge yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_user_id: Option<Uuid>,
    /// Fully authenticated identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
}

impl SessionData {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a live session; expired or unknown tokens return `None`.
    async fn load(&self, token: &str) -> Result<Option<SessionData>, AuthError>;
    async fn save(&self, token: &str, data: &SessionData, ttl: Duration) -> Result<(), AuthError>;
    async fn delete(&self, token: &str) -> Result<(), AuthError>;

    async fn ping(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

struct MemoryEntry {
    data: SessionData,
    expires_at: Instant,
}

#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<Vec<u8>, MemoryEntry>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, token: &str) -> Result<Option<SessionData>, AuthError> {
        let key = hash_session_token(token);
        let entries = self.entries.lock().await;
        Ok(entries
            .get(&key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.data.clone()))
    }

    async fn save(&self, token: &str, data: &SessionData, ttl: Duration) -> Result<(), AuthError> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .ok_or_else(|| anyhow!("session ttl of {}s overflows the clock", ttl.as_secs()))?;
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            hash_session_token(token),
            MemoryEntry {
                data: data.clone(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<(), AuthError> {
        self.entries.lock().await.remove(&hash_session_token(token));
        Ok(())
    }
}

/// Postgres-backed sessions, see `sql/schema.sql`.
#[derive(Clone, Debug)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn load(&self, token: &str) -> Result<Option<SessionData>, AuthError> {
        let row = sqlx::query(
            "SELECT data FROM sessions WHERE token_hash = $1 AND expires_at_unix > $2",
        )
        .bind(hash_session_token(token))
        .bind(unix_now())
        .fetch_optional(&self.pool)
        .await
        .context("failed to load session")?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.try_get("data").context("failed to decode session row")?;
        let data = serde_json::from_str(&raw).context("failed to parse session data")?;
        Ok(Some(data))
    }

    async fn save(&self, token: &str, data: &SessionData, ttl: Duration) -> Result<(), AuthError> {
        let raw = serde_json::to_string(data).context("failed to serialize session data")?;
        let ttl_seconds = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let now = unix_now();

        // Expired rows are never read again; drop them as sessions are written.
        sqlx::query("DELETE FROM sessions WHERE expires_at_unix <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .context("failed to purge expired sessions")?;

        sqlx::query(
            "INSERT INTO sessions (token_hash, data, expires_at_unix) VALUES ($1, $2, $3) \
             ON CONFLICT (token_hash) DO UPDATE SET data = EXCLUDED.data, expires_at_unix = EXCLUDED.expires_at_unix",
        )
        .bind(hash_session_token(token))
        .bind(raw)
        .bind(now.saturating_add(ttl_seconds))
        .execute(&self.pool)
        .await
        .context("failed to save session")?;
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<(), AuthError> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(hash_session_token(token))
            .execute(&self.pool)
            .await
            .context("failed to delete session")?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), AuthError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("failed to ping session store")?;
        Ok(())
    }
}
