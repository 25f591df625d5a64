//! User records and the stores that hold them.
//!
//! The login flow only reads users; `insert` exists for the `create-user`
//! command and for seeding the in-memory store at startup.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::AuthError;
use super::utils::valid_username;

#[derive(Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub is_active: bool,
}

impl User {
    /// Build an active user with a fresh id.
    ///
    /// # Errors
    /// Returns `InvalidUsername` if the username has disallowed characters.
    pub fn new(username: &str, password_hash: String, is_admin: bool) -> Result<Self, AuthError> {
        if !valid_username(username) {
            return Err(AuthError::InvalidUsername(username.to_string()));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash,
            is_admin,
            is_active: true,
        })
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"***")
            .field("is_admin", &self.is_admin)
            .field("is_active", &self.is_active)
            .finish()
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError>;
    async fn insert(&self, user: User) -> Result<(), AuthError>;

    /// Backend liveness check used by `/health`.
    async fn ping(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) async fn set_active(&self, id: Uuid, is_active: bool) {
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.is_active = is_active;
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<(), AuthError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == user.username) {
            return Err(AuthError::DuplicateUsername(user.username));
        }
        users.insert(user.id, user);
        Ok(())
    }
}

/// Postgres-backed users, see `sql/schema.sql`.
#[derive(Clone, Debug)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        is_admin: row.try_get("is_admin")?,
        is_active: row.try_get("is_active")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .code()
            .is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, is_admin, is_active FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("failed to look up user by username")?;

        row.as_ref()
            .map(user_from_row)
            .transpose()
            .context("failed to decode user row")
            .map_err(AuthError::from)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, is_admin, is_active FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to look up user by id")?;

        row.as_ref()
            .map(user_from_row)
            .transpose()
            .context("failed to decode user row")
            .map_err(AuthError::from)
    }

    async fn insert(&self, user: User) -> Result<(), AuthError> {
        let result = sqlx::query(
            "INSERT INTO users (id, username, password_hash, is_admin, is_active) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(user.is_active)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                Err(AuthError::DuplicateUsername(user.username))
            }
            Err(err) => Err(anyhow::Error::new(err).context("failed to insert user").into()),
        }
    }

    async fn ping(&self) -> Result<(), AuthError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("failed to ping user store")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, is_admin: bool) -> Result<User, AuthError> {
        User::new(name, "$argon2id$placeholder".to_string(), is_admin)
    }

    #[test]
    fn new_user_is_active_and_validated() -> Result<(), AuthError> {
        let alice = user("alice", false)?;
        assert!(alice.is_active);
        assert!(!alice.is_admin);
        assert!(matches!(
            user("bad name", false),
            Err(AuthError::InvalidUsername(name)) if name == "bad name"
        ));
        Ok(())
    }

    #[test]
    fn debug_redacts_password_hash() -> Result<(), AuthError> {
        let rendered = format!("{:?}", user("alice", false)?);
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("placeholder"));
        Ok(())
    }

    #[tokio::test]
    async fn memory_store_finds_by_username_and_id() -> Result<(), AuthError> {
        let store = MemoryUserStore::new();
        let alice = user("alice", false)?;
        let alice_id = alice.id;
        store.insert(alice).await?;
        store.insert(user("root", true)?).await?;

        let found = store.find_by_username("alice").await?;
        assert_eq!(found.map(|u| u.id), Some(alice_id));
        let by_id = store.find_by_id(alice_id).await?;
        assert_eq!(by_id.map(|u| u.username), Some("alice".to_string()));
        assert!(store.find_by_username("Alice").await?.is_none());
        assert!(store.find_by_id(Uuid::new_v4()).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn memory_store_rejects_duplicate_usernames() -> Result<(), AuthError> {
        let store = MemoryUserStore::new();
        store.insert(user("alice", false)?).await?;
        let err = store.insert(user("alice", true)?).await;
        assert!(matches!(err, Err(AuthError::DuplicateUsername(name)) if name == "alice"));
        Ok(())
    }

    #[tokio::test]
    async fn pg_store_round_trip() -> anyhow::Result<()> {
        let Some(pool) = crate::api::db::test_pool().await? else {
            return Ok(());
        };
        let store = PgUserStore::new(pool);
        store.ping().await?;

        let name = format!("pg-{}", Uuid::new_v4().simple());
        let created = user(&name, true)?;
        let id = created.id;
        store.insert(created).await?;

        let found = store.find_by_username(&name).await?.context("user missing")?;
        assert_eq!(found.id, id);
        assert!(found.is_admin);
        assert!(found.is_active);
        assert_eq!(store.find_by_id(id).await?.map(|u| u.username), Some(name.clone()));

        let duplicate = store.insert(user(&name, false)?).await;
        assert!(matches!(duplicate, Err(AuthError::DuplicateUsername(_))));
        Ok(())
    }
}
