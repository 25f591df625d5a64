//! Credential verification: username lookup plus password hash check.

use anyhow::Context;
use secrecy::SecretString;
use tracing::{debug, instrument};

use super::{
    error::AuthError,
    password::PasswordHasher,
    users::{User, UserStore},
};

/// Verify a username/password pair and return the matching active user.
///
/// Unknown usernames still pay for one hash so they cost about as much as a
/// wrong password. Every failure is `InvalidCredentials`.
///
/// # Errors
/// `InvalidCredentials` on any mismatch, `Store` if the lookup fails.
#[instrument(skip(users, hasher, password))]
pub async fn verify_credentials(
    users: &dyn UserStore,
    hasher: &PasswordHasher,
    username: &str,
    password: &SecretString,
) -> Result<User, AuthError> {
    let user = users.find_by_username(username).await?;

    let hasher = hasher.clone();
    let password = password.clone();
    let Some(user) = user else {
        tokio::task::spawn_blocking(move || {
            let _ = hasher.hash(&password);
        })
        .await
        .context("password hashing task failed")?;
        debug!("unknown username");
        return Err(AuthError::InvalidCredentials);
    };

    let stored_hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
        .await
        .context("password verification task failed")?;

    if !valid {
        debug!("password mismatch");
        return Err(AuthError::InvalidCredentials);
    }

    if !user.is_active {
        debug!("inactive user");
        return Err(AuthError::InvalidCredentials);
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::users::MemoryUserStore;

    async fn store_with(
        username: &str,
        password: &str,
        is_active: bool,
    ) -> anyhow::Result<MemoryUserStore> {
        let store = MemoryUserStore::new();
        let hash = PasswordHasher::fast().hash(&SecretString::from(password))?;
        let mut user = User::new(username, hash, false)?;
        user.is_active = is_active;
        store.insert(user).await?;
        Ok(store)
    }

    #[tokio::test]
    async fn valid_pair_returns_user() -> anyhow::Result<()> {
        let store = store_with("alice", "correct-pw", true).await?;
        let user = verify_credentials(
            &store,
            &PasswordHasher::fast(),
            "alice",
            &SecretString::from("correct-pw"),
        )
        .await?;
        assert_eq!(user.username, "alice");
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() -> anyhow::Result<()> {
        let store = store_with("alice", "correct-pw", true).await?;
        let hasher = PasswordHasher::fast();

        let wrong = verify_credentials(&store, &hasher, "alice", &SecretString::from("nope")).await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));

        let unknown =
            verify_credentials(&store, &hasher, "mallory", &SecretString::from("correct-pw"))
                .await;
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
        Ok(())
    }

    #[tokio::test]
    async fn inactive_user_is_rejected() -> anyhow::Result<()> {
        let store = store_with("bob", "pw", false).await?;
        let result =
            verify_credentials(&store, &PasswordHasher::fast(), "bob", &SecretString::from("pw"))
                .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        Ok(())
    }
}
