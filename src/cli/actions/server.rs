use crate::{
    api::{
        self, db,
        handlers::auth::{
            AuthConfig, AuthState, ChallengeConfig, MemorySessionStore, MemoryUserStore,
            PasswordHasher, PgSessionStore, PgUserStore, SessionCsrfGuard, SessionStore, User,
            UserStore,
        },
    },
    cli::dispatch::SeedUser,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub users: Vec<SeedUser>,
    pub challenge_answer: String,
    pub session_ttl_seconds: u64,
    pub session_cookie_secure: bool,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the stores cannot be prepared or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let challenge =
        ChallengeConfig::new(&args.challenge_answer).context("invalid --challenge-answer")?;
    let config = AuthConfig::new()
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_session_cookie_secure(args.session_cookie_secure)
        .with_challenge(challenge);
    let hasher = PasswordHasher::default();

    let (users, sessions): (Arc<dyn UserStore>, Arc<dyn SessionStore>) = match &args.dsn {
        Some(dsn) => {
            let pool = db::connect(dsn).await?;
            db::apply_schema(&pool).await?;
            if !args.users.is_empty() {
                warn!("--user is ignored with --dsn, use the create-user command");
            }
            info!("Using Postgres user and session stores");
            (
                Arc::new(PgUserStore::new(pool.clone())),
                Arc::new(PgSessionStore::new(pool)),
            )
        }
        None => {
            let users = MemoryUserStore::new();
            seed_users(&users, &hasher, args.users).await?;
            info!("Using in-memory user and session stores");
            (Arc::new(users), Arc::new(MemorySessionStore::new()))
        }
    };

    let auth_state = AuthState::new(config, users, sessions, Arc::new(SessionCsrfGuard))
        .with_hasher(hasher);

    api::new(args.port, Arc::new(auth_state)).await
}

/// Hash and insert `--user` accounts into the in-memory store.
async fn seed_users(
    store: &MemoryUserStore,
    hasher: &PasswordHasher,
    seeds: Vec<SeedUser>,
) -> Result<()> {
    if seeds.is_empty() {
        warn!("No users configured, nobody can log in");
    }

    for seed in seeds {
        let hasher = hasher.clone();
        let password = seed.password;
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .context("password hashing task failed")??;

        let user = User::new(&seed.username, password_hash, seed.is_admin)
            .with_context(|| format!("invalid --user {}", seed.username))?;
        store
            .insert(user)
            .await
            .with_context(|| format!("cannot seed --user {}", seed.username))?;
        info!(admin = seed.is_admin, "Seeded user {}", seed.username);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::dispatch::parse_seed_user;
    use secrecy::SecretString;

    #[tokio::test]
    async fn seed_users_hashes_and_flags_admins() -> Result<()> {
        let store = MemoryUserStore::new();
        let hasher = PasswordHasher::fast();
        let seeds = vec![
            parse_seed_user("alice:correct-pw")?,
            parse_seed_user("root:admin-pw:admin")?,
        ];
        seed_users(&store, &hasher, seeds).await?;

        let alice = store
            .find_by_username("alice")
            .await?
            .context("alice missing")?;
        assert!(!alice.is_admin);
        assert!(hasher.verify(&SecretString::from("correct-pw"), &alice.password_hash));

        let root = store.find_by_username("root").await?.context("root missing")?;
        assert!(root.is_admin);
        Ok(())
    }

    #[tokio::test]
    async fn seed_users_rejects_duplicates_and_bad_names() -> Result<()> {
        let hasher = PasswordHasher::fast();

        let store = MemoryUserStore::new();
        let seeds = vec![parse_seed_user("alice:a")?, parse_seed_user("alice:b")?];
        assert!(seed_users(&store, &hasher, seeds).await.is_err());

        let store = MemoryUserStore::new();
        let seeds = vec![parse_seed_user("bad name:pw")?];
        assert!(seed_users(&store, &hasher, seeds).await.is_err());
        Ok(())
    }
}
