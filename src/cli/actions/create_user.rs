use crate::api::{
    db,
    handlers::auth::{PasswordHasher, PgUserStore, User, UserStore},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub dsn: String,
    pub username: String,
    pub password: SecretString,
    pub is_admin: bool,
}

/// Create one user in Postgres, applying the schema first.
/// # Errors
/// Returns an error if the database is unreachable, the username is invalid or
/// already taken.
pub async fn execute(args: Args) -> Result<()> {
    let pool = db::connect(&args.dsn).await?;
    db::apply_schema(&pool).await?;

    let hasher = PasswordHasher::default();
    let password = args.password;
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .context("password hashing task failed")??;

    let user = User::new(&args.username, password_hash, args.is_admin)?;
    let id = user.id;
    PgUserStore::new(pool).insert(user).await?;

    info!(user_id = %id, admin = args.is_admin, "created user {}", args.username);
    println!("created user {} ({id})", args.username);

    Ok(())
}
