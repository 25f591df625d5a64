//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to an `Action`: the server by default, or
//! `create-user` when that subcommand is given.

use crate::cli::actions::{create_user, server, Action};
use crate::cli::commands::{auth, users, ARG_DSN, ARG_PORT};
use anyhow::{anyhow, bail, Context, Result};
use secrecy::SecretString;
use url::Url;

/// A `--user name:password[:admin]` value.
#[derive(Debug)]
pub struct SeedUser {
    pub username: String,
    pub password: SecretString,
    pub is_admin: bool,
}

/// Parse `name:password` or `name:password:admin`.
///
/// The password may itself contain `:`; only a trailing `:admin` is special.
///
/// # Errors
/// Returns an error if the name or password is empty.
pub fn parse_seed_user(value: &str) -> Result<SeedUser> {
    let (rest, is_admin) = match value.strip_suffix(":admin") {
        Some(rest) => (rest, true),
        None => (value, false),
    };
    let (username, password) = rest
        .split_once(':')
        .ok_or_else(|| anyhow!("invalid --user value, expected name:password[:admin]"))?;
    if username.is_empty() || password.is_empty() {
        bail!("invalid --user value, name and password must not be empty");
    }
    Ok(SeedUser {
        username: username.to_string(),
        password: SecretString::from(password),
        is_admin,
    })
}

fn validate_dsn(dsn: &str) -> Result<()> {
    let url = Url::parse(dsn).context("invalid --dsn")?;
    match url.scheme() {
        "postgres" | "postgresql" => Ok(()),
        other => bail!("unsupported --dsn scheme '{other}', expected postgres://"),
    }
}

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    if let Some((users::CMD_CREATE_USER, sub)) = matches.subcommand() {
        return create_user_action(matches, sub);
    }

    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches.get_one::<String>(ARG_DSN).cloned();
    if let Some(dsn) = &dsn {
        validate_dsn(dsn)?;
    }

    let auth_opts = auth::Options::parse(matches)?;
    let users = auth_opts
        .users
        .iter()
        .map(|value| parse_seed_user(value))
        .collect::<Result<Vec<_>>>()?;

    Ok(Action::Server(server::Args {
        port,
        dsn,
        users,
        challenge_answer: auth_opts.challenge_answer,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        session_cookie_secure: auth_opts.session_cookie_secure,
    }))
}

fn create_user_action(root: &clap::ArgMatches, matches: &clap::ArgMatches) -> Result<Action> {
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .or_else(|| root.get_one::<String>(ARG_DSN))
        .cloned()
        .context("missing required argument: --dsn")?;
    validate_dsn(&dsn)?;

    let username = matches
        .get_one::<String>(users::ARG_USERNAME)
        .cloned()
        .context("missing required argument: --username")?;
    let password = matches
        .get_one::<String>(users::ARG_PASSWORD)
        .map(|password| SecretString::from(password.as_str()))
        .context("missing required argument: --password")?;

    Ok(Action::CreateUser(create_user::Args {
        dsn,
        username,
        password,
        is_admin: matches.get_flag(users::ARG_ADMIN),
    }))
}
