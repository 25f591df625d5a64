//! Login flow settings: challenge answer, session cookie and seed users.

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::api::handlers::auth::{DEFAULT_CHALLENGE_ANSWER, MAX_SESSION_TTL_SECONDS};

pub const ARG_USER: &str = "user";
pub const ARG_CHALLENGE_ANSWER: &str = "challenge-answer";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_SESSION_COOKIE_SECURE: &str = "session-cookie-secure";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_USER)
                .long("user")
                .help("Seed an in-memory user as name:password[:admin], repeatable")
                .long_help(
                    "Seed an in-memory user as name:password[:admin]. Repeat for more users. Ignored when --dsn is set; use the create-user command instead.",
                )
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new(ARG_CHALLENGE_ANSWER)
                .long("challenge-answer")
                .help("Comma-separated tile order expected by the challenge")
                .env("AUTHGATE_CHALLENGE_ANSWER")
                .default_value(DEFAULT_CHALLENGE_ANSWER),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long("session-ttl-seconds")
                .help("Session cookie TTL in seconds")
                .env("AUTHGATE_SESSION_TTL_SECONDS")
                .default_value("1209600")
                .value_parser(clap::value_parser!(u64).range(1..=MAX_SESSION_TTL_SECONDS)),
        )
        .arg(
            Arg::new(ARG_SESSION_COOKIE_SECURE)
                .long("session-cookie-secure")
                .help("Mark the session cookie Secure (HTTPS only)")
                .env("AUTHGATE_SESSION_COOKIE_SECURE")
                .action(ArgAction::SetTrue),
        )
}

#[derive(Debug)]
pub struct Options {
    pub users: Vec<String>,
    pub challenge_answer: String,
    pub session_ttl_seconds: u64,
    pub session_cookie_secure: bool,
}

impl Options {
    /// # Errors
    /// Returns an error if a defaulted argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let users = matches
            .get_many::<String>(ARG_USER)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        let challenge_answer = matches
            .get_one::<String>(ARG_CHALLENGE_ANSWER)
            .cloned()
            .context("missing required argument: --challenge-answer")?;
        let session_ttl_seconds = matches
            .get_one::<u64>(ARG_SESSION_TTL_SECONDS)
            .copied()
            .context("missing required argument: --session-ttl-seconds")?;

        Ok(Self {
            users,
            challenge_answer,
            session_ttl_seconds,
            session_cookie_secure: matches.get_flag(ARG_SESSION_COOKIE_SECURE),
        })
    }
}
