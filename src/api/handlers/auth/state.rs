//! Auth configuration and shared state.

use anyhow::{bail, Result};
use std::sync::Arc;
use std::time::Duration;

use super::{
    csrf::CsrfGuard, password::PasswordHasher, sessions::SessionStore, users::UserStore,
};

pub(crate) const DEFAULT_SESSION_TTL_SECONDS: u64 = 14 * 24 * 60 * 60;
/// Upper bound for session lifetimes (ten years).
pub const MAX_SESSION_TTL_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;
pub const DEFAULT_CHALLENGE_ANSWER: &str = "1,2,3,4";

/// Expected answer for the ordered-sequence challenge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChallengeConfig {
    answer: String,
}

impl ChallengeConfig {
    /// Tiles are separated by `,` with nothing around them, e.g. `red,green`.
    ///
    /// # Errors
    /// Returns an error if the answer is blank, has an empty tile, or pads a
    /// tile with whitespace.
    pub fn new(answer: &str) -> Result<Self> {
        if answer.trim().is_empty() {
            bail!("challenge answer must not be empty");
        }
        if answer
            .split(',')
            .any(|tile| tile.is_empty() || tile.trim() != tile)
        {
            bail!("challenge answer tiles must be non-empty and unpadded, e.g. 1,2,3,4");
        }
        Ok(Self {
            answer: answer.to_string(),
        })
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Exact comparison; no trimming or reordering.
    #[must_use]
    pub fn matches(&self, submitted: &str) -> bool {
        self.answer == submitted
    }

    /// Tiles shown on the challenge page, in answer order.
    #[must_use]
    pub fn tiles(&self) -> Vec<&str> {
        self.answer.split(',').collect()
    }
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            answer: DEFAULT_CHALLENGE_ANSWER.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    session_ttl_seconds: u64,
    session_cookie_secure: bool,
    challenge: ChallengeConfig,
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            session_cookie_secure: false,
            challenge: ChallengeConfig::default(),
        }
    }

    /// Values above `MAX_SESSION_TTL_SECONDS` are clamped.
    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: u64) -> Self {
        self.session_ttl_seconds = seconds.min(MAX_SESSION_TTL_SECONDS);
        self
    }

    #[must_use]
    pub fn with_session_cookie_secure(mut self, secure: bool) -> Self {
        self.session_cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn with_challenge(mut self, challenge: ChallengeConfig) -> Self {
        self.challenge = challenge;
        self
    }

    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_seconds)
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> u64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.session_cookie_secure
    }

    #[must_use]
    pub fn challenge(&self) -> &ChallengeConfig {
        &self.challenge
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub struct AuthState {
    config: AuthConfig,
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    csrf: Arc<dyn CsrfGuard>,
    hasher: PasswordHasher,
}

impl AuthState {
    pub fn new(
        config: AuthConfig,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        csrf: Arc<dyn CsrfGuard>,
    ) -> Self {
        Self {
            config,
            users,
            sessions,
            csrf,
            hasher: PasswordHasher::default(),
        }
    }

    #[must_use]
    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    #[must_use]
    pub fn sessions(&self) -> &dyn SessionStore {
        self.sessions.as_ref()
    }

    #[must_use]
    pub fn csrf(&self) -> &dyn CsrfGuard {
        self.csrf.as_ref()
    }

    #[must_use]
    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }
}
