//! Pending-auth session gate.
//!
//! Flow Overview:
//! - `ANONYMOUS`: no `pending_user_id`, no `user_id`.
//! - `PENDING`: password verified, `pending_user_id` set. Grants no access.
//! - `AUTHENTICATED`: challenge passed, `user_id` set, `pending_user_id` gone.
//!
//! A failed challenge leaves the session untouched, so retries are unlimited.
//! A missing pending identity fails exactly like a wrong answer.

use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    error::AuthError, sessions::SessionData, state::ChallengeConfig, users::UserStore,
};

/// Where the visitor goes next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Destination {
    Admin,
    Welcome,
    Challenge,
}

impl Destination {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Admin => "/admin/",
            Self::Welcome => "/welcome/",
            Self::Challenge => "/captcha/",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateState {
    Anonymous,
    Pending,
    Authenticated,
}

impl GateState {
    #[must_use]
    pub fn of(session: &SessionData) -> Self {
        if session.user_id.is_some() {
            Self::Authenticated
        } else if session.pending_user_id.is_some() {
            Self::Pending
        } else {
            Self::Anonymous
        }
    }
}

/// Record an identity that passed the password step.
///
/// Replaces any earlier pending identity and drops an existing login.
pub fn begin_pending(session: &mut SessionData, user_id: Uuid) {
    session.pending_user_id = Some(user_id);
    session.user_id = None;
}

/// Check a challenge answer and promote the pending identity on success.
///
/// On success the session holds `user_id` and no pending marker; the caller is
/// expected to rotate the session key. On failure the session is unchanged.
///
/// # Errors
/// `ChallengeMismatch` for a wrong answer, a missing pending identity, or a
/// pending identity that no longer resolves to an active user. `Store` if the
/// user lookup fails.
#[instrument(skip_all)]
pub async fn check_challenge(
    session: &mut SessionData,
    submitted: &str,
    challenge: &ChallengeConfig,
    users: &dyn UserStore,
) -> Result<Destination, AuthError> {
    let Some(pending_user_id) = session.pending_user_id else {
        debug!("no pending identity");
        return Err(AuthError::ChallengeMismatch);
    };

    if !challenge.matches(submitted) {
        debug!("challenge answer mismatch");
        return Err(AuthError::ChallengeMismatch);
    }

    let Some(user) = users.find_by_id(pending_user_id).await? else {
        debug!(%pending_user_id, "pending identity no longer exists");
        return Err(AuthError::ChallengeMismatch);
    };
    if !user.is_active {
        debug!(%pending_user_id, "pending identity is inactive");
        return Err(AuthError::ChallengeMismatch);
    }

    session.user_id = Some(user.id);
    session.pending_user_id = None;
    session.csrf_token = None;

    info!(user_id = %user.id, "login completed");

    Ok(if user.is_admin {
        Destination::Admin
    } else {
        Destination::Welcome
    })
}
