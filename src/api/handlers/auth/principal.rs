//! Resolve the authenticated user behind a visitor session.
//!
//! A pending identity never counts; only `user_id` set by a completed
//! challenge does.

use super::{error::AuthError, session::VisitorSession, state::AuthState, users::User};

/// Return the active user the session is logged in as, if any.
///
/// # Errors
/// Returns `Store` if the user lookup fails.
pub async fn current_user(
    session: &VisitorSession,
    state: &AuthState,
) -> Result<Option<User>, AuthError> {
    let Some(user_id) = session.data().user_id else {
        return Ok(None);
    };
    Ok(state
        .users()
        .find_by_id(user_id)
        .await?
        .filter(|user| user.is_active))
}
