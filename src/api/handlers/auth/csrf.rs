//! Anti-forgery tokens for state-changing form posts.
//!
//! The token lives in the visitor session and is echoed back by every form as
//! a hidden `csrf_token` field.

use anyhow::Result;

use super::{
    sessions::SessionData,
    utils::{constant_time_eq, generate_token},
};

pub trait CsrfGuard: Send + Sync {
    /// Return the session token, creating it if the session has none.
    ///
    /// # Errors
    /// Returns an error if no random token could be generated.
    fn issue(&self, session: &mut SessionData) -> Result<String>;

    /// Accept the submitted token only if it matches the session token.
    fn verify(&self, session: &SessionData, submitted: Option<&str>) -> bool;
}

#[derive(Clone, Debug)]
pub struct SessionCsrfGuard;

impl CsrfGuard for SessionCsrfGuard {
    fn issue(&self, session: &mut SessionData) -> Result<String> {
        if let Some(token) = &session.csrf_token {
            return Ok(token.clone());
        }
        let token = generate_token()?;
        session.csrf_token = Some(token.clone());
        Ok(token)
    }

    fn verify(&self, session: &SessionData, submitted: Option<&str>) -> bool {
        match (session.csrf_token.as_deref(), submitted) {
            (Some(expected), Some(submitted)) if !submitted.is_empty() => {
                constant_time_eq(expected.as_bytes(), submitted.as_bytes())
            }
            _ => false,
        }
    }
}

/// Accepts every request; lets tests drive forms without scraping tokens.
#[derive(Clone, Debug)]
pub struct NoopCsrfGuard;

impl CsrfGuard for NoopCsrfGuard {
    fn issue(&self, _session: &mut SessionData) -> Result<String> {
        Ok(String::new())
    }

    fn verify(&self, _session: &SessionData, _submitted: Option<&str>) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_is_stable_per_session() -> Result<()> {
        let guard = SessionCsrfGuard;
        let mut session = SessionData::default();
        let first = guard.issue(&mut session)?;
        let second = guard.issue(&mut session)?;
        assert_eq!(first, second);
        assert_eq!(session.csrf_token.as_deref(), Some(first.as_str()));
        Ok(())
    }

    #[test]
    fn verify_requires_matching_token() -> Result<()> {
        let guard = SessionCsrfGuard;
        let mut session = SessionData::default();
        let token = guard.issue(&mut session)?;

        assert!(guard.verify(&session, Some(&token)));
        assert!(!guard.verify(&session, Some("forged")));
        assert!(!guard.verify(&session, Some("")));
        assert!(!guard.verify(&session, None));
        Ok(())
    }

    #[test]
    fn verify_fails_without_session_token() {
        let guard = SessionCsrfGuard;
        let session = SessionData::default();
        assert!(!guard.verify(&session, Some("anything")));
    }

    #[test]
    fn noop_guard_accepts_everything() {
        let guard = NoopCsrfGuard;
        assert!(guard.verify(&SessionData::default(), None));
    }
}
