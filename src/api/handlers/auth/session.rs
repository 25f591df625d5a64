//! Per-request visitor session context and the session cookie.
//!
//! Handlers load a `VisitorSession` from the request cookie, read or mutate its
//! `SessionData`, then `commit` it, which persists changes and yields the
//! `Set-Cookie` header to attach to the response (if any).
//!
//! Security boundaries: a cookie token that does not resolve to a live session
//! is discarded, so visitors cannot choose their own session key. Keys are
//! rotated when a login completes.

use axum::{
    http::{
        header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue,
    },
    response::Response,
};
use tracing::error;

use super::{error::AuthError, sessions::SessionData, state::AuthState, utils::generate_token};

pub const SESSION_COOKIE_NAME: &str = "authgate_session";

#[derive(Debug)]
pub struct VisitorSession {
    token: Option<String>,
    data: SessionData,
    original: SessionData,
    rotate: bool,
    flushed: bool,
}

impl VisitorSession {
    /// Resolve the session cookie into session data.
    ///
    /// Missing, unknown and expired cookies all give an empty session.
    ///
    /// # Errors
    /// Returns `Store` if the session backend fails.
    pub async fn load(headers: &HeaderMap, state: &AuthState) -> Result<Self, AuthError> {
        let (token, data) = match extract_session_token(headers) {
            Some(token) => match state.sessions().load(&token).await? {
                Some(data) => (Some(token), data),
                None => (None, SessionData::default()),
            },
            None => (None, SessionData::default()),
        };

        Ok(Self {
            token,
            original: data.clone(),
            data,
            rotate: false,
            flushed: false,
        })
    }

    #[must_use]
    pub fn data(&self) -> &SessionData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut SessionData {
        &mut self.data
    }

    /// Issue a new session key on commit, keeping the data.
    pub fn cycle_key(&mut self) {
        self.rotate = true;
    }

    /// Drop all session data and the stored session.
    pub fn flush(&mut self) {
        self.data = SessionData::default();
        self.flushed = true;
    }

    /// Persist changes and return the cookie to send back, if any.
    ///
    /// # Errors
    /// Returns `Store` if the backend fails, or if no token can be generated.
    pub async fn commit(self, state: &AuthState) -> Result<Option<HeaderValue>, AuthError> {
        let sessions = state.sessions();

        if self.flushed {
            if let Some(token) = &self.token {
                sessions.delete(token).await?;
            }
            return Ok(clear_session_cookie(state).ok());
        }

        let changed = self.data != self.original;
        let token = match self.token {
            Some(old) if self.rotate => {
                sessions.delete(&old).await?;
                None
            }
            Some(_) if !changed => return Ok(None),
            other => other,
        };

        if token.is_none() && self.data.is_empty() {
            return Ok(None);
        }

        let token = match token {
            Some(token) => token,
            None => generate_token()?,
        };
        sessions
            .save(&token, &self.data, state.config().session_ttl())
            .await?;

        match session_cookie(state, &token) {
            Ok(cookie) => Ok(Some(cookie)),
            Err(err) => {
                error!("Failed to build session cookie: {err}");
                Ok(None)
            }
        }
    }
}

/// Attach an optional `Set-Cookie` header to a response.
pub(crate) fn with_cookie(mut response: Response, cookie: Option<HeaderValue>) -> Response {
    if let Some(cookie) = cookie {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}

/// Build an `HttpOnly` cookie for the session token.
pub(super) fn session_cookie(
    state: &AuthState,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = state.config().session_ttl_seconds();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if state.config().session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookie(state: &AuthState) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if state.config().session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            (key.trim() == SESSION_COOKIE_NAME).then(|| val.trim().to_string())
        })
        .find(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::{
        csrf::NoopCsrfGuard, sessions::MemorySessionStore, state::AuthConfig,
        users::MemoryUserStore,
    };
    use std::sync::Arc;
    use uuid::Uuid;

    fn state(secure: bool) -> AuthState {
        AuthState::new(
            AuthConfig::new()
                .with_session_ttl_seconds(300)
                .with_session_cookie_secure(secure),
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemorySessionStore::new()),
            Arc::new(NoopCsrfGuard),
        )
    }

    fn cookie_headers(cookie: &HeaderValue) -> HeaderMap {
        let pair = cookie
            .to_str()
            .ok()
            .and_then(|value| value.split(';').next())
            .unwrap_or_default()
            .to_string();
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&pair) {
            headers.insert(COOKIE, value);
        }
        headers
    }

    #[test]
    fn extract_session_token_finds_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; authgate_session=abc123; other=1"),
        );
        assert_eq!(extract_session_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn extract_session_token_ignores_missing_or_empty() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_session_token(&headers), None);
        headers.insert(COOKIE, HeaderValue::from_static("authgate_session="));
        assert_eq!(extract_session_token(&headers), None);
    }

    #[test]
    fn session_cookie_flags() -> anyhow::Result<()> {
        let cookie = session_cookie(&state(false), "tok")?;
        assert_eq!(
            cookie.to_str()?,
            "authgate_session=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=300"
        );
        let secure = session_cookie(&state(true), "tok")?;
        assert!(secure.to_str()?.ends_with("; Secure"));
        Ok(())
    }

    #[tokio::test]
    async fn untouched_empty_session_sets_no_cookie() -> Result<(), AuthError> {
        let state = state(false);
        let session = VisitorSession::load(&HeaderMap::new(), &state).await?;
        assert_eq!(session.commit(&state).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn modified_session_round_trips_through_cookie() -> anyhow::Result<()> {
        let state = state(false);
        let user_id = Uuid::new_v4();

        let mut session = VisitorSession::load(&HeaderMap::new(), &state).await?;
        session.data_mut().pending_user_id = Some(user_id);
        let cookie = session.commit(&state).await?.ok_or_else(|| anyhow::anyhow!("no cookie"))?;

        let headers = cookie_headers(&cookie);
        let reloaded = VisitorSession::load(&headers, &state).await?;
        assert_eq!(reloaded.data().pending_user_id, Some(user_id));

        // Unchanged sessions are not re-sent and keep their token.
        assert_eq!(reloaded.commit(&state).await?, None);
        let again = VisitorSession::load(&headers, &state).await?;
        assert_eq!(again.data().pending_user_id, Some(user_id));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_cookie_is_not_adopted() -> anyhow::Result<()> {
        let state = state(false);
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("authgate_session=attacker-chosen"));

        let mut session = VisitorSession::load(&headers, &state).await?;
        session.data_mut().pending_user_id = Some(Uuid::new_v4());
        let cookie = session.commit(&state).await?.ok_or_else(|| anyhow::anyhow!("no cookie"))?;
        assert!(!cookie.to_str()?.contains("attacker-chosen"));
        Ok(())
    }

    #[tokio::test]
    async fn cycle_key_moves_data_to_new_token() -> anyhow::Result<()> {
        let state = state(false);
        let mut session = VisitorSession::load(&HeaderMap::new(), &state).await?;
        session.data_mut().pending_user_id = Some(Uuid::new_v4());
        let first = session.commit(&state).await?.ok_or_else(|| anyhow::anyhow!("no cookie"))?;
        let first_headers = cookie_headers(&first);

        let mut session = VisitorSession::load(&first_headers, &state).await?;
        session.data_mut().user_id = Some(Uuid::new_v4());
        session.cycle_key();
        let second = session.commit(&state).await?.ok_or_else(|| anyhow::anyhow!("no cookie"))?;
        assert_ne!(first, second);

        let old = VisitorSession::load(&first_headers, &state).await?;
        assert!(old.data().is_empty());
        let new = VisitorSession::load(&cookie_headers(&second), &state).await?;
        assert!(new.data().user_id.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn flush_deletes_session_and_clears_cookie() -> anyhow::Result<()> {
        let state = state(false);
        let mut session = VisitorSession::load(&HeaderMap::new(), &state).await?;
        session.data_mut().user_id = Some(Uuid::new_v4());
        let cookie = session.commit(&state).await?.ok_or_else(|| anyhow::anyhow!("no cookie"))?;
        let headers = cookie_headers(&cookie);

        let mut session = VisitorSession::load(&headers, &state).await?;
        session.flush();
        let cleared = session.commit(&state).await?.ok_or_else(|| anyhow::anyhow!("no cookie"))?;
        assert!(cleared.to_str()?.contains("Max-Age=0"));

        let after = VisitorSession::load(&headers, &state).await?;
        assert!(after.data().is_empty());
        Ok(())
    }
}
