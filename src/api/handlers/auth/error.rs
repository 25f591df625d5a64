use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::api::handlers::pages;

/// Failures produced by the login flow.
///
/// `InvalidCredentials` and `ChallengeMismatch` are recoverable and never shown
/// to the visitor with any detail. `Store` wraps infrastructure failures from
/// the user or session backends.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("challenge mismatch")]
    ChallengeMismatch,
    #[error("csrf verification failed")]
    CsrfRejected,
    #[error("username already exists: {0}")]
    DuplicateUsername(String),
    #[error("invalid username: {0}")]
    InvalidUsername(String),
    #[error("store failure: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::CsrfRejected => (StatusCode::FORBIDDEN, Html(pages::forbidden())).into_response(),
            Self::Store(err) => {
                error!("Auth store failure: {err:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, Html(pages::server_error())).into_response()
            }
            other => (StatusCode::BAD_REQUEST, other.to_string()).into_response(),
        }
    }
}
