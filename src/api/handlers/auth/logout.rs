//! Logout: drop the visitor session and clear the cookie.

use axum::{extract::Extension, http::HeaderMap, response::Response, Form};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use super::{
    error::AuthError,
    session::{with_cookie, VisitorSession},
    state::AuthState,
};
use crate::api::handlers::found;

#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct LogoutForm {
    #[serde(default)]
    pub csrf_token: Option<String>,
}

#[utoipa::path(
    get,
    path = "/logout/",
    responses(
        (status = 302, description = "Session ended, redirect to /")
    ),
    tag = "auth"
)]
pub async fn logout_link(
    headers: HeaderMap,
    Extension(auth_state): Extension<Arc<AuthState>>,
) -> Result<Response, AuthError> {
    let session = VisitorSession::load(&headers, &auth_state).await?;
    end_session(session, &auth_state).await
}

#[utoipa::path(
    post,
    path = "/logout/",
    request_body(content = LogoutForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Session ended, redirect to /"),
        (status = 403, description = "CSRF verification failed")
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    Extension(auth_state): Extension<Arc<AuthState>>,
    Form(form): Form<LogoutForm>,
) -> Result<Response, AuthError> {
    let session = VisitorSession::load(&headers, &auth_state).await?;
    if !auth_state
        .csrf()
        .verify(session.data(), form.csrf_token.as_deref())
    {
        return Err(AuthError::CsrfRejected);
    }
    end_session(session, &auth_state).await
}

async fn end_session(
    mut session: VisitorSession,
    auth_state: &AuthState,
) -> Result<Response, AuthError> {
    if let Some(user_id) = session.data().user_id {
        info!(%user_id, "logged out");
    }
    session.flush();
    let cookie = session.commit(auth_state).await?;
    Ok(with_cookie(found("/"), cookie))
}
