//! Login form: the password step of the flow.

use axum::{
    extract::Extension,
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
    Form,
};
use secrecy::SecretString;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::{
    error::AuthError,
    gate::{begin_pending, Destination},
    session::{with_cookie, VisitorSession},
    state::AuthState,
    verifier::verify_credentials,
};
use crate::api::handlers::{found, pages};

#[derive(ToSchema, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub csrf_token: Option<String>,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"***")
            .finish_non_exhaustive()
    }
}

#[utoipa::path(
    get,
    path = "/login/",
    responses(
        (status = 200, description = "Login form", body = String, content_type = "text/html")
    ),
    tag = "auth"
)]
pub async fn login_form(
    headers: HeaderMap,
    Extension(auth_state): Extension<Arc<AuthState>>,
) -> Result<Response, AuthError> {
    let session = VisitorSession::load(&headers, &auth_state).await?;
    render_form(session, &auth_state, "", false).await
}

#[utoipa::path(
    post,
    path = "/login/",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Credentials accepted, redirect to /captcha/"),
        (status = 200, description = "Invalid credentials, form shown again", body = String, content_type = "text/html"),
        (status = 403, description = "CSRF verification failed")
    ),
    tag = "auth"
)]
#[instrument(skip(headers, auth_state))]
pub async fn login(
    headers: HeaderMap,
    Extension(auth_state): Extension<Arc<AuthState>>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AuthError> {
    let mut session = VisitorSession::load(&headers, &auth_state).await?;
    if !auth_state
        .csrf()
        .verify(session.data(), form.csrf_token.as_deref())
    {
        return Err(AuthError::CsrfRejected);
    }

    let password = SecretString::from(form.password);
    match verify_credentials(
        auth_state.users(),
        auth_state.hasher(),
        &form.username,
        &password,
    )
    .await
    {
        Ok(user) => {
            begin_pending(session.data_mut(), user.id);
            info!(user_id = %user.id, "credentials accepted, challenge pending");
            let cookie = session.commit(&auth_state).await?;
            Ok(with_cookie(found(Destination::Challenge.path()), cookie))
        }
        Err(AuthError::InvalidCredentials) => {
            info!("login rejected");
            render_form(session, &auth_state, &form.username, true).await
        }
        Err(err) => Err(err),
    }
}

async fn render_form(
    mut session: VisitorSession,
    auth_state: &AuthState,
    username: &str,
    failed: bool,
) -> Result<Response, AuthError> {
    let csrf_token = auth_state.csrf().issue(session.data_mut())?;
    let page = pages::login(&csrf_token, username, failed);
    let cookie = session.commit(auth_state).await?;
    Ok(with_cookie(Html(page).into_response(), cookie))
}
