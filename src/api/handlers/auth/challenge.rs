//! Challenge prompt and answer check: the second step of the flow.

use axum::{
    extract::Extension,
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
    Form,
};
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use super::{
    error::AuthError,
    gate::{check_challenge, Destination},
    session::{with_cookie, VisitorSession},
    state::AuthState,
};
use crate::api::handlers::{found, pages};

#[derive(ToSchema, Deserialize, Debug)]
pub struct ChallengeForm {
    /// Submitted tile order, e.g. `1,2,3,4`.
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub csrf_token: Option<String>,
}

#[utoipa::path(
    get,
    path = "/captcha/",
    responses(
        (status = 200, description = "Challenge prompt", body = String, content_type = "text/html")
    ),
    tag = "auth"
)]
pub async fn captcha(
    headers: HeaderMap,
    Extension(auth_state): Extension<Arc<AuthState>>,
) -> Result<Response, AuthError> {
    let mut session = VisitorSession::load(&headers, &auth_state).await?;
    let csrf_token = auth_state.csrf().issue(session.data_mut())?;

    let mut tiles = auth_state.config().challenge().tiles();
    tiles.shuffle(&mut rand::thread_rng());
    let page = pages::captcha(&csrf_token, &tiles);

    let cookie = session.commit(&auth_state).await?;
    Ok(with_cookie(Html(page).into_response(), cookie))
}

#[utoipa::path(
    post,
    path = "/check-captcha/",
    request_body(content = ChallengeForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Redirect to /admin/ or /welcome/ on success, /captcha/ otherwise"),
        (status = 403, description = "CSRF verification failed")
    ),
    tag = "auth"
)]
#[instrument(skip(headers, auth_state, form))]
pub async fn check_captcha(
    headers: HeaderMap,
    Extension(auth_state): Extension<Arc<AuthState>>,
    Form(form): Form<ChallengeForm>,
) -> Result<Response, AuthError> {
    let mut session = VisitorSession::load(&headers, &auth_state).await?;
    if !auth_state
        .csrf()
        .verify(session.data(), form.csrf_token.as_deref())
    {
        return Err(AuthError::CsrfRejected);
    }

    let submitted = form.order.unwrap_or_default();
    let destination = match check_challenge(
        session.data_mut(),
        &submitted,
        auth_state.config().challenge(),
        auth_state.users(),
    )
    .await
    {
        Ok(destination) => {
            session.cycle_key();
            destination
        }
        Err(AuthError::ChallengeMismatch) => {
            debug!("challenge failed, back to prompt");
            Destination::Challenge
        }
        Err(err) => return Err(err),
    };

    let cookie = session.commit(&auth_state).await?;
    Ok(with_cookie(found(destination.path()), cookie))
}
