use axum::{
    extract::Extension,
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;

use super::{
    auth::{
        principal::current_user,
        session::{with_cookie, VisitorSession},
        AuthError, AuthState,
    },
    pages,
};

// No access check here; the page simply greets whoever is logged in.
#[utoipa::path(
    get,
    path = "/welcome/",
    responses(
        (status = 200, description = "Post-login page", body = String, content_type = "text/html")
    ),
    tag = "authgate"
)]
pub async fn welcome(
    headers: HeaderMap,
    Extension(auth_state): Extension<Arc<AuthState>>,
) -> Result<Response, AuthError> {
    let mut session = VisitorSession::load(&headers, &auth_state).await?;
    let page = match current_user(&session, &auth_state).await? {
        Some(user) => {
            let csrf_token = auth_state.csrf().issue(session.data_mut())?;
            pages::welcome(Some(&user.username), &csrf_token)
        }
        None => pages::welcome(None, ""),
    };
    let cookie = session.commit(&auth_state).await?;
    Ok(with_cookie(Html(page).into_response(), cookie))
}
