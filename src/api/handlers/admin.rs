//! Admin landing page.
//!
//! Only an authenticated elevated user gets through; anyone else, including a
//! visitor with a pending login, is sent to `/login/`.

use axum::{
    extract::Extension,
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

use super::{
    auth::{
        principal::current_user,
        session::{with_cookie, VisitorSession},
        AuthError, AuthState,
    },
    found, pages,
};

#[utoipa::path(
    get,
    path = "/admin/",
    responses(
        (status = 200, description = "Admin landing page", body = String, content_type = "text/html"),
        (status = 302, description = "Not an authenticated admin, redirect to /login/")
    ),
    tag = "authgate"
)]
pub async fn admin(
    headers: HeaderMap,
    Extension(auth_state): Extension<Arc<AuthState>>,
) -> Result<Response, AuthError> {
    let mut session = VisitorSession::load(&headers, &auth_state).await?;
    let user = match current_user(&session, &auth_state).await? {
        Some(user) if user.is_admin => user,
        _ => {
            debug!("admin access denied");
            return Ok(found("/login/"));
        }
    };

    let csrf_token = auth_state.csrf().issue(session.data_mut())?;
    let page = pages::admin(&user.username, &csrf_token);
    let cookie = session.commit(&auth_state).await?;
    Ok(with_cookie(Html(page).into_response(), cookie))
}
