//! HTTP handlers and shared response helpers.

pub mod admin;
pub mod auth;
pub mod health;
pub(crate) mod pages;
pub mod root;
pub mod welcome;

use axum::{
    http::{header::LOCATION, HeaderValue, Method, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};

/// Paths served with a trailing slash; slashless requests are redirected.
const SLASHED_PATHS: [&str; 6] = [
    "/login/",
    "/captcha/",
    "/check-captcha/",
    "/welcome/",
    "/logout/",
    "/admin/",
];

/// `302 Found` to a local path.
pub(crate) fn found(path: &'static str) -> Response {
    (
        StatusCode::FOUND,
        [(LOCATION, HeaderValue::from_static(path))],
    )
        .into_response()
}

/// Redirect `GET /login` to `/login/` and friends; everything else is a 404.
pub async fn fallback(method: Method, uri: Uri) -> Response {
    let path = uri.path();
    if (method == Method::GET || method == Method::HEAD) && !path.ends_with('/') {
        let slashed = format!("{path}/");
        if SLASHED_PATHS.contains(&slashed.as_str()) {
            let location = match uri.query() {
                Some(query) => format!("{slashed}?{query}"),
                None => slashed,
            };
            if let Ok(location) = HeaderValue::from_str(&location) {
                return (StatusCode::MOVED_PERMANENTLY, [(LOCATION, location)]).into_response();
            }
        }
    }

    (StatusCode::NOT_FOUND, Html(pages::not_found())).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn found_sets_location() {
        let response = found("/captcha/");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(LOCATION),
            Some(&HeaderValue::from_static("/captcha/"))
        );
    }

    #[tokio::test]
    async fn fallback_appends_slash_for_known_paths() {
        let response = fallback(Method::GET, Uri::from_static("/login?next=/admin/")).await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            response.headers().get(LOCATION),
            Some(&HeaderValue::from_static("/login/?next=/admin/"))
        );
    }

    #[tokio::test]
    async fn fallback_does_not_redirect_posts_or_unknown_paths() {
        let post = fallback(Method::POST, Uri::from_static("/login")).await;
        assert_eq!(post.status(), StatusCode::NOT_FOUND);

        let unknown = fallback(Method::GET, Uri::from_static("/nowhere")).await;
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    }
}
