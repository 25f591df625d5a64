use super::handlers::{admin, auth, health, root, welcome};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        root::root,
        health::health,
        auth::login::login_form,
        auth::login::login,
        auth::challenge::captcha,
        auth::challenge::check_captcha,
        welcome::welcome,
        auth::logout::logout_link,
        auth::logout::logout,
        admin::admin,
    ),
    components(schemas(
        health::Health,
        auth::login::LoginForm,
        auth::challenge::ChallengeForm,
        auth::logout::LogoutForm,
    )),
    tags(
        (name = "authgate", description = "Landing, welcome and admin pages"),
        (name = "auth", description = "Password login, challenge and logout"),
        (name = "health", description = "Service health"),
    )
)]
struct ApiDoc;

/// `OpenAPI` document for the HTTP surface, with Cargo metadata as info.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = env!("CARGO_PKG_NAME").to_string();
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();
    doc.info.description = Some(env!("CARGO_PKG_DESCRIPTION").to_string());
    doc
}
