use axum::response::Html;

use super::pages;

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Landing page", body = String, content_type = "text/html")
    ),
    tag = "authgate"
)]
pub async fn root() -> Html<String> {
    Html(pages::index())
}
