use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::ToSchema;

use super::auth::AuthState;
use crate::GIT_COMMIT_HASH;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    users: String,
    sessions: String,
}

fn status_label(ok: bool) -> String {
    let label = if ok { "ok" } else { "error" };
    label.to_string()
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "User and session stores are healthy", body = Health),
        (status = 503, description = "User or session store is unhealthy", body = Health)
    ),
    tag = "health"
)]
pub async fn health(
    method: Method,
    Extension(auth_state): Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let users = match auth_state.users().ping().await {
        Ok(()) => true,
        Err(err) => {
            error!("User store is unhealthy: {err}");
            false
        }
    };
    let sessions = match auth_state.sessions().ping().await {
        Ok(()) => true,
        Err(err) => {
            error!("Session store is unhealthy: {err}");
            false
        }
    };

    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        users: status_label(users),
        sessions: status_label(sessions),
    };

    let body = if method == Method::GET {
        Json(&health).into_response()
    } else {
        Body::empty().into_response()
    };

    let short_hash = health.commit.get(0..7).unwrap_or_default();

    let mut headers = HeaderMap::new();
    match format!("{}:{}:{}", health.name, health.version, short_hash).parse::<HeaderValue>() {
        Ok(x_app) => {
            debug!("X-App header: {:?}", x_app);
            headers.insert("X-App", x_app);
        }
        Err(err) => error!("Failed to parse X-App header: {}", err),
    }

    if users && sessions {
        (StatusCode::OK, headers, body)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, headers, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::{
        AuthConfig, AuthError, MemorySessionStore, MemoryUserStore, NoopCsrfGuard, SessionData,
        SessionStore,
    };
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::time::Duration;

    struct DownSessions;

    #[async_trait]
    impl SessionStore for DownSessions {
        async fn load(&self, _token: &str) -> Result<Option<SessionData>, AuthError> {
            Err(anyhow!("down").into())
        }
        async fn save(&self, _: &str, _: &SessionData, _: Duration) -> Result<(), AuthError> {
            Err(anyhow!("down").into())
        }
        async fn delete(&self, _token: &str) -> Result<(), AuthError> {
            Err(anyhow!("down").into())
        }
        async fn ping(&self) -> Result<(), AuthError> {
            Err(anyhow!("down").into())
        }
    }

    fn state(sessions: Arc<dyn SessionStore>) -> Arc<AuthState> {
        Arc::new(AuthState::new(
            AuthConfig::new(),
            Arc::new(MemoryUserStore::new()),
            sessions,
            Arc::new(NoopCsrfGuard),
        ))
    }

    #[tokio::test]
    async fn healthy_stores_return_ok_with_x_app() -> Result<()> {
        let response = health(Method::GET, Extension(state(Arc::new(MemorySessionStore::new()))))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let x_app = response
            .headers()
            .get("X-App")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        assert!(x_app.starts_with(concat!(env!("CARGO_PKG_NAME"), ":")));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body: serde_json::Value = serde_json::from_slice(&bytes)?;
        assert_eq!(body["users"], "ok");
        assert_eq!(body["sessions"], "ok");
        Ok(())
    }

    #[tokio::test]
    async fn failing_store_returns_service_unavailable() -> Result<()> {
        let response = health(Method::GET, Extension(state(Arc::new(DownSessions))))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body: serde_json::Value = serde_json::from_slice(&bytes)?;
        assert_eq!(body["sessions"], "error");
        Ok(())
    }
}
