//! HTTP router and handlers

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::slack::{CallbackState, handle_callback};

/// Create the router: the callback on its configured path plus `/health`
pub fn create_router(state: Arc<CallbackState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(&state.callback_path, get(handle_callback))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler (GET /health)
async fn health_handler(State(state): State<Arc<CallbackState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "credentials_configured": state.credentials.is_some(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderCredentials;
    use crate::slack::{SlackTokenClient, TokenExchanger};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    fn state(credentials: Option<ProviderCredentials>, callback_path: &str) -> Arc<CallbackState> {
        let exchanger: Arc<dyn TokenExchanger> = Arc::new(SlackTokenClient::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1/api/oauth.v2.access",
        ));
        Arc::new(CallbackState {
            credentials,
            exchanger,
            callback_path: callback_path.to_string(),
            app_path: String::new(),
        })
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header("host", "example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_missing_credentials() {
        let app = create_router(state(None, "/api/slack-callback"));
        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["credentials_configured"], false);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn health_reports_configured_credentials() {
        let creds = ProviderCredentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        };
        let app = create_router(state(Some(creds), "/api/slack-callback"));
        let (_, body) = get_json(app, "/health").await;
        assert_eq!(body["credentials_configured"], true);
    }

    #[tokio::test]
    async fn callback_is_mounted_on_configured_path() {
        let app = create_router(state(None, "/oauth/slack"));

        let (status, body) = get_json(app.clone(), "/oauth/slack").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing code parameter");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/slack-callback")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
