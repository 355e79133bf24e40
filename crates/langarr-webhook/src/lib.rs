//! Webhook transport for intake notifications.
//!
//! This crate owns the HTTP surface: routing, authentication, and
//! payload-shape validation. The decision and reconciliation logic
//! lives in profile-sync-core; handlers only dispatch into it.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use profile_sync_core::{process_webhook, webhook, CatalogInstance, IntakeInstance};
use profile_sync_models::WebhookPayload;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct WebhookState {
    pub auth_token: Option<String>,
    pub intakes: Arc<Vec<Arc<IntakeInstance>>>,
    pub catalogs: Arc<Vec<Arc<CatalogInstance>>>,
}

pub fn create_router(state: WebhookState) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Bind and serve until the process exits. Runs alongside the
/// scheduler for the daemon's lifetime.
pub async fn serve(state: WebhookState, bind_address: &str, port: u16) -> std::io::Result<()> {
    let addr = format!("{}:{}", bind_address, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Webhook server listening on http://{}", addr);
    axum::serve(listener, create_router(state)).await
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn handle_webhook(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    Json(payload): Json<WebhookPayload>,
) -> impl IntoResponse {
    if let Some(expected) = &state.auth_token {
        let provided = headers.get("X-Auth-Token").and_then(|value| value.to_str().ok());
        if provided != Some(expected.as_str()) {
            warn!("Webhook request with invalid auth token");
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "Unauthorized" })),
            )
                .into_response();
        }
    }

    let notification_type = payload.notification_type.as_deref().unwrap_or("");
    info!("Received webhook: {}", notification_type);

    if webhook::is_actionable(notification_type) {
        if let Err(e) = process_webhook(&payload, &state.intakes, &state.catalogs).await {
            error!("Error processing webhook: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    } else {
        debug!("Ignoring notification type: {}", notification_type);
    }

    (StatusCode::OK, Json(serde_json::json!({ "status": "success" }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    fn state(auth_token: Option<&str>) -> WebhookState {
        WebhookState {
            auth_token: auth_token.map(|s| s.to_string()),
            intakes: Arc::new(Vec::new()),
            catalogs: Arc::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(state(None));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_webhook_rejects_bad_token() {
        let app = create_router(state(Some("secret")));
        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("Content-Type", "application/json")
            .header("X-Auth-Token", "wrong")
            .body(Body::from("{}"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_webhook_acknowledges_irrelevant_notifications() {
        // Unhandled types are accepted so the intake service does not
        // retry or disable the webhook.
        let app = create_router(state(None));
        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("Content-Type", "application/json")
            .body(Body::from(r#"{"notification_type": "MEDIA_AVAILABLE"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_webhook_without_intake_instances_still_succeeds() {
        let app = create_router(state(None));
        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("Content-Type", "application/json")
            .body(Body::from(
                r#"{"notification_type": "MEDIA_PENDING", "media": {"tmdbId": 603, "media_type": "movie"}}"#,
            ))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
