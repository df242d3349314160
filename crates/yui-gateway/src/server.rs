// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway state, router assembly, and the serve loop.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use dashmap::DashMap;
use tower_http::trace::TraceLayer;
use tracing::info;

use yui_config::YuiConfig;
use yui_core::{PluginAdapter, ProviderAdapter, YuiError};

use crate::ws::ws_handler;

/// One live WebSocket connection.
#[derive(Debug, Clone)]
pub struct ConnectionEntry {
    pub user_name: String,
    pub connected_at: String,
}

/// Shared state behind every gateway route.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<YuiConfig>,
    pub provider: Arc<dyn ProviderAdapter>,
    /// Live connections, keyed by connection id. Inserted on upgrade,
    /// removed on disconnect -- nothing else touches this map.
    pub connections: Arc<DashMap<String, ConnectionEntry>>,
}

impl GatewayState {
    pub fn new(config: YuiConfig, provider: Arc<dyn ProviderAdapter>) -> Self {
        Self {
            config: Arc::new(config),
            provider,
            connections: Arc::new(DashMap::new()),
        }
    }
}

/// Builds the gateway router.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/ws/{user}", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "provider": state.provider.name(),
        "connections": state.connections.len(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Binds the listener and serves until the process exits.
pub async fn serve(config: YuiConfig, provider: Arc<dyn ProviderAdapter>) -> Result<(), YuiError> {
    let addr = format!(
        "{}:{}",
        config.gateway.bind_address, config.gateway.port
    );
    let state = GatewayState::new(config, provider);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| YuiError::Internal(format!("failed to bind {addr}: {e}")))?;
    info!(%addr, "gateway listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| YuiError::Internal(format!("gateway server error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use yui_test_utils::{MockProvider, test_config};

    fn state() -> (GatewayState, tempfile::TempDir) {
        let (config, dir) = test_config();
        (
            GatewayState::new(config, Arc::new(MockProvider::new())),
            dir,
        )
    }

    #[tokio::test]
    async fn health_reports_provider_and_connections() {
        let (state, _dir) = state();
        let app = router(state.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["provider"], "mock-provider");
        assert_eq!(json["connections"], 0);
    }

    #[tokio::test]
    async fn connection_map_tracks_entries() {
        let (state, _dir) = state();
        state.connections.insert(
            "conn-1".to_string(),
            ConnectionEntry {
                user_name: "alice".to_string(),
                connected_at: "2026-03-01T00:00:00+00:00".to_string(),
            },
        );
        assert_eq!(state.connections.len(), 1);

        state.connections.remove("conn-1");
        assert!(state.connections.is_empty());
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (state, _dir) = state();
        let app = router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
