//! HTTP server exposing the report, chat, and workspace APIs.

pub mod routes;
pub mod state;

pub use state::ServerAppState;

use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::Json;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Run the HTTP server until shutdown is requested.
pub async fn run_server(
    port: u16,
    bind: &str,
    state: ServerAppState,
    cors_origins: Option<Vec<String>>,
) -> Result<(), String> {
    // Build CORS layer
    // Note: Using explicit headers instead of Any to avoid browser deprecation
    // warnings when the Authorization header is used with a wildcard
    let cors = match &cors_origins {
        Some(origins) if !origins.is_empty() => {
            // Restricted CORS: only allow specified origins
            let allowed_origins: Vec<HeaderValue> =
                origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods(Any)
                .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
        }
        _ => {
            // Permissive CORS: allow any origin (default for development)
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
        }
    };

    let app = routes::api_router().layer(cors).with_state(state.clone());

    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    log::info!("Server listening on http://{}", addr);

    // Create shutdown signal that waits for the shutdown state flag
    let shutdown_state = state.shutdown_state.clone();
    let shutdown_signal = async move {
        loop {
            if shutdown_state.is_shutdown_requested() {
                log::info!("Shutdown signal received, stopping server...");
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| format!("Server error: {}", e))
}

/// Health check endpoint
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
