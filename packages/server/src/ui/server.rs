//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::{
    handler::{
        create_room, create_user, get_room, get_user, health_check, hub_handler, join_room,
        post_realtime, socket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket endpoints
        .route("/realtime", get(hub_handler))
        .route("/api/socket", get(socket_handler))
        // HTTP endpoints
        .route("/api/health", get(health_check))
        .route("/api/realtime", post(post_realtime))
        .route("/api/users", post(create_user))
        .route("/api/users/{id}", get(get_user))
        .route("/api/rooms", post(create_room))
        .route("/api/rooms/{room_id}", get(get_room))
        .route("/api/rooms/{room_id}/players", post(join_room))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Turup's Gambit server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(AppState::in_memory(None));
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Bind to `host:port` and serve until a shutdown signal arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if binding fails or the server stops abnormally.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Turup server listening on {}", listener.local_addr()?);
        tracing::info!("Realtime hub: ws://{}/realtime", bind_addr);
        tracing::info!("Socket fallback: ws://{}/api/socket", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}
