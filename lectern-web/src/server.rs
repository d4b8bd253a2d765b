//! Axum server wiring for the Lectern JSON API.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use lectern_core::api::BbbClient;
use lectern_core::config::LecternConfig;
use lectern_core::recording::RecordingAggregator;
use lectern_core::session::SessionResolver;
use tower_http::cors::CorsLayer;

use crate::handlers::recording_list_table;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<RecordingAggregator>,
    pub client: Arc<BbbClient>,
    pub sessions: Arc<dyn SessionResolver>,
    pub config: LecternConfig,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/activities/{activity_id}/recordings/table",
            get(recording_list_table),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Runs the API server until the process is stopped.
pub async fn run_server(
    state: AppState,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
