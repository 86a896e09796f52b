//! DocQR Server - HTTP surface and command line of the document service
//!
//! The [`router`] is built from an [`AppState`] holding the connection
//! manager; every route that touches the database sits behind the
//! [`require_database`](middleware::require_database) liveness gate.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::get,
};
use anyhow::Context;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod render;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::AppError;
pub use state::AppState;

/// Room for multipart framing on top of the file size limit
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state
        .uploads
        .max_bytes()
        .saturating_add(MULTIPART_OVERHEAD);

    let database_routes = Router::new()
        .route(routes::LIST_PATH, get(routes::list_documents))
        .route(
            "/api/pdf/upload",
            get(routes::upload_form).post(routes::upload_document),
        )
        .route("/api/pdf/download/{id}", get(routes::download_document))
        .route("/api/pdf/qrcode/{id}", get(routes::document_code))
        .route("/api/pdf/generate-qr", get(routes::all_codes))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_database,
        ))
        .layer(DefaultBodyLimit::max(body_limit));

    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .merge(database_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve HTTP until Ctrl+C or SIGTERM, then close the database connection.
pub async fn serve(config: &ServerConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let address = config.listen_address();
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("cannot bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, router(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down");
    state.manager.disconnect().await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
