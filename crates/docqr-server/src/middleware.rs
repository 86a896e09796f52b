//! Liveness gate in front of every database route

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::AppError;
use crate::render;
use crate::state::AppState;

/// Paths answered with an HTML page instead of JSON when unavailable
const HTML_PATHS: &[&str] = &["/api/pdf/list", "/api/pdf/upload"];

/// Reject the request with 503 unless the database connection is live.
///
/// Only reads the manager's state; no I/O happens here.
pub async fn require_database(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if state.manager.is_live() {
        return next.run(request).await;
    }

    tracing::warn!(
        path = %request.uri().path(),
        state = %state.manager.state(),
        "database not live, rejecting request"
    );

    if request.method() == axum::http::Method::GET && HTML_PATHS.contains(&request.uri().path()) {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Html(render::unavailable_page()),
        )
            .into_response()
    } else {
        AppError::DatabaseUnavailable.into_response()
    }
}
