pub mod health;
pub mod status;
pub mod upload;

use axum::Router;

use crate::state::AppState;

/// Build the full route tree (all endpoints are root-level).
///
/// ```text
/// /health                      service + database health
///
/// /upload                      create (POST), list (GET)
/// /upload/imported             list import results (GET)
/// /upload/{id}                 delete (DELETE)
/// /upload/{id}/chunk/{n}       accept chunk (PUT)
/// /upload/{id}/file            download artifact (GET)
///
/// /status                      all services + fleet health (GET)
/// /status/{serviceName}        one service (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(upload::router())
        .merge(status::router())
}
