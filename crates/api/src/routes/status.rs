//! Route definitions for the service status probe.

use axum::routing::get;
use axum::Router;

use crate::handlers::status;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(status::get_fleet_status))
        .route("/status/{service_name}", get(status::get_service_status))
}
