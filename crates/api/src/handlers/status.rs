//! Handlers for the external service status probe.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::Json;

use flightbay_core::status::aggregate_health;

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::wire::{FleetStatusResponse, ServiceStatusResponse};

/// GET /status
///
/// Probe every configured service in parallel and aggregate a fleet
/// health color. A failing probe degrades the color; it never fails the
/// request.
pub async fn get_fleet_status(
    State(state): State<AppState>,
) -> AppResult<Json<FleetStatusResponse>> {
    let results = state.probe.probe_all().await;

    let statuses: Vec<_> = results.iter().map(|(_, info)| info.status).collect();
    let health = aggregate_health(&statuses);

    let services: BTreeMap<String, ServiceStatusResponse> = results.into_iter().collect();

    Ok(Json(FleetStatusResponse { services, health }))
}

/// GET /status/{serviceName}
pub async fn get_service_status(
    State(state): State<AppState>,
    Path(service_name): Path<String>,
) -> AppResult<Json<ServiceStatusResponse>> {
    state
        .probe
        .probe(&service_name)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Unknown service '{service_name}'.")))
}
