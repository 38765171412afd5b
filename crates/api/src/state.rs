use std::sync::Arc;

use crate::config::ServerConfig;
use crate::probe::StatusProbe;
use crate::storage::UploadStorage;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: flightbay_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Chunk staging and artifact assembly filesystem layer.
    pub storage: Arc<UploadStorage>,
    /// External service status probe.
    pub probe: Arc<StatusProbe>,
}
