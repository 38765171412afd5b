//! Models for import results (owned by the external import pipeline).

use serde::Deserialize;
use sqlx::FromRow;

use flightbay_core::types::{DbId, Timestamp};

/// A row from the `imports` table.
///
/// Written by the import pipeline after it consumes an assembled upload;
/// read-only from this service's perspective.
#[derive(Debug, Clone, FromRow)]
pub struct ImportRecord {
    pub id: DbId,
    pub upload_id: DbId,
    pub status: String,
    pub valid_flights: i32,
    pub warning_flights: i32,
    pub error_flights: i32,
    pub imported_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting an import result.
///
/// In production only the pipeline inserts these; the repo method exists
/// for pipeline tooling and tests.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateImportRecord {
    pub upload_id: DbId,
    pub status: String,
    pub valid_flights: i32,
    pub warning_flights: i32,
    pub error_flights: i32,
}
