//! Response DTOs in the wire format the protocol speaks: camelCase field
//! names, decoded/encoded exactly once at this boundary.

use std::collections::BTreeMap;

use serde::Serialize;

use flightbay_core::status::{FleetHealth, ServiceStatus};
use flightbay_core::types::{DbId, Timestamp};
use flightbay_db::models::import::ImportRecord;
use flightbay_db::models::upload::Upload;

/// An upload record as sent to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadInfo {
    pub id: DbId,
    pub identifier: String,
    pub filename: String,
    pub size_bytes: i64,
    pub number_chunks: i32,
    pub uploaded_chunks: i32,
    pub bytes_uploaded: i64,
    pub chunk_status: String,
    pub md5_hash: String,
    pub status: String,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    /// Import pickup queue position, present only on `UPLOADED` rows in
    /// list responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<i64>,
}

impl From<Upload> for UploadInfo {
    fn from(u: Upload) -> Self {
        Self {
            id: u.id,
            identifier: u.identifier,
            filename: u.filename,
            size_bytes: u.size_bytes,
            number_chunks: u.number_chunks,
            uploaded_chunks: u.uploaded_chunks,
            bytes_uploaded: u.bytes_uploaded,
            chunk_status: u.chunk_status,
            md5_hash: u.md5_hash,
            status: u.status,
            start_time: u.start_time,
            end_time: u.end_time,
            queue_position: None,
        }
    }
}

/// One page of the uploads list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadsPage {
    pub uploads: Vec<UploadInfo>,
    pub number_pages: i64,
}

/// An import result as sent to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportInfo {
    pub id: DbId,
    pub upload_id: DbId,
    pub status: String,
    pub valid_flights: i32,
    pub warning_flights: i32,
    pub error_flights: i32,
    pub imported_at: Timestamp,
}

impl From<ImportRecord> for ImportInfo {
    fn from(r: ImportRecord) -> Self {
        Self {
            id: r.id,
            upload_id: r.upload_id,
            status: r.status,
            valid_flights: r.valid_flights,
            warning_flights: r.warning_flights,
            error_flights: r.error_flights,
            imported_at: r.imported_at,
        }
    }
}

/// One page of the imports list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportsPage {
    pub imports: Vec<ImportInfo>,
    pub number_pages: i64,
}

/// Status of one probed service.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatusResponse {
    pub status: ServiceStatus,
    pub message: String,
}

/// Aggregate status of every probed service.
#[derive(Debug, Serialize)]
pub struct FleetStatusResponse {
    pub services: BTreeMap<String, ServiceStatusResponse>,
    pub health: FleetHealth,
}

/// The protocol's `{}` success payload (delete).
#[derive(Debug, Serialize)]
pub struct Empty {}
