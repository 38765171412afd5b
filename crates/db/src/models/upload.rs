//! Models for the upload registry.

use serde::Deserialize;
use sqlx::FromRow;

use flightbay_core::types::{DbId, Timestamp};

/// A row from the `uploads` table.
#[derive(Debug, Clone, FromRow)]
pub struct Upload {
    pub id: DbId,
    pub uploader_id: DbId,
    pub fleet_id: DbId,
    pub filename: String,
    pub identifier: String,
    pub size_bytes: i64,
    pub number_chunks: i32,
    pub uploaded_chunks: i32,
    pub bytes_uploaded: i64,
    /// One character per chunk, `'0'` = pending, `'1'` = received.
    pub chunk_status: String,
    pub md5_hash: String,
    pub status: String,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Upload {
    /// Whether every chunk of this upload has been received.
    pub fn all_chunks_received(&self) -> bool {
        self.uploaded_chunks == self.number_chunks
    }
}

/// DTO for inserting a new upload row.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUpload {
    pub uploader_id: DbId,
    pub fleet_id: DbId,
    /// Already sanitized and charset-validated.
    pub filename: String,
    pub identifier: String,
    pub size_bytes: i64,
    pub number_chunks: i32,
    pub md5_hash: String,
}

/// Outcome of the create-or-resume branch of the registry.
#[derive(Debug)]
pub enum CreateOutcome {
    /// No prior record existed; a new one was inserted.
    Created(Upload),
    /// A record with the same hash exists and is not fully uploaded yet;
    /// the caller should resume from its `chunk_status`.
    Resumed(Upload),
    /// A record with the same hash was already assembled and verified.
    AlreadyUploaded(Upload),
    /// A record with the same filename carries a different hash.
    HashConflict(Upload),
}

/// Outcome of accepting one chunk.
#[derive(Debug)]
pub enum ChunkOutcome {
    /// The upload row does not exist (stale or deleted id).
    NotFound,
    /// The chunk index is outside `0..number_chunks`.
    InvalidIndex { number_chunks: i32 },
    /// The chunk byte length does not match what this index must carry.
    LengthMismatch { expected: u64, actual: u64 },
    /// The chunk was recorded (or re-recorded).
    Accepted(ChunkAccept),
}

/// A successfully recorded chunk.
#[derive(Debug)]
pub struct ChunkAccept {
    /// The row after the update.
    pub upload: Upload,
    /// False when this was a resubmission of an already-received chunk
    /// (counters untouched).
    pub newly_received: bool,
    /// True exactly once per upload: when this acceptance flipped the
    /// final pending bit. The caller triggers assembly on it.
    pub completed: bool,
}
