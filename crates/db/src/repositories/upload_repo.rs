//! Repository for the upload registry.
//!
//! All state transitions for a single upload are serialized through
//! `SELECT ... FOR UPDATE` on its row, so concurrent chunk PUTs interleave
//! safely and assembly is triggered by exactly one of them. Creation races
//! are settled by the `uq_uploads_uploader_filename` constraint instead of
//! a lock: the losing insert falls through to the resume/conflict branch.

use sqlx::PgPool;

use flightbay_core::chunks::{expected_chunk_len, ChunkStatus};
use flightbay_core::status::{UPLOAD_STATUS_FAILED, UPLOAD_STATUS_UPLOADED};
use flightbay_core::types::DbId;

use crate::models::upload::{
    ChunkAccept, ChunkOutcome, CreateOutcome, CreateUpload, Upload,
};

/// Column list for `uploads`.
const UPLOAD_COLUMNS: &str = "id, uploader_id, fleet_id, filename, identifier, size_bytes, \
     number_chunks, uploaded_chunks, bytes_uploaded, chunk_status, md5_hash, status, \
     start_time, end_time, created_at, updated_at";

/// Provides registry operations for uploads.
pub struct UploadRepo;

impl UploadRepo {
    /// Create a new upload, or resolve the request against the existing
    /// record for the same `(uploader_id, filename)`.
    ///
    /// The four-way branch of the protocol:
    /// - no record: insert all-pending row, `Created`
    /// - same hash, not yet verified: `Resumed` (caller re-sends the
    ///   missing chunks per `chunk_status`)
    /// - same hash, verified: `AlreadyUploaded`
    /// - different hash: `HashConflict`, existing row untouched
    pub async fn create_or_resume(
        pool: &PgPool,
        input: &CreateUpload,
    ) -> Result<CreateOutcome, sqlx::Error> {
        let chunk_status = ChunkStatus::new_pending(input.number_chunks as u32);

        let sql = format!(
            "INSERT INTO uploads \
                (uploader_id, fleet_id, filename, identifier, size_bytes, \
                 number_chunks, chunk_status, md5_hash) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT ON CONSTRAINT uq_uploads_uploader_filename DO NOTHING \
             RETURNING {UPLOAD_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Upload>(&sql)
            .bind(input.uploader_id)
            .bind(input.fleet_id)
            .bind(&input.filename)
            .bind(&input.identifier)
            .bind(input.size_bytes)
            .bind(input.number_chunks)
            .bind(chunk_status.as_str())
            .bind(&input.md5_hash)
            .fetch_optional(pool)
            .await?;

        if let Some(upload) = inserted {
            return Ok(CreateOutcome::Created(upload));
        }

        // The insert lost to an existing row. If that row vanishes before
        // we read it (concurrent delete), surface RowNotFound and let the
        // caller retry the request.
        let existing =
            Self::find_by_uploader_and_filename(pool, input.uploader_id, &input.filename)
                .await?
                .ok_or(sqlx::Error::RowNotFound)?;

        if existing.md5_hash != input.md5_hash {
            Ok(CreateOutcome::HashConflict(existing))
        } else if existing.status == UPLOAD_STATUS_UPLOADED {
            Ok(CreateOutcome::AlreadyUploaded(existing))
        } else {
            Ok(CreateOutcome::Resumed(existing))
        }
    }

    /// Find an upload by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Upload>, sqlx::Error> {
        let sql = format!("SELECT {UPLOAD_COLUMNS} FROM uploads WHERE id = $1");
        sqlx::query_as::<_, Upload>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an upload by its identity key.
    pub async fn find_by_uploader_and_filename(
        pool: &PgPool,
        uploader_id: DbId,
        filename: &str,
    ) -> Result<Option<Upload>, sqlx::Error> {
        let sql = format!(
            "SELECT {UPLOAD_COLUMNS} FROM uploads \
             WHERE uploader_id = $1 AND filename = $2"
        );
        sqlx::query_as::<_, Upload>(&sql)
            .bind(uploader_id)
            .bind(filename)
            .fetch_optional(pool)
            .await
    }

    /// Record one received chunk of `actual_len` bytes.
    ///
    /// Runs a read-modify-write transaction under the row lock. A
    /// resubmission of an already-received chunk leaves `uploaded_chunks`
    /// and `bytes_uploaded` untouched and never reports completion, so
    /// assembly cannot be triggered twice. `completed` is true exactly for
    /// the call that flips the final pending bit.
    pub async fn mark_chunk_received(
        pool: &PgPool,
        upload_id: DbId,
        chunk_index: u32,
        actual_len: u64,
        chunk_size: u64,
    ) -> Result<ChunkOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let sql = format!("SELECT {UPLOAD_COLUMNS} FROM uploads WHERE id = $1 FOR UPDATE");
        let Some(upload) = sqlx::query_as::<_, Upload>(&sql)
            .bind(upload_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(ChunkOutcome::NotFound);
        };

        if chunk_index >= upload.number_chunks as u32 {
            return Ok(ChunkOutcome::InvalidIndex {
                number_chunks: upload.number_chunks,
            });
        }

        let expected = expected_chunk_len(chunk_index, upload.size_bytes as u64, chunk_size);
        if actual_len != expected {
            return Ok(ChunkOutcome::LengthMismatch {
                expected,
                actual: actual_len,
            });
        }

        let mut status = ChunkStatus::parse(&upload.chunk_status, upload.number_chunks as u32)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        let newly_received = status
            .mark_received(chunk_index)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        if !newly_received {
            // Resubmission: staged bytes were overwritten by the caller,
            // counters stay as a single acceptance left them.
            tx.commit().await?;
            return Ok(ChunkOutcome::Accepted(ChunkAccept {
                upload,
                newly_received: false,
                completed: false,
            }));
        }

        let sql = format!(
            "UPDATE uploads SET \
                chunk_status = $2, \
                uploaded_chunks = uploaded_chunks + 1, \
                bytes_uploaded = bytes_uploaded + $3, \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {UPLOAD_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Upload>(&sql)
            .bind(upload_id)
            .bind(status.as_str())
            .bind(actual_len as i64)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        let completed = updated.all_chunks_received();
        tracing::debug!(
            upload_id,
            chunk_index,
            uploaded_chunks = updated.uploaded_chunks,
            number_chunks = updated.number_chunks,
            completed,
            "chunk recorded"
        );
        Ok(ChunkOutcome::Accepted(ChunkAccept {
            upload: updated,
            newly_received: true,
            completed,
        }))
    }

    /// Mark an upload as assembled and verified.
    pub async fn mark_uploaded(pool: &PgPool, id: DbId) -> Result<Option<Upload>, sqlx::Error> {
        let sql = format!(
            "UPDATE uploads SET status = $2, end_time = now(), updated_at = now() \
             WHERE id = $1 \
             RETURNING {UPLOAD_COLUMNS}"
        );
        sqlx::query_as::<_, Upload>(&sql)
            .bind(id)
            .bind(UPLOAD_STATUS_UPLOADED)
            .fetch_optional(pool)
            .await
    }

    /// Mark an upload as failed (assembly corruption).
    pub async fn mark_failed(pool: &PgPool, id: DbId) -> Result<Option<Upload>, sqlx::Error> {
        let sql = format!(
            "UPDATE uploads SET status = $2, updated_at = now() \
             WHERE id = $1 \
             RETURNING {UPLOAD_COLUMNS}"
        );
        sqlx::query_as::<_, Upload>(&sql)
            .bind(id)
            .bind(UPLOAD_STATUS_FAILED)
            .fetch_optional(pool)
            .await
    }

    /// One page of an uploader's uploads, newest first, plus the total
    /// page count for the pager.
    pub async fn list_page(
        pool: &PgPool,
        uploader_id: DbId,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<Upload>, i64), sqlx::Error> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM uploads WHERE uploader_id = $1")
            .bind(uploader_id)
            .fetch_one(pool)
            .await?;

        let sql = format!(
            "SELECT {UPLOAD_COLUMNS} FROM uploads \
             WHERE uploader_id = $1 \
             ORDER BY start_time DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        let uploads = sqlx::query_as::<_, Upload>(&sql)
            .bind(uploader_id)
            .bind(page_size)
            .bind(page * page_size)
            .fetch_all(pool)
            .await?;

        let divisor = page_size.max(1);
        let number_pages = (total + divisor - 1) / divisor;
        Ok((uploads, number_pages))
    }

    /// Position of an `UPLOADED` upload in the import pickup queue
    /// (1-based): the number of older uploads still awaiting import, +1.
    pub async fn queue_position(pool: &PgPool, upload_id: DbId) -> Result<i64, sqlx::Error> {
        let ahead: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM uploads u \
             WHERE u.id < $1 AND u.status = $2 \
               AND NOT EXISTS (SELECT 1 FROM imports i WHERE i.upload_id = u.id)",
        )
        .bind(upload_id)
        .bind(UPLOAD_STATUS_UPLOADED)
        .fetch_one(pool)
        .await?;
        Ok(ahead + 1)
    }

    /// Delete an upload row. Associated import rows cascade.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM uploads WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
