//! Handlers for the chunked upload protocol.
//!
//! The sequence per file: `POST /upload` creates or resumes the record,
//! then one `PUT /upload/{id}/chunk/{n}` per pending chunk. The PUT that
//! flips the final pending bit assembles and verifies the artifact before
//! responding, so its response already carries the terminal status.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use flightbay_core::chunks::{expected_chunk_len, number_chunks};
use flightbay_core::error::{CoreError, UploadError};
use flightbay_core::filename::sanitize_and_validate;
use flightbay_core::status::UPLOAD_STATUS_UPLOADED;
use flightbay_core::types::DbId;
use flightbay_db::models::upload::{ChunkOutcome, CreateOutcome, CreateUpload, Upload};
use flightbay_db::repositories::{ImportRepo, UploadRepo};

use crate::error::{AppError, AppResult};
use crate::extract::UploaderContext;
use crate::state::AppState;
use crate::storage::AssemblyOutcome;
use crate::wire::{Empty, ImportsPage, UploadInfo, UploadsPage};

// ── Create / resume ──────────────────────────────────────────────────

/// The `NEW_UPLOAD` form fields.
#[derive(Debug)]
struct NewUploadForm {
    request: String,
    filename: String,
    identifier: String,
    number_chunks: i64,
    size_bytes: i64,
    md5_hash: String,
}

impl NewUploadForm {
    /// Collect the form fields from a multipart body.
    async fn from_multipart(multipart: &mut Multipart) -> Result<Self, AppError> {
        let mut request = None;
        let mut filename = None;
        let mut identifier = None;
        let mut number_chunks = None;
        let mut size_bytes = None;
        let mut md5_hash = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            match name.as_str() {
                "request" => request = Some(value),
                "filename" => filename = Some(value),
                "identifier" => identifier = Some(value),
                "numberChunks" => number_chunks = Some(value),
                "sizeBytes" => size_bytes = Some(value),
                "md5Hash" => md5_hash = Some(value),
                _ => {}
            }
        }

        Ok(Self {
            request: required(request, "request")?,
            filename: required(filename, "filename")?,
            identifier: required(identifier, "identifier")?,
            number_chunks: parse_number(required(number_chunks, "numberChunks")?, "numberChunks")?,
            size_bytes: parse_number(required(size_bytes, "sizeBytes")?, "sizeBytes")?,
            md5_hash: required(md5_hash, "md5Hash")?,
        })
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Upload field '{name}' was missing.")))
}

fn parse_number(value: String, name: &str) -> Result<i64, AppError> {
    value
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Upload field '{name}' must be an integer.")))
}

fn is_md5_hex(hash: &str) -> bool {
    hash.len() == 32 && hash.bytes().all(|b| b.is_ascii_hexdigit())
}

/// POST /upload
///
/// Create a new upload record, or resolve the request against the
/// existing record with the same filename: resume (same hash, still
/// uploading), `ALREADY_UPLOADED` (same hash, verified), or
/// `HASH_CONFLICT` (different content under the same name).
pub async fn create_upload(
    State(state): State<AppState>,
    ctx: UploaderContext,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<UploadInfo>)> {
    let form = NewUploadForm::from_multipart(&mut multipart).await?;

    if form.request != "NEW_UPLOAD" {
        return Err(AppError::BadRequest(format!(
            "Unsupported request type '{}'.",
            form.request
        )));
    }

    let filename = sanitize_and_validate(&form.filename)?;

    if form.size_bytes <= 0 {
        return Err(AppError::BadRequest(
            "Upload field 'sizeBytes' must be positive.".into(),
        ));
    }
    let expected_chunks = number_chunks(form.size_bytes as u64, state.config.chunk_size_bytes);
    if form.number_chunks != expected_chunks as i64 {
        return Err(AppError::BadRequest(format!(
            "Upload field 'numberChunks' must be {expected_chunks} for {} bytes at {}-byte chunks.",
            form.size_bytes, state.config.chunk_size_bytes
        )));
    }
    if !is_md5_hex(&form.md5_hash) {
        return Err(AppError::BadRequest(
            "Upload field 'md5Hash' must be a 32-character hex digest.".into(),
        ));
    }

    let outcome = UploadRepo::create_or_resume(
        &state.pool,
        &CreateUpload {
            uploader_id: ctx.uploader_id,
            fleet_id: ctx.fleet_id,
            filename,
            identifier: form.identifier,
            size_bytes: form.size_bytes,
            number_chunks: form.number_chunks as i32,
            md5_hash: form.md5_hash,
        },
    )
    .await?;

    match outcome {
        CreateOutcome::Created(upload) => {
            tracing::info!(upload_id = upload.id, filename = %upload.filename, "New upload created");
            Ok((StatusCode::CREATED, Json(upload.into())))
        }
        CreateOutcome::Resumed(upload) => {
            tracing::info!(
                upload_id = upload.id,
                uploaded_chunks = upload.uploaded_chunks,
                number_chunks = upload.number_chunks,
                "Resuming upload"
            );
            Ok((StatusCode::OK, Json(upload.into())))
        }
        CreateOutcome::AlreadyUploaded(_) => Err(UploadError::AlreadyUploaded.into()),
        CreateOutcome::HashConflict(existing) => {
            tracing::warn!(
                upload_id = existing.id,
                filename = %existing.filename,
                "Hash conflict on upload creation"
            );
            Err(UploadError::HashConflict.into())
        }
    }
}

// ── Chunk acceptance ─────────────────────────────────────────────────

/// PUT /upload/{id}/chunk/{n}
///
/// Accept one chunk (multipart, single part = raw chunk bytes). The call
/// that flips the final pending bit assembles the artifact inline; its
/// response carries `UPLOADED`, or the corruption error.
pub async fn put_chunk(
    State(state): State<AppState>,
    ctx: UploaderContext,
    Path((id, chunk_index)): Path<(DbId, u32)>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadInfo>> {
    let mut bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if bytes.is_some() {
            return Err(AppError::BadRequest(
                "Multiple parts attached to chunk upload.".into(),
            ));
        }
        bytes = Some(
            field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?,
        );
    }
    let Some(bytes) = bytes else {
        return Err(AppError::BadRequest(
            "No chunk part attached to request.".into(),
        ));
    };

    let upload = UploadRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(UploadError::UploadNotFound)?;
    // Ownership: uploads of other uploaders are indistinguishable from
    // nonexistent ones.
    if upload.uploader_id != ctx.uploader_id {
        return Err(UploadError::UploadNotFound.into());
    }

    if chunk_index >= upload.number_chunks as u32 {
        return Err(CoreError::Validation(format!(
            "Chunk index {chunk_index} out of range: upload has {} chunks.",
            upload.number_chunks
        ))
        .into());
    }
    let expected = expected_chunk_len(
        chunk_index,
        upload.size_bytes as u64,
        state.config.chunk_size_bytes,
    );
    if bytes.len() as u64 != expected {
        return Err(CoreError::Validation(format!(
            "Chunk {chunk_index} must be {expected} bytes, got {}.",
            bytes.len()
        ))
        .into());
    }

    state
        .storage
        .write_chunk(&upload, chunk_index, &bytes)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to stage chunk: {e}")))?;

    let outcome = UploadRepo::mark_chunk_received(
        &state.pool,
        id,
        chunk_index,
        bytes.len() as u64,
        state.config.chunk_size_bytes,
    )
    .await?;

    match outcome {
        ChunkOutcome::NotFound => {
            // The upload was deleted while we were staging; drop the
            // orphaned part so nothing accumulates.
            state.storage.remove_chunk(&upload, chunk_index).await;
            Err(UploadError::UploadNotFound.into())
        }
        ChunkOutcome::InvalidIndex { number_chunks } => Err(CoreError::Validation(format!(
            "Chunk index {chunk_index} out of range: upload has {number_chunks} chunks."
        ))
        .into()),
        ChunkOutcome::LengthMismatch { expected, actual } => Err(CoreError::Validation(format!(
            "Chunk {chunk_index} must be {expected} bytes, got {actual}."
        ))
        .into()),
        ChunkOutcome::Accepted(accept) => {
            // A straggler resubmission after assembly re-created the
            // staging dir; the artifact already exists, so drop the part.
            if !accept.newly_received && accept.upload.status == UPLOAD_STATUS_UPLOADED {
                state.storage.remove_chunk(&accept.upload, chunk_index).await;
            }
            let upload = if accept.completed {
                finish_assembly(&state, accept.upload).await?
            } else {
                accept.upload
            };
            Ok(Json(upload.into()))
        }
    }
}

/// Assemble and verify a fully-received upload, then persist the terminal
/// status. Runs inline in the final chunk PUT; the row keeps reading
/// `UPLOADING` until the outcome is known.
async fn finish_assembly(state: &AppState, upload: Upload) -> AppResult<Upload> {
    tracing::info!(
        upload_id = upload.id,
        filename = %upload.filename,
        number_chunks = upload.number_chunks,
        "All chunks received, assembling"
    );

    match state.storage.assemble(&upload).await {
        Ok(AssemblyOutcome::Verified) => UploadRepo::mark_uploaded(&state.pool, upload.id)
            .await?
            .ok_or_else(|| UploadError::UploadNotFound.into()),
        Ok(AssemblyOutcome::Corrupt { actual_md5 }) => {
            tracing::error!(
                upload_id = upload.id,
                expected = %upload.md5_hash,
                actual = %actual_md5,
                "Assembled artifact hash mismatch, staged chunks retained"
            );
            UploadRepo::mark_failed(&state.pool, upload.id).await?;
            Err(UploadError::AssemblyCorruption.into())
        }
        Err(e) => {
            tracing::error!(upload_id = upload.id, error = %e, "Assembly I/O failure");
            UploadRepo::mark_failed(&state.pool, upload.id).await?;
            Err(AppError::InternalError(format!(
                "Failed to assemble upload: {e}"
            )))
        }
    }
}

// ── Lists ────────────────────────────────────────────────────────────

/// Pagination query parameters shared by the list endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    #[serde(default)]
    pub current_page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page_size() -> i64 {
    10
}

/// GET /upload?currentPage=&pageSize=
pub async fn list_uploads(
    State(state): State<AppState>,
    ctx: UploaderContext,
    Query(params): Query<PageParams>,
) -> AppResult<Json<UploadsPage>> {
    let page = params.current_page.max(0);
    let page_size = params.page_size.clamp(1, 100);

    let (uploads, number_pages) =
        UploadRepo::list_page(&state.pool, ctx.uploader_id, page, page_size).await?;

    let mut rows = Vec::with_capacity(uploads.len());
    for upload in uploads {
        let queue_position = if upload.status == UPLOAD_STATUS_UPLOADED {
            Some(UploadRepo::queue_position(&state.pool, upload.id).await?)
        } else {
            None
        };
        let mut info = UploadInfo::from(upload);
        info.queue_position = queue_position;
        rows.push(info);
    }

    Ok(Json(UploadsPage {
        uploads: rows,
        number_pages,
    }))
}

/// GET /upload/imported?currentPage=&pageSize=
pub async fn list_imported(
    State(state): State<AppState>,
    ctx: UploaderContext,
    Query(params): Query<PageParams>,
) -> AppResult<Json<ImportsPage>> {
    let page = params.current_page.max(0);
    let page_size = params.page_size.clamp(1, 100);

    let (imports, number_pages) =
        ImportRepo::list_page(&state.pool, ctx.uploader_id, page, page_size).await?;

    Ok(Json(ImportsPage {
        imports: imports.into_iter().map(Into::into).collect(),
        number_pages,
    }))
}

// ── Delete ───────────────────────────────────────────────────────────

/// DELETE /upload/{id}
///
/// Remove the record (import results cascade), staged chunks, and the
/// assembled artifact. Safe in any state; in-flight chunk PUTs against
/// the id fail with `UPLOAD_NOT_FOUND` afterwards.
pub async fn delete_upload(
    State(state): State<AppState>,
    ctx: UploaderContext,
    Path(id): Path<DbId>,
) -> AppResult<Json<Empty>> {
    let upload = UploadRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(UploadError::UploadNotFound)?;
    if upload.uploader_id != ctx.uploader_id {
        return Err(CoreError::Forbidden("You do not own this upload.".into()).into());
    }

    UploadRepo::delete(&state.pool, id).await?;
    state
        .storage
        .remove_all(&upload)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to remove upload files: {e}")))?;

    tracing::info!(upload_id = id, filename = %upload.filename, "Upload deleted");
    Ok(Json(Empty {}))
}

// ── Download ─────────────────────────────────────────────────────────

/// Query parameters for the artifact download endpoint.
#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    pub md5hash: String,
}

/// GET /upload/{id}/file?md5hash=
///
/// Stream the assembled artifact. The caller must present the record's
/// hash, which doubles as a cheap staleness check.
pub async fn download_file(
    State(state): State<AppState>,
    ctx: UploaderContext,
    Path(id): Path<DbId>,
    Query(params): Query<DownloadParams>,
) -> AppResult<Response> {
    let upload = UploadRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(UploadError::UploadNotFound)?;
    if upload.uploader_id != ctx.uploader_id {
        return Err(UploadError::UploadNotFound.into());
    }

    if upload.status != UPLOAD_STATUS_UPLOADED {
        return Err(AppError::BadRequest(
            "This upload has not been fully uploaded and assembled yet.".into(),
        ));
    }
    if params.md5hash != upload.md5_hash {
        return Err(AppError::BadRequest(
            "The md5hash parameter does not match this upload.".into(),
        ));
    }

    let file = state
        .storage
        .open_artifact(&upload)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to open artifact: {e}")))?;

    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", upload.filename),
        ),
    ];
    let body = axum::body::Body::from_stream(ReaderStream::new(file));
    Ok((headers, body).into_response())
}
