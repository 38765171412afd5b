//! The per-file upload sequence.
//!
//! Hash the file (progress surfaced), create or resume the server record,
//! then PUT the lowest pending chunk until the server reports none left.
//! Chunk PUTs for one file are
//! strictly sequential; distinct files run as independent sequences. Any
//! transport or protocol failure stops this file's sequence and is
//! surfaced through the event sink; other files are unaffected.

use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncSeekExt};

use flightbay_core::chunks::{chunk_range, number_chunks, ChunkStatus};
use flightbay_core::filename;

use crate::api::{ApiClient, ApiOutcome, NewUploadRequest, UploadInfo};
use crate::error::ClientError;
use crate::hasher::ContentHasher;

/// Yield back to the runtime every this many chunk PUTs so one long
/// upload cannot starve the caller's event loop.
pub const YIELD_EVERY_CHUNKS: u32 = 4;

/// Progress and lifecycle notifications for one file's sequence.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// Content hashing progress.
    Hashing { bytes_hashed: u64, total: u64 },
    /// The server acknowledged the upload (created or resumed).
    Started { upload: UploadInfo },
    /// One more chunk accepted.
    ChunkAccepted { upload: UploadInfo },
    /// All chunks received and the artifact verified.
    Completed { upload: UploadInfo },
    /// The identical file was already fully uploaded; nothing to send.
    AlreadyUploaded,
    /// The sequence stopped on an error.
    Failed { message: String },
}

/// Callback receiving [`UploadEvent`]s.
pub type EventSink = Arc<dyn Fn(UploadEvent) + Send + Sync>;

/// Drives the chunked transfer protocol for single files.
pub struct ChunkUploadClient {
    api: Arc<ApiClient>,
    hasher: ContentHasher,
    chunk_size: u64,
}

impl ChunkUploadClient {
    pub fn new(api: Arc<ApiClient>, chunk_size: u64) -> Self {
        Self {
            api,
            hasher: ContentHasher::new(chunk_size),
            chunk_size,
        }
    }

    /// Upload one file end to end.
    ///
    /// Returns the final server record, or `None` when the server
    /// answered `ALREADY_UPLOADED` (the authoritative record is fetched
    /// from the list endpoint on the next refresh). All failures are also
    /// reported through `events` before being returned.
    pub async fn upload_file(
        &self,
        path: &Path,
        events: EventSink,
    ) -> Result<Option<UploadInfo>, ClientError> {
        match self.run_sequence(path, &events).await {
            Ok(result) => Ok(result),
            Err(err) => {
                events(UploadEvent::Failed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn run_sequence(
        &self,
        path: &Path,
        events: &EventSink,
    ) -> Result<Option<UploadInfo>, ClientError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ClientError::Protocol("path has no usable file name".into()))?
            .to_string();
        let size_bytes = tokio::fs::metadata(path).await?.len();

        // Hash first: a hash failure aborts before any server request.
        let hash_events = Arc::clone(events);
        let md5_hash = self
            .hasher
            .compute_best_effort(
                path,
                Arc::new(move |done, total| {
                    hash_events(UploadEvent::Hashing {
                        bytes_hashed: done,
                        total,
                    });
                }),
            )
            .await
            .map_err(|e| ClientError::Hash(e.to_string()))?;

        let request = NewUploadRequest {
            filename: name.clone(),
            identifier: filename::identifier(&name, size_bytes),
            number_chunks: number_chunks(size_bytes, self.chunk_size),
            size_bytes,
            md5_hash,
        };

        let mut current = match self.api.create_upload(&request).await?.into_result() {
            Ok(upload) => upload,
            Err(err) if err.is_already_uploaded() => {
                events(UploadEvent::AlreadyUploaded);
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        events(UploadEvent::Started {
            upload: current.clone(),
        });

        // The server's chunkStatus names the next chunk to send. Each
        // accepted PUT must shrink the pending set; a response that does
        // not would loop forever, so the loop is bounded.
        let mut sent: u32 = 0;
        let max_puts = current.number_chunks as u32 + 1;

        loop {
            let status =
                ChunkStatus::parse(&current.chunk_status, current.number_chunks as u32)
                    .map_err(|e| ClientError::Protocol(e.to_string()))?;
            let Some(next) = status.first_pending() else {
                break;
            };
            if sent >= max_puts {
                return Err(ClientError::Protocol(
                    "server did not acknowledge chunk progress".into(),
                ));
            }

            let (start, end) = chunk_range(next, size_bytes, self.chunk_size);
            let bytes = read_slice(path, start, end).await?;

            match self.api.put_chunk(current.id, next, bytes).await? {
                ApiOutcome::Ok(updated) => {
                    current = updated;
                    events(UploadEvent::ChunkAccepted {
                        upload: current.clone(),
                    });
                }
                ApiOutcome::Err(err) => {
                    return Err(ClientError::Server {
                        title: err.error_title,
                        message: err.error_message,
                    });
                }
            }

            sent += 1;
            if sent % YIELD_EVERY_CHUNKS == 0 {
                tokio::task::yield_now().await;
            }
        }

        events(UploadEvent::Completed {
            upload: current.clone(),
        });
        Ok(Some(current))
    }
}

async fn read_slice(path: &Path, start: u64, end: u64) -> std::io::Result<Vec<u8>> {
    let mut file = tokio::fs::File::open(path).await?;
    file.seek(std::io::SeekFrom::Start(start)).await?;
    let mut buf = vec![0u8; (end - start) as usize];
    file.read_exact(&mut buf).await?;
    Ok(buf)
}
