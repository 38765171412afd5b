//! Content hashing with two interchangeable execution strategies.
//!
//! The hash is the file's identity for resume, dedup, and corruption
//! detection, so both strategies must produce byte-identical output:
//!
//! - [`BackgroundHasher`] digests the file on the blocking thread pool,
//!   keeping the caller's task free (the worker-context path).
//! - [`StreamingHasher`] digests on the calling task in chunk-sized steps
//!   with a yield between chunks, as the fallback when the background
//!   path is unavailable.
//!
//! [`ContentHasher`] tries the background path first and degrades to
//! streaming transparently; the caller never needs to know which ran.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

/// Report progress every this many chunks, so a long hash does not flood
/// the caller with updates.
pub const PROGRESS_EVERY_CHUNKS: u64 = 5;

/// `(bytes_processed, total_bytes)` progress callback.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Hash computation failure.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("background hash task failed: {0}")]
    Background(String),
}

/// One way of computing a file's MD5 hex digest.
#[async_trait]
pub trait HashStrategy: Send + Sync {
    async fn compute(&self, path: &Path, on_progress: ProgressFn) -> Result<String, HashError>;
}

// ── Background strategy ──────────────────────────────────────────────

/// Digests the file on the blocking thread pool.
pub struct BackgroundHasher {
    pub chunk_size: u64,
}

#[async_trait]
impl HashStrategy for BackgroundHasher {
    async fn compute(&self, path: &Path, on_progress: ProgressFn) -> Result<String, HashError> {
        let path: PathBuf = path.to_path_buf();
        let chunk_size = self.chunk_size;
        tokio::task::spawn_blocking(move || hash_file_blocking(&path, chunk_size, &on_progress))
            .await
            .map_err(|e| HashError::Background(e.to_string()))?
    }
}

fn hash_file_blocking(
    path: &Path,
    chunk_size: u64,
    on_progress: &ProgressFn,
) -> Result<String, HashError> {
    use std::io::Read;

    let mut file = std::fs::File::open(path)?;
    let total = file.metadata()?.len();

    let mut context = md5::Context::new();
    let mut buf = vec![0u8; chunk_size as usize];
    let mut processed: u64 = 0;
    let mut chunks: u64 = 0;

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        context.consume(&buf[..n]);
        processed += n as u64;
        chunks += 1;
        if chunks % PROGRESS_EVERY_CHUNKS == 0 {
            on_progress(processed, total);
        }
    }

    on_progress(total, total);
    Ok(format!("{:x}", context.compute()))
}

// ── Streaming strategy ───────────────────────────────────────────────

/// Digests the file on the calling task, yielding between chunks so the
/// surrounding event loop stays responsive.
pub struct StreamingHasher {
    pub chunk_size: u64,
}

#[async_trait]
impl HashStrategy for StreamingHasher {
    async fn compute(&self, path: &Path, on_progress: ProgressFn) -> Result<String, HashError> {
        let mut file = tokio::fs::File::open(path).await?;
        let total = file.metadata().await?.len();

        let mut context = md5::Context::new();
        let mut buf = vec![0u8; self.chunk_size as usize];
        let mut processed: u64 = 0;
        let mut chunks: u64 = 0;

        loop {
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            context.consume(&buf[..n]);
            processed += n as u64;
            chunks += 1;
            if chunks % PROGRESS_EVERY_CHUNKS == 0 {
                on_progress(processed, total);
            }
            tokio::task::yield_now().await;
        }

        on_progress(total, total);
        Ok(format!("{:x}", context.compute()))
    }
}

// ── Best-effort front ────────────────────────────────────────────────

/// Computes content hashes, preferring the background strategy and
/// falling back to streaming transparently.
pub struct ContentHasher {
    background: BackgroundHasher,
    streaming: StreamingHasher,
}

impl ContentHasher {
    pub fn new(chunk_size: u64) -> Self {
        Self {
            background: BackgroundHasher { chunk_size },
            streaming: StreamingHasher { chunk_size },
        }
    }

    /// Hash `path`, trying the background strategy first.
    ///
    /// A background failure degrades to the streaming fallback; if both
    /// fail the error is terminal and the upload attempt must abort
    /// before any server request is made.
    pub async fn compute_best_effort(
        &self,
        path: &Path,
        on_progress: ProgressFn,
    ) -> Result<String, HashError> {
        match self.background.compute(path, on_progress.clone()).await {
            Ok(hash) => Ok(hash),
            Err(err) => {
                tracing::warn!(error = %err, "Background hashing failed, falling back to streaming");
                self.streaming.compute(path, on_progress).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn progress_counter() -> (ProgressFn, Arc<AtomicU64>) {
        let calls = Arc::new(AtomicU64::new(0));
        let calls_in_cb = Arc::clone(&calls);
        let cb: ProgressFn = Arc::new(move |_done, _total| {
            calls_in_cb.fetch_add(1, Ordering::SeqCst);
        });
        (cb, calls)
    }

    fn temp_file_with(content: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content).unwrap();
        f.flush().unwrap();
        f
    }

    #[tokio::test]
    async fn known_vector_empty_file() {
        let f = temp_file_with(b"");
        let hasher = ContentHasher::new(64);
        let (cb, _) = progress_counter();
        let hash = hasher.compute_best_effort(f.path(), cb).await.unwrap();
        // MD5 of the empty string.
        assert_eq!(hash, "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[tokio::test]
    async fn known_vector_abc() {
        let f = temp_file_with(b"abc");
        let hasher = ContentHasher::new(64);
        let (cb, _) = progress_counter();
        let hash = hasher.compute_best_effort(f.path(), cb).await.unwrap();
        assert_eq!(hash, "900150983cd24fb0d6963f7d28e17f72");
    }

    #[tokio::test]
    async fn strategies_agree_on_multi_chunk_input() {
        // 1 KiB chunks over ~5.5 KiB of data: several full chunks plus a
        // short tail.
        let content: Vec<u8> = (0..5_632u32).map(|i| (i % 251) as u8).collect();
        let f = temp_file_with(&content);

        let (cb1, _) = progress_counter();
        let (cb2, _) = progress_counter();
        let background = BackgroundHasher { chunk_size: 1024 };
        let streaming = StreamingHasher { chunk_size: 1024 };

        let h1 = background.compute(f.path(), cb1).await.unwrap();
        let h2 = streaming.compute(f.path(), cb2).await.unwrap();

        assert_eq!(h1, h2);
        assert_eq!(h1, format!("{:x}", md5::compute(&content)));
    }

    #[tokio::test]
    async fn progress_reported_at_bounded_cadence() {
        // 20 chunks of 16 bytes: every-5 cadence plus the final report.
        let content = vec![7u8; 320];
        let f = temp_file_with(&content);
        let (cb, calls) = progress_counter();

        let streaming = StreamingHasher { chunk_size: 16 };
        streaming.compute(f.path(), cb).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 20 / PROGRESS_EVERY_CHUNKS + 1);
    }

    #[tokio::test]
    async fn missing_file_is_terminal() {
        let hasher = ContentHasher::new(1024);
        let (cb, _) = progress_counter();
        let result = hasher
            .compute_best_effort(Path::new("/nonexistent/file.bin"), cb)
            .await;
        assert!(result.is_err());
    }
}
