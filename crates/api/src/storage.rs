//! Filesystem layer for staged chunks and assembled artifacts.
//!
//! Staged chunks live at `{staging}/{fleet}/{uploader}/{identifier}/{n}.part`
//! until assembly. The assembled artifact is written to the content-addressed
//! path `{archive}/{fleet}/{uploader}/{md5}-{filename}` while its MD5 is
//! recomputed incrementally. Staged parts are deleted only after the
//! artifact verifies; a corrupt one leaves them in place for inspection.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use flightbay_db::models::upload::Upload;

/// Result of assembling an upload's staged chunks.
#[derive(Debug, PartialEq, Eq)]
pub enum AssemblyOutcome {
    /// Artifact written and its hash matches the announced hash.
    Verified,
    /// Artifact hash mismatch; staged parts retained.
    Corrupt { actual_md5: String },
}

/// Staging and archive filesystem operations.
#[derive(Debug, Clone)]
pub struct UploadStorage {
    staging_root: PathBuf,
    archive_root: PathBuf,
}

impl UploadStorage {
    pub fn new(staging_root: impl Into<PathBuf>, archive_root: impl Into<PathBuf>) -> Self {
        Self {
            staging_root: staging_root.into(),
            archive_root: archive_root.into(),
        }
    }

    /// Directory holding an upload's staged chunk files.
    pub fn staging_dir(&self, upload: &Upload) -> PathBuf {
        self.staging_root
            .join(upload.fleet_id.to_string())
            .join(upload.uploader_id.to_string())
            .join(&upload.identifier)
    }

    /// Path of one staged chunk file.
    pub fn chunk_path(&self, upload: &Upload, chunk_index: u32) -> PathBuf {
        self.staging_dir(upload).join(format!("{chunk_index}.part"))
    }

    /// Content-addressed path of the assembled artifact.
    pub fn artifact_path(&self, upload: &Upload) -> PathBuf {
        self.archive_root
            .join(upload.fleet_id.to_string())
            .join(upload.uploader_id.to_string())
            .join(format!("{}-{}", upload.md5_hash, upload.filename))
    }

    /// Persist one chunk's bytes to the staging area.
    ///
    /// Overwrites any previously staged bytes for the same index (chunk
    /// resubmission), returning the byte count written.
    pub async fn write_chunk(
        &self,
        upload: &Upload,
        chunk_index: u32,
        bytes: &[u8],
    ) -> std::io::Result<u64> {
        let path = self.chunk_path(upload, chunk_index);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(bytes.len() as u64)
    }

    /// Concatenate all staged chunks in index order into the artifact,
    /// rehashing while writing, and verify against the announced hash.
    ///
    /// On `Verified` the staging directory is removed; on `Corrupt` it is
    /// kept and the outcome carries the actual digest for the log.
    pub async fn assemble(&self, upload: &Upload) -> std::io::Result<AssemblyOutcome> {
        let artifact = self.artifact_path(upload);
        if let Some(parent) = artifact.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut out = tokio::fs::File::create(&artifact).await?;
        let mut context = md5::Context::new();

        for index in 0..upload.number_chunks as u32 {
            let part = self.chunk_path(upload, index);
            let bytes = tokio::fs::read(&part).await?;
            context.consume(&bytes);
            out.write_all(&bytes).await?;
        }
        out.flush().await?;

        let actual_md5 = format!("{:x}", context.compute());
        if actual_md5 == upload.md5_hash {
            remove_dir_if_present(&self.staging_dir(upload)).await?;
            Ok(AssemblyOutcome::Verified)
        } else {
            Ok(AssemblyOutcome::Corrupt { actual_md5 })
        }
    }

    /// Stream handle on the assembled artifact, for downloads.
    pub async fn open_artifact(&self, upload: &Upload) -> std::io::Result<tokio::fs::File> {
        tokio::fs::File::open(self.artifact_path(upload)).await
    }

    /// Remove everything this upload ever put on disk: staged chunks and
    /// the assembled artifact. Used by delete, safe in any state.
    pub async fn remove_all(&self, upload: &Upload) -> std::io::Result<()> {
        remove_dir_if_present(&self.staging_dir(upload)).await?;
        remove_file_if_present(&self.artifact_path(upload)).await
    }

    /// Best-effort removal of a single staged chunk (orphaned PUT cleanup).
    pub async fn remove_chunk(&self, upload: &Upload, chunk_index: u32) {
        let _ = tokio::fs::remove_file(self.chunk_path(upload, chunk_index)).await;
    }
}

async fn remove_dir_if_present(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

async fn remove_file_if_present(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use flightbay_core::types::DbId;

    fn upload_fixture(dir_tag: DbId, number_chunks: i32, md5_hash: &str) -> Upload {
        Upload {
            id: dir_tag,
            uploader_id: 7,
            fleet_id: 3,
            filename: "log.zip".into(),
            identifier: format!("{dir_tag}-logzip"),
            size_bytes: 0,
            number_chunks,
            uploaded_chunks: number_chunks,
            bytes_uploaded: 0,
            chunk_status: "1".repeat(number_chunks as usize),
            md5_hash: md5_hash.into(),
            status: "UPLOADING".into(),
            start_time: Utc::now(),
            end_time: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn assembles_chunks_in_index_order_and_verifies() {
        let root = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(
            root.path().join("staging"),
            root.path().join("archive"),
        );

        let content = b"hello chunked world";
        let expected = format!("{:x}", md5::compute(content));
        let upload = upload_fixture(1, 3, &expected);

        // Stage out of order; assembly must still concatenate by index.
        storage.write_chunk(&upload, 2, b"world").await.unwrap();
        storage.write_chunk(&upload, 0, b"hello ").await.unwrap();
        storage.write_chunk(&upload, 1, b"chunked ").await.unwrap();

        let outcome = storage.assemble(&upload).await.unwrap();
        assert_eq!(outcome, AssemblyOutcome::Verified);

        let assembled = tokio::fs::read(storage.artifact_path(&upload)).await.unwrap();
        assert_eq!(assembled, content);
        // Staged parts are gone after verification.
        assert!(!storage.staging_dir(&upload).exists());
    }

    #[tokio::test]
    async fn corrupt_part_fails_verification_and_keeps_parts() {
        let root = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(
            root.path().join("staging"),
            root.path().join("archive"),
        );

        let content = b"hello chunked world";
        let expected = format!("{:x}", md5::compute(content));
        let upload = upload_fixture(2, 2, &expected);

        storage.write_chunk(&upload, 0, b"hello chu").await.unwrap();
        storage.write_chunk(&upload, 1, b"XXXX world").await.unwrap();

        match storage.assemble(&upload).await.unwrap() {
            AssemblyOutcome::Corrupt { actual_md5 } => assert_ne!(actual_md5, expected),
            other => panic!("expected corruption, got {other:?}"),
        }
        // Parts kept for inspection.
        assert!(storage.chunk_path(&upload, 0).exists());
        assert!(storage.chunk_path(&upload, 1).exists());
    }

    #[tokio::test]
    async fn remove_all_is_safe_when_nothing_exists() {
        let root = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(
            root.path().join("staging"),
            root.path().join("archive"),
        );
        let upload = upload_fixture(3, 1, "0".repeat(32).as_str());
        storage.remove_all(&upload).await.unwrap();
    }
}
