//! Domain error types.
//!
//! [`CoreError`] is the general domain error shared across crates.
//! [`UploadError`] is the upload protocol's own taxonomy; each variant
//! knows the user-facing `errorTitle` / `errorMessage` pair the wire
//! format carries, so the API layer can serialize it without re-deriving
//! prose per call site.

use crate::types::DbId;

/// General domain error.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An entity lookup came up empty.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// Input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The request conflicts with existing state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The requester is not allowed to touch this resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The upload protocol's error taxonomy.
///
/// `AlreadyUploaded` is a success signal dressed as an error by the
/// protocol: callers treat it as "complete, skip the transfer", never as a
/// retry trigger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    /// Filename contains characters outside the restricted charset.
    #[error("malformed filename")]
    InvalidFilename,

    /// Same filename exists with different content.
    #[error("filename already uploaded with a different hash")]
    HashConflict,

    /// The file was already fully uploaded and verified.
    #[error("file already uploaded")]
    AlreadyUploaded,

    /// Local content hash computation failed on every strategy.
    #[error("hash computation failed: {0}")]
    HashFailed(String),

    /// A chunk transfer failed at the network or server level.
    #[error("chunk upload failed: {0}")]
    ChunkUploadFailed(String),

    /// The assembled artifact's hash did not match the announced hash.
    #[error("assembled file hash mismatch")]
    AssemblyCorruption,

    /// The referenced upload does not exist (stale or deleted).
    #[error("upload not found")]
    UploadNotFound,
}

impl UploadError {
    /// The `errorTitle` the wire format carries for this error.
    pub fn error_title(&self) -> &'static str {
        match self {
            Self::InvalidFilename
            | Self::HashConflict
            | Self::AssemblyCorruption => "File Upload Failure",
            Self::AlreadyUploaded => "File Already Exists",
            Self::HashFailed(_) => "File Hash Failure",
            Self::ChunkUploadFailed(_) => "File Chunk Upload Failure",
            Self::UploadNotFound => "Upload Not Found",
        }
    }

    /// The `errorMessage` the wire format carries for this error.
    pub fn error_message(&self) -> String {
        match self {
            Self::InvalidFilename => "The filename was malformed. Filenames must only contain \
                 letters, numbers, dashes ('-'), underscores ('_') and periods."
                .into(),
            Self::HashConflict => "A file with the same name has already been uploaded with a \
                 different hash (the file names are the same but the contents are different). \
                 Either rename the new file, or delete the existing upload and retry."
                .into(),
            Self::AlreadyUploaded => "This file has already been uploaded to the server and does \
                 not need to be uploaded again."
                .into(),
            Self::HashFailed(detail) => {
                format!("Could not compute the file's content hash: {detail}")
            }
            Self::ChunkUploadFailed(detail) => {
                format!("A chunk could not be uploaded: {detail}")
            }
            Self::AssemblyCorruption => "An error occurred while putting the chunk files together \
                 to make the full uploaded file. The assembled file had different bytes than the \
                 one that was originally uploaded, so some corruption may have occurred on \
                 transfer. Please delete this upload and retry."
                .into(),
            Self::UploadNotFound => {
                "The referenced upload does not exist. It may have been deleted.".into()
            }
        }
    }

    /// Whether this signal actually denotes success (see type docs).
    pub fn is_success_signal(&self) -> bool {
        matches!(self, Self::AlreadyUploaded)
    }
}
