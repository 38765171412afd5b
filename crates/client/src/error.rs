//! Client-side error type.

/// Errors the upload client can hit while driving the protocol.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (connection, timeout, TLS, ...).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The server answered with the protocol's error object.
    #[error("{title}: {message}")]
    Server { title: String, message: String },

    /// Local file I/O failure.
    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    /// Content hash computation failed on every strategy.
    #[error("hash computation failed: {0}")]
    Hash(String),

    /// A response violated a protocol invariant (e.g. malformed
    /// `chunkStatus`).
    #[error("protocol violation: {0}")]
    Protocol(String),
}

impl ClientError {
    /// Whether this error is the `ALREADY_UPLOADED` success signal: the
    /// server refuses the transfer because the identical file is already
    /// fully uploaded and verified.
    pub fn is_already_uploaded(&self) -> bool {
        use flightbay_core::error::UploadError;
        matches!(
            self,
            Self::Server { title, .. }
                if title == UploadError::AlreadyUploaded.error_title()
        )
    }
}
