//! Wire types and the HTTP client for the upload protocol.
//!
//! Responses are decoded exactly once at this boundary into a tagged
//! [`ApiOutcome`]: the presence of `errorTitle`, not the HTTP status,
//! is what distinguishes failure from success in the protocol.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use flightbay_core::types::{DbId, Timestamp};

use crate::config::ClientConfig;
use crate::error::ClientError;

// ── Wire DTOs ────────────────────────────────────────────────────────

/// An upload record as the server reports it.
#[derive(Debug, Clone, Deserialize)]
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
    #[serde(default)]
    pub end_time: Option<Timestamp>,
    #[serde(default)]
    pub queue_position: Option<i64>,
}

/// One page of the uploads list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadsPage {
    pub uploads: Vec<UploadInfo>,
    pub number_pages: i64,
}

/// An import result as the server reports it.
#[derive(Debug, Clone, Deserialize)]
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

/// One page of the imports list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportsPage {
    pub imports: Vec<ImportInfo>,
    pub number_pages: i64,
}

/// The protocol's error object.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub error_title: String,
    pub error_message: String,
}

/// A decoded response: success payload or protocol error object.
#[derive(Debug)]
pub enum ApiOutcome<T> {
    Ok(T),
    Err(ApiError),
}

impl<T> ApiOutcome<T> {
    /// Collapse into a `Result`, turning the protocol error object into
    /// [`ClientError::Server`].
    pub fn into_result(self) -> Result<T, ClientError> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Err(err) => Err(ClientError::Server {
                title: err.error_title,
                message: err.error_message,
            }),
        }
    }
}

/// Decode a response body, discriminating on `errorTitle`.
pub fn decode_outcome<T: DeserializeOwned>(
    value: serde_json::Value,
) -> Result<ApiOutcome<T>, ClientError> {
    if value.get("errorTitle").is_some() {
        Ok(ApiOutcome::Err(serde_json::from_value(value)?))
    } else {
        Ok(ApiOutcome::Ok(serde_json::from_value(value)?))
    }
}

// ── Requests ─────────────────────────────────────────────────────────

/// Fields of the `NEW_UPLOAD` request.
#[derive(Debug, Clone)]
pub struct NewUploadRequest {
    pub filename: String,
    pub identifier: String,
    pub number_chunks: u32,
    pub size_bytes: u64,
    pub md5_hash: String,
}

/// HTTP client for the upload protocol, carrying the uploader identity
/// the (external) auth layer would otherwise install.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    uploader_id: DbId,
    fleet_id: DbId,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            uploader_id: config.uploader_id,
            fleet_id: config.fleet_id,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn with_identity(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("x-uploader-id", self.uploader_id)
            .header("x-fleet-id", self.fleet_id)
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<ApiOutcome<T>, ClientError> {
        let value: serde_json::Value = response.json().await?;
        decode_outcome(value)
    }

    /// `POST /upload` with the `NEW_UPLOAD` form.
    pub async fn create_upload(
        &self,
        request: &NewUploadRequest,
    ) -> Result<ApiOutcome<UploadInfo>, ClientError> {
        let form = reqwest::multipart::Form::new()
            .text("request", "NEW_UPLOAD")
            .text("filename", request.filename.clone())
            .text("identifier", request.identifier.clone())
            .text("numberChunks", request.number_chunks.to_string())
            .text("sizeBytes", request.size_bytes.to_string())
            .text("md5Hash", request.md5_hash.clone());

        let response = self
            .with_identity(self.http.post(self.url("/upload")))
            .multipart(form)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// `PUT /upload/{id}/chunk/{n}` with the raw chunk bytes.
    pub async fn put_chunk(
        &self,
        upload_id: DbId,
        chunk_index: u32,
        bytes: Vec<u8>,
    ) -> Result<ApiOutcome<UploadInfo>, ClientError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name("chunk");
        let form = reqwest::multipart::Form::new().part("chunk", part);

        let response = self
            .with_identity(
                self.http
                    .put(self.url(&format!("/upload/{upload_id}/chunk/{chunk_index}"))),
            )
            .multipart(form)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// `GET /upload?currentPage=&pageSize=`
    pub async fn list_uploads(
        &self,
        current_page: i64,
        page_size: i64,
    ) -> Result<ApiOutcome<UploadsPage>, ClientError> {
        let response = self
            .with_identity(self.http.get(self.url("/upload")))
            .query(&[("currentPage", current_page), ("pageSize", page_size)])
            .send()
            .await?;
        Self::decode(response).await
    }

    /// `GET /upload/imported?currentPage=&pageSize=`
    pub async fn list_imported(
        &self,
        current_page: i64,
        page_size: i64,
    ) -> Result<ApiOutcome<ImportsPage>, ClientError> {
        let response = self
            .with_identity(self.http.get(self.url("/upload/imported")))
            .query(&[("currentPage", current_page), ("pageSize", page_size)])
            .send()
            .await?;
        Self::decode(response).await
    }

    /// `DELETE /upload/{id}`
    pub async fn delete_upload(&self, upload_id: DbId) -> Result<(), ClientError> {
        let response = self
            .with_identity(self.http.delete(self.url(&format!("/upload/{upload_id}"))))
            .send()
            .await?;
        let outcome: ApiOutcome<serde_json::Value> = Self::decode(response).await?;
        outcome.into_result().map(|_| ())
    }

    /// `GET /upload/{id}/file?md5hash=`: download the assembled artifact
    /// into `dest`.
    pub async fn download_file(
        &self,
        upload_id: DbId,
        md5_hash: &str,
        dest: &std::path::Path,
    ) -> Result<(), ClientError> {
        let response = self
            .with_identity(
                self.http
                    .get(self.url(&format!("/upload/{upload_id}/file"))),
            )
            .query(&[("md5hash", md5_hash)])
            .send()
            .await?;

        // A JSON error object can come back instead of the binary body.
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if content_type.starts_with("application/json") {
            let value: serde_json::Value = response.json().await?;
            let outcome: ApiOutcome<serde_json::Value> = decode_outcome(value)?;
            outcome.into_result()?;
            return Err(ClientError::Protocol(
                "expected a binary body from the download endpoint".into(),
            ));
        }

        let bytes = response.bytes().await?;
        tokio::fs::write(dest, &bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn error_title_presence_discriminates() {
        let err = serde_json::json!({
            "errorTitle": "File Upload Failure",
            "errorMessage": "The filename was malformed."
        });
        let outcome: ApiOutcome<UploadsPage> = decode_outcome(err).unwrap();
        assert_matches!(outcome, ApiOutcome::Err(e) if e.error_title == "File Upload Failure");

        let ok = serde_json::json!({ "uploads": [], "numberPages": 0 });
        let outcome: ApiOutcome<UploadsPage> = decode_outcome(ok).unwrap();
        assert_matches!(outcome, ApiOutcome::Ok(page) if page.number_pages == 0);
    }

    #[test]
    fn upload_info_decodes_camel_case() {
        let value = serde_json::json!({
            "id": 12,
            "identifier": "1024-logzip",
            "filename": "log.zip",
            "sizeBytes": 1024,
            "numberChunks": 1,
            "uploadedChunks": 0,
            "bytesUploaded": 0,
            "chunkStatus": "0",
            "md5Hash": "d41d8cd98f00b204e9800998ecf8427e",
            "status": "UPLOADING",
            "startTime": "2026-01-10T12:00:00Z"
        });
        let outcome: ApiOutcome<UploadInfo> = decode_outcome(value).unwrap();
        let info = match outcome {
            ApiOutcome::Ok(info) => info,
            ApiOutcome::Err(e) => panic!("unexpected error: {e:?}"),
        };
        assert_eq!(info.size_bytes, 1024);
        assert_eq!(info.chunk_status, "0");
        assert_eq!(info.queue_position, None);
    }

    #[test]
    fn already_uploaded_signal_detected() {
        let err = ClientError::Server {
            title: "File Already Exists".into(),
            message: "This file has already been uploaded.".into(),
        };
        assert!(err.is_already_uploaded());

        let other = ClientError::Server {
            title: "File Upload Failure".into(),
            message: "nope".into(),
        };
        assert!(!other.is_already_uploaded());
    }
}
