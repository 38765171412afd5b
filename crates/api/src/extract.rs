//! Uploader context extraction.
//!
//! Authentication itself is an external collaborator: by the time a
//! request reaches this service, the auth layer in front of it has
//! resolved the session and installs the uploader identity as headers.
//! This extractor is that boundary.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use flightbay_core::types::DbId;

use crate::error::AppError;

/// Header carrying the authenticated uploader id.
pub const UPLOADER_ID_HEADER: &str = "x-uploader-id";
/// Header carrying the uploader's fleet id.
pub const FLEET_ID_HEADER: &str = "x-fleet-id";

/// The authenticated uploader on whose behalf a request runs.
#[derive(Debug, Clone, Copy)]
pub struct UploaderContext {
    pub uploader_id: DbId,
    pub fleet_id: DbId,
}

impl<S> FromRequestParts<S> for UploaderContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let uploader_id = header_id(parts, UPLOADER_ID_HEADER)?;
        let fleet_id = header_id(parts, FLEET_ID_HEADER)?;
        Ok(Self {
            uploader_id,
            fleet_id,
        })
    }
}

fn header_id(parts: &Parts, name: &str) -> Result<DbId, AppError> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<DbId>().ok())
        .ok_or_else(|| AppError::Unauthorized(format!("Missing or malformed {name} header")))
}
