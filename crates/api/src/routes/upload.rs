//! Route definitions for the chunked upload protocol.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::upload;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/upload",
            get(upload::list_uploads).post(upload::create_upload),
        )
        .route("/upload/imported", get(upload::list_imported))
        .route(
            "/upload/{id}",
            axum::routing::delete(upload::delete_upload),
        )
        .route("/upload/{id}/chunk/{n}", put(upload::put_chunk))
        .route("/upload/{id}/file", get(upload::download_file))
}
