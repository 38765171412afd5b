//! The uploads list view model.
//!
//! Reconciles in-flight (not-yet-server-known) uploads with the
//! server-confirmed list, merges import outcomes, and exposes the
//! delete/download actions. State is scoped to this object (nothing
//! module-global), so a session owns exactly one view.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use flightbay_core::types::DbId;

use crate::api::{ApiClient, ImportsPage, UploadsPage};
use crate::error::ClientError;
use crate::pending::{PendingUpload, PendingUploadsStore};
use crate::projector::{combine, CombinedRow};

/// One visible row: either still client-local or server-confirmed.
#[derive(Debug, Clone)]
pub enum ListRow {
    Pending(PendingUpload),
    Confirmed(CombinedRow),
}

/// A refreshed page of the uploads view.
#[derive(Debug)]
pub struct RefreshedPage {
    pub rows: Vec<ListRow>,
    pub upload_pages: i64,
    pub import_pages: i64,
}

/// Client-side uploads list state.
pub struct UploadsView {
    api: Arc<ApiClient>,
    pending: Arc<PendingUploadsStore>,
}

impl UploadsView {
    pub fn new(api: Arc<ApiClient>, pending: Arc<PendingUploadsStore>) -> Self {
        Self { api, pending }
    }

    /// The pending store backing this view (upload sequences write their
    /// progress into it).
    pub fn pending(&self) -> &Arc<PendingUploadsStore> {
        &self.pending
    }

    /// Fetch one page of uploads and imports, reconcile the pending set
    /// against the server-confirmed identifiers, and produce the merged
    /// row list: pending entries first, then confirmed rows with their
    /// import outcomes.
    pub async fn refresh(
        &self,
        current_page: i64,
        page_size: i64,
    ) -> Result<RefreshedPage, ClientError> {
        let uploads: UploadsPage = self
            .api
            .list_uploads(current_page, page_size)
            .await?
            .into_result()?;
        let imports: ImportsPage = self
            .api
            .list_imported(current_page, page_size)
            .await?
            .into_result()?;

        // Any pending entry the server now confirms is dropped; the
        // server record takes over as source of truth.
        let server_identifiers: HashSet<String> = uploads
            .uploads
            .iter()
            .map(|u| u.identifier.clone())
            .collect();
        self.pending.reconcile(&server_identifiers);

        let mut rows: Vec<ListRow> = self
            .pending
            .snapshot()
            .iter()
            .cloned()
            .map(ListRow::Pending)
            .collect();
        rows.extend(
            combine(&uploads.uploads, &imports.imports)
                .into_iter()
                .map(ListRow::Confirmed),
        );

        Ok(RefreshedPage {
            rows,
            upload_pages: uploads.number_pages,
            import_pages: imports.number_pages,
        })
    }

    /// Delete a server-confirmed upload.
    pub async fn delete(&self, upload_id: DbId) -> Result<(), ClientError> {
        self.api.delete_upload(upload_id).await
    }

    /// Download a server-confirmed upload's artifact to `dest`.
    pub async fn download(
        &self,
        upload_id: DbId,
        md5_hash: &str,
        dest: &Path,
    ) -> Result<(), ClientError> {
        self.api.download_file(upload_id, md5_hash, dest).await
    }
}
