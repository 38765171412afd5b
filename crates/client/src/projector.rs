//! Merge of the uploads list with asynchronously-arriving import results.
//!
//! A pure function of its two inputs: the paginated uploads and imports
//! lists are fetched independently (possibly different page windows), and
//! rows are joined on the upload's id. No mutation, no caching.

use std::collections::HashMap;

use crate::api::{ImportInfo, UploadInfo};

/// One uploads-list row with its import outcome, where known.
#[derive(Debug, Clone)]
pub struct CombinedRow {
    pub upload: UploadInfo,
    /// `None` renders as "processing pending".
    pub import: Option<ImportInfo>,
}

/// Join uploads with their import results on `upload.id == import.upload_id`.
///
/// Preserves the order of `uploads`; imports without a visible upload row
/// (a different page window) are dropped.
pub fn combine(uploads: &[UploadInfo], imports: &[ImportInfo]) -> Vec<CombinedRow> {
    let by_upload_id: HashMap<_, _> = imports.iter().map(|i| (i.upload_id, i)).collect();

    uploads
        .iter()
        .map(|upload| CombinedRow {
            upload: upload.clone(),
            import: by_upload_id.get(&upload.id).map(|i| (*i).clone()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use flightbay_core::types::DbId;

    fn upload(id: DbId) -> UploadInfo {
        UploadInfo {
            id,
            identifier: format!("100-file{id}"),
            filename: format!("file{id}.zip"),
            size_bytes: 100,
            number_chunks: 1,
            uploaded_chunks: 1,
            bytes_uploaded: 100,
            chunk_status: "1".into(),
            md5_hash: "d41d8cd98f00b204e9800998ecf8427e".into(),
            status: "UPLOADED".into(),
            start_time: Utc::now(),
            end_time: None,
            queue_position: None,
        }
    }

    fn import(upload_id: DbId, valid: i32, warning: i32, error: i32) -> ImportInfo {
        ImportInfo {
            id: upload_id + 1000,
            upload_id,
            status: "IMPORTED".into(),
            valid_flights: valid,
            warning_flights: warning,
            error_flights: error,
            imported_at: Utc::now(),
        }
    }

    #[test]
    fn joins_on_upload_id() {
        let uploads = vec![upload(1), upload(2), upload(3)];
        let imports = vec![import(3, 10, 1, 0), import(1, 5, 0, 2)];

        let rows = combine(&uploads, &imports);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].import.as_ref().unwrap().valid_flights, 5);
        assert!(rows[1].import.is_none());
        assert_eq!(rows[2].import.as_ref().unwrap().valid_flights, 10);
    }

    #[test]
    fn preserves_upload_order() {
        let uploads = vec![upload(9), upload(4), upload(7)];
        let rows = combine(&uploads, &[]);
        let ids: Vec<_> = rows.iter().map(|r| r.upload.id).collect();
        assert_eq!(ids, vec![9, 4, 7]);
    }

    #[test]
    fn imports_without_visible_upload_are_dropped() {
        let uploads = vec![upload(1)];
        let imports = vec![import(99, 1, 0, 0)];
        let rows = combine(&uploads, &imports);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].import.is_none());
    }

    #[test]
    fn empty_inputs_produce_empty_output() {
        assert!(combine(&[], &[]).is_empty());
    }
}
