//! Repository for import results.
//!
//! The external import pipeline owns these rows; this service reads them
//! to merge import outcomes into the uploads view. The insert exists for
//! pipeline tooling and tests.

use sqlx::PgPool;

use flightbay_core::types::DbId;

use crate::models::import::{CreateImportRecord, ImportRecord};

/// Column list for `imports`.
const IMPORT_COLUMNS: &str = "id, upload_id, status, valid_flights, warning_flights, \
     error_flights, imported_at, created_at, updated_at";

/// Same list qualified for joins against `uploads`.
const IMPORT_COLUMNS_QUALIFIED: &str = "i.id, i.upload_id, i.status, i.valid_flights, \
     i.warning_flights, i.error_flights, i.imported_at, i.created_at, i.updated_at";

/// Read access to import results.
pub struct ImportRepo;

impl ImportRepo {
    /// One page of import results for an uploader's uploads, newest
    /// first, plus the total page count.
    pub async fn list_page(
        pool: &PgPool,
        uploader_id: DbId,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<ImportRecord>, i64), sqlx::Error> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM imports i \
             JOIN uploads u ON u.id = i.upload_id \
             WHERE u.uploader_id = $1",
        )
        .bind(uploader_id)
        .fetch_one(pool)
        .await?;

        let sql = format!(
            "SELECT {IMPORT_COLUMNS_QUALIFIED} FROM imports i \
             JOIN uploads u ON u.id = i.upload_id \
             WHERE u.uploader_id = $1 \
             ORDER BY i.imported_at DESC, i.id DESC \
             LIMIT $2 OFFSET $3"
        );
        let imports = sqlx::query_as::<_, ImportRecord>(&sql)
            .bind(uploader_id)
            .bind(page_size)
            .bind(page * page_size)
            .fetch_all(pool)
            .await?;

        let divisor = page_size.max(1);
        let number_pages = (total + divisor - 1) / divisor;
        Ok((imports, number_pages))
    }

    /// Find the import result for one upload, if the pipeline has
    /// processed it.
    pub async fn find_by_upload_id(
        pool: &PgPool,
        upload_id: DbId,
    ) -> Result<Option<ImportRecord>, sqlx::Error> {
        let sql = format!("SELECT {IMPORT_COLUMNS} FROM imports WHERE upload_id = $1");
        sqlx::query_as::<_, ImportRecord>(&sql)
            .bind(upload_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert an import result (pipeline tooling / tests).
    pub async fn insert(
        pool: &PgPool,
        input: &CreateImportRecord,
    ) -> Result<ImportRecord, sqlx::Error> {
        let sql = format!(
            "INSERT INTO imports \
                (upload_id, status, valid_flights, warning_flights, error_flights) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {IMPORT_COLUMNS}"
        );
        sqlx::query_as::<_, ImportRecord>(&sql)
            .bind(input.upload_id)
            .bind(&input.status)
            .bind(input.valid_flights)
            .bind(input.warning_flights)
            .bind(input.error_flights)
            .fetch_one(pool)
            .await
    }
}
