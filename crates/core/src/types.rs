/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Sentinel id for a client-local upload record the server has not
/// acknowledged yet.
pub const PENDING_ID: DbId = -1;
