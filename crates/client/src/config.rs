use flightbay_core::chunks::CHUNK_SIZE;
use flightbay_core::types::DbId;

/// Client configuration loaded from environment variables.
///
/// The chunk size must match the server's; chunk index arithmetic on
/// both sides depends on it.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the flightbay API (default: `http://localhost:3000`).
    pub base_url: String,
    /// Uploader identity presented to the server.
    pub uploader_id: DbId,
    /// Fleet identity presented to the server.
    pub fleet_id: DbId,
    /// Transfer chunk size in bytes (default: 2 MiB).
    pub chunk_size_bytes: u64,
    /// Per-request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `FLIGHTBAY_API_URL`          | `http://localhost:3000` |
    /// | `FLIGHTBAY_UPLOADER_ID`      | `1`                     |
    /// | `FLIGHTBAY_FLEET_ID`         | `1`                     |
    /// | `FLIGHTBAY_CHUNK_SIZE_BYTES` | `2097152` (2 MiB)       |
    /// | `FLIGHTBAY_TIMEOUT_SECS`     | `30`                    |
    pub fn from_env() -> Self {
        let base_url = std::env::var("FLIGHTBAY_API_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into());

        let uploader_id: DbId = std::env::var("FLIGHTBAY_UPLOADER_ID")
            .unwrap_or_else(|_| "1".into())
            .parse()
            .expect("FLIGHTBAY_UPLOADER_ID must be an integer");

        let fleet_id: DbId = std::env::var("FLIGHTBAY_FLEET_ID")
            .unwrap_or_else(|_| "1".into())
            .parse()
            .expect("FLIGHTBAY_FLEET_ID must be an integer");

        let chunk_size_bytes: u64 = std::env::var("FLIGHTBAY_CHUNK_SIZE_BYTES")
            .unwrap_or_else(|_| CHUNK_SIZE.to_string())
            .parse()
            .expect("FLIGHTBAY_CHUNK_SIZE_BYTES must be a valid u64");
        assert!(chunk_size_bytes > 0, "FLIGHTBAY_CHUNK_SIZE_BYTES must be > 0");

        let request_timeout_secs: u64 = std::env::var("FLIGHTBAY_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("FLIGHTBAY_TIMEOUT_SECS must be a valid u64");

        Self {
            base_url,
            uploader_id,
            fleet_id,
            chunk_size_bytes,
            request_timeout_secs,
        }
    }
}
