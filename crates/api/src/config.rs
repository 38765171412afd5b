use flightbay_core::chunks::CHUNK_SIZE;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Transfer chunk size in bytes. Chunk index arithmetic on both sides
    /// depends on this value, so client and server must agree on it.
    pub chunk_size_bytes: u64,
    /// Directory holding staged chunk files of in-flight uploads.
    pub staging_dir: String,
    /// Directory holding assembled, verified artifacts.
    pub archive_dir: String,
    /// Named external services the status probe checks, in declaration
    /// order. A service without a URL is reported `UNCHECKED`.
    pub status_services: Vec<(String, Option<String>)>,
    /// Per-probe request timeout in seconds (default: `5`).
    pub probe_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                     |
    /// |---------------------------|-----------------------------|
    /// | `HOST`                    | `0.0.0.0`                   |
    /// | `PORT`                    | `3000`                      |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`     |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                        |
    /// | `UPLOAD_CHUNK_SIZE_BYTES` | `2097152` (2 MiB)           |
    /// | `UPLOAD_STAGING_DIR`      | `/tmp/flightbay/staging`    |
    /// | `UPLOAD_ARCHIVE_DIR`      | `/tmp/flightbay/archives`   |
    /// | `STATUS_SERVICES`         | (empty)                     |
    /// | `PROBE_TIMEOUT_SECS`      | `5`                         |
    ///
    /// `STATUS_SERVICES` is a comma-separated list of `name=url` entries;
    /// the url part may be empty (`name=`) for declared-but-unchecked
    /// services.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let chunk_size_bytes: u64 = std::env::var("UPLOAD_CHUNK_SIZE_BYTES")
            .unwrap_or_else(|_| CHUNK_SIZE.to_string())
            .parse()
            .expect("UPLOAD_CHUNK_SIZE_BYTES must be a valid u64");
        assert!(chunk_size_bytes > 0, "UPLOAD_CHUNK_SIZE_BYTES must be > 0");

        let staging_dir = std::env::var("UPLOAD_STAGING_DIR")
            .unwrap_or_else(|_| "/tmp/flightbay/staging".into());

        let archive_dir = std::env::var("UPLOAD_ARCHIVE_DIR")
            .unwrap_or_else(|_| "/tmp/flightbay/archives".into());

        let status_services = parse_status_services(
            &std::env::var("STATUS_SERVICES").unwrap_or_default(),
        );

        let probe_timeout_secs: u64 = std::env::var("PROBE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("PROBE_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            chunk_size_bytes,
            staging_dir,
            archive_dir,
            status_services,
            probe_timeout_secs,
        }
    }
}

/// Parse the `STATUS_SERVICES` list: `name=url,name=,name2=url2`.
fn parse_status_services(raw: &str) -> Vec<(String, Option<String>)> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, url) = entry.split_once('=').unwrap_or((entry, ""));
            let url = url.trim();
            (
                name.trim().to_string(),
                (!url.is_empty()).then(|| url.to_string()),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_url_pairs() {
        let services = parse_status_services(
            "upload-consumer=http://consumer:9000/health, kafka=, chart-service=http://charts/hc",
        );
        assert_eq!(
            services,
            vec![
                (
                    "upload-consumer".to_string(),
                    Some("http://consumer:9000/health".to_string())
                ),
                ("kafka".to_string(), None),
                (
                    "chart-service".to_string(),
                    Some("http://charts/hc".to_string())
                ),
            ]
        );
    }

    #[test]
    fn empty_list_is_empty() {
        assert!(parse_status_services("").is_empty());
        assert!(parse_status_services(" , ").is_empty());
    }
}
