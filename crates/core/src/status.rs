//! Upload and service status vocabulary.
//!
//! Upload statuses match the values persisted in the `uploads.status`
//! column. `HASHING` exists only on the client while the content hash is
//! being computed; the server never stores it. Import statuses belong to
//! the external import pipeline and are read-only here.

use serde::{Deserialize, Serialize};

// ── Upload statuses (server-persisted) ───────────────────────────────

/// Chunks are still being received.
pub const UPLOAD_STATUS_UPLOADING: &str = "UPLOADING";
/// All chunks received and the assembled artifact verified against its
/// hash; ready for import pickup.
pub const UPLOAD_STATUS_UPLOADED: &str = "UPLOADED";
/// Assembly produced an artifact whose hash did not match; staged parts
/// are kept for inspection.
pub const UPLOAD_STATUS_FAILED: &str = "FAILED";

// ── Import statuses (owned by the external pipeline) ─────────────────

pub const IMPORT_STATUS_PROCESSING: &str = "PROCESSING";
pub const IMPORT_STATUS_IMPORTED: &str = "IMPORTED";
pub const IMPORT_STATUS_ERROR: &str = "ERROR";

// ── Service status probe ─────────────────────────────────────────────

/// Machine status of a single probed service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceStatus {
    Unknown,
    Ok,
    Warning,
    Error,
    Unchecked,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Unchecked => "UNCHECKED",
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated fleet-level health across all probed services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FleetHealth {
    /// Every checked service reported OK.
    Healthy,
    /// Some checked services reported OK, some did not.
    Degraded,
    /// No checked service reported OK.
    Unhealthy,
    /// Nothing has been checked yet.
    Unknown,
}

impl FleetHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
            Self::Unknown => "unknown",
        }
    }
}

/// Aggregate per-service statuses into a fleet health color.
///
/// `UNCHECKED` and `UNKNOWN` entries carry no signal: they are excluded
/// from the OK/not-OK split, and a fleet where nothing was checked at all
/// is `Unknown`, not `Unhealthy`.
pub fn aggregate_health(statuses: &[ServiceStatus]) -> FleetHealth {
    let checked: Vec<_> = statuses
        .iter()
        .filter(|s| !matches!(s, ServiceStatus::Unchecked | ServiceStatus::Unknown))
        .collect();

    if checked.is_empty() {
        return FleetHealth::Unknown;
    }

    let ok = checked
        .iter()
        .filter(|s| matches!(s, ServiceStatus::Ok))
        .count();

    if ok == checked.len() {
        FleetHealth::Healthy
    } else if ok == 0 {
        FleetHealth::Unhealthy
    } else {
        FleetHealth::Degraded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ServiceStatus::*;

    #[test]
    fn all_ok_is_healthy() {
        assert_eq!(aggregate_health(&[Ok, Ok, Ok]), FleetHealth::Healthy);
    }

    #[test]
    fn partial_ok_is_degraded() {
        assert_eq!(aggregate_health(&[Ok, Ok, Error]), FleetHealth::Degraded);
        assert_eq!(aggregate_health(&[Ok, Warning]), FleetHealth::Degraded);
    }

    #[test]
    fn none_ok_is_unhealthy() {
        assert_eq!(aggregate_health(&[Error, Error]), FleetHealth::Unhealthy);
        assert_eq!(aggregate_health(&[Warning]), FleetHealth::Unhealthy);
    }

    #[test]
    fn unchecked_only_is_unknown_not_unhealthy() {
        assert_eq!(
            aggregate_health(&[Unchecked, Unchecked]),
            FleetHealth::Unknown
        );
        assert_eq!(aggregate_health(&[]), FleetHealth::Unknown);
    }

    #[test]
    fn unchecked_entries_do_not_dilute_health() {
        assert_eq!(aggregate_health(&[Ok, Unchecked]), FleetHealth::Healthy);
        assert_eq!(aggregate_health(&[Error, Unknown]), FleetHealth::Unhealthy);
    }

    #[test]
    fn status_serializes_screaming_snake() {
        assert_eq!(serde_json::to_string(&Unchecked).unwrap(), "\"UNCHECKED\"");
        assert_eq!(serde_json::to_string(&Ok).unwrap(), "\"OK\"");
    }
}
