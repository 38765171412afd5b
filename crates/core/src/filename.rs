//! Upload filename normalization, validation, and identifier derivation.
//!
//! Filenames are the identity key for resume and dedup, so the accepted
//! charset is deliberately restrictive: after whitespace is normalized to
//! underscores, only letters, digits, `.`, `_` and `-` may remain.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::UploadError;

static VALID_FILENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_.-]+$").expect("valid regex"));

static IDENTIFIER_STRIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9a-zA-Z_-]").expect("valid regex"));

/// Replace every run of whitespace in `filename` with a single underscore.
pub fn sanitize(filename: &str) -> String {
    filename
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Sanitize `filename` and validate it against the restricted charset.
///
/// Returns the sanitized name, or [`UploadError::InvalidFilename`] if
/// anything outside the allowed characters survives normalization.
pub fn sanitize_and_validate(filename: &str) -> Result<String, UploadError> {
    let sanitized = sanitize(filename);
    if VALID_FILENAME.is_match(&sanitized) {
        Ok(sanitized)
    } else {
        Err(UploadError::InvalidFilename)
    }
}

/// Derive the client-side upload identifier for a file.
///
/// `"{size}-{stripped}"`, where the stripped filename drops every character
/// outside `[0-9a-zA-Z_-]`. The identifier correlates a pending client
/// upload with its eventual server record before the server id is known.
pub fn identifier(filename: &str, size_bytes: u64) -> String {
    let stripped = IDENTIFIER_STRIP.replace_all(filename, "");
    format!("{size_bytes}-{stripped}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn whitespace_becomes_underscores() {
        assert_eq!(sanitize("my flight log.csv"), "my_flight_log.csv");
        assert_eq!(sanitize("  padded \t name.zip "), "padded_name.zip");
    }

    #[test]
    fn accepts_the_restricted_charset() {
        assert_eq!(
            sanitize_and_validate("N123AB_2024-06-01.zip").unwrap(),
            "N123AB_2024-06-01.zip"
        );
        assert_eq!(
            sanitize_and_validate("flight log.csv").unwrap(),
            "flight_log.csv"
        );
    }

    #[test]
    fn rejects_characters_outside_the_charset() {
        assert_matches!(
            sanitize_and_validate("bad/name.zip"),
            Err(UploadError::InvalidFilename)
        );
        assert_matches!(
            sanitize_and_validate("naïve.zip"),
            Err(UploadError::InvalidFilename)
        );
        assert_matches!(sanitize_and_validate(""), Err(UploadError::InvalidFilename));
        assert_matches!(
            sanitize_and_validate("   "),
            Err(UploadError::InvalidFilename)
        );
    }

    #[test]
    fn identifier_strips_and_prefixes_size() {
        assert_eq!(identifier("flight log.zip", 1024), "1024-flightlogzip");
        assert_eq!(identifier("N123AB-1.csv", 77), "77-N123AB-1csv");
    }

    #[test]
    fn identifier_is_stable_for_a_given_input() {
        assert_eq!(identifier("a b.zip", 10), identifier("a b.zip", 10));
    }
}
