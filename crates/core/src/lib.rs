//! Pure domain logic for the flightbay upload service.
//!
//! This crate has zero internal dependencies (no DB, no async, no I/O).
//! It provides chunk arithmetic and the chunk-status bit-string, filename
//! validation and identifier derivation, upload/import status constants,
//! service status aggregation, and the domain error types shared by the
//! server and client crates.

pub mod chunks;
pub mod error;
pub mod filename;
pub mod status;
pub mod types;
