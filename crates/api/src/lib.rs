//! Flightbay API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! storage, status probe) so integration tests and the binary entrypoint
//! can both access them.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod probe;
pub mod router;
pub mod routes;
pub mod state;
pub mod storage;
pub mod wire;
