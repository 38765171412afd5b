//! The set of uploads known only on the producer side.
//!
//! Entries live here from the moment a file is picked until the server's
//! list first reports a record with the same identifier, at which point
//! the server copy takes over as source of truth. The store hands out
//! immutable snapshots and replaces the whole vector on every write, so
//! concurrent upload sequences can update it without lost updates.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use flightbay_core::types::{DbId, PENDING_ID};

/// Client-local lifecycle of a pending upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingStatus {
    Hashing,
    Uploading,
    Failed(String),
}

/// An upload the server has not acknowledged yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpload {
    /// Always [`PENDING_ID`] until reconciled away.
    pub id: DbId,
    pub identifier: String,
    pub filename: String,
    pub size_bytes: u64,
    pub bytes_done: u64,
    pub status: PendingStatus,
}

impl PendingUpload {
    pub fn new(identifier: String, filename: String, size_bytes: u64) -> Self {
        Self {
            id: PENDING_ID,
            identifier,
            filename,
            size_bytes,
            bytes_done: 0,
            status: PendingStatus::Hashing,
        }
    }
}

/// Copy-on-write store of pending uploads, keyed by identifier.
#[derive(Default)]
pub struct PendingUploadsStore {
    snapshot: RwLock<Arc<Vec<PendingUpload>>>,
}

impl PendingUploadsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current immutable snapshot.
    pub fn snapshot(&self) -> Arc<Vec<PendingUpload>> {
        Arc::clone(&self.snapshot.read().expect("pending store lock"))
    }

    /// Insert a pending upload, or replace the entry with the same
    /// identifier.
    pub fn upsert(&self, entry: PendingUpload) {
        self.mutate(|entries| {
            match entries.iter_mut().find(|e| e.identifier == entry.identifier) {
                Some(existing) => *existing = entry,
                None => entries.push(entry),
            }
        });
    }

    /// Apply `f` to the entry with `identifier`, if present.
    pub fn update<F>(&self, identifier: &str, f: F)
    where
        F: FnOnce(&mut PendingUpload),
    {
        self.mutate(|entries| {
            if let Some(entry) = entries.iter_mut().find(|e| e.identifier == identifier) {
                f(entry);
            }
        });
    }

    /// Remove the entry with `identifier`, if present.
    pub fn remove(&self, identifier: &str) {
        self.mutate(|entries| entries.retain(|e| e.identifier != identifier));
    }

    /// Drop every pending entry whose identifier the server now knows.
    ///
    /// Idempotent and order-independent: reconciling against the same
    /// (or an older) server list any number of times never resurrects or
    /// over-removes entries.
    pub fn reconcile(&self, server_identifiers: &HashSet<String>) {
        self.mutate(|entries| entries.retain(|e| !server_identifiers.contains(&e.identifier)));
    }

    fn mutate<F>(&self, f: F)
    where
        F: FnOnce(&mut Vec<PendingUpload>),
    {
        let mut guard = self.snapshot.write().expect("pending store lock");
        let mut next: Vec<PendingUpload> = guard.as_ref().clone();
        f(&mut next);
        *guard = Arc::new(next);
    }
}
