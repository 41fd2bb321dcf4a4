//! Filedrop Store Library
//!
//! This crate provides the registry store: an in-memory identifier-to-record
//! map with an injected snapshot-persistence port, plus the JSON flat-file
//! implementation of that port.
//!
//! # Snapshot format
//!
//! The snapshot serializes the full registry as a JSON array of
//! `[identifier, record]` pairs. Pair order carries no meaning; reloading
//! never assumes the sequence reflects insertion order.

pub mod registry;
pub mod snapshot;

// Re-export commonly used types
pub use registry::RegistryStore;
pub use snapshot::{JsonSnapshot, SnapshotError, SnapshotResult, SnapshotStore};
