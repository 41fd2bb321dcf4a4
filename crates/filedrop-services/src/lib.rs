//! Filedrop Services Layer
//!
//! This crate is the **business service layer**: it hosts the registry
//! service (permission-checked mutation, single and batch registration) and
//! the upload aggregator that collapses a burst of grouped file events into
//! one batch registration pass. Keep orchestration here; keep transport
//! handling in the chat-bot collaborator.

pub mod aggregator;
pub mod links;
pub mod service;

// Re-export commonly used types
pub use aggregator::{AggregatorConfig, GroupSink, UploadAggregator};
pub use links::{DirectLinkFetcher, NoDirectLinks};
pub use service::{RegistryService, RegistryServiceConfig};
