//! Filedrop Core Library
//!
//! This crate provides the domain models, identifier generation, error types,
//! and configuration shared across all filedrop components.

pub mod config;
pub mod error;
pub mod id;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use error::AppError;
pub use id::FileId;
