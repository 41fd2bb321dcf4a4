//! Direct-link fetch port
//!
//! The transport collaborator implements this to resolve a provider file
//! handle into a direct download URL. The capability is best-effort: a
//! `None` never blocks registration.

use async_trait::async_trait;

#[async_trait]
pub trait DirectLinkFetcher: Send + Sync {
    async fn fetch_direct_url(&self, provider_file_ref: &str) -> Option<String>;
}

/// Fetcher used when no transport capability is wired in (tests, CLI tools).
/// Every lookup resolves to absent.
pub struct NoDirectLinks;

#[async_trait]
impl DirectLinkFetcher for NoDirectLinks {
    async fn fetch_direct_url(&self, _provider_file_ref: &str) -> Option<String> {
        None
    }
}
