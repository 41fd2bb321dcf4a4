//! Configuration module
//!
//! Runtime configuration for the registry service, read from the environment
//! once at startup. The owner identity and public link base are required; the
//! process refuses to start without them.

use std::env;
use std::path::PathBuf;

// Default values
pub const DEFAULT_SNAPSHOT_PATH: &str = "file_registry.json";
const DEBOUNCE_WINDOW_MS: u64 = 1000;
const MAX_GROUP_SIZE: usize = 100;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Identity allowed to mutate any record and to list the full registry.
    pub owner_identity: String,
    /// Base URL for public deep links, e.g. `https://t.me/somebot`.
    pub public_link_base: String,
    /// Location of the registry snapshot file.
    pub snapshot_path: PathBuf,
    /// Sliding debounce window for grouped uploads, in milliseconds.
    pub debounce_window_ms: u64,
    /// Flush trigger for grouped uploads: a group reaching this many events
    /// is registered immediately instead of waiting for the window.
    pub max_group_size: usize,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let config = Config {
            owner_identity: env::var("OWNER_IDENTITY")
                .map_err(|_| anyhow::anyhow!("OWNER_IDENTITY must be set"))?,
            public_link_base: env::var("PUBLIC_LINK_BASE")
                .map_err(|_| anyhow::anyhow!("PUBLIC_LINK_BASE must be set"))?,
            snapshot_path: env::var("FILE_REGISTRY_PATH")
                .unwrap_or_else(|_| DEFAULT_SNAPSHOT_PATH.to_string())
                .into(),
            debounce_window_ms: env::var("UPLOAD_DEBOUNCE_MS")
                .unwrap_or_else(|_| DEBOUNCE_WINDOW_MS.to_string())
                .parse()
                .unwrap_or(DEBOUNCE_WINDOW_MS),
            max_group_size: env::var("UPLOAD_MAX_GROUP_SIZE")
                .unwrap_or_else(|_| MAX_GROUP_SIZE.to_string())
                .parse()
                .unwrap_or(MAX_GROUP_SIZE),
            environment,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.owner_identity.trim().is_empty() {
            return Err(anyhow::anyhow!("OWNER_IDENTITY cannot be empty"));
        }
        if self.public_link_base.trim().is_empty() {
            return Err(anyhow::anyhow!("PUBLIC_LINK_BASE cannot be empty"));
        }
        if self.debounce_window_ms == 0 {
            return Err(anyhow::anyhow!("UPLOAD_DEBOUNCE_MS must be at least 1"));
        }
        if self.max_group_size == 0 {
            return Err(anyhow::anyhow!("UPLOAD_MAX_GROUP_SIZE must be at least 1"));
        }
        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}
