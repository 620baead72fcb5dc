//! Rockpool: a bounded single-domain crawler
//!
//! This crate implements a focused breadth-first crawler that collects pages
//! from one web domain, bounded by depth and page count, while respecting
//! robots.txt and per-host politeness delays. Collected pages are written as
//! newline-delimited JSON records for a downstream extraction pipeline.

pub mod config;
pub mod crawler;
pub mod robots;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Rockpool operations
#[derive(Debug, Error)]
pub enum RockpoolError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid environment override {var}: {message}")]
    InvalidEnvOverride { var: String, message: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Rockpool operations
pub type Result<T> = std::result::Result<T, RockpoolError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use crate::url::{canonicalize, DomainScope};
pub use config::Config;
pub use crawler::{crawl, CrawlReport, StopSignal, Termination};
pub use storage::PageRecord;
