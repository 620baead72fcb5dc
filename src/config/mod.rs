//! Configuration module for Rockpool
//!
//! Handles loading, environment overrides, validation, and integrity
//! hashing of TOML configuration files.

mod parser;
mod types;
mod validation;

pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash,
    ENV_IGNORE_ROBOTS, ENV_MAX_RETRIES, ENV_POLITENESS_DELAY_MS, ENV_REQUEST_TIMEOUT_MS,
};
pub use types::{Config, CrawlConfig, FetchConfig, OutputConfig, UserAgentConfig};
pub use validation::validate;
