use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable overriding the ignore-robots flag
pub const ENV_IGNORE_ROBOTS: &str = "ROCKPOOL_IGNORE_ROBOTS";
/// Environment variable overriding the politeness delay (milliseconds)
pub const ENV_POLITENESS_DELAY_MS: &str = "ROCKPOOL_POLITENESS_DELAY_MS";
/// Environment variable overriding the request timeout (milliseconds)
pub const ENV_REQUEST_TIMEOUT_MS: &str = "ROCKPOOL_REQUEST_TIMEOUT_MS";
/// Environment variable overriding the retry count
pub const ENV_MAX_RETRIES: &str = "ROCKPOOL_MAX_RETRIES";

/// Loads and parses a configuration file from the given path
///
/// After TOML parsing, operational tunables are overridden from the
/// environment (the deployment layer supplies these without editing the
/// file), keywords are lowercased, and the result is validated.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use rockpool::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Max pages: {}", config.crawl.max_pages);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let mut config: Config = toml::from_str(&content)?;

    apply_env_overrides(&mut config)?;
    normalize_keywords(&mut config);

    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a crawl's output can be tied to the exact
/// configuration that produced it.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Applies environment-variable overrides to the fetch tunables
pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
    if let Ok(value) = std::env::var(ENV_IGNORE_ROBOTS) {
        config.fetch.ignore_robots = parse_bool(ENV_IGNORE_ROBOTS, &value)?;
    }

    if let Ok(value) = std::env::var(ENV_POLITENESS_DELAY_MS) {
        config.fetch.politeness_delay_ms = parse_number(ENV_POLITENESS_DELAY_MS, &value)?;
    }

    if let Ok(value) = std::env::var(ENV_REQUEST_TIMEOUT_MS) {
        config.fetch.request_timeout_ms = parse_number(ENV_REQUEST_TIMEOUT_MS, &value)?;
    }

    if let Ok(value) = std::env::var(ENV_MAX_RETRIES) {
        config.fetch.max_retries = parse_number(ENV_MAX_RETRIES, &value)?;
    }

    Ok(())
}

/// Lowercases keywords and drops empty entries
fn normalize_keywords(config: &mut Config) {
    config.crawl.keywords = config
        .crawl
        .keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
}

fn parse_bool(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvOverride {
            var: var.to_string(),
            message: format!("expected a boolean, got '{}'", value),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride {
            var: var.to_string(),
            message: format!("expected a number, got '{}'", value),
        })
}
