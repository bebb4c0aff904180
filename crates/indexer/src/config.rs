//! Configuration management for the Murmur synchronizer.
//!
//! This module handles loading configuration from:
//! - TOML files
//! - Environment variables via `${VAR_NAME}` placeholders
//! - Default values (fallbacks)

use alloy::primitives::Address;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for the synchronizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Network configuration.
    pub network: NetworkConfig,

    /// Contract addresses.
    pub contracts: ContractsConfig,

    /// Database configuration.
    pub database: DatabaseConfig,

    /// Sync configuration.
    pub sync: SyncConfig,

    /// Prover-service verifier configuration.
    pub verifier: VerifierConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Ethereum RPC URL.
    pub rpc_url: String,

    /// Chain ID (e.g., 11155111 for Sepolia).
    pub chain_id: u64,
}

/// Contract addresses configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractsConfig {
    /// Base anonymity-protocol contract (proofs, roots, signups).
    pub protocol: Address,

    /// Board extension contract (posts, comments, votes, airdrops).
    pub board: Address,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://murmur.db").
    pub url: String,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Sync configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Block number to start syncing from (0 = from genesis).
    #[serde(default)]
    pub start_block: u64,

    /// Polling interval in seconds for new blocks.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Batch size for historical sync (number of blocks per batch).
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,

    /// Number of confirmations to wait before processing blocks.
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,
}

/// Prover-service verifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Base URL of the prover service (exposes `POST /verify`).
    pub endpoint: String,

    /// Request timeout in seconds.
    #[serde(default = "default_verifier_timeout_secs")]
    pub timeout_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty.
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

fn default_poll_interval_secs() -> u64 {
    12
}

fn default_batch_size() -> u64 {
    1000
}

fn default_confirmations() -> u64 {
    6
}

fn default_verifier_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables can be referenced using `${VAR_NAME}` syntax,
    /// e.g. `rpc_url = "${MURMUR_RPC_URL}"`. Placeholders inside comment
    /// lines are left alone.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let expanded = Self::expand_env_vars(&contents)?;

        let config: Config = toml::from_str(&expanded)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml).context("Failed to parse TOML configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.network.rpc_url.is_empty() {
            anyhow::bail!("Network RPC URL cannot be empty");
        }
        if self.network.chain_id == 0 {
            anyhow::bail!("Chain ID must be non-zero");
        }

        if self.contracts.protocol.is_zero() {
            anyhow::bail!("Contracts protocol must be a non-zero address");
        }
        if self.contracts.board.is_zero() {
            anyhow::bail!("Contracts board must be a non-zero address");
        }
        if self.contracts.protocol == self.contracts.board {
            anyhow::bail!("Contracts protocol and board must be distinct addresses");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }
        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be > 0");
        }
        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot exceed max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if self.sync.poll_interval_secs == 0 {
            anyhow::bail!("Sync poll_interval_secs must be > 0");
        }
        if self.sync.batch_size == 0 {
            anyhow::bail!("Sync batch_size must be > 0");
        }

        let endpoint = self.verifier.endpoint.trim();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            anyhow::bail!(
                "Verifier endpoint must start with http:// or https:// (got '{}')",
                self.verifier.endpoint
            );
        }
        if self.verifier.timeout_secs == 0 {
            anyhow::bail!("Verifier timeout_secs must be > 0");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Logging level must be one of: {} (got '{}')",
                valid_levels.join(", "),
                self.logging.level
            );
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            anyhow::bail!(
                "Logging format must be one of: {} (got '{}')",
                valid_formats.join(", "),
                self.logging.format
            );
        }

        Ok(())
    }

    /// Expand `${VAR_NAME}` placeholders from the environment.
    ///
    /// Lines whose first non-whitespace character is `#` are comments and
    /// left untouched, so example placeholders in comments don't need the
    /// variables to exist.
    fn expand_env_vars(input: &str) -> Result<String> {
        let mut out = String::with_capacity(input.len());

        for (idx, line) in input.lines().enumerate() {
            if idx > 0 {
                out.push('\n');
            }

            if line.trim_start().starts_with('#') {
                out.push_str(line);
                continue;
            }

            let mut rest = line;
            while let Some(start) = rest.find("${") {
                out.push_str(&rest[..start]);
                let after = &rest[start + 2..];
                let Some(end) = after.find('}') else {
                    anyhow::bail!("Unclosed environment variable placeholder on line {}", idx + 1);
                };
                let name = &after[..end];
                if name.is_empty() {
                    anyhow::bail!("Empty environment variable name on line {}", idx + 1);
                }
                let value = std::env::var(name).with_context(|| {
                    format!("Environment variable '{}' is not set (line {})", name, idx + 1)
                })?;
                out.push_str(&value);
                rest = &after[end + 1..];
            }
            out.push_str(rest);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE_TOML: &str = r#"
[network]
rpc_url = "http://localhost:8545"
chain_id = 11155111

[contracts]
protocol = "0x1111111111111111111111111111111111111111"
board = "0x2222222222222222222222222222222222222222"

[database]
url = "sqlite://murmur.db"

[sync]
start_block = 0

[verifier]
endpoint = "http://localhost:9000"
        "#;

    #[test]
    fn test_load_example_config() {
        let config = Config::from_toml_str(BASE_TOML).unwrap();
        assert_eq!(config.network.chain_id, 11155111);
        assert_eq!(config.database.url, "sqlite://murmur.db");

        // Defaults
        assert_eq!(config.sync.poll_interval_secs, 12);
        assert_eq!(config.sync.batch_size, 1000);
        assert_eq!(config.sync.confirmations, 6);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.verifier.timeout_secs, 10);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_validation_empty_rpc_url() {
        let toml = BASE_TOML.replace("http://localhost:8545", "");
        let result = Config::from_toml_str(&toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("RPC URL"));
    }

    #[test]
    fn test_validation_zero_board_address() {
        let toml = BASE_TOML.replace(
            "0x2222222222222222222222222222222222222222",
            "0x0000000000000000000000000000000000000000",
        );
        let result = Config::from_toml_str(&toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("board"));
    }

    #[test]
    fn test_validation_identical_addresses() {
        let toml = BASE_TOML.replace(
            "0x2222222222222222222222222222222222222222",
            "0x1111111111111111111111111111111111111111",
        );
        let result = Config::from_toml_str(&toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("distinct"));
    }

    #[test]
    fn test_validation_bad_verifier_endpoint() {
        let toml = BASE_TOML.replace("http://localhost:9000", "tcp://localhost:9000");
        let result = Config::from_toml_str(&toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("endpoint"));
    }

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("MURMUR_TEST_VAR", "hello");
        let result = Config::expand_env_vars("value is ${MURMUR_TEST_VAR}").unwrap();
        assert_eq!(result, "value is hello");
        std::env::remove_var("MURMUR_TEST_VAR");

        let result = Config::expand_env_vars("no variables here").unwrap();
        assert_eq!(result, "no variables here");
    }

    #[test]
    fn test_expand_env_vars_undefined() {
        let result = Config::expand_env_vars("value is ${MURMUR_UNDEFINED_VAR_12345}");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("MURMUR_UNDEFINED_VAR_12345"));
    }

    #[test]
    fn test_expand_env_vars_unclosed() {
        let result = Config::expand_env_vars("value is ${UNCLOSED");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unclosed"));
    }

    #[test]
    fn test_expand_env_vars_ignores_comment_lines() {
        let input = "# Example: url = \"${MURMUR_NOT_SET}\"\nkey = \"value\"";
        let result = Config::expand_env_vars(input).unwrap();
        assert!(result.contains("${MURMUR_NOT_SET}"));
        assert!(result.contains("key = \"value\""));
    }
}
