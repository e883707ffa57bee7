//! Centralized configuration for TuneStream.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Environment variable overriding [`ServerConfig::host`].
pub const ENV_HOST: &str = "TUNESTREAM_HOST";
/// Environment variable overriding [`ServerConfig::port`].
pub const ENV_PORT: &str = "TUNESTREAM_PORT";
/// Environment variable overriding [`StorageConfig::library_dir`].
pub const ENV_LIBRARY_DIR: &str = "TUNESTREAM_LIBRARY_DIR";
/// Environment variable overriding [`StorageConfig::chunk_size`].
pub const ENV_CHUNK_SIZE: &str = "TUNESTREAM_CHUNK_SIZE";
/// Environment variable holding comma separated bearer tokens.
pub const ENV_TOKENS: &str = "TUNESTREAM_TOKENS";

/// Central configuration for all TuneStream components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct TuneStreamConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind to
    pub host: String,
    /// TCP port to bind to
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// Resolves host and port into a socket address.
    ///
    /// # Errors
    ///
    /// - `ConfigError::InvalidValue` - If host is not an IP address
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: ENV_HOST,
                value: self.host.clone(),
                reason: "expected an IP address".to_string(),
            })
    }
}

/// Backing store and stream buffering configuration.
///
/// Controls where uploaded audio lives and how many bytes a stream
/// session reads per chunk.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding uploaded audio files
    pub library_dir: PathBuf,
    /// Upper bound on bytes held in memory per stream read
    pub chunk_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            library_dir: PathBuf::from("uploads"),
            chunk_size: 256 * 1024, // 256 KiB
        }
    }
}

/// Bearer token configuration for the authorization collaborator.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Accepted bearer tokens; empty accepts any well-formed bearer credential
    pub tokens: Vec<String>,
}

/// Errors raised while building configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A setting held a value that could not be used
    #[error("Invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        /// Name of the offending setting
        key: &'static str,
        /// The rejected value
        value: String,
        /// Why the value was rejected
        reason: String,
    },
}

impl TuneStreamConfig {
    /// Builds configuration from defaults overridden by `TUNESTREAM_*` variables.
    ///
    /// # Errors
    ///
    /// - `ConfigError::InvalidValue` - If a variable cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// - `ConfigError::InvalidValue` - If a value cannot be parsed
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup(ENV_HOST) {
            config.server.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            config.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_PORT,
                value: port.clone(),
                reason: "expected a port number".to_string(),
            })?;
        }
        if let Some(dir) = lookup(ENV_LIBRARY_DIR) {
            config.storage.library_dir = PathBuf::from(dir);
        }
        if let Some(chunk) = lookup(ENV_CHUNK_SIZE) {
            config.storage.chunk_size = parse_chunk_size(&chunk)?;
        }
        if let Some(tokens) = lookup(ENV_TOKENS) {
            config.auth.tokens = tokens
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(config)
    }
}

/// Parses a non-zero chunk size.
///
/// # Errors
///
/// - `ConfigError::InvalidValue` - If the value is not a positive integer
pub fn parse_chunk_size(value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(ConfigError::InvalidValue {
            key: ENV_CHUNK_SIZE,
            value: value.to_string(),
            reason: "expected a positive byte count".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = TuneStreamConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.chunk_size, 262_144);
        assert_eq!(config.storage.library_dir, PathBuf::from("uploads"));
        assert!(config.auth.tokens.is_empty());
    }

    #[test]
    fn test_env_overrides() {
        let config = TuneStreamConfig::from_lookup(lookup_from(&[
            (ENV_HOST, "0.0.0.0"),
            (ENV_PORT, "8080"),
            (ENV_LIBRARY_DIR, "/srv/music"),
            (ENV_CHUNK_SIZE, "4096"),
            (ENV_TOKENS, "alpha, beta,,"),
        ]))
        .unwrap();

        assert_eq!(config.server.socket_addr().unwrap().port(), 8080);
        assert_eq!(config.storage.library_dir, PathBuf::from("/srv/music"));
        assert_eq!(config.storage.chunk_size, 4096);
        assert_eq!(config.auth.tokens, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = TuneStreamConfig::from_lookup(lookup_from(&[(ENV_PORT, "ninety")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { key: ENV_PORT, .. })
        ));

        let result = TuneStreamConfig::from_lookup(lookup_from(&[(ENV_CHUNK_SIZE, "0")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                key: ENV_CHUNK_SIZE,
                ..
            })
        ));
    }

    #[test]
    fn test_socket_addr_rejects_hostnames() {
        let server = ServerConfig {
            host: "localhost".to_string(),
            port: 3000,
        };
        assert!(server.socket_addr().is_err());
    }
}
