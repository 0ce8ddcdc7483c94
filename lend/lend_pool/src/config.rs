//! Configuration for a resource pool.
//!
//! A pool is configured with its size and the prefix used to name its
//! resources. The configuration can be built in code or loaded from TOML:
//!
//! ```toml
//! size = 4
//! id_prefix = "conn-"
//! ```

use crate::error::{PoolError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default prefix for resource identifiers
pub const DEFAULT_ID_PREFIX: &str = "resource-";

/// Configuration for a resource pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    /// Number of resources to create. Signed so that a negative size coming
    /// from a file or the command line is rejected rather than wrapped.
    pub size: i64,

    /// Prefix for resource identifiers
    pub id_prefix: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: 0,
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
        }
    }
}

impl PoolConfig {
    /// Configuration for a pool of `size` resources with the default prefix.
    pub fn with_size(size: i64) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Parse a configuration from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| PoolError::Configuration(e.to_string()))
    }

    /// Load a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Check the configuration and return the pool size.
    pub fn validate(&self) -> Result<usize> {
        if self.size < 0 {
            return Err(PoolError::Configuration(format!(
                "pool size must be non-negative, got {}",
                self.size
            )));
        }
        usize::try_from(self.size).map_err(|_| {
            PoolError::Configuration(format!("pool size {} does not fit this platform", self.size))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PoolConfig::default();
        assert_eq!(config.size, 0);
        assert_eq!(config.id_prefix, "resource-");
        assert_eq!(config.validate().unwrap(), 0);
    }

    #[test]
    fn test_negative_size_rejected() {
        let result = PoolConfig::with_size(-1).validate();
        assert!(matches!(result, Err(PoolError::Configuration(_))));
    }

    #[test]
    fn test_from_toml() {
        let config = PoolConfig::from_toml_str("size = 4\nid_prefix = \"conn-\"").unwrap();
        assert_eq!(config.size, 4);
        assert_eq!(config.id_prefix, "conn-");

        // Missing keys fall back to defaults
        let config = PoolConfig::from_toml_str("size = 2").unwrap();
        assert_eq!(config.id_prefix, DEFAULT_ID_PREFIX);
    }

    #[test]
    fn test_non_integer_size_rejected() {
        let result = PoolConfig::from_toml_str("size = 1.5");
        assert!(matches!(result, Err(PoolError::Configuration(_))));

        let result = PoolConfig::from_toml_str("size = \"two\"");
        assert!(matches!(result, Err(PoolError::Configuration(_))));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = PoolConfig::from_toml_str("size = 2\nmax_idle = 30");
        assert!(matches!(result, Err(PoolError::Configuration(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "size = 3").unwrap();
        let config = PoolConfig::from_file(file.path()).unwrap();
        assert_eq!(config.validate().unwrap(), 3);

        let missing = PoolConfig::from_file("/nonexistent/lend/pool.toml");
        assert!(matches!(missing, Err(PoolError::Io(_))));
    }
}
