//! Runtime configuration for table lookup.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ccs::Optimization;

/// Environment variable naming the root of the external table tree
pub const NLS_PATH_VAR: &str = "NLSPATH";

/// Search root used when [`NLS_PATH_VAR`] is unset or empty
pub const DEFAULT_NLS_PATH: &str = "/usr/locale";

/// Subdirectory of the search root holding `.cct` files
pub const TABLE_DIR: &str = "iconv_data";

/// Extension of external CCS table files
pub const TABLE_EXT: &str = "cct";

/// Settings consulted when a session opens its converters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Root directory searched for external tables
    pub nls_path: PathBuf,
    /// Whether tables that are not compiled in may be loaded from disk
    pub external_tables: bool,
    /// Which layout to read for 16-bit external tables
    pub table_optimization: Optimization,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nls_path: PathBuf::from(DEFAULT_NLS_PATH),
            external_tables: true,
            table_optimization: Optimization::Speed,
        }
    }
}

impl Config {
    /// Build a configuration from the process environment.
    pub fn from_env() -> Self {
        let nls_path = match env::var_os(NLS_PATH_VAR) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from(DEFAULT_NLS_PATH),
        };
        Self {
            nls_path,
            ..Self::default()
        }
    }

    /// Configuration rooted at `path` instead of the environment.
    pub fn with_nls_path(path: impl Into<PathBuf>) -> Self {
        Self {
            nls_path: path.into(),
            ..Self::default()
        }
    }

    /// Location of the external table file for the CCS `name`.
    pub fn table_path(&self, name: &str) -> PathBuf {
        self.nls_path
            .join(TABLE_DIR)
            .join(format!("{}.{}", name, TABLE_EXT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_path() {
        let config = Config::with_nls_path("/opt/nls");
        assert_eq!(
            config.table_path("big5"),
            PathBuf::from("/opt/nls/iconv_data/big5.cct")
        );
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.nls_path, PathBuf::from("/usr/locale"));
        assert!(config.external_tables);
        assert_eq!(config.table_optimization, Optimization::Speed);
    }
}
