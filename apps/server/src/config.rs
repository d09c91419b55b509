//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. A `.env` file in the working directory is loaded first by
//! `main`.
//!
//! | Variable                    | Default                           |
//! |-----------------------------|-----------------------------------|
//! | `WRENCH_HTTP_PORT`          | `5000`                            |
//! | `WRENCH_DB_PATH`            | platform data dir `/wrench.db`    |
//! | `WRENCH_DB_MAX_CONNECTIONS` | `5`                               |
//! | `WRENCH_SHOP_NAME`          | `Wrench Auto Repair`              |
//! | `WRENCH_SHOP_ADDRESS`       | `123 Main Street\|Springfield`    |
//! | `WRENCH_SHOP_PHONE`         | `(555) 010-0000`                  |
//! | `WRENCH_SHOP_EMAIL`         | unset                             |

use std::env;
use std::path::PathBuf;

use directories::ProjectDirs;
use wrench_core::ShopProfile;

/// Separates address lines in `WRENCH_SHOP_ADDRESS`.
const ADDRESS_LINE_SEPARATOR: char = '|';

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// Company header printed on invoice documents
    pub shop: ShopProfile,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = ShopProfile::default();

        let config = ServerConfig {
            http_port: var("WRENCH_HTTP_PORT")
                .unwrap_or_else(|| "5000".to_string())
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("WRENCH_HTTP_PORT".to_string()))?,

            database_path: match var("WRENCH_DB_PATH") {
                Some(path) => PathBuf::from(path),
                None => default_database_path(),
            },

            db_max_connections: var("WRENCH_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("WRENCH_DB_MAX_CONNECTIONS".to_string()))?,

            shop: ShopProfile {
                name: var("WRENCH_SHOP_NAME").unwrap_or(defaults.name),
                address_lines: match var("WRENCH_SHOP_ADDRESS") {
                    Some(address) => address
                        .split(ADDRESS_LINE_SEPARATOR)
                        .map(str::trim)
                        .filter(|line| !line.is_empty())
                        .map(str::to_string)
                        .collect(),
                    None => defaults.address_lines,
                },
                phone: var("WRENCH_SHOP_PHONE").unwrap_or(defaults.phone),
                email: var("WRENCH_SHOP_EMAIL").or(defaults.email),
            },
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "WRENCH_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(config)
    }
}

/// Platform data directory, falling back to the working directory.
///
/// - **macOS**: `~/Library/Application Support/com.wrench.pos/wrench.db`
/// - **Windows**: `%APPDATA%\wrench\pos\data\wrench.db`
/// - **Linux**: `~/.local/share/pos/wrench.db`
fn default_database_path() -> PathBuf {
    match ProjectDirs::from("com", "wrench", "pos") {
        Some(dirs) => dirs.data_dir().join("wrench.db"),
        None => PathBuf::from("wrench.db"),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
