//! Store service configuration from the environment.
//!
//! - `SHIFTBOARD_PORT`: Port to listen on (default: 8080)
//! - `SHIFTBOARD_DATABASE_PATH`: SQLite file (default: <data dir>/shiftboard-server/shiftboard.db)
//! - `SHIFTBOARD_CONFIG`: YAML file with `api_keys` (default: <config dir>/shiftboard-server/config.yaml)

use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_path: PathBuf,
    pub config_path: PathBuf,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("SHIFTBOARD_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let database_path = lookup("SHIFTBOARD_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("shiftboard-server")
                    .join("shiftboard.db")
            });

        let config_path = lookup("SHIFTBOARD_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("shiftboard-server")
                    .join("config.yaml")
            });

        Self {
            port,
            database_path,
            config_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(|_| None);
        assert_eq!(config.port, 8080);
        assert!(config.database_path.ends_with("shiftboard-server/shiftboard.db"));
        assert!(config.config_path.ends_with("shiftboard-server/config.yaml"));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("SHIFTBOARD_PORT", "9090"),
            ("SHIFTBOARD_DATABASE_PATH", "/srv/board.db"),
        ]
        .into_iter()
        .collect();

        let config = ServerConfig::from_lookup(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(config.port, 9090);
        assert_eq!(config.database_path, PathBuf::from("/srv/board.db"));
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let config = ServerConfig::from_lookup(|name| {
            (name == "SHIFTBOARD_PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(config.port, 8080);
    }
}
