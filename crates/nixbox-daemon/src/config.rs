//! Configuration management.
//!
//! nixbox configuration is loaded from multiple sources with the following
//! priority:
//!
//! 1. Environment variables (NIXBOX_*)
//! 2. User config file (~/.config/nixbox/config.toml)
//! 3. System config file (/etc/nixbox/config.toml)
//! 4. Default values
//!
//! ## Example Configuration File
//!
//! ```toml
//! socket = "/run/nixbox/nixbox.sock"
//! containerd_address = "/run/containerd/containerd.sock"
//! source = "https://cache.example.org"
//! loader_command = "nixbox-load"
//!
//! [logging]
//! level = "info"
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// nixbox daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Unix socket the daemon serves the CRI image service on.
    pub socket: PathBuf,
    /// Address of the backend CRI endpoint.
    pub containerd_address: String,
    /// Substituter store paths are fetched from; empty builds locally.
    pub source: String,
    /// External command used to load archives into the content store.
    pub loader_command: PathBuf,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket: PathBuf::from("/run/nixbox/nixbox.sock"),
            containerd_address: "/run/containerd/containerd.sock".to_string(),
            source: String::new(),
            loader_command: PathBuf::from("nixbox-load"),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from files and environment.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(system_config_path()))
            .merge(Toml::file(user_config_path()))
            .merge(Env::prefixed("NIXBOX_"))
            .extract()
    }

    /// Loads configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("NIXBOX_"))
            .extract()
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("nixbox")
        .join("config.toml")
}

fn system_config_path() -> PathBuf {
    PathBuf::from("/etc/nixbox/config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.containerd_address, "/run/containerd/containerd.sock");
        assert!(config.source.is_empty());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "containerd_address = \"/tmp/other.sock\"\n[logging]\nlevel = \"debug\""
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.containerd_address, "/tmp/other.sock");
        assert_eq!(config.logging.level, "debug");
        // Unset keys keep their defaults.
        assert_eq!(config.socket, PathBuf::from("/run/nixbox/nixbox.sock"));
    }
}
