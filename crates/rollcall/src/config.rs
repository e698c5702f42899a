//! Configuration management for rollcall.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "rollcall";

/// Default attendance file name.
const ATTENDANCE_FILE_NAME: &str = "attendance.json";

/// Default uploads directory name, relative to the data directory.
const UPLOADS_DIR_NAME: &str = "uploads";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. `PORT` environment variable (sets `server.port`)
/// 2. Environment variables `ROLLCALL_<SECTION>__<KEY>`
/// 3. TOML config file at `~/.config/rollcall/config.toml`
/// 4. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Photo upload configuration.
    pub uploads: UploadConfig,
    /// Live update configuration.
    pub live: LiveConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the attendance file and uploads.
    /// Defaults to `~/.local/share/rollcall`
    pub data_dir: Option<PathBuf>,
    /// Attendance file name inside the data directory.
    pub attendance_file: String,
    /// Uploads directory name inside the data directory. Also the prefix
    /// recorded in each record's `photo` field.
    pub uploads_dir: String,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Base URL students reach the service at; used to build form links.
    /// Defaults to `http://localhost:<port>`
    pub public_url: Option<String>,
}

/// Photo upload configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Accepted photo extensions, lowercase, without the dot.
    pub allowed_extensions: Vec<String>,
    /// Maximum request body size for a submission, in bytes.
    pub max_photo_bytes: usize,
}

/// Live update configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Events buffered per viewer before a slow viewer starts skipping.
    pub channel_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None, // Will be resolved to default at runtime
            attendance_file: ATTENDANCE_FILE_NAME.to_string(),
            uploads_dir: UPLOADS_DIR_NAME.to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 2334,
            public_url: None,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()],
            max_photo_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("ROLLCALL_").split("__"))
            .merge(Env::raw().only(&["PORT"]).map(|_| "server.port".into()));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::config("server.port must be greater than 0"));
        }

        if self.storage.attendance_file.trim().is_empty() {
            return Err(Error::config("storage.attendance_file must not be empty"));
        }

        // Doubles as a URL prefix; "/" would shadow every route
        if self.uploads_dir_name().is_empty() {
            return Err(Error::config(
                "storage.uploads_dir must name a directory other than '/'",
            ));
        }

        if self.uploads.allowed_extensions.is_empty() {
            return Err(Error::config(
                "uploads.allowed_extensions must list at least one extension",
            ));
        }

        for ext in &self.uploads.allowed_extensions {
            let well_formed = !ext.is_empty()
                && ext
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
            if !well_formed {
                return Err(Error::config(format!(
                    "invalid upload extension '{ext}': use lowercase letters and digits without a dot"
                )));
            }
        }

        if self.uploads.max_photo_bytes == 0 {
            return Err(Error::config(
                "uploads.max_photo_bytes must be greater than 0",
            ));
        }

        if self.live.channel_capacity == 0 {
            return Err(Error::config("live.channel_capacity must be greater than 0"));
        }

        Ok(())
    }

    /// Get the data directory, resolving defaults if not set.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    /// Get the attendance file path.
    #[must_use]
    pub fn attendance_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.attendance_file)
    }

    /// Get the uploads directory name without surrounding slashes.
    ///
    /// This is also the URL prefix photos are served under.
    #[must_use]
    pub fn uploads_dir_name(&self) -> &str {
        self.storage.uploads_dir.trim().trim_matches('/')
    }

    /// Get the uploads directory path.
    #[must_use]
    pub fn uploads_path(&self) -> PathBuf {
        self.data_dir().join(self.uploads_dir_name())
    }

    /// Get the address the server binds to.
    #[must_use]
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Get the public base URL, without a trailing slash.
    #[must_use]
    pub fn public_url(&self) -> String {
        self.server.public_url.as_ref().map_or_else(
            || format!("http://localhost:{}", self.server.port),
            |url| url.trim_end_matches('/').to_string(),
        )
    }
}
