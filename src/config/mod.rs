//! Configuration management for lrweb
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Caller identity settings
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Query cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// How request URLs are rooted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginMode {
    /// Requests go straight to the backend origin
    Direct,
    /// Requests go to a same-origin prefix that a reverse proxy forwards to the backend
    Proxy,
}

/// Backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend origin (or the proxy origin in proxy mode)
    #[serde(default = "default_backend_url")]
    pub url: String,

    #[serde(default = "default_backend_mode")]
    pub mode: OriginMode,

    /// Path prefix used in proxy mode
    #[serde(default = "default_proxy_prefix")]
    pub proxy_prefix: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Identity configuration
///
/// The `X-User-Id` header is a stand-in for real authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Explicit user id; wins over the persisted one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,

    /// File (relative to the base dir) holding the persisted user id
    #[serde(default = "default_identity_file")]
    pub identity_file: String,
}

/// Query cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds a stored result is served without refetching (0 = always refetch)
    #[serde(default = "default_stale_time_secs")]
    pub stale_time_secs: u64,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for lrweb data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,

    /// Path to the persisted user id
    pub identity_file: PathBuf,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            mode: default_backend_mode(),
            proxy_prefix: default_proxy_prefix(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_id: None,
            identity_file: default_identity_file(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time_secs: default_stale_time_secs(),
        }
    }
}

impl Config {
    /// Get the default base directory for lrweb (~/.lrweb)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".lrweb")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    fn paths_for(&self, base: PathBuf, config_file: PathBuf) -> PathsConfig {
        PathsConfig {
            identity_file: base.join(&self.identity.identity_file),
            config_file,
            base_dir: base,
        }
    }

    /// Initialize paths configuration
    pub fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = self.paths_for(base.clone(), base.join("config.toml"));
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = config.paths_for(base, config_path.to_path_buf());

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a base directory, falling back to defaults
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = loaded.paths_for(
                config.paths.base_dir.clone(),
                config.paths.config_file.clone(),
            );
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Parsed backend origin
    pub fn backend_url(&self) -> Result<Url> {
        Url::parse(&self.backend.url)
            .map_err(|e| Error::Config(format!("Invalid backend URL '{}': {}", self.backend.url, e)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.cache.stale_time_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = self.backend_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "backend.url must be http(s), got '{}'",
                url.scheme()
            )));
        }

        if self.backend.timeout_secs == 0 {
            return Err(Error::Config(
                "backend.timeout_secs must be positive".to_string(),
            ));
        }

        if self.backend.mode == OriginMode::Proxy && !self.backend.proxy_prefix.starts_with('/') {
            return Err(Error::Config(
                "backend.proxy_prefix must start with '/'".to_string(),
            ));
        }

        if self.identity.identity_file.trim().is_empty() {
            return Err(Error::Config(
                "identity.identity_file must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend.mode, OriginMode::Direct);
        assert_eq!(config.backend.proxy_prefix, "/api");
        assert_eq!(config.cache.stale_time_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));
        config.backend.url = "http://backend.internal:9000".to_string();
        config.cache.stale_time_secs = 5;

        config.save().unwrap();
        assert!(config.paths.config_file.exists());

        let loaded = Config::load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(loaded.backend.url, "http://backend.internal:9000");
        assert_eq!(loaded.cache.stale_time_secs, 5);
        assert_eq!(loaded.paths.identity_file, tmp.path().join("user_id"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "[backend]\nurl = \"https://lr.example.org\"\nmode = \"proxy\"\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.backend.mode, OriginMode::Proxy);
        assert_eq!(config.backend.proxy_prefix, "/api");
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.identity.user_id, None);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.backend.url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.backend.url = "ftp://example.org".to_string();
        assert!(config.validate().is_err());

        config.backend.url = "http://localhost:8000".to_string();
        config.backend.timeout_secs = 0;
        assert!(config.validate().is_err());

        config.backend.timeout_secs = 10;
        config.backend.mode = OriginMode::Proxy;
        config.backend.proxy_prefix = "api".to_string();
        assert!(config.validate().is_err());

        config.backend.proxy_prefix = "/api".to_string();
        assert!(config.validate().is_ok());
    }
}
