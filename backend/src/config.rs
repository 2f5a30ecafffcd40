//! Application configuration file support.
//!
//! Configuration is read from an `attractions.toml` file and then overridden
//! by environment variables. Every setting has a default, so an empty file
//! (or no file at all) yields a working local configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::db::factory::RepositoryType;
use crate::services::pagination::{DEFAULT_LIMIT, MAX_LIMIT};
use crate::services::proximity::DEFAULT_CANDIDATE_CAP;
use crate::services::QuerySettings;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "ATTRACTIONS_CONFIG";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

impl ConfigError {
    fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub query: QuerySection,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Document store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Store backend; only `local` ships.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// JSON export loaded through bulk replace at startup.
    #[serde(default)]
    pub data_path: Option<PathBuf>,
    /// Declare a geospatial index so nearby uses the store's geo operator.
    #[serde(default)]
    pub geo_index: bool,
}

/// Query tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySection {
    #[serde(default = "default_candidate_cap")]
    pub nearby_candidate_cap: usize,
    #[serde(default = "default_limit")]
    pub default_limit: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_backend() -> String {
    "local".to_string()
}

fn default_candidate_cap() -> usize {
    DEFAULT_CANDIDATE_CAP
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            backend: default_backend(),
            data_path: None,
            geo_index: false,
        }
    }
}

impl Default for QuerySection {
    fn default() -> Self {
        QuerySection {
            nearby_candidate_cap: default_candidate_cap(),
            default_limit: default_limit(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `attractions.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    ///
    /// Returns `Ok(None)` when no file exists.
    pub fn from_default_location() -> Result<Option<Self>, ConfigError> {
        let search_paths = [
            PathBuf::from("attractions.toml"),
            PathBuf::from("backend/attractions.toml"),
            PathBuf::from("../attractions.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                log::info!("Loading configuration from {}", path.display());
                return Self::from_file(&path).map(Some);
            }
        }
        Ok(None)
    }

    /// Resolve the configuration for the running process: the file named by
    /// `ATTRACTIONS_CONFIG`, else the default location, else defaults; then
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None => Self::from_default_location()?.unwrap_or_default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `HOST`, `PORT`, `DATA_PATH`, `GEO_INDEX` and
    /// `NEARBY_CANDIDATE_CAP` from `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST").filter(|h| !h.trim().is_empty()) {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_env("PORT", &port)?;
        }
        if let Some(path) = lookup("DATA_PATH").filter(|p| !p.trim().is_empty()) {
            self.store.data_path = Some(PathBuf::from(path));
        }
        if let Some(flag) = lookup("GEO_INDEX") {
            self.store.geo_index = parse_flag(&flag)
                .ok_or_else(|| ConfigError::invalid("GEO_INDEX", "expected true/false/1/0"))?;
        }
        if let Some(cap) = lookup("NEARBY_CANDIDATE_CAP") {
            self.query.nearby_candidate_cap = parse_env("NEARBY_CANDIDATE_CAP", &cap)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn repository_type(&self) -> Result<RepositoryType, ConfigError> {
        RepositoryType::from_str(&self.store.backend)
            .map_err(|e| ConfigError::invalid("store.backend", e))
    }

    /// Address for the HTTP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn query_settings(&self) -> QuerySettings {
        QuerySettings {
            nearby_candidate_cap: self.query.nearby_candidate_cap,
            default_limit: self.query.default_limit,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.repository_type()?;
        if self.query.nearby_candidate_cap == 0 {
            return Err(ConfigError::invalid("query.nearby_candidate_cap", "must be at least 1"));
        }
        if !(1..=MAX_LIMIT).contains(&self.query.default_limit) {
            return Err(ConfigError::invalid(
                "query.default_limit",
                format!("must be between 1 and {}", MAX_LIMIT),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(key, e.to_string()))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.query.nearby_candidate_cap, 5000);
        assert_eq!(config.query.default_limit, 20);
        assert!(!config.store.geo_index);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 3000

[store]
backend = "local"
data_path = "data/attractions.json"
geo_index = true

[query]
nearby_candidate_cap = 200
default_limit = 50
"#;
        let config = AppConfig::from_toml(toml).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.store.data_path, Some(PathBuf::from("data/attractions.json")));
        assert!(config.store.geo_index);
        assert_eq!(config.query_settings().nearby_candidate_cap, 200);
        assert_eq!(config.repository_type().unwrap(), RepositoryType::Local);
    }

    #[test]
    fn test_rejects_unknown_backend_and_bad_limits() {
        assert!(AppConfig::from_toml("[store]\nbackend = \"mongo\"").is_err());
        assert!(AppConfig::from_toml("[query]\ndefault_limit = 500").is_err());
        assert!(AppConfig::from_toml("[query]\nnearby_candidate_cap = 0").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PORT", "9000"),
            ("DATA_PATH", "/srv/seed.json"),
            ("GEO_INDEX", "1"),
            ("NEARBY_CANDIDATE_CAP", "10"),
        ]
        .into_iter()
        .collect();
        let config = AppConfig::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.store.data_path, Some(PathBuf::from("/srv/seed.json")));
        assert!(config.store.geo_index);
        assert_eq!(config.query.nearby_candidate_cap, 10);
    }

    #[test]
    fn test_invalid_env_override_is_reported() {
        let err = AppConfig::default()
            .with_overrides(|key| (key == "PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "PORT"));
    }
}
