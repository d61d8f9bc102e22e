use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::gallery::GalleryLimits;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// YAML config file structure. Every field is optional; absent ones keep their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigYaml {
    pub met_base_url: Option<String>,
    pub smithsonian_base_url: Option<String>,
    /// Prefer the ARTWORKS_SMITHSONIAN_API_KEY environment variable over this.
    pub smithsonian_api_key: Option<String>,
    /// Max lookups in flight during a batch fetch
    pub max_concurrent: Option<usize>,
    pub page_size: Option<usize>,
    /// Cap on refs kept from one listing
    pub max_items: Option<usize>,
    /// Refs resolved for a search or exhibition
    pub search_limit: Option<usize>,
    pub highlight_count: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    /// Directory for the favorites file
    pub data_dir: Option<PathBuf>,
}

/// Application configuration
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub met_base_url: String,
    pub smithsonian_base_url: String,
    pub smithsonian_api_key: Option<String>,
    pub max_concurrent: usize,
    pub page_size: usize,
    pub max_items: usize,
    pub search_limit: usize,
    pub highlight_count: usize,
    pub request_timeout: Duration,
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            met_base_url: crate::met::DEFAULT_BASE_URL.to_string(),
            smithsonian_base_url: crate::smithsonian::DEFAULT_BASE_URL.to_string(),
            smithsonian_api_key: None,
            max_concurrent: 6,
            page_size: 12,
            max_items: 500,
            search_limit: 50,
            highlight_count: 10,
            request_timeout: Duration::from_secs(20),
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("artworks")
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("artworks").join("config.yaml"))
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Config(format!("{key} must be a number, got '{value}'")))
}

impl Config {
    /// Load configuration: `.env`, then the YAML file, then environment overrides.
    ///
    /// The YAML file is `explicit_path` if given, else `$ARTWORKS_CONFIG`, else
    /// `<config dir>/artworks/config.yaml` when it exists.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_ok() {
            info!("Loaded environment from .env");
        }

        let path = explicit_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("ARTWORKS_CONFIG").map(PathBuf::from))
            .or_else(|| default_config_path().filter(|p| p.exists()));

        let mut config = match path {
            Some(path) => {
                info!("Loading config from {}", path.display());
                Self::from_yaml_file(&path)?
            }
            None => {
                debug!("No config file, using defaults");
                Self::default()
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let parsed: ConfigYaml = if yaml.trim().is_empty() {
            ConfigYaml::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Serialization(e.to_string()))?
        };
        Ok(Self::from(parsed))
    }

    /// Apply `ARTWORKS_*` overrides using `lookup` to read variables.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("ARTWORKS_MET_BASE_URL") {
            self.met_base_url = url;
        }
        if let Some(url) = get("ARTWORKS_SMITHSONIAN_BASE_URL") {
            self.smithsonian_base_url = url;
        }
        if let Some(key) = get("ARTWORKS_SMITHSONIAN_API_KEY") {
            self.smithsonian_api_key = Some(key);
        }
        if let Some(v) = get("ARTWORKS_MAX_CONCURRENT") {
            self.max_concurrent = parse_number("ARTWORKS_MAX_CONCURRENT", &v)?;
        }
        if let Some(v) = get("ARTWORKS_PAGE_SIZE") {
            self.page_size = parse_number("ARTWORKS_PAGE_SIZE", &v)?;
        }
        if let Some(v) = get("ARTWORKS_REQUEST_TIMEOUT_SECS") {
            self.request_timeout =
                Duration::from_secs(parse_number("ARTWORKS_REQUEST_TIMEOUT_SECS", &v)?);
        }
        if let Some(dir) = get("ARTWORKS_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent == 0 {
            return Err(ConfigError::Config(
                "max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Config(
                "page_size must be at least 1".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn gallery_limits(&self) -> GalleryLimits {
        GalleryLimits {
            page_size: self.page_size,
            max_items: self.max_items,
            search_limit: self.search_limit,
            highlight_count: self.highlight_count,
            max_concurrent: self.max_concurrent,
        }
    }
}

impl From<ConfigYaml> for Config {
    fn from(yaml: ConfigYaml) -> Self {
        let defaults = Config::default();
        Self {
            met_base_url: yaml.met_base_url.unwrap_or(defaults.met_base_url),
            smithsonian_base_url: yaml
                .smithsonian_base_url
                .unwrap_or(defaults.smithsonian_base_url),
            smithsonian_api_key: yaml.smithsonian_api_key.filter(|k| !k.is_empty()),
            max_concurrent: yaml.max_concurrent.unwrap_or(defaults.max_concurrent),
            page_size: yaml.page_size.unwrap_or(defaults.page_size),
            max_items: yaml.max_items.unwrap_or(defaults.max_items),
            search_limit: yaml.search_limit.unwrap_or(defaults.search_limit),
            highlight_count: yaml.highlight_count.unwrap_or(defaults.highlight_count),
            request_timeout: yaml
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            data_dir: yaml.data_dir.unwrap_or(defaults.data_dir),
        }
    }
}
