use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::constants;
use crate::models::tender::TenderQuery;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub upstream: UpstreamConfig,

    pub cache: CacheConfig,

    pub query: QueryConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Silences reqwest/hyper connection noise when the scraper is down.
    pub suppress_connection_errors: bool,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            suppress_connection_errors: false,
            worker_threads: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,

    pub port: u16,

    /// `"*"` allows any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: constants::DEFAULT_PORT,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the scraping service; `/scrape` is appended.
    pub base_url: String,

    /// Upper bound for a single scrape call (default: 30)
    pub request_timeout_seconds: u64,

    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: constants::DEFAULT_UPSTREAM_URL.to_string(),
            request_timeout_seconds: constants::upstream::DEFAULT_TIMEOUT_SECONDS,
            user_agent: constants::upstream::USER_AGENT.to_string(),
        }
    }
}

impl UpstreamConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: constants::cache::DEFAULT_TTL_SECONDS,
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub keywords: Vec<String>,

    pub max_results: u32,

    pub strict_mode: bool,

    pub loose_phrases: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            keywords: constants::DEFAULT_KEYWORDS
                .iter()
                .map(ToString::to_string)
                .collect(),
            max_results: constants::limits::DEFAULT_MAX_RESULTS,
            strict_mode: true,
            loose_phrases: false,
        }
    }
}

impl QueryConfig {
    #[must_use]
    pub fn to_query(&self) -> TenderQuery {
        TenderQuery {
            keywords: self.keywords.clone(),
            max_results: self.max_results,
            strict_mode: self.strict_mode,
            loose_phrases: self.loose_phrases,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    /// Emit logs as JSON lines instead of the human-readable format.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            json_logs: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Loads `path` if given, otherwise the first config file on the search
    /// path, then applies environment overrides (including a `.env` file).
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => Self::load_file()?,
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Applies `PORT`, `UPSTREAM_URL`, `CACHE_TTL_SECONDS`,
    /// `UPSTREAM_TIMEOUT_SECONDS` and `LOG_LEVEL` on top of the file values.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Ignoring invalid PORT value: {}", port),
            }
        }

        if let Some(url) = lookup("UPSTREAM_URL") {
            self.upstream.base_url = url;
        }

        if let Some(ttl) = lookup("CACHE_TTL_SECONDS") {
            match ttl.parse() {
                Ok(ttl) => self.cache.ttl_seconds = ttl,
                Err(_) => warn!("Ignoring invalid CACHE_TTL_SECONDS value: {}", ttl),
            }
        }

        if let Some(timeout) = lookup("UPSTREAM_TIMEOUT_SECONDS") {
            match timeout.parse() {
                Ok(timeout) => self.upstream.request_timeout_seconds = timeout,
                Err(_) => warn!("Ignoring invalid UPSTREAM_TIMEOUT_SECONDS value: {}", timeout),
            }
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            self.general.log_level = level;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        if let Ok(explicit) = std::env::var("CYBER50_CONFIG") {
            paths.push(PathBuf::from(explicit));
        }

        paths.push(Self::default_config_path());

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("cyber50").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".cyber50").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.upstream.base_url)
            .with_context(|| format!("Invalid upstream URL: {}", self.upstream.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("Upstream URL must use http or https: {}", url);
        }

        if self.cache.ttl_seconds == 0 {
            anyhow::bail!("Cache TTL must be > 0");
        }

        if self.upstream.request_timeout_seconds == 0 {
            anyhow::bail!("Upstream request timeout must be > 0");
        }

        if self.query.keywords.is_empty() {
            anyhow::bail!("At least one search keyword is required");
        }

        if self.query.max_results == 0 {
            anyhow::bail!("max_results must be > 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.cache.ttl_seconds, 300);
        assert_eq!(config.upstream.base_url, "http://localhost:8000");
        assert_eq!(config.query.max_results, 50);
        assert!(config.query.strict_mode);
        assert!(!config.query.loose_phrases);
        assert!(config.query.keywords.iter().any(|k| k == "Firewall"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[upstream]"));
        assert!(toml_str.contains("[cache]"));
        assert!(toml_str.contains("[query]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [upstream]
            base_url = "http://scraper.internal:9000"

            [cache]
            ttl_seconds = 60
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.upstream.base_url, "http://scraper.internal:9000");
        assert_eq!(config.cache.ttl_seconds, 60);

        assert_eq!(config.server.port, 3001);
        assert!(!config.query.keywords.is_empty());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PORT", "8080"),
            ("UPSTREAM_URL", "http://10.0.0.5:8000"),
            ("CACHE_TTL_SECONDS", "not-a-number"),
            ("LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env_overrides(|key| env.get(key).map(ToString::to_string));

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.upstream.base_url, "http://10.0.0.5:8000");
        assert_eq!(config.cache.ttl_seconds, 300);
        assert_eq!(config.general.log_level, "debug");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.upstream.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cache.ttl_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.query.keywords.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir().join(format!("cyber50-config-{}.toml", uuid::Uuid::new_v4()));
        let mut config = Config::default();
        config.cache.ttl_seconds = 42;
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.cache.ttl_seconds, 42);
        assert_eq!(loaded.query.keywords, config.query.keywords);

        let _ = std::fs::remove_file(path);
    }
}
