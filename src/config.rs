use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::traversal::TraversalSettings;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub traversal: TraversalConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// File the values were read from; None when running on defaults.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Relation API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Predicate used for neighbor lookups and "everything" queries.
    #[serde(default = "default_predicate")]
    pub default_predicate: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            default_predicate: default_predicate(),
        }
    }
}

/// Neighborhood traversal configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TraversalConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_node_delay_ms")]
    pub node_delay_ms: u64,
    #[serde(default = "default_direction_delay_ms")]
    pub direction_delay_ms: u64,
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: usize,
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: PathBuf,
    #[serde(default = "default_checkpoint_ttl_hours")]
    pub checkpoint_ttl_hours: i64,
    #[serde(default = "default_prune_max_passes")]
    pub prune_max_passes: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            node_delay_ms: default_node_delay_ms(),
            direction_delay_ms: default_direction_delay_ms(),
            checkpoint_interval: default_checkpoint_interval(),
            checkpoint_path: default_checkpoint_path(),
            checkpoint_ttl_hours: default_checkpoint_ttl_hours(),
            prune_max_passes: default_prune_max_passes(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_base_url() -> String {
    "https://medikanren.metareflective.app/query".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_predicate() -> String {
    "biolink:related_to".to_string()
}

fn default_max_depth() -> usize {
    2
}

fn default_node_delay_ms() -> u64 {
    1000
}

fn default_direction_delay_ms() -> u64 {
    500
}

fn default_checkpoint_interval() -> usize {
    10
}

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from("graph_traversal_checkpoint.json")
}

fn default_checkpoint_ttl_hours() -> i64 {
    24
}

/// Upper bound for `traversal.checkpoint_ttl_hours` (one year).
pub const MAX_CHECKPOINT_TTL_HOURS: i64 = 24 * 365;

fn default_prune_max_passes() -> usize {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in RELGRAPH_CONFIG environment variable
    /// 2. ./config.toml in current directory
    ///
    /// Falls back to built-in defaults when neither is present; `source`
    /// records which case applied. Nothing is logged here because the logger
    /// is configured from the result.
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        let path = match std::env::var("RELGRAPH_CONFIG") {
            Ok(path) => Some(PathBuf::from(path)),
            Err(_) => Some(PathBuf::from("config.toml")).filter(|p| p.exists()),
        };
        let config = match path {
            Some(path) => {
                let mut config = Self::from_file(&path)?;
                config.source = Some(path);
                config
            }
            None => Config::default(),
        };

        config.validate()?;

        Ok(config)
    }

    /// Parse a TOML config file without validating it
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            anyhow::bail!("api.base_url must not be empty");
        }

        url::Url::parse(&self.api.base_url)
            .with_context(|| format!("api.base_url is not a valid URL: {}", self.api.base_url))?;

        if self.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be greater than 0");
        }

        if self.api.default_predicate.trim().is_empty() {
            anyhow::bail!("api.default_predicate must not be empty");
        }

        if self.traversal.max_depth == 0 {
            anyhow::bail!("traversal.max_depth must be greater than 0");
        }

        if self.traversal.checkpoint_interval == 0 {
            anyhow::bail!("traversal.checkpoint_interval must be greater than 0");
        }

        if self.traversal.checkpoint_ttl_hours <= 0
            || self.traversal.checkpoint_ttl_hours > MAX_CHECKPOINT_TTL_HOURS
        {
            anyhow::bail!(
                "traversal.checkpoint_ttl_hours must be between 1 and {}",
                MAX_CHECKPOINT_TTL_HOURS
            );
        }

        Ok(())
    }

    /// Request timeout for the relation API
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Traversal tuning derived from `[api]` and `[traversal]`
    pub fn traversal_settings(&self) -> TraversalSettings {
        TraversalSettings {
            predicate: self.api.default_predicate.clone(),
            node_delay: Duration::from_millis(self.traversal.node_delay_ms),
            direction_delay: Duration::from_millis(self.traversal.direction_delay_ms),
            checkpoint_interval: self.traversal.checkpoint_interval,
        }
    }
}
