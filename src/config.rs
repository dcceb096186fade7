use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tickerdash::prelude::{MaWindows, SourceKind};
use tickerdash::utils::MAX_TICKERS;

// YAML-serializable configuration structure
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ConfigYaml {
    pub node_name: Option<String>,
    pub environment: Option<String>,
    pub port: Option<u16>,
    pub data_source: Option<String>,
    pub data_dir: Option<String>,
    pub default_short_window: Option<usize>,
    pub default_long_window: Option<usize>,
    pub default_lookback_days: Option<i64>,
    pub max_tickers: Option<usize>,
    pub cache_ttl_secs: Option<u64>,
}

// Holds application-wide settings
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub node_name: String,
    pub environment: String,
    pub port: u16,
    pub source: SourceKind,
    pub data_dir: PathBuf,
    pub windows: MaWindows,
    pub default_lookback_days: i64,
    pub max_tickers: usize,
    /// Zero disables memoization
    pub cache_ttl: Duration,
}

impl AppConfig {
    // Load configuration from YAML file or environment variables
    pub fn load() -> anyhow::Result<Self> {
        // Check for CONFIG_FILE environment variable first
        if let Ok(config_file) = env::var("CONFIG_FILE") {
            Self::from_yaml(&config_file)
        } else {
            Self::from_env()
        }
    }

    pub fn from_yaml(file_path: &str) -> anyhow::Result<Self> {
        let yaml_content = fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read config file {}", file_path))?;
        Self::from_yaml_str(&yaml_content)
    }

    pub fn from_yaml_str(yaml_content: &str) -> anyhow::Result<Self> {
        let yaml_config: ConfigYaml =
            serde_yaml::from_str(yaml_content).context("Failed to parse YAML config")?;
        Self::from_parts(yaml_config)
    }

    // Load all configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build from a variable lookup, so tests need not touch the process environment.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        fn parsed<T: std::str::FromStr>(
            get: &impl Fn(&str) -> Option<String>,
            key: &str,
        ) -> anyhow::Result<Option<T>>
        where
            T::Err: std::fmt::Display,
        {
            match get(key) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map(Some)
                    .map_err(|e| anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e)),
                None => Ok(None),
            }
        }

        Self::from_parts(ConfigYaml {
            node_name: get("NODE_NAME"),
            environment: get("ENVIRONMENT"),
            port: parsed(&get, "PORT")?,
            data_source: get("DATA_SOURCE"),
            data_dir: get("DATA_DIR"),
            default_short_window: parsed(&get, "DEFAULT_SHORT_WINDOW")?,
            default_long_window: parsed(&get, "DEFAULT_LONG_WINDOW")?,
            default_lookback_days: parsed(&get, "DEFAULT_LOOKBACK_DAYS")?,
            max_tickers: parsed(&get, "MAX_TICKERS")?,
            cache_ttl_secs: parsed(&get, "CACHE_TTL_SECS")?,
        })
    }

    fn from_parts(raw: ConfigYaml) -> anyhow::Result<Self> {
        let source = match raw.data_source.as_deref() {
            Some(name) => name.parse::<SourceKind>().map_err(anyhow::Error::msg)?,
            None => SourceKind::Yahoo,
        };

        let windows = MaWindows::new(
            raw.default_short_window.unwrap_or(MaWindows::DEFAULT_SHORT),
            raw.default_long_window.unwrap_or(MaWindows::DEFAULT_LONG),
        )
        .context("Invalid default moving average windows")?;

        let default_lookback_days = raw.default_lookback_days.unwrap_or(365); // Default to one year
        if default_lookback_days <= 0 {
            anyhow::bail!("default_lookback_days must be positive, got {}", default_lookback_days);
        }

        let max_tickers = raw.max_tickers.unwrap_or(MAX_TICKERS);
        if max_tickers == 0 {
            anyhow::bail!("max_tickers must be at least 1");
        }

        Ok(Self {
            node_name: raw.node_name.unwrap_or_else(|| "tickerdash".to_string()),
            environment: raw.environment.unwrap_or_else(|| "development".to_string()),
            port: raw.port.unwrap_or(8888), // Default to 8888
            source,
            data_dir: PathBuf::from(raw.data_dir.unwrap_or_else(|| "data".to_string())),
            windows,
            default_lookback_days,
            max_tickers,
            cache_ttl: Duration::from_secs(raw.cache_ttl_secs.unwrap_or(1800)), // Default to 30 minutes
        })
    }
}
