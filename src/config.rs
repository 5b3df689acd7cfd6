// ⚙️ Configuration - optional TOML file, defaults otherwise

use crate::error::{DashboardError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_CONFIG_FILE: &str = "dashboard.toml";

/// Largest TTL a chrono duration can hold in whole seconds
const MAX_CACHE_TTL_SECS: u64 = (i64::MAX / 1000) as u64;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the three metric CSV files
    pub data_dir: PathBuf,
    pub files: MetricFiles,
    /// Lifetime of the memoized merged table
    pub cache_ttl_secs: u64,
    /// Countries selected when the dashboard opens
    pub default_countries: Vec<String>,
    /// Largest bubble size, in chart units
    pub size_max: f64,
    /// Year advance interval while playing
    pub play_interval_ms: u64,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MetricFiles {
    pub lex: String,
    pub gni_per_capita: String,
    pub population: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("."),
            files: MetricFiles::default(),
            cache_ttl_secs: 3600,
            default_countries: vec![
                "Germany".to_string(),
                "USA".to_string(),
                "Vietnam".to_string(),
            ],
            size_max: 60.0,
            play_interval_ms: 500,
            server: ServerConfig::default(),
        }
    }
}

impl Default for MetricFiles {
    fn default() -> Self {
        MetricFiles {
            lex: "lex.csv".to_string(),
            gni_per_capita: "ny_gnp_pcap_pp_cd.csv".to_string(),
            population: "pop.csv".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Config {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DashboardError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.cache_ttl_secs == 0 {
            return Err(DashboardError::Config(
                "cache_ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.cache_ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(DashboardError::Config(format!(
                "cache_ttl_secs must be at most {}",
                MAX_CACHE_TTL_SECS
            )));
        }
        if !(self.size_max > 0.0) {
            return Err(DashboardError::Config(
                "size_max must be a positive number".to_string(),
            ));
        }
        Ok(())
    }

    /// Full paths of the metric files, in join order (lex, gni, population)
    pub fn metric_paths(&self) -> [PathBuf; 3] {
        [
            self.data_dir.join(&self.files.lex),
            self.data_dir.join(&self.files.gni_per_capita),
            self.data_dir.join(&self.files.population),
        ]
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cache_ttl_secs.min(MAX_CACHE_TTL_SECS) as i64)
    }
}
