//! CLI configuration, loaded from TOML.

use std::path::Path;

use anyhow::{Context, Result};
use bodyfuel_core::app::{AnalyzerConfig, ExecutorConfig, SchedulerConfig, SelectorConfig};
use serde::{Deserialize, Serialize};

fn default_log_level() -> String { "info".into() }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub selector: SelectorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            scheduler: SchedulerConfig::default(),
            executor: ExecutorConfig::default(),
            analyzer: AnalyzerConfig::default(),
            selector: SelectorConfig::default(),
        }
    }
}

impl AppConfig {
    /// Defaults when no path is given. A given path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let toml_str = r#"
            log_level = "debug"

            [scheduler]
            interval_secs = 5
            rng_seed = 42

            [analyzer]
            rest_window_secs = 60
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.scheduler.interval_secs, 5);
        assert_eq!(config.scheduler.rng_seed, Some(42));
        assert_eq!(config.scheduler.max_retry_send_notification, 5);
        assert_eq!(config.analyzer.rest_window_secs, 60);
        assert_eq!(config.analyzer.history_limit, 10);
        assert_eq!(config.executor, ExecutorConfig::default());
    }

    #[test]
    fn no_path_means_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.selector.count, 5);
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = AppConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"), "{err}");
    }
}
