//! Loading a [`CorralConfig`] from files and the environment

use super::logging_config::{LogFormat, LoggingConfig};
use super::pool_config::PoolConfig;
use super::supervisor_config::SupervisorConfig;
use crate::error::{CorralError, CorralResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Environment variable overriding the handler watchdog (humantime format)
pub const ENV_WATCHDOG: &str = "CORRAL_WATCHDOG";
/// Environment variable overriding the log level directive
pub const ENV_LOG_LEVEL: &str = "CORRAL_LOG_LEVEL";
/// Environment variable overriding the log format
pub const ENV_LOG_FORMAT: &str = "CORRAL_LOG_FORMAT";

/// Top-level configuration: supervisor, logging and named pools
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorralConfig {
    pub supervisor: SupervisorConfig,
    pub logging: LoggingConfig,
    /// Pool configurations keyed by pool name
    pub pools: BTreeMap<String, PoolConfig>,
}

impl CorralConfig {
    /// Configuration for the named pool, or defaults if it is not listed
    pub fn pool(&self, name: &str) -> PoolConfig {
        self.pools.get(name).cloned().unwrap_or_default()
    }

    /// Validate every pool entry
    pub fn validate(&self) -> CorralResult<()> {
        for (name, pool) in &self.pools {
            pool.validate().map_err(|e| {
                CorralError::config_with_context(e.to_string(), format!("pool '{}'", name))
            })?;
        }
        Ok(())
    }

    /// Override fields from `CORRAL_*` environment variables
    pub fn apply_env(&mut self) -> CorralResult<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> CorralResult<()> {
        if let Some(watchdog) = var(ENV_WATCHDOG) {
            self.supervisor.watchdog = humantime_serde::re::humantime::parse_duration(&watchdog)
                .map_err(|e| {
                    CorralError::config_with_context(
                        format!("Invalid {} value '{}': {}", ENV_WATCHDOG, watchdog, e),
                        "Reading configuration from environment",
                    )
                })?;
        }

        if let Some(level) = var(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }

        if let Some(format) = var(ENV_LOG_FORMAT) {
            self.logging.format = format.parse::<LogFormat>().map_err(|e| {
                CorralError::config_with_context(e, "Reading configuration from environment")
            })?;
        }

        Ok(())
    }
}

/// Load configuration from a file
///
/// Supports JSON, TOML, and YAML formats based on file extension.
/// Returns default config if the file doesn't exist.
pub fn load_from_file(path: &Path) -> CorralResult<CorralConfig> {
    if !path.exists() {
        tracing::debug!("Config file {} not found, using defaults", path.display());
        return Ok(CorralConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        CorralError::io_with_path(
            format!("Failed to read config file: {}", e),
            path.display().to_string(),
        )
    })?;

    let config: CorralConfig = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|e| {
            CorralError::config_with_context(
                format!("Failed to parse TOML config: {}", e),
                format!("Deserializing TOML configuration from '{}'", path.display()),
            )
        })?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| {
            CorralError::config_with_context(
                format!("Failed to parse YAML config: {}", e),
                format!("Deserializing YAML configuration from '{}'", path.display()),
            )
        })?,
        _ => serde_json::from_str(&content).map_err(|e| {
            CorralError::config_with_context(
                format!("Failed to parse JSON config: {}", e),
                format!("Deserializing JSON configuration from '{}'", path.display()),
            )
        })?,
    };

    config.validate()?;
    tracing::debug!(pools = config.pools.len(), "Loaded config from {}", path.display());
    Ok(config)
}

/// Load a file and then apply environment overrides
pub fn load(path: &Path) -> CorralResult<CorralConfig> {
    let mut config = load_from_file(path)?;
    config.apply_env()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RestartPolicy;
    use std::collections::HashMap;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_from_file(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, CorralConfig::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("corral.toml");
        fs::write(
            &config_path,
            r#"
[supervisor]
watchdog = "2s"

[logging]
level = "debug"
format = "json"

[pools.ingest]
concurrency = 4
timeout = "30s"

[pools.ingest.restart]
mode = "always"
"#,
        )
        .unwrap();

        let config = load_from_file(&config_path).unwrap();
        assert_eq!(config.supervisor.watchdog, Duration::from_secs(2));
        assert_eq!(config.logging.format, LogFormat::Json);

        let ingest = config.pool("ingest");
        assert_eq!(ingest.concurrency, 4);
        assert_eq!(ingest.timeout, Some(Duration::from_secs(30)));
        assert_eq!(ingest.restart, RestartPolicy::forever());

        assert_eq!(config.pool("unknown"), PoolConfig::default());
    }

    #[test]
    fn test_load_from_yaml_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("corral.yaml");
        fs::write(
            &config_path,
            "pools:\n  export:\n    concurrency: 2\n    bound_mode: abort\n",
        )
        .unwrap();

        let config = load_from_file(&config_path).unwrap();
        assert_eq!(config.pool("export").concurrency, 2);
    }

    #[test]
    fn test_invalid_pool_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("corral.json");
        fs::write(&config_path, r#"{"pools": {"broken": {"concurrency": 0}}}"#).unwrap();

        let error = load_from_file(&config_path).unwrap_err();
        assert_eq!(error.context(), Some("pool 'broken'"));
    }

    #[test]
    fn test_malformed_file_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("corral.toml");
        fs::write(&config_path, "supervisor = [").unwrap();

        assert!(matches!(
            load_from_file(&config_path),
            Err(CorralError::Config { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_WATCHDOG, "1500ms"),
            (ENV_LOG_LEVEL, "corral_core=trace"),
            (ENV_LOG_FORMAT, "compact"),
        ]);

        let mut config = CorralConfig::default();
        config
            .apply_vars(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.supervisor.watchdog, Duration::from_millis(1500));
        assert_eq!(config.logging.level, "corral_core=trace");
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_env_bad_watchdog() {
        let mut config = CorralConfig::default();
        let result = config.apply_vars(|key| (key == ENV_WATCHDOG).then(|| "soon".to_string()));
        assert!(result.is_err());
    }
}
