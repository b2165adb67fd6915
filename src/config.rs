use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::validator::{DEFAULT_WORKERS, ValidationConfig};

/// Largest accepted worker pool width
pub const MAX_WORKERS: usize = 1024;

/// File names looked up in each search directory, in order
pub const CONFIG_FILE_NAMES: [&str; 4] = [
    "validate-json.toml",
    "validate-json.json",
    ".validate-json.toml",
    ".validate-json.json",
];

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),

    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub output: OutputConfig,
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of worker threads
    pub workers: usize,
    /// Per-call timeout in milliseconds
    pub timeout_ms: Option<u64>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct OutputConfig {
    /// Verbose output
    pub verbose: bool,
    /// Quiet mode (error kinds and locations only)
    pub quiet: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            timeout_ms: None,
        }
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: defaults -> file -> environment.
    /// `path` selects the file explicitly; otherwise standard locations are searched.
    pub async fn load_config(path: Option<&Path>) -> Result<Config> {
        Self::load_config_with(&SystemEnvProvider, path).await
    }

    /// Load configuration reading environment overrides from `env`
    pub async fn load_config_with(env: &impl EnvProvider, path: Option<&Path>) -> Result<Config> {
        Self::load_config_in(env, path, &Self::search_dirs()).await
    }

    /// Load configuration searching `search_dirs` in order when no explicit
    /// `path` is given
    pub async fn load_config_in(
        env: &impl EnvProvider,
        path: Option<&Path>,
        search_dirs: &[PathBuf],
    ) -> Result<Config> {
        let mut config = Config::default();

        if let Some(config_path) = path {
            let file_config = Self::load_from_file(config_path).await?;
            config = Self::merge_configs(config, file_config);
        } else if let Some(found_config) = Self::find_config_file_in(search_dirs).await? {
            config = Self::merge_configs(config, found_config);
        }

        config = Self::apply_environment_overrides_with(env, config)?;

        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => {
                let config: Config = toml::from_str(&content)?;
                Ok(config)
            }
            Some("json") => {
                let config: Config = serde_json::from_str(&content)?;
                Ok(config)
            }
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    let config: Config = serde_json::from_str(&content)?;
                    Ok(config)
                }
            }
        }
    }

    /// Standard lookup locations: the current directory, then the user
    /// config directory
    pub fn search_dirs() -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from(".")];
        if let Some(config_dir) = dirs::config_dir() {
            locations.push(config_dir.join("validate-json"));
        }
        locations
    }

    /// Find configuration file in standard locations
    pub async fn find_config_file() -> Result<Option<Config>> {
        Self::find_config_file_in(&Self::search_dirs()).await
    }

    /// Load the first known config file name found in `search_dirs`
    pub async fn find_config_file_in(search_dirs: &[PathBuf]) -> Result<Option<Config>> {
        for dir in search_dirs {
            for name in CONFIG_FILE_NAMES {
                let path = dir.join(name);
                if tokio::fs::try_exists(&path).await? {
                    return Ok(Some(Self::load_from_file(&path).await?));
                }
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(config: Config) -> Result<Config> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, config)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        // Engine settings
        if let Some(workers) = env.get("VALIDATE_JSON_WORKERS") {
            config.engine.workers = workers.parse().map_err(|_| {
                ConfigError::Environment(format!("Invalid VALIDATE_JSON_WORKERS value: {}", workers))
            })?;
        }

        if let Some(timeout) = env.get("VALIDATE_JSON_TIMEOUT_MS") {
            config.engine.timeout_ms = Some(timeout.parse().map_err(|_| {
                ConfigError::Environment(format!(
                    "Invalid VALIDATE_JSON_TIMEOUT_MS value: {}",
                    timeout
                ))
            })?);
        }

        // Output settings
        if let Some(verbose) = env.get("VALIDATE_JSON_VERBOSE") {
            config.output.verbose = verbose.parse().map_err(|_| {
                ConfigError::Environment(format!("Invalid VALIDATE_JSON_VERBOSE value: {}", verbose))
            })?;
        }

        if let Some(quiet) = env.get("VALIDATE_JSON_QUIET") {
            config.output.quiet = quiet.parse().map_err(|_| {
                ConfigError::Environment(format!("Invalid VALIDATE_JSON_QUIET value: {}", quiet))
            })?;
        }

        Ok(config)
    }

    /// Merge two configurations (second takes precedence for non-None values)
    pub fn merge_configs(mut base: Config, override_config: Config) -> Config {
        // Engine settings
        base.engine.workers = override_config.engine.workers;
        if override_config.engine.timeout_ms.is_some() {
            base.engine.timeout_ms = override_config.engine.timeout_ms;
        }

        // Output settings
        base.output.verbose = override_config.output.verbose;
        base.output.quiet = override_config.output.quiet;

        base
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if config.engine.workers == 0 {
            return Err(ConfigError::Validation(
                "Number of workers must be greater than 0".to_string(),
            ));
        }
        if config.engine.workers > MAX_WORKERS {
            return Err(ConfigError::Validation(format!(
                "Number of workers cannot exceed {}",
                MAX_WORKERS
            )));
        }

        if config.engine.timeout_ms == Some(0) {
            return Err(ConfigError::Validation(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the per-call timeout as a Duration
    pub fn get_timeout_duration(config: &Config) -> Option<Duration> {
        config.engine.timeout_ms.map(Duration::from_millis)
    }

    /// Engine settings derived from the configuration
    pub fn validation_config(config: &Config) -> ValidationConfig {
        ValidationConfig {
            workers: config.engine.workers,
            timeout: Self::get_timeout_duration(config),
        }
    }
}
