use abacus_calculator::DuplicatePolicy;
use abacus_calculator::built_in::DEFAULT_LARGE_AMOUNT_LIMIT;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_PATH_VAR: &str = "ABACUS_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "abacus.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration {path}: {message}")]
    Invalid { path: PathBuf, message: String },
    #[error("invalid value '{value}' for {var}: {message}")]
    InvalidOverride { var: &'static str, value: String, message: String },
}

impl ConfigError {
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io",
            Self::Parse { .. } => "parse",
            Self::Invalid { .. } => "invalid",
            Self::InvalidOverride { .. } => "override",
        }
    }

    /// Configuration problems need an operator to fix the file or environment.
    pub fn is_recoverable(&self) -> bool {
        false
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Environment {
    #[serde(default = "default_env_type")]
    pub env_type: String,
}

impl Default for Environment {
    fn default() -> Self {
        Self { env_type: default_env_type() }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// `EnvFilter` directives. `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_log_filter(), json: false }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RegistryConfig {
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
    #[serde(default = "default_true")]
    pub include_builtins: bool,
    #[serde(default)]
    pub catalogs: Vec<PathBuf>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::default(),
            include_builtins: true,
            catalogs: Vec::new(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct WarningsConfig {
    #[serde(default = "default_large_amount_limit")]
    pub large_amount_limit: f64,
}

impl Default for WarningsConfig {
    fn default() -> Self {
        Self { large_amount_limit: default_large_amount_limit() }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AbacusConfig {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub warnings: WarningsConfig,
}

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// No file at `attempted`; built-in defaults are in effect.
    Defaults { attempted: PathBuf },
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AbacusConfig,
    pub source: ConfigSource,
}

impl AbacusConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Checks values that parse but cannot be used.
    pub fn validate(&self) -> Result<(), String> {
        if !is_positive_limit(self.warnings.large_amount_limit) {
            return Err(format!(
                "warnings.large_amount_limit must be a positive number, got {}",
                self.warnings.large_amount_limit
            ));
        }
        Ok(())
    }

    /// Loads from `path`, else `ABACUS_CONFIG_PATH`, else `abacus.toml`. A
    /// missing file yields the defaults; an unreadable or malformed one is an error.
    ///
    /// Logging is not initialized yet when this runs, so the caller reports
    /// the returned [`ConfigSource`].
    pub fn load(path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(|| {
            std::env::var_os(CONFIG_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
        });
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<LoadedConfig, ConfigError> {
        match fs::read_to_string(path) {
            Ok(source) => {
                let config = Self::from_toml_str(&source).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
                config.validate().map_err(|message| ConfigError::Invalid {
                    path: path.to_path_buf(),
                    message,
                })?;
                Ok(LoadedConfig { config, source: ConfigSource::File(path.to_path_buf()) })
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(LoadedConfig {
                config: Self::default(),
                source: ConfigSource::Defaults { attempted: path.to_path_buf() },
            }),
            Err(source) => Err(ConfigError::Io { path: path.to_path_buf(), source }),
        }
    }

    /// Applies `ABACUS_*` overrides from the process environment.
    pub fn apply_env_overrides(self) -> Result<Self, ConfigError> {
        self.apply_overrides_from(|var| std::env::var(var).ok())
    }

    /// Applies overrides read through `lookup`, so tests need not touch the
    /// process environment.
    pub fn apply_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(filter) = lookup("ABACUS_LOG") {
            self.logging.filter = filter;
        }
        if let Some(policy) = lookup("ABACUS_DUPLICATE_POLICY") {
            self.registry.duplicate_policy =
                policy.parse().map_err(|message| ConfigError::InvalidOverride {
                    var: "ABACUS_DUPLICATE_POLICY",
                    value: policy.clone(),
                    message,
                })?;
        }
        if let Some(catalogs) = lookup("ABACUS_CATALOGS") {
            self.registry.catalogs = std::env::split_paths(&catalogs)
                .filter(|path| !path.as_os_str().is_empty())
                .collect();
        }
        if let Some(limit) = lookup("ABACUS_LARGE_AMOUNT_LIMIT") {
            self.warnings.large_amount_limit = match limit.trim().parse::<f64>() {
                Ok(value) if is_positive_limit(value) => value,
                _ => {
                    return Err(ConfigError::InvalidOverride {
                        var: "ABACUS_LARGE_AMOUNT_LIMIT",
                        value: limit,
                        message: "expected a positive number".to_string(),
                    });
                }
            };
        }
        Ok(self)
    }
}

fn is_positive_limit(limit: f64) -> bool {
    limit.is_finite() && limit > 0.0
}

fn default_env_type() -> String {
    "default".to_string()
}

fn default_log_filter() -> String {
    "warn".to_string()
}

fn default_true() -> bool {
    true
}

fn default_large_amount_limit() -> f64 {
    DEFAULT_LARGE_AMOUNT_LIMIT
}
