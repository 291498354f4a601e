use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use schemafs_introspect::{CaptureOptions, PoolSettings};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "schemafs.toml";
pub const DEFAULT_DUMP_ROOT: &str = "pg-schema-dump";
pub const DEFAULT_ENV: &str = "development";
pub const ENV_VAR: &str = "SCHEMAFS_ENV";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    Missing(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

/// Contents of `schemafs.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub skip_schemas: Option<Vec<String>>,
    pub skip_functions: Option<Vec<String>>,
    pub skip_extensions: Option<Vec<String>>,
    pub dump_root: Option<PathBuf>,
    pub max_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub log_format: Option<LogFormat>,
}

/// Values given on the command line; they win over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub skip_schemas: Vec<String>,
    pub skip_functions: Vec<String>,
    pub skip_extensions: Vec<String>,
    pub max_connections: Option<u32>,
    pub log_format: Option<LogFormat>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub capture: CaptureOptions,
    pub pool: PoolSettings,
    pub dump_root: PathBuf,
    pub environment: String,
    pub log_format: LogFormat,
}

/// Load the config file.
///
/// An explicit path must exist. Without one, `schemafs.toml` in the working
/// directory is used when present.
pub fn load_config(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let path = match explicit {
        Some(path) if !path.exists() => return Err(ConfigError::Missing(path.to_path_buf())),
        Some(path) => path.to_path_buf(),
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !path.exists() {
                return Ok(FileConfig::default());
            }
            path
        }
    };

    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
}

impl Settings {
    pub fn resolve(file: FileConfig, overrides: Overrides, environment: String) -> Self {
        let defaults = CaptureOptions::default();
        let capture = CaptureOptions {
            skip_schemas: pick_list(overrides.skip_schemas, file.skip_schemas, defaults.skip_schemas),
            skip_functions: pick_list(
                overrides.skip_functions,
                file.skip_functions,
                defaults.skip_functions,
            ),
            skip_extensions: pick_list(
                overrides.skip_extensions,
                file.skip_extensions,
                defaults.skip_extensions,
            ),
        };

        let mut pool = PoolSettings::default();
        if let Some(max) = overrides.max_connections.or(file.max_connections) {
            pool.max_connections = max;
        }
        if let Some(secs) = file.acquire_timeout_secs {
            pool.acquire_timeout = Duration::from_secs(secs);
        }

        Self {
            capture,
            pool,
            dump_root: file
                .dump_root
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DUMP_ROOT)),
            environment,
            log_format: overrides.log_format.or(file.log_format).unwrap_or_default(),
        }
    }

    /// `<dump_root>/<env>/<database>`.
    pub fn dump_dir(&self, database: &str) -> PathBuf {
        self.dump_root.join(&self.environment).join(database)
    }
}

/// Environment name from `SCHEMAFS_ENV`, falling back to `development`.
pub fn environment() -> String {
    environment_from(std::env::var(ENV_VAR).ok())
}

fn environment_from(value: Option<String>) -> String {
    value
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENV.to_string())
}

fn pick_list(cli: Vec<String>, file: Option<Vec<String>>, default: Vec<String>) -> Vec<String> {
    if !cli.is_empty() {
        return cli;
    }
    file.unwrap_or(default)
}
