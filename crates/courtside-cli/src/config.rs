// Configuration loading and parsing (courtside.toml).

use chrono::NaiveDate;
use courtside_core::{EngineError, OptimizationSettings};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// The one config file, read from `config/` and seeded from `defaults/`.
const CONFIG_FILE: &str = "courtside.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub slate: SlateConfig,
    pub optimizer: OptimizationSettings,
}

impl Config {
    /// The slate CSV path, resolved against `base_dir` when relative.
    pub fn pool_path(&self, base_dir: &Path) -> PathBuf {
        let path = Path::new(&self.slate.pool);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }
}

/// The `[slate]` table: which slate to optimize and where its pool lives.
#[derive(Debug, Clone, Deserialize)]
pub struct SlateConfig {
    pub id: String,
    /// Contest date, written as "YYYY-MM-DD".
    pub date: NaiveDate,
    /// Path of the player pool CSV, relative to the project root.
    pub pool: String,
}

/// Raw deserialization target for courtside.toml. The optimizer table is
/// kept untyped so per-mode defaults can be filled in before it is read.
#[derive(Debug, Clone, Deserialize)]
struct CourtsideFile {
    slate: SlateConfig,
    #[serde(default)]
    optimizer: toml::Table,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/courtside.toml` relative to
/// the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let file: CourtsideFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let optimizer = settings_from_table(&file.optimizer)?;
    let config = Config {
        slate: file.slate,
        optimizer,
    };

    validate(&config)?;

    Ok(config)
}

/// Build settings from an `[optimizer]` table: defaults for the table's
/// `mode` first, then every key the table sets.
pub fn settings_from_table(table: &toml::Table) -> Result<OptimizationSettings, ConfigError> {
    let value = serde_json::to_value(table).map_err(|e| invalid("optimizer", e))?;
    OptimizationSettings::from_value(value).map_err(|e| match e {
        EngineError::Validation { field, message } if field == "mode" => {
            ConfigError::ValidationError {
                field: "optimizer.mode".into(),
                message,
            }
        }
        EngineError::Validation { message, .. } => invalid("optimizer", message),
        other => invalid("optimizer", other),
    })
}

fn invalid(field: &str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: err.to_string(),
    }
}

/// Seed `config/courtside.toml` from `defaults/courtside.toml` on first run.
///
/// Returns the path written, or `None` when a config already exists. An
/// existing config is never overwritten.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.is_file() {
        return Ok(None);
    }
    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.is_file() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no config/{CONFIG_FILE} or defaults/{CONFIG_FILE} under {}",
                base_dir.display()
            ),
        });
    }

    let copy_err = |e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to write {}: {e}", target.display()),
    };
    std::fs::create_dir_all(base_dir.join("config")).map_err(copy_err)?;
    std::fs::copy(&source, &target).map_err(copy_err)?;
    info!("seeded {} from {}", target.display(), source.display());
    Ok(Some(target))
}

/// Load config relative to the current working directory, seeding it from
/// `defaults/` first if needed.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_file(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.slate.id.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "slate.id".into(),
            message: "must not be empty".into(),
        });
    }
    if config.slate.pool.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "slate.pool".into(),
            message: "must name the player pool CSV".into(),
        });
    }

    match config.optimizer.validate() {
        Ok(()) => Ok(()),
        Err(EngineError::Validation { field, message }) => Err(ConfigError::ValidationError {
            field: format!("optimizer.{field}"),
            message,
        }),
        Err(other) => Err(ConfigError::ValidationError {
            field: "optimizer".into(),
            message: other.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
