// Configuration loading and parsing (server.toml).

use serde::Deserialize;
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

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
    pub listen: SocketAddr,
    pub db_path: String,
    pub catalog: CatalogSettings,
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    /// Catalog file, resolved against the directory the config was loaded from.
    pub path: PathBuf,
    /// How many clothing types the overview request returns.
    pub overview_clothing_types: usize,
    pub seed_on_startup: bool,
}

// ---------------------------------------------------------------------------
// server.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire server.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ServerFile {
    server: ServerSection,
    database: DatabaseSection,
    #[serde(default)]
    catalog: CatalogSection,
}

#[derive(Debug, Clone, Deserialize)]
struct ServerSection {
    listen: String,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct CatalogSection {
    path: String,
    overview_clothing_types: usize,
    seed_on_startup: bool,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            path: "config/catalog.toml".to_string(),
            overview_clothing_types: 6,
            seed_on_startup: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/server.toml` relative to
/// `base_dir`.
///
/// This does not copy defaults; `load_config()` does that first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let server_path = base_dir.join("config").join("server.toml");
    let text = read_file(&server_path)?;
    let file: ServerFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: server_path.clone(),
        source: e,
    })?;

    let listen: SocketAddr =
        file.server
            .listen
            .parse()
            .map_err(|e| ConfigError::ValidationError {
                field: "server.listen".into(),
                message: format!("`{}` is not a socket address: {e}", file.server.listen),
            })?;

    let catalog_path = PathBuf::from(&file.catalog.path);
    let catalog_path = if catalog_path.is_relative() {
        base_dir.join(catalog_path)
    } else {
        catalog_path
    };

    let config = Config {
        listen,
        db_path: file.database.path,
        catalog: CatalogSettings {
            path: catalog_path,
            overview_clothing_types: file.catalog.overview_clothing_types,
            seed_on_startup: file.catalog.seed_on_startup,
        },
    };

    validate(&config)?;

    Ok(config)
}

/// Copy every file in `defaults/` that `config/` is missing. Existing config
/// files are never touched and `*.example` files are skipped. Returns the
/// copied targets, sorted.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if config_dir.exists() {
            return Ok(vec![]);
        }
        return Err(copy_error(format!(
            "neither defaults/ nor config/ directory found in {}; \
             run from the project root or ensure defaults/ is present",
            base_dir.display()
        )));
    }

    std::fs::create_dir_all(&config_dir)
        .map_err(|e| copy_error(format!("failed to create config directory: {e}")))?;

    let mut copied = Vec::new();
    for source in default_files(&defaults_dir)? {
        let Some(file_name) = source.file_name() else {
            continue;
        };
        let target = config_dir.join(file_name);
        if copy_default(&source, &target)? {
            copied.push(target);
        }
    }

    copied.sort();
    Ok(copied)
}

/// Regular files in `defaults/`, minus `*.example` samples.
fn default_files(defaults_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let entries = std::fs::read_dir(defaults_dir)
        .map_err(|e| copy_error(format!("failed to read defaults directory: {e}")))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| copy_error(format!("failed to read defaults entry: {e}")))?
            .path();
        let is_sample = path
            .extension()
            .is_some_and(|ext| ext == "example");
        if path.is_file() && !is_sample {
            files.push(path);
        }
    }
    Ok(files)
}

/// Copy `source` to `target` unless `target` already exists. The source is
/// read in full before the target is created, so a failed read leaves no
/// empty config file behind. Returns whether a copy happened.
fn copy_default(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    if target.exists() {
        return Ok(false);
    }
    let content = std::fs::read(source)
        .map_err(|e| copy_error(format!("failed to read {}: {e}", source.display())))?;

    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
    {
        Ok(dest) => dest,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => {
            return Err(copy_error(format!(
                "failed to create {}: {e}",
                target.display()
            )))
        }
    };

    if let Err(e) = dest.write_all(&content) {
        drop(dest);
        let _ = std::fs::remove_file(target);
        return Err(copy_error(format!(
            "failed to write {}: {e}",
            target.display()
        )));
    }
    Ok(true)
}

fn copy_error(message: String) -> ConfigError {
    ConfigError::DefaultsCopyError { message }
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.db_path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    if config.catalog.overview_clothing_types == 0 {
        return Err(ConfigError::ValidationError {
            field: "catalog.overview_clothing_types".into(),
            message: "must be greater than 0".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
