//! Configuration for the engine's data directory.
//!
//! Sources (highest priority first):
//! 1. Environment variable (INKPRESS_HOME)
//! 2. Config file (.inkpress/config.yaml)
//! 3. Default (~/.inkpress)
//!
//! Config file discovery:
//! - Searches current directory and parents for .inkpress/config.yaml
//! - Paths in the config file are relative to the config file's parent
//!   directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<std::result::Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Data directory (relative to the config file's parent)
    pub home: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Data directory holding the store snapshot
    pub home: PathBuf,

    /// Path to the config file (if one was found)
    pub config_file: Option<PathBuf>,
}

/// Find the config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let candidate = current.join(".inkpress").join("config.yaml");
        if candidate.exists() {
            return Some(candidate);
        }

        if !current.pop() {
            return None;
        }
    }
}

fn resolve() -> Result<ResolvedConfig> {
    if let Ok(home) = std::env::var("INKPRESS_HOME") {
        return Ok(ResolvedConfig {
            home: PathBuf::from(home),
            config_file: None,
        });
    }

    if let Some(config_path) = find_config_file() {
        let raw = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
        let file: ConfigFile = serde_yaml::from_str(&raw)
            .with_context(|| format!("Failed to parse config: {}", config_path.display()))?;

        // paths resolve against the directory holding .inkpress/
        let base = config_path
            .parent()
            .and_then(Path::parent)
            .unwrap_or_else(|| Path::new("."));
        let home = match file.paths.home {
            Some(relative) => base.join(relative),
            None => config_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .to_path_buf(),
        };

        return Ok(ResolvedConfig {
            home,
            config_file: Some(config_path),
        });
    }

    let home_dir = dirs::home_dir().context("Failed to determine home directory")?;
    Ok(ResolvedConfig {
        home: home_dir.join(".inkpress"),
        config_file: None,
    })
}

/// Resolved configuration, computed once per process
pub fn config() -> Result<&'static ResolvedConfig> {
    let cached = CONFIG.get_or_init(|| resolve().map_err(|e| format!("{:#}", e)));
    match cached {
        Ok(config) => Ok(config),
        Err(message) => Err(anyhow::anyhow!("{}", message)),
    }
}

/// Data directory for engine state
pub fn data_dir() -> Result<PathBuf> {
    Ok(config()?.home.clone())
}

/// Path of the JSON store snapshot
pub fn snapshot_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("store.json"))
}
