use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use common::{ExtensionSet, DEFAULT_EXTENSIONS};
use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: u32 = 1;
pub const CONFIG_FILE_NAME: &str = "rockbox.yaml";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundlerConfig {
    pub version: u32,
    pub extensions: Vec<String>,
    pub include_genre: bool,
    pub move_albums: bool,
    pub move_playlists: bool,
    pub recursive_export: bool,
    pub log_level: String,
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            include_genre: false,
            move_albums: false,
            move_playlists: false,
            recursive_export: false,
            log_level: "info".to_string(),
        }
    }
}

impl BundlerConfig {
    pub fn extension_set(&self) -> ExtensionSet {
        ExtensionSet::new(&self.extensions)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "io error: {}", err),
            ConfigError::Yaml(err) => write!(f, "yaml error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Yaml(err)
    }
}

pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    match explicit {
        Some(path) if !path.as_os_str().is_empty() => path,
        _ => default_config_path(),
    }
}

fn default_config_path() -> PathBuf {
    match env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME)),
        Err(_) => PathBuf::from(CONFIG_FILE_NAME),
    }
}

/// Reads the config at `path`. A missing file is not an error; the defaults
/// are returned with `false`.
pub fn load_config(path: &Path) -> Result<(BundlerConfig, bool), ConfigError> {
    if !path.exists() {
        return Ok((BundlerConfig::default(), false));
    }
    let contents = fs::read_to_string(path)?;
    let mut config: BundlerConfig = serde_yaml::from_str(&contents)?;
    if config.version < CONFIG_VERSION {
        config.version = CONFIG_VERSION;
    }
    if config.log_level.trim().is_empty() {
        config.log_level = "info".to_string();
    }
    Ok((config, true))
}

pub fn save_config(path: &Path, config: &BundlerConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    fs::write(path, contents)?;
    Ok(())
}
