use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use directories::ProjectDirs;
use anyhow::{Context, Result};
use std::fs;

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub browse: BrowseConfig,
    #[serde(default)]
    pub session: BTreeMap<String, String>,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub menu: MenuConfig,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_picker")]
    pub picker: String,
    #[serde(default = "default_opener")]
    pub opener: String,
    /// 0 keeps everything.
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

fn default_picker() -> String { "dmenu -i".to_string() }
fn default_opener() -> String { "xdg-open".to_string() }
fn default_history_size() -> usize { 50 }

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            picker: default_picker(),
            opener: default_opener(),
            history_size: default_history_size(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct BrowseConfig {
    #[serde(default)]
    pub folders: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CommandsConfig {
    #[serde(default)]
    pub executables: Vec<String>,
    #[serde(default)]
    pub executable_dirs: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct HistoryConfig {
    pub file: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String { "warn".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), file: None }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct MenuConfig {
    /// Replaces the XDG application directories when set.
    pub dirs: Option<Vec<String>>,
}

pub fn default_config_path() -> PathBuf {
    match ProjectDirs::from("org", "menudo", "menudo") {
        Some(dirs) => dirs.config_dir().join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

/// Read the config at `path`, or the default location. A missing file means defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);

    if !config_path.exists() {
        if path.is_some() {
            anyhow::bail!("config file {:?} does not exist", config_path);
        }
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("reading {:?}", config_path))?;
    parse_config(&content).with_context(|| format!("parsing {:?}", config_path))
}

pub fn parse_config(content: &str) -> Result<Config> {
    Ok(toml::from_str(content)?)
}
