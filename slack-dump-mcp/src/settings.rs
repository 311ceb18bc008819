use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, File};
use log::debug;
use serde::Deserialize;

use crate::cli::Args;

const DEFAULT_SLACKDUMP_BIN: &str = "slackdump";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    pub slackdump_bin: Option<String>,
    pub temp_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

/// Resolved runtime configuration handed to the dump pipeline.
#[derive(Debug, Clone)]
pub struct DumpConfig {
    pub slackdump_bin: String,
    pub temp_dir: PathBuf,
    pub timeout: Option<Duration>,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            slackdump_bin: DEFAULT_SLACKDUMP_BIN.to_string(),
            temp_dir: env::temp_dir(),
            timeout: None,
        }
    }
}

const CONFIG_FILE_NAME: &str = env!("CARGO_PKG_NAME");

// Function to get the XDG_CONFIG_HOME path
fn get_xdg_config_path() -> Option<PathBuf> {
    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config));
    }

    if let Ok(home) = env::var("HOME") {
        return Some(PathBuf::from(home).join(".config"));
    }

    None
}

pub fn load_settings() -> anyhow::Result<Settings> {
    match get_xdg_config_path() {
        Some(xdg_config) => {
            load_settings_from(&xdg_config.join(CONFIG_FILE_NAME).join("config.toml"))
        }
        None => Ok(Settings::default()),
    }
}

pub fn load_settings_from(config_path: &Path) -> anyhow::Result<Settings> {
    if !config_path.exists() {
        return Ok(Settings::default());
    }

    Config::builder()
        .add_source(File::from(config_path.to_path_buf()).required(false))
        .build()?
        .try_deserialize()
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to deserialize config file {}: {}",
                config_path.display(),
                e
            )
        })
}

/// CLI and environment values win over the config file, which wins over defaults.
pub fn merge_settings_with_args(args: &Args, settings: Settings) -> DumpConfig {
    let defaults = DumpConfig::default();

    let config = DumpConfig {
        slackdump_bin: args
            .slackdump_bin
            .clone()
            .filter(|bin| !bin.is_empty())
            .or(settings.slackdump_bin.filter(|bin| !bin.is_empty()))
            .unwrap_or(defaults.slackdump_bin),
        temp_dir: args
            .temp_dir
            .clone()
            .or(settings.temp_dir)
            .unwrap_or(defaults.temp_dir),
        timeout: args
            .timeout_secs
            .or(settings.timeout_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs),
    };

    debug!("merged config: {:?}", config);

    config
}
