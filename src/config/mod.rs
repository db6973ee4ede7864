use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_yml;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_PATHS: [&str; 2] = ["config/linky.yaml", "linky.yaml"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read the config on {0}")]
    NotFound(String),
    #[error("Unable to read config file {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("Unable to parse config file: {0}")]
    Parse(#[from] serde_yml::Error),
}

fn tic_port_default() -> String { return "/dev/ttyUSB0".to_string() }
fn tic_standard_mode_default() -> bool { return false }
fn tic_reconnect_delay_default() -> u64 { return 5 }
fn tic_report_interval_default() -> u64 { return 60 }

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct TicConfig {
    #[serde(default="tic_port_default")]
    pub port: String,
    #[serde(default="tic_standard_mode_default")]
    pub standard_mode: bool,
    #[serde(default="tic_reconnect_delay_default")]
    pub reconnect_delay: u64,   // Seconds between two connection attempts
    #[serde(default="tic_report_interval_default")]
    pub report_interval: u64,   // Seconds between two value reports
}

fn tic_default() -> TicConfig {
    return TicConfig {
        port: tic_port_default(),
        standard_mode: tic_standard_mode_default(),
        reconnect_delay: tic_reconnect_delay_default(),
        report_interval: tic_report_interval_default(),
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    #[serde(default="tic_default")]
    pub tic: TicConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config { tic: tic_default() }
    }
}

pub struct ConfigHolder {
    pub config: Config,
    pub path: Option<PathBuf>,
}

impl ConfigHolder {
    /// Loads `$LINKY_CONFIG`, or the first of config/linky.yaml and linky.yaml
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("LINKY_CONFIG") {
            return Self::load_from(path);
        }

        for path in CONFIG_PATHS {
            if Path::new(path).exists() {
                return Self::load_from(path);
            }
        }

        Err(ConfigError::NotFound(CONFIG_PATHS.join(" or ")))
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Reading configuration from {}", path.display());

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::parse(&contents)?;

        info!("Configuration loaded from {}", path.display());
        Ok(ConfigHolder { config, path: Some(path.to_path_buf()) })
    }

    pub fn parse(contents: &str) -> Result<Config, ConfigError> {
        Ok(serde_yml::from_str(contents)?)
    }

    pub fn defaults() -> Self {
        ConfigHolder { config: Config::default(), path: None }
    }

    pub fn tic(&self) -> &TicConfig {
        &self.config.tic
    }
}
