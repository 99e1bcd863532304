//! Configuration for the host binary.
//!
//! Values come from, in order of precedence:
//! 1. environment variables (`RUSTY_PAYLOAD_SHELL`, `RUSTY_PAYLOAD_LOG_DIR`)
//! 2. a JSON config file (explicit `--config`, or `~/.rusty-payload/config.json` when present)
//! 3. built-in defaults
//!
//! Values are taken as given; path validation happens before they get here.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::shell::LocalShellConfig;

pub const ENV_SHELL: &str = "RUSTY_PAYLOAD_SHELL";
pub const ENV_LOG_DIR: &str = "RUSTY_PAYLOAD_LOG_DIR";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub shell: LocalShellConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Directory receiving one log file per run.
    pub dir: PathBuf,
    /// Filter used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: home_dir().join(".rusty-payload").join("logs"),
            filter: "info".to_string(),
        }
    }
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_config_path() -> PathBuf {
    home_dir().join(".rusty-payload").join("config.json")
}

pub fn load(path: &Path) -> anyhow::Result<Config> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: Config = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid config JSON at {}", path.display()))?;
    Ok(config)
}

impl Config {
    /// Load the effective configuration.
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn resolve(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match explicit {
            Some(path) => load(path)?,
            None => {
                let path = default_config_path();
                if path.is_file() {
                    load(&path)?
                } else {
                    Config::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from `lookup`, which maps variable names to values.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(program) = lookup(ENV_SHELL).filter(|v| !v.is_empty()) {
            self.shell.program = program;
        }
        if let Some(dir) = lookup(ENV_LOG_DIR).filter(|v| !v.is_empty()) {
            self.log.dir = PathBuf::from(dir);
        }
    }
}
