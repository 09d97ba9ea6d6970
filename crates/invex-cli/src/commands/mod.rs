//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod process;

use std::path::{Path, PathBuf};

use invex_core::InvexConfig;

/// Load configuration from an explicit path, the default location, or
/// built-in defaults, then fill missing API keys from the environment.
pub fn load_config(path: Option<&str>) -> anyhow::Result<InvexConfig> {
    let mut config = match path {
        Some(p) => InvexConfig::from_file(Path::new(p))?,
        None => {
            let default = default_config_path();
            if default.exists() {
                InvexConfig::from_file(&default)?
            } else {
                InvexConfig::default()
            }
        }
    };
    config.apply_env();
    Ok(config)
}

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invex")
        .join("config.json")
}
