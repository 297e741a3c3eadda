use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{common::types::AnyResult, configs::*};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

const CONFIG_PATHS: [&str; 2] = ["config.toml", "config.default.toml"];

impl Config {
    pub fn load() -> AnyResult<Self> {
        Self::load_first(&CONFIG_PATHS)?
            .ok_or_else(|| "config.toml or config.default.toml not found".into())
    }

    /// Like [`Config::load`], but a missing file means defaults.
    pub fn load_or_default() -> AnyResult<Self> {
        Ok(Self::load_first(&CONFIG_PATHS)?.unwrap_or_default())
    }

    /// Reads the first of `paths` that exists; `None` when none does.
    fn load_first(paths: &[&str]) -> AnyResult<Option<Self>> {
        let Some(config_path) = paths.iter().copied().find(|p| Path::new(p).exists()) else {
            return Ok(None);
        };

        let config_str = std::fs::read_to_string(config_path)?;
        if config_str.is_empty() {
            return Err(format!("{} is empty", config_path).into());
        }

        Self::parse(&config_str).map(Some)
    }

    pub fn parse(config_str: &str) -> AnyResult<Self> {
        let config: Config = toml::from_str(config_str)?;
        let download = &config.download;
        if download.max_concurrent_requests == 0 {
            return Err("download.max_concurrent_requests must be at least 1".into());
        }
        if download.slice_secs == 0 {
            return Err("download.slice_secs must be at least 1".into());
        }
        if download.streaming_slice_secs == 0 {
            return Err("download.streaming_slice_secs must be at least 1".into());
        }
        Ok(config)
    }
}
