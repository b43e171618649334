use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Config {
    /// Load the common settings from `configuration.*` and `APP__*` variables.
    ///
    /// `.env` and `.env.local` are read first; values already present in the
    /// process environment are never overwritten.
    pub fn load() -> Result<Self, AppError> {
        load_dotenv();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

pub fn load_dotenv() {
    dotenvy::dotenv().ok();
    dotenvy::from_filename(".env.local").ok();
}

/// Resolve the first of `keys` that `lookup` yields with a non-blank value.
pub fn first_present<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter()
        .filter_map(|key| lookup(*key))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

/// Like [`first_present`] but fails with a `ConfigError` naming every key.
pub fn require_any<F>(lookup: &F, keys: &[&str]) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    first_present(lookup, keys).ok_or_else(|| {
        AppError::ConfigError(anyhow::anyhow!(
            "{} is required but not set",
            keys.join(" or ")
        ))
    })
}
