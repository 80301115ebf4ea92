use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config_env::optional_trimmed_env;
use crate::i18n::Locale;

const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub data_dir: PathBuf,
    pub locale: Locale,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    MissingVar(String),
    #[error("invalid integer in env var {0}")]
    ParseInt(String),
    #[error("invalid number in env var {0}")]
    ParseFloat(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl SiteConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = optional_trimmed_env("ACADEMY_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let locale = match optional_trimmed_env("ACADEMY_LOCALE") {
            Some(raw) => Locale::parse(&raw).ok_or_else(|| {
                ConfigError::InvalidConfiguration(format!(
                    "ACADEMY_LOCALE must be one of en, es (got '{raw}')"
                ))
            })?,
            None => Locale::default(),
        };

        Ok(Self { data_dir, locale })
    }
}

/// Loads a `.env` file from the working directory when one exists.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded environment file"),
        Err(err) if err.not_found() => {}
        Err(err) => warn!("failed to load .env file: {err}"),
    }
}
