//! Application configuration schemas.
//!
//! Configuration structs are deserialized from an optional TOML file
//! merged with `TRIGGERKIT__`-prefixed environment variables via the
//! `config` crate. Each sub-module represents a logical section.

pub mod dispatch;
pub mod logging;

use serde::{Deserialize, Serialize};
use validator::Validate;

use self::dispatch::DispatchConfig;
use self::logging::LoggingConfig;

use crate::error::AppError;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "TRIGGERKIT";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Dispatch engine settings.
    #[serde(default)]
    #[validate(nested)]
    pub dispatch: DispatchConfig,
    /// Logging settings.
    #[serde(default)]
    #[validate(nested)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file and the environment.
    ///
    /// The file is optional; environment variables such as
    /// `TRIGGERKIT__DISPATCH__EXTENSION_POINT` override its values.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );

        Self::build(builder)
    }

    /// Parse configuration from a TOML string, without environment overrides.
    pub fn from_toml_str(contents: &str) -> Result<Self, AppError> {
        let builder = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml));

        Self::build(builder)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, AppError> {
        let config = builder
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        parsed.validate()?;
        Ok(parsed)
    }
}
