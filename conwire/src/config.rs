//! Framework configuration is represented by [ApplicationConfig], which
//! [Application](crate::application::Application) uses to configure itself and the registry it
//! assembles.
//!
//! By default, the config is created with opinionated default values, which can then be overwritten
//! by environment variables prefixed with `CONWIRE_` or `conwire.json` file.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_ENV_PREFIX: &str = "CONWIRE";

/// Name of the default config file.
pub const CONFIG_FILE: &str = "conwire.json";

/// Framework configuration.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApplicationConfig {
    /// Should a default tracing logger be installed in the scope of the application.
    pub install_tracing_logger: bool,
    /// Can components with the same name replace earlier definitions.
    pub allow_definition_overriding: bool,
    /// Should the condition evaluation report be logged after the registry is assembled.
    pub log_condition_report: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            install_tracing_logger: true,
            allow_definition_overriding: false,
            log_condition_report: false,
        }
    }
}

impl From<OptionalApplicationConfig> for ApplicationConfig {
    fn from(value: OptionalApplicationConfig) -> Self {
        let default = Self::default();
        Self {
            install_tracing_logger: value
                .install_tracing_logger
                .unwrap_or(default.install_tracing_logger),
            allow_definition_overriding: value
                .allow_definition_overriding
                .unwrap_or(default.allow_definition_overriding),
            log_condition_report: value
                .log_condition_report
                .unwrap_or(default.log_condition_report),
        }
    }
}

impl ApplicationConfig {
    /// Creates the config from defaults, the optional config file and the environment.
    pub fn init_from_environment() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(CONFIG_ENV_PREFIX))
            .build()
            .and_then(|config| config.try_deserialize::<OptionalApplicationConfig>())
            .map(|config| config.into())
    }
}

#[derive(Deserialize, Default)]
struct OptionalApplicationConfig {
    install_tracing_logger: Option<bool>,
    allow_definition_overriding: Option<bool>,
    log_condition_report: Option<bool>,
}
