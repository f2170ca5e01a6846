//! Centralized server configuration.
//!
//! Loaded via the `config` crate from `APP_`-prefixed environment variables,
//! with `__` separating nested sections (`APP_TRACKER__API_TOKEN`).
//! Library configs are composed as sections:
//!
//! - [`LlmConfig`] under `llm`
//! - [`JiraConfig`] under `tracker`
//! - [`HolidayConfig`] under `holidays`
//! - [`PlannerConfig`] under `planner`

use serde::Deserialize;
use sprintcraft_ai::LlmConfig;
use sprintcraft_integration::{HolidayConfig, JiraConfig};
use sprintcraft_pipeline::{PlannerConfig, RunMode};

/// Server configuration composed from library configs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `dev` skips LLM epic and story derivation.
    #[serde(default)]
    pub mode: RunMode,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub tracker: JiraConfig,

    #[serde(default)]
    pub holidays: HolidayConfig,

    #[serde(default)]
    pub planner: PlannerConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_source(config::Environment::with_prefix("APP"))
    }

    fn from_source(source: config::Environment) -> Result<Self, config::ConfigError> {
        let mut config: Self = config::Config::builder()
            .add_source(
                source
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.planner.mode = config.mode;
        Ok(config)
    }

    /// The `host:port` pair to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
