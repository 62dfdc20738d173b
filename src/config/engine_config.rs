use serde::Deserialize;
use std::time::Duration;

use crate::domain::variation::VariationValue;

/// Engine configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub provider: ProviderConfig,
    pub resolution: ResolutionConfig,
    pub logging: LoggingConfig,
}

/// External variation provider settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Endpoint serving the provider's client script; the experiment id is
    /// appended as the `experiment` query parameter
    pub script_url: String,
    pub request_timeout_secs: u64,
}

impl ProviderConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Resolution fallback behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Variation handed to consumers when resolution fails (fail-open)
    pub fallback_variation: VariationValue,
    /// Surface resolution failures to consumers instead of falling back
    pub strict: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            script_url: "https://www.google-analytics.com/cx/api.js".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            fallback_variation: VariationValue::default(),
            strict: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl EngineConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("ENGINE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
