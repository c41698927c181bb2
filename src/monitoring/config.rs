use crate::error::SetupError;
use crate::utils::{get_env_with_prefix, non_empty, parse_flag};
use serde::{Deserialize, Serialize};

/// Monitoring (Sentry) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitoringConfig {
    /// Report to Sentry instead of the console
    #[serde(default)]
    pub enabled: bool,

    /// Sentry DSN (required when enabled)
    #[serde(default)]
    pub dsn: Option<String>,

    #[serde(default = "default_environment")]
    pub environment: String,

    /// Fraction of transactions sent, 0.0 to 1.0
    #[serde(default = "default_traces_sample_rate")]
    pub traces_sample_rate: f32,

    #[serde(default = "default_release")]
    pub release: String,

    /// Raw `SENTRY_TRACES_SAMPLE_RATE` when it was not a number
    #[serde(skip)]
    pub(crate) invalid_sample_rate: Option<String>,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dsn: None,
            environment: default_environment(),
            traces_sample_rate: default_traces_sample_rate(),
            release: default_release(),
            invalid_sample_rate: None,
        }
    }
}

impl MonitoringConfig {
    /// Load monitoring configuration from environment variables
    ///
    /// - `SENTRY_ENABLED`, `SENTRY_DSN`
    /// - `SENTRY_ENVIRONMENT`, falling back to `ENV`, then `development`
    /// - `SENTRY_TRACES_SAMPLE_RATE` (default 0.1)
    /// - `SENTRY_RELEASE` (default `unknown`)
    pub fn from_env() -> Self {
        Self::from_lookup(get_env_with_prefix)
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(enabled) = lookup("SENTRY_ENABLED") {
            config.enabled = parse_flag(&enabled);
        }

        config.dsn = non_empty(lookup("SENTRY_DSN"));

        if let Some(environment) = lookup("SENTRY_ENVIRONMENT").or_else(|| lookup("ENV")) {
            config.environment = environment;
        }

        if let Some(rate) = lookup("SENTRY_TRACES_SAMPLE_RATE") {
            match parse_sample_rate(&rate) {
                Some(parsed) => config.traces_sample_rate = parsed,
                None => config.invalid_sample_rate = Some(rate),
            }
        }

        if let Some(release) = lookup("SENTRY_RELEASE") {
            config.release = release;
        }

        config
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn dsn(mut self, dsn: impl Into<String>) -> Self {
        self.dsn = Some(dsn.into());
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn traces_sample_rate(mut self, rate: f32) -> Self {
        self.traces_sample_rate = clamp_sample_rate(rate);
        self.invalid_sample_rate = None;
        self
    }

    /// Check settings that only matter once Sentry is enabled.
    pub(crate) fn validate(&self) -> Result<(), SetupError> {
        match self.invalid_sample_rate {
            Some(ref raw) => Err(SetupError::invalid_credential(format!(
                "SENTRY_TRACES_SAMPLE_RATE is not a number: {:?}",
                raw
            ))),
            None => Ok(()),
        }
    }

    pub fn release(mut self, release: impl Into<String>) -> Self {
        self.release = release.into();
        self
    }
}

/// Parse and clamp a sample rate. `None` if it isn't a number.
fn parse_sample_rate(value: &str) -> Option<f32> {
    value.trim().parse::<f32>().ok().map(clamp_sample_rate)
}

fn clamp_sample_rate(rate: f32) -> f32 {
    if rate.is_nan() {
        default_traces_sample_rate()
    } else {
        rate.clamp(0.0, 1.0)
    }
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_traces_sample_rate() -> f32 {
    0.1
}

fn default_release() -> String {
    "unknown".to_string()
}
