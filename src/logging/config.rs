use crate::utils::get_env_with_prefix;
use serde::{Deserialize, Serialize};

/// Output format for log records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line
    Json,
    /// `timestamp level target: message fields`, local time
    Text,
}

impl LogFormat {
    /// `json` (any case) selects JSON; anything else is text.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `DEBUG`, `INFO`, `WARN`/`WARNING`, `ERROR` or `CRITICAL`
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_format")]
    pub format: LogFormat,

    /// Deployment environment tag (`development`, `staging`, `prod`, ...)
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            environment: default_environment(),
        }
    }
}

/// Crates whose chatter is capped at `warn` unless `RUST_LOG` says otherwise.
const QUIET_TARGETS: &[&str] = &["hyper", "h2", "rustls", "reqwest", "tower"];

impl LoggingConfig {
    /// Load logging configuration from environment variables
    ///
    /// - `LOG_LEVEL`: verbosity (default `INFO`)
    /// - `LOG_FORMAT`: `json` or `text` (default `json`)
    /// - `ENV`: environment tag; `staging`/`prod`/`production` force JSON
    pub fn from_env() -> Self {
        Self::from_lookup(get_env_with_prefix)
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(level) = lookup("LOG_LEVEL") {
            config.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            config.format = LogFormat::parse(&format);
        }
        if let Some(env) = lookup("ENV") {
            config.environment = env;
        }

        config
    }

    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Whether the environment tag names a deployed (non-development) stage.
    pub fn is_deployed(&self) -> bool {
        matches!(
            self.environment.trim().to_ascii_lowercase().as_str(),
            "staging" | "prod" | "production"
        )
    }

    /// Format to use: JSON if asked for, or whenever running deployed.
    pub fn resolved_format(&self) -> LogFormat {
        if self.format == LogFormat::Json || self.is_deployed() {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }

    /// `tracing` level name for `level`. Unknown names fall back to `info`.
    pub fn level_name(&self) -> &'static str {
        match self.level.trim().to_ascii_uppercase().as_str() {
            "TRACE" => "trace",
            "DEBUG" => "debug",
            "INFO" => "info",
            "WARN" | "WARNING" => "warn",
            "ERROR" | "CRITICAL" => "error",
            _ => "info",
        }
    }

    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub fn filter_directives(&self) -> String {
        let mut directives = self.level_name().to_string();
        for target in QUIET_TARGETS {
            directives.push_str(&format!(",{}=warn", target));
        }
        directives
    }
}

fn default_log_level() -> String {
    "INFO".to_string()
}

fn default_format() -> LogFormat {
    LogFormat::Json
}

fn default_environment() -> String {
    "development".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_to_json() {
        let config = LoggingConfig::from_lookup(lookup(&[]));
        assert_eq!(config.level, "INFO");
        assert_eq!(config.environment, "development");
        assert_eq!(config.resolved_format(), LogFormat::Json);
    }

    #[test]
    fn test_text_format_in_development() {
        let config = LoggingConfig::from_lookup(lookup(&[("LOG_FORMAT", "text")]));
        assert_eq!(config.resolved_format(), LogFormat::Text);
    }

    #[test]
    fn test_deployed_environments_force_json() {
        for env in ["staging", "prod", "production", "PROD"] {
            let config =
                LoggingConfig::from_lookup(lookup(&[("LOG_FORMAT", "text"), ("ENV", env)]));
            assert_eq!(config.resolved_format(), LogFormat::Json, "ENV={}", env);
        }

        let config = LoggingConfig::from_lookup(lookup(&[("LOG_FORMAT", "text"), ("ENV", "dev")]));
        assert_eq!(config.resolved_format(), LogFormat::Text);
    }

    #[test]
    fn test_level_names() {
        let level = |l: &str| LoggingConfig::default().level(l).level_name();
        assert_eq!(level("DEBUG"), "debug");
        assert_eq!(level("info"), "info");
        assert_eq!(level("WARNING"), "warn");
        assert_eq!(level("WARN"), "warn");
        assert_eq!(level("ERROR"), "error");
        assert_eq!(level("CRITICAL"), "error");
        assert_eq!(level("chatty"), "info");
    }

    #[test]
    fn test_filter_directives_quiet_http_stack() {
        let directives = LoggingConfig::default().level("DEBUG").filter_directives();
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("hyper=warn"));
    }
}
