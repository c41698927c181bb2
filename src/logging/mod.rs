//! Structured logging built on `tracing`.
//!
//! [`LoggerFactory`] installs the process-wide subscriber the first time one is
//! created and hands out named [`Logger`]s. Output is JSON by default, or
//! human-readable text with local timestamps when `LOG_FORMAT=text` outside
//! staging and production.
//!
//! ```rust,ignore
//! use failsoft::{fields, logging::LoggerFactory};
//!
//! let factory = LoggerFactory::from_env();
//! let logger = factory.get_logger("billing");
//!
//! logger.info("Invoice sent");
//! logger.info_with("User created", &fields! { "user_id" => 123 });
//! ```

mod config;
pub(crate) mod helpers;

pub use config::{LogFormat, LoggingConfig};
pub use helpers::{log_db_query, log_error, log_request};

use crate::Fields;
use dashmap::DashMap;
use std::fmt;
use std::sync::{Arc, Once, OnceLock};
use tracing::Level;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Timestamp layout for text output.
pub const TEXT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of the subscriber installed by the first factory.
static INSTALLED_FORMAT: OnceLock<LogFormat> = OnceLock::new();

static JSON_FALLBACK_WARNING: Once = Once::new();

/// Emit an event at a level chosen at runtime.
macro_rules! emit {
    ($level:expr, $($arg:tt)+) => {{
        let level: ::tracing::Level = $level;
        if level == ::tracing::Level::ERROR {
            ::tracing::error!($($arg)+)
        } else if level == ::tracing::Level::WARN {
            ::tracing::warn!($($arg)+)
        } else if level == ::tracing::Level::INFO {
            ::tracing::info!($($arg)+)
        } else if level == ::tracing::Level::DEBUG {
            ::tracing::debug!($($arg)+)
        } else {
            ::tracing::trace!($($arg)+)
        }
    }};
}

/// Creates loggers and owns the global subscriber setup
///
/// Creating several factories is harmless: only the first installs a
/// subscriber, later ones reuse it (and its format) and never add sinks.
pub struct LoggerFactory {
    config: LoggingConfig,
    format: LogFormat,
    loggers: DashMap<String, Logger>,
}

impl LoggerFactory {
    /// Build a factory from `LOG_LEVEL`, `LOG_FORMAT` and `ENV`.
    pub fn from_env() -> Self {
        Self::new(LoggingConfig::from_env())
    }

    pub fn new(config: LoggingConfig) -> Self {
        let format = install_subscriber(&config);
        Self {
            config,
            format,
            loggers: DashMap::new(),
        }
    }

    /// Get the logger for `name`, creating it on first use.
    pub fn get_logger(&self, name: &str) -> Logger {
        self.loggers
            .entry(name.to_string())
            .or_insert_with(|| Logger::new(name))
            .value()
            .clone()
    }

    /// Format of the installed subscriber.
    pub fn format(&self) -> LogFormat {
        self.format
    }

    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }
}

impl fmt::Debug for LoggerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerFactory")
            .field("format", &self.format)
            .field("loggers", &self.loggers.len())
            .finish()
    }
}

/// Format that will actually be used for a requested one.
fn available_format(requested: LogFormat) -> LogFormat {
    if cfg!(feature = "json-logs") {
        requested
    } else {
        LogFormat::Text
    }
}

fn install_subscriber(config: &LoggingConfig) -> LogFormat {
    *INSTALLED_FORMAT.get_or_init(|| {
        let requested = config.resolved_format();
        let format = available_format(requested);

        // RUST_LOG wins over LOG_LEVEL
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.filter_directives()));

        let installed = match format {
            #[cfg(feature = "json-logs")]
            LogFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
                .try_init(),
            _ => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_timer(ChronoLocal::new(TEXT_TIME_FORMAT.to_string())),
                )
                .try_init(),
        };

        if installed.is_err() {
            tracing::debug!(
                target: "failsoft::logging",
                "A global subscriber is already set, leaving it in place"
            );
        }

        warn_if_json_unavailable(requested, format, &JSON_FALLBACK_WARNING);

        format
    })
}

/// Warn, at most once per `warned`, that JSON output was downgraded to text.
fn warn_if_json_unavailable(requested: LogFormat, format: LogFormat, warned: &Once) {
    if requested != format {
        warned.call_once(|| {
            tracing::warn!(
                target: "failsoft::logging",
                "JSON logs requested but the json-logs feature is disabled, using text format"
            );
        });
    }
}

/// A named logger
///
/// Every event carries a `logger` field with the name. Extra fields are
/// attached as a single `extra` attribute holding a JSON object.
#[derive(Clone, Debug)]
pub struct Logger {
    name: Arc<str>,
}

impl Logger {
    fn new(name: &str) -> Self {
        Self { name: Arc::from(name) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Log `message` at `level`, with optional extra fields.
    pub fn log(&self, level: Level, message: &str, extra: Option<&Fields>) {
        let logger: &str = &self.name;
        match extra {
            Some(extra) if !extra.is_empty() => emit!(
                level,
                target: "failsoft::logging",
                logger,
                extra = %Extra(extra),
                "{}",
                message
            ),
            _ => emit!(level, target: "failsoft::logging", logger, "{}", message),
        }
    }

    pub fn debug(&self, message: &str) {
        self.log(Level::DEBUG, message, None);
    }

    pub fn info(&self, message: &str) {
        self.log(Level::INFO, message, None);
    }

    pub fn warn(&self, message: &str) {
        self.log(Level::WARN, message, None);
    }

    pub fn error(&self, message: &str) {
        self.log(Level::ERROR, message, None);
    }

    pub fn debug_with(&self, message: &str, extra: &Fields) {
        self.log(Level::DEBUG, message, Some(extra));
    }

    pub fn info_with(&self, message: &str, extra: &Fields) {
        self.log(Level::INFO, message, Some(extra));
    }

    pub fn warn_with(&self, message: &str, extra: &Fields) {
        self.log(Level::WARN, message, Some(extra));
    }

    pub fn error_with(&self, message: &str, extra: &Fields) {
        self.log(Level::ERROR, message, Some(extra));
    }
}

/// Renders fields as compact JSON, only when the event is enabled.
pub(crate) struct Extra<'a>(pub(crate) &'a Fields);

impl fmt::Display for Extra<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self.0).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    /// Collects formatted log output in memory.
    #[derive(Clone, Default)]
    pub struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Run `f` with a scoped text subscriber and return what it logged.
    pub fn capture(f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        captured.contents()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::capture;
    use super::*;
    use crate::fields;

    #[test]
    fn test_factory_caches_loggers_by_name() {
        let factory = LoggerFactory::new(LoggingConfig::default());
        let first = factory.get_logger("orders");
        let second = factory.get_logger("orders");
        let other = factory.get_logger("billing");

        assert!(Arc::ptr_eq(&first.name, &second.name));
        assert_eq!(other.name(), "billing");
    }

    #[test]
    fn test_repeated_factories_share_one_subscriber() {
        let first = LoggerFactory::new(LoggingConfig::default().format(LogFormat::Text));
        let second = LoggerFactory::new(LoggingConfig::default().format(LogFormat::Json));
        assert_eq!(first.format(), second.format());
    }

    #[test]
    fn test_events_carry_logger_name() {
        let factory = LoggerFactory::new(LoggingConfig::default());
        let logger = factory.get_logger("orders");

        let output = capture(|| logger.info("Order placed"));
        assert!(output.contains("Order placed"));
        assert!(output.contains("logger=\"orders\""));
        assert!(output.contains("INFO"));
    }

    #[test]
    fn test_extra_fields_rendered_as_json() {
        let factory = LoggerFactory::new(LoggingConfig::default());
        let logger = factory.get_logger("users");

        let output = capture(|| {
            logger.warn_with("User created", &fields! { "user_id" => 123, "plan" => "pro" })
        });
        assert!(output.contains("WARN"));
        assert!(output.contains(r#""user_id":123"#));
        assert!(output.contains(r#""plan":"pro""#));
    }

    #[test]
    fn test_empty_extra_is_omitted() {
        let factory = LoggerFactory::new(LoggingConfig::default());
        let logger = factory.get_logger("users");

        let output = capture(|| logger.error_with("Nothing extra", &Fields::new()));
        assert!(output.contains("Nothing extra"));
        assert!(!output.contains("extra="));
    }

    #[test]
    fn test_json_unavailable_falls_back_to_text() {
        if cfg!(feature = "json-logs") {
            assert_eq!(available_format(LogFormat::Json), LogFormat::Json);
        } else {
            assert_eq!(available_format(LogFormat::Json), LogFormat::Text);
        }
        assert_eq!(available_format(LogFormat::Text), LogFormat::Text);
    }

    #[test]
    fn test_json_fallback_warns_once() {
        let warned = Once::new();
        let output = capture(|| {
            warn_if_json_unavailable(LogFormat::Json, LogFormat::Text, &warned);
            warn_if_json_unavailable(LogFormat::Json, LogFormat::Text, &warned);
        });

        assert!(output.contains("WARN"));
        assert_eq!(output.matches("json-logs feature is disabled").count(), 1);
    }

    #[test]
    fn test_no_warning_when_format_available() {
        let warned = Once::new();
        let output = capture(|| {
            warn_if_json_unavailable(LogFormat::Json, LogFormat::Json, &warned);
            warn_if_json_unavailable(LogFormat::Text, LogFormat::Text, &warned);
        });

        assert!(output.is_empty());
        assert!(!warned.is_completed());
    }
}
