//! Error tracking and performance tracing with an optional Sentry backend.
//!
//! [`MonitoringService`] reports to Sentry when `SENTRY_ENABLED=true` and a
//! valid `SENTRY_DSN` is set. Otherwise captured errors and messages are
//! written to the log and everything else is a no-op.
//!
//! ```rust,ignore
//! use failsoft::{fields, monitoring::{MonitoringService, Severity}};
//!
//! let monitor = MonitoringService::from_env();
//!
//! if let Err(e) = process_payment(1000) {
//!     monitor.capture_exception(&e, &fields! { "user_id" => 123 }, Severity::Error);
//! }
//!
//! let users = monitor.in_trace("database_query", || db.load_users());
//! ```

mod config;
mod console;
mod types;

#[cfg(feature = "monitoring-sentry")]
mod live;

pub use config::MonitoringConfig;
pub use console::ConsoleMonitor;
pub use types::{Breadcrumb, ParseSeverityError, Severity, UserInfo};

#[cfg(feature = "monitoring-sentry")]
pub use live::SentryMonitor;

use crate::Fields;
use crate::error::SetupError;
use crate::facade::{Binding, Connected, DegradedReason, FacadeLabels, FacadeMode};
use crate::traits::monitor::{ActiveSpan, MonitoringBackend};
use std::error::Error;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

const LABELS: FacadeLabels = FacadeLabels {
    service: "Sentry monitoring",
    degraded: "console output",
};

/// Error and performance monitoring that works with or without Sentry
#[derive(Clone)]
pub struct MonitoringService {
    binding: Binding<dyn MonitoringBackend>,
}

impl MonitoringService {
    /// Build the service from `SENTRY_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(MonitoringConfig::from_env())
    }

    /// Build the service from an explicit configuration. Never fails.
    pub fn new(config: MonitoringConfig) -> Self {
        let attempt = if config.enabled {
            Some(connect(&config))
        } else {
            None
        };

        Self {
            binding: Binding::select(LABELS, attempt, console_backend),
        }
    }

    /// Console-only monitoring, without reading the environment.
    pub fn console() -> Self {
        Self {
            binding: Binding::degraded(console_backend(), DegradedReason::Disabled),
        }
    }

    /// Use a custom backend.
    pub fn with_backend(backend: Arc<dyn MonitoringBackend>, mode: FacadeMode) -> Self {
        let binding = match mode {
            FacadeMode::Live => Binding::live(backend),
            FacadeMode::Degraded => Binding::degraded(backend, DegradedReason::Disabled),
        };
        Self { binding }
    }

    pub fn mode(&self) -> FacadeMode {
        self.binding.mode()
    }

    pub fn is_live(&self) -> bool {
        self.binding.is_live()
    }

    pub fn binding(&self) -> &Binding<dyn MonitoringBackend> {
        &self.binding
    }

    fn backend(&self) -> &dyn MonitoringBackend {
        self.binding.backend().as_ref()
    }

    /// Report an error. Each context entry is attached as its own block.
    ///
    /// Returns the event id, or `None` if nothing was sent.
    pub fn capture_exception(
        &self,
        error: &(dyn Error + 'static),
        context: &Fields,
        level: Severity,
    ) -> Option<Uuid> {
        self.backend().capture_exception(error, context, level)
    }

    /// Report a free-form event. `extra` is attached as one `extra` block.
    pub fn capture_message(&self, message: &str, level: Severity, extra: &Fields) -> Option<Uuid> {
        self.backend().capture_message(message, level, extra)
    }

    pub fn set_user(&self, user: UserInfo) {
        self.backend().set_user(&user);
    }

    pub fn set_context(&self, key: &str, value: Fields) {
        self.backend().set_context(key, &value);
    }

    pub fn add_breadcrumb(&self, breadcrumb: Breadcrumb) {
        self.backend().add_breadcrumb(&breadcrumb);
    }

    /// Start timing `operation`. The span closes when the guard is dropped.
    pub fn trace(&self, operation: &str) -> TraceGuard {
        TraceGuard {
            span: self.backend().start_span(operation),
            failed: false,
        }
    }

    /// Run `f` inside a trace.
    pub fn in_trace<R>(&self, operation: &str, f: impl FnOnce() -> R) -> R {
        let _guard = self.trace(operation);
        f()
    }

    /// Await `fut` inside a trace.
    pub async fn in_trace_async<F: Future>(&self, operation: &str, fut: F) -> F::Output {
        let _guard = self.trace(operation);
        fut.await
    }
}

impl std::fmt::Debug for MonitoringService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitoringService")
            .field("mode", &self.mode())
            .field("backend", &self.backend().name())
            .finish()
    }
}

/// An open trace
///
/// Closing happens in `Drop`, so the span is finished on every exit path:
/// normal return, early `?` return, or unwinding. A span closed while
/// panicking, or after [`TraceGuard::mark_failed`], is reported as failed.
#[must_use = "the trace ends as soon as the guard is dropped"]
pub struct TraceGuard {
    span: Option<Box<dyn ActiveSpan>>,
    failed: bool,
}

impl TraceGuard {
    /// Whether a backend span is being recorded.
    pub fn is_recording(&self) -> bool {
        self.span.is_some()
    }

    /// Report the span as failed when it closes.
    pub fn mark_failed(&mut self) {
        self.failed = true;
    }

    /// Close the span now.
    pub fn finish(self) {}
}

impl Drop for TraceGuard {
    fn drop(&mut self) {
        if let Some(span) = self.span.take() {
            span.finish(self.failed || std::thread::panicking());
        }
    }
}

impl std::fmt::Debug for TraceGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceGuard")
            .field("recording", &self.is_recording())
            .field("failed", &self.failed)
            .finish()
    }
}

fn console_backend() -> Arc<dyn MonitoringBackend> {
    Arc::new(ConsoleMonitor::new())
}

#[cfg(feature = "monitoring-sentry")]
fn connect(config: &MonitoringConfig) -> Result<Connected<dyn MonitoringBackend>, SetupError> {
    let dsn = config
        .dsn
        .as_deref()
        .ok_or(SetupError::missing("SENTRY_DSN", "SENTRY_ENABLED"))?;
    config.validate()?;

    let backend: Arc<dyn MonitoringBackend> = Arc::new(SentryMonitor::init(config, dsn)?);
    Ok(Connected::new(backend).with_detail(format!("env: {}", config.environment)))
}

#[cfg(not(feature = "monitoring-sentry"))]
fn connect(config: &MonitoringConfig) -> Result<Connected<dyn MonitoringBackend>, SetupError> {
    if config.dsn.is_none() {
        return Err(SetupError::missing("SENTRY_DSN", "SENTRY_ENABLED"));
    }
    config.validate()?;
    Err(SetupError::feature_unavailable("Sentry", "monitoring-sentry"))
}
