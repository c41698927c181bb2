//! Monitoring trait for error tracking and tracing backends

use crate::Fields;
use crate::monitoring::{Breadcrumb, Severity, UserInfo};
use uuid::Uuid;

/// Error tracking backend
///
/// Capture methods return the identifier the backend assigned to the event,
/// or `None` when nothing was sent anywhere.
pub trait MonitoringBackend: Send + Sync {
    /// Report an error with per-event context.
    fn capture_exception(
        &self,
        error: &(dyn std::error::Error + 'static),
        context: &Fields,
        level: Severity,
    ) -> Option<Uuid>;

    /// Report a free-form message with per-event extra data.
    fn capture_message(&self, message: &str, level: Severity, extra: &Fields) -> Option<Uuid>;

    /// Attach a user to subsequent events.
    fn set_user(&self, user: &UserInfo);

    /// Attach a named context block to subsequent events.
    fn set_context(&self, key: &str, value: &Fields);

    /// Record a breadcrumb for subsequent events.
    fn add_breadcrumb(&self, breadcrumb: &Breadcrumb);

    /// Start a timed span. Backends without tracing return `None`.
    fn start_span(&self, operation: &str) -> Option<Box<dyn ActiveSpan>>;

    /// Short backend name used in logs and health reports.
    fn name(&self) -> &'static str;
}

/// A span started by [`MonitoringBackend::start_span`].
pub trait ActiveSpan: Send {
    /// Close the span. `failed` is set when it is closed during a panic.
    fn finish(self: Box<Self>, failed: bool);
}
