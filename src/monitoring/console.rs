use super::{Breadcrumb, Severity, UserInfo};
use crate::Fields;
use crate::logging::Extra;
use crate::logging::helpers::{error_type_name, source_chain};
use crate::traits::monitor::{ActiveSpan, MonitoringBackend};
use std::error::Error;
use uuid::Uuid;

/// Console monitoring for development
///
/// Captured errors and messages are written to the log instead of being sent
/// anywhere. User, context, breadcrumb and tracing calls do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMonitor;

impl ConsoleMonitor {
    pub fn new() -> Self {
        Self
    }
}

impl MonitoringBackend for ConsoleMonitor {
    fn capture_exception(
        &self,
        error: &(dyn Error + 'static),
        context: &Fields,
        level: Severity,
    ) -> Option<Uuid> {
        let chain = source_chain(error);
        tracing::error!(
            target: "failsoft::monitoring",
            severity = level.as_str(),
            error_type = %error_type_name(error),
            error = %error,
            caused_by = (!chain.is_empty()).then(|| tracing::field::display(chain.join(": "))),
            context = (!context.is_empty()).then(|| tracing::field::display(Extra(context))),
            "Exception captured"
        );
        None
    }

    fn capture_message(&self, message: &str, level: Severity, extra: &Fields) -> Option<Uuid> {
        tracing::info!(
            target: "failsoft::monitoring",
            severity = level.as_str(),
            extra = (!extra.is_empty()).then(|| tracing::field::display(Extra(extra))),
            "Message captured: {}",
            message
        );
        None
    }

    fn set_user(&self, _user: &UserInfo) {}

    fn set_context(&self, _key: &str, _value: &Fields) {}

    fn add_breadcrumb(&self, _breadcrumb: &Breadcrumb) {}

    fn start_span(&self, _operation: &str) -> Option<Box<dyn ActiveSpan>> {
        None
    }

    fn name(&self) -> &'static str {
        "console"
    }
}
