use super::{Breadcrumb, MonitoringConfig, Severity, UserInfo};
use crate::Fields;
use crate::error::SetupError;
use crate::traits::monitor::{ActiveSpan, MonitoringBackend};
use sentry::protocol::{Context, SpanStatus};
use sentry::types::Dsn;
use std::collections::BTreeMap;
use std::error::Error;
use uuid::Uuid;

/// Sentry error tracking and performance monitoring
///
/// Owns the client guard: dropping the last reference flushes pending events.
pub struct SentryMonitor {
    _guard: Option<sentry::ClientInitGuard>,
}

impl SentryMonitor {
    /// Initialise the Sentry client.
    ///
    /// The DSN is parsed first so a malformed one is reported instead of
    /// silently producing a disabled client.
    pub fn init(config: &MonitoringConfig, dsn: &str) -> Result<Self, SetupError> {
        let dsn: Dsn = dsn
            .parse()
            .map_err(|e| SetupError::invalid_credential(format!("Invalid Sentry DSN: {}", e)))?;

        let guard = sentry::init(sentry::ClientOptions {
            dsn: Some(dsn),
            environment: Some(config.environment.clone().into()),
            release: Some(config.release.clone().into()),
            traces_sample_rate: config.traces_sample_rate,
            send_default_pii: false,
            ..Default::default()
        });

        if !guard.is_enabled() {
            return Err(SetupError::unreachable("Sentry client did not start"));
        }

        Ok(Self {
            _guard: Some(guard),
        })
    }

    /// Report through whatever client the current hub has bound.
    #[cfg(test)]
    fn unguarded() -> Self {
        Self { _guard: None }
    }
}

fn sentry_level(level: Severity) -> sentry::Level {
    match level {
        Severity::Debug => sentry::Level::Debug,
        Severity::Info => sentry::Level::Info,
        Severity::Warning => sentry::Level::Warning,
        Severity::Error => sentry::Level::Error,
        Severity::Fatal => sentry::Level::Fatal,
    }
}

fn context_map(fields: &Fields) -> BTreeMap<String, serde_json::Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Sentry hands back a nil id when the event was dropped.
fn sent(id: Uuid) -> Option<Uuid> {
    (!id.is_nil()).then_some(id)
}

impl MonitoringBackend for SentryMonitor {
    fn capture_exception(
        &self,
        error: &(dyn Error + 'static),
        context: &Fields,
        level: Severity,
    ) -> Option<Uuid> {
        let id = sentry::with_scope(
            |scope| {
                scope.set_level(Some(sentry_level(level)));
                for (key, value) in context {
                    let wrapped = BTreeMap::from([("value".to_string(), value.clone())]);
                    scope.set_context(key, Context::Other(wrapped));
                }
            },
            || sentry::capture_error(error),
        );
        sent(id)
    }

    fn capture_message(&self, message: &str, level: Severity, extra: &Fields) -> Option<Uuid> {
        let level = sentry_level(level);
        let id = sentry::with_scope(
            |scope| {
                scope.set_level(Some(level));
                if !extra.is_empty() {
                    scope.set_context("extra", Context::Other(context_map(extra)));
                }
            },
            || sentry::capture_message(message, level),
        );
        sent(id)
    }

    fn set_user(&self, user: &UserInfo) {
        let user = sentry::User {
            id: Some(user.id.clone()),
            email: user.email.clone(),
            username: user.username.clone(),
            ..Default::default()
        };
        sentry::configure_scope(|scope| scope.set_user(Some(user)));
    }

    fn set_context(&self, key: &str, value: &Fields) {
        let context = Context::Other(context_map(value));
        sentry::configure_scope(|scope| scope.set_context(key, context));
    }

    fn add_breadcrumb(&self, breadcrumb: &Breadcrumb) {
        sentry::add_breadcrumb(sentry::Breadcrumb {
            message: Some(breadcrumb.message.clone()),
            category: Some(breadcrumb.category.clone()),
            level: sentry_level(breadcrumb.level),
            data: context_map(&breadcrumb.data),
            ..Default::default()
        });
    }

    fn start_span(&self, operation: &str) -> Option<Box<dyn ActiveSpan>> {
        let ctx = sentry::TransactionContext::new(operation, operation);
        Some(Box::new(SentryTransaction(sentry::start_transaction(ctx))))
    }

    fn name(&self) -> &'static str {
        "sentry"
    }
}

struct SentryTransaction(sentry::Transaction);

impl ActiveSpan for SentryTransaction {
    fn finish(self: Box<Self>, failed: bool) {
        if failed {
            self.0.set_status(SpanStatus::InternalError);
        }
        self.0.finish();
    }
}
