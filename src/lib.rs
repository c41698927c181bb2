//! failsoft - optional backends that degrade instead of failing
//!
//! Four facades let an application run with or without Redis, Sentry and
//! Stripe, selected purely by environment variables. Each one decides once, at
//! construction, whether it talks to the real backend or serves calls locally,
//! and never fails to construct.
//!
//! # Features
//!
//! - **Cache**: Redis, or an in-process map (`REDIS_ENABLED`, `REDIS_URL`)
//! - **Logging**: JSON or human-readable output via `tracing` (`LOG_LEVEL`, `LOG_FORMAT`, `ENV`)
//! - **Monitoring**: Sentry, or console output (`SENTRY_ENABLED`, `SENTRY_DSN`)
//! - **Payments**: Stripe, or simulated test records (`STRIPE_ENABLED`, `STRIPE_SECRET_KEY`)
//!
//! Every variable may also be given with a `FAILSOFT_` prefix, which wins.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use failsoft::Services;
//!
//! #[tokio::main]
//! async fn main() {
//!     let services = Services::from_env().await;
//!
//!     services.cache.set("greeting", serde_json::json!("hello"), None).await;
//!     let logger = services.logger("app");
//!     logger.info("Started");
//!
//!     let _guard = services.monitoring.trace("startup");
//! }
//! ```

pub mod cache;
mod error;
pub mod facade;
pub mod health;
pub mod logging;
pub mod monitoring;
pub mod payment;
mod services;
pub mod traits;
pub mod utils;

// Re-exports for public API
pub use cache::{CacheConfig, CacheService, InMemoryCache};
pub use error::{CacheError, CacheResult, SetupError};
pub use facade::{DegradedReason, FacadeMode};
pub use health::{ComponentHealth, HealthReport, HealthStatus};
pub use logging::{LogFormat, Logger, LoggerFactory, LoggingConfig};
pub use monitoring::{Breadcrumb, MonitoringConfig, MonitoringService, Severity, TraceGuard, UserInfo};
pub use payment::{
    Customer, PaymentConfig, PaymentError, PaymentIntent, PaymentService, PaymentStatus, Refund,
    RefundReason,
};
pub use services::{Services, ServicesBuilder};

/// Structured key/value data attached to log events and monitoring captures.
pub type Fields = serde_json::Map<String, serde_json::Value>;

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}

/// Build a [`Fields`] map.
///
/// ```rust
/// let fields = failsoft::fields! { "user_id" => 123, "plan" => "pro" };
/// assert_eq!(fields["user_id"], 123);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::Fields::new();
        $(
            map.insert(
                ::std::string::String::from($key),
                $crate::__private::serde_json::to_value(&$value)
                    .unwrap_or($crate::__private::serde_json::Value::Null),
            );
        )+
        map
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_fields_macro() {
        let empty = fields! {};
        assert!(empty.is_empty());

        let fields = fields! { "user_id" => 123, "email" => "a@example.com", "tags" => vec!["x"] };
        assert_eq!(fields.len(), 3);
        assert_eq!(fields["user_id"], serde_json::json!(123));
        assert_eq!(fields["email"], serde_json::json!("a@example.com"));
        assert_eq!(fields["tags"], serde_json::json!(["x"]));
    }
}
