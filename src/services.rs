use crate::cache::{CacheConfig, CacheService};
use crate::health::{ComponentHealth, HealthReport};
use crate::logging::{Logger, LoggerFactory, LoggingConfig};
use crate::monitoring::{MonitoringConfig, MonitoringService};
use crate::payment::{PaymentConfig, PaymentService};
use std::sync::Arc;

/// All four facades, constructed together
///
/// Logging is set up first so the other facades' construction notices go
/// through the configured subscriber. The facades are independent of each
/// other; any of them may be cloned out and passed around on its own.
#[derive(Clone, Debug)]
pub struct Services {
    pub cache: CacheService,
    pub logging: Arc<LoggerFactory>,
    pub monitoring: MonitoringService,
    pub payments: PaymentService,
}

impl Services {
    /// Build every facade from environment variables.
    pub async fn from_env() -> Self {
        Self::builder().build().await
    }

    /// Builder pattern for constructing Services
    pub fn builder() -> ServicesBuilder {
        ServicesBuilder::new()
    }

    /// Shorthand for `services.logging.get_logger(name)`.
    pub fn logger(&self, name: &str) -> Logger {
        self.logging.get_logger(name)
    }

    /// Per-facade health, derived from how each one was bound.
    pub fn health(&self) -> HealthReport {
        HealthReport::from_checks(vec![
            ComponentHealth::from_binding(
                "cache",
                self.cache.mode(),
                self.cache.binding().degraded_reason(),
            ),
            ComponentHealth::from_binding(
                "monitoring",
                self.monitoring.mode(),
                self.monitoring.binding().degraded_reason(),
            ),
            ComponentHealth::from_binding(
                "payments",
                self.payments.mode(),
                self.payments.binding().degraded_reason(),
            ),
        ])
    }
}

/// Builder for Services with fluent API
///
/// Any configuration not given explicitly is read from the environment.
#[must_use = "builder does nothing until you call build()"]
#[derive(Debug, Default)]
pub struct ServicesBuilder {
    cache: Option<CacheConfig>,
    logging: Option<LoggingConfig>,
    monitoring: Option<MonitoringConfig>,
    payments: Option<PaymentConfig>,
}

impl ServicesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = Some(config);
        self
    }

    pub fn logging(mut self, config: LoggingConfig) -> Self {
        self.logging = Some(config);
        self
    }

    pub fn monitoring(mut self, config: MonitoringConfig) -> Self {
        self.monitoring = Some(config);
        self
    }

    pub fn payments(mut self, config: PaymentConfig) -> Self {
        self.payments = Some(config);
        self
    }

    pub async fn build(self) -> Services {
        let logging = Arc::new(LoggerFactory::new(
            self.logging.unwrap_or_else(LoggingConfig::from_env),
        ));
        let monitoring = MonitoringService::new(self.monitoring.unwrap_or_else(MonitoringConfig::from_env));
        let cache = CacheService::new(self.cache.unwrap_or_else(CacheConfig::from_env)).await;
        let payments = PaymentService::new(self.payments.unwrap_or_else(PaymentConfig::from_env));

        Services {
            cache,
            logging,
            monitoring,
            payments,
        }
    }
}
