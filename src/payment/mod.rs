//! Payment processing with an optional Stripe backend.
//!
//! [`PaymentService`] calls Stripe when `STRIPE_ENABLED=true` and a valid
//! `STRIPE_SECRET_KEY` is set. Otherwise every operation succeeds with a
//! simulated record whose id carries a `_test_` marker.
//!
//! No amount, currency or state-transition validation happens here: the live
//! backend trusts Stripe to reject bad input and the simulated backend accepts
//! anything.
//!
//! ```rust,ignore
//! use failsoft::payment::{CreatePaymentIntentRequest, PaymentService};
//!
//! let payments = PaymentService::from_env();
//! let intent = payments
//!     .create_payment_intent(CreatePaymentIntentRequest::usd(1000).metadata("order_id", "123"))
//!     .await?;
//! ```

mod config;
mod error;
mod simulated;
mod types;
mod webhook;

#[cfg(feature = "payments-stripe")]
mod live;

pub use config::PaymentConfig;
pub use error::PaymentError;
pub use simulated::{SIMULATED_CLIENT_SECRET, SimulatedPayments};
pub use types::{
    CreateCustomerRequest, CreatePaymentIntentRequest, CreateRefundRequest, Customer, Metadata,
    PaymentIntent, PaymentStatus, Refund, RefundReason,
};
pub use webhook::{WebhookError, compute_signature, verify_signature, verify_signature_at};

#[cfg(feature = "payments-stripe")]
pub use live::StripePayments;

use crate::error::SetupError;
use crate::facade::{Binding, Connected, DegradedReason, FacadeLabels, FacadeMode};
use crate::traits::payment::PaymentBackend;
use secrecy::{ExposeSecret, SecretString};
use std::sync::{Arc, Once};
use std::time::Duration;

const LABELS: FacadeLabels = FacadeLabels {
    service: "Stripe payments",
    degraded: "simulated test mode",
};

/// Payment operations that work with or without Stripe
#[derive(Clone)]
pub struct PaymentService {
    binding: Binding<dyn PaymentBackend>,
    webhook_secret: Option<SecretString>,
    webhook_tolerance: Duration,
    publishable_key: Option<String>,
    unverified_warning: Arc<Once>,
}

impl PaymentService {
    /// Build the service from `STRIPE_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(PaymentConfig::from_env())
    }

    /// Build the service from an explicit configuration. Never fails.
    pub fn new(config: PaymentConfig) -> Self {
        let attempt = if config.enabled {
            Some(connect(&config))
        } else {
            None
        };

        Self {
            binding: Binding::select(LABELS, attempt, simulated_backend),
            webhook_tolerance: config.webhook_tolerance_duration(),
            webhook_secret: config.webhook_secret,
            publishable_key: config.publishable_key,
            unverified_warning: Arc::new(Once::new()),
        }
    }

    /// Simulated payments, without reading the environment.
    pub fn simulated() -> Self {
        Self::with_backend(simulated_backend(), FacadeMode::Degraded)
    }

    /// Use a custom backend.
    pub fn with_backend(backend: Arc<dyn PaymentBackend>, mode: FacadeMode) -> Self {
        let binding = match mode {
            FacadeMode::Live => Binding::live(backend),
            FacadeMode::Degraded => Binding::degraded(backend, DegradedReason::Disabled),
        };
        let config = PaymentConfig::default();
        Self {
            binding,
            webhook_secret: None,
            webhook_tolerance: config.webhook_tolerance_duration(),
            publishable_key: None,
            unverified_warning: Arc::new(Once::new()),
        }
    }

    /// Set the webhook signing secret used when none is passed per call.
    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = Some(SecretString::from(secret.into()));
        self
    }

    pub fn mode(&self) -> FacadeMode {
        self.binding.mode()
    }

    pub fn is_live(&self) -> bool {
        self.binding.is_live()
    }

    pub fn binding(&self) -> &Binding<dyn PaymentBackend> {
        &self.binding
    }

    /// Whether returned records are test data (simulated, or a Stripe test key).
    pub fn is_test_mode(&self) -> bool {
        self.backend().is_test_mode()
    }

    /// `STRIPE_PUBLISHABLE_KEY`, for handing to a frontend.
    pub fn publishable_key(&self) -> Option<&str> {
        self.publishable_key.as_deref()
    }

    fn backend(&self) -> &dyn PaymentBackend {
        self.binding.backend().as_ref()
    }

    pub async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        let result = self.backend().create_payment_intent(request).await;
        log_outcome(result)
    }

    pub async fn retrieve_payment_intent(&self, payment_intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        let result = self.backend().retrieve_payment_intent(payment_intent_id).await;
        log_outcome(result)
    }

    pub async fn create_customer(&self, request: CreateCustomerRequest) -> Result<Customer, PaymentError> {
        let result = self.backend().create_customer(request).await;
        log_outcome(result)
    }

    /// Refund a payment intent, fully when `amount` is `None`.
    pub async fn create_refund(&self, request: CreateRefundRequest) -> Result<Refund, PaymentError> {
        let result = self.backend().create_refund(request).await;
        log_outcome(result)
    }

    /// Check a `Stripe-Signature` header.
    ///
    /// `secret` overrides the configured `STRIPE_WEBHOOK_SECRET`. Every failure,
    /// including a missing secret, is reported as `false`.
    ///
    /// In degraded mode this always returns `true` without checking anything,
    /// so a degraded service must never receive real webhook traffic.
    pub fn verify_webhook_signature(&self, payload: &[u8], signature: &str, secret: Option<&str>) -> bool {
        if !self.is_live() {
            self.unverified_warning.call_once(|| {
                tracing::warn!(
                    target: "failsoft::payment",
                    "Webhook signatures are not verified in simulated mode; do not expose this endpoint to real traffic"
                );
            });
            return true;
        }

        let secret = match secret.or_else(|| self.webhook_secret.as_ref().map(|s| s.expose_secret())) {
            Some(secret) => secret,
            None => {
                tracing::warn!(
                    target: "failsoft::payment",
                    "STRIPE_WEBHOOK_SECRET not set, cannot verify webhook"
                );
                return false;
            }
        };

        match verify_signature(payload, signature, secret, self.webhook_tolerance) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(target: "failsoft::payment", error = %e, "Webhook signature rejected");
                false
            }
        }
    }
}

impl std::fmt::Debug for PaymentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentService")
            .field("mode", &self.mode())
            .field("backend", &self.backend().name())
            .field("webhook_secret_set", &self.webhook_secret.is_some())
            .finish()
    }
}

fn log_outcome<T>(result: Result<T, PaymentError>) -> Result<T, PaymentError> {
    if let Err(ref e) = result {
        tracing::warn!(
            target: "failsoft::payment",
            operation = e.operation,
            error = %e.message,
            "Payment operation failed"
        );
    }
    result
}

fn simulated_backend() -> Arc<dyn PaymentBackend> {
    Arc::new(SimulatedPayments::new())
}

#[cfg(feature = "payments-stripe")]
fn connect(config: &PaymentConfig) -> Result<Connected<dyn PaymentBackend>, SetupError> {
    let key = config
        .secret_key
        .as_ref()
        .ok_or(SetupError::missing("STRIPE_SECRET_KEY", "STRIPE_ENABLED"))?;

    let stripe = StripePayments::new(key.clone())?;
    let detail = stripe.key_mode();
    let backend: Arc<dyn PaymentBackend> = Arc::new(stripe);
    Ok(Connected::new(backend).with_detail(detail))
}

#[cfg(not(feature = "payments-stripe"))]
fn connect(config: &PaymentConfig) -> Result<Connected<dyn PaymentBackend>, SetupError> {
    if config.secret_key.is_none() {
        return Err(SetupError::missing("STRIPE_SECRET_KEY", "STRIPE_ENABLED"));
    }
    Err(SetupError::feature_unavailable("Stripe", "payments-stripe"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::time::{SystemTime, UNIX_EPOCH};

    /// A live backend that declines every request.
    struct DecliningBackend;

    #[async_trait]
    impl PaymentBackend for DecliningBackend {
        async fn create_payment_intent(
            &self,
            _request: CreatePaymentIntentRequest,
        ) -> Result<PaymentIntent, PaymentError> {
            Err(PaymentError::new("create payment intent", "Your card was declined."))
        }

        async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError> {
            Err(PaymentError::new(
                "retrieve payment intent",
                format!("No such payment_intent: '{}'", id),
            ))
        }

        async fn create_customer(&self, _request: CreateCustomerRequest) -> Result<Customer, PaymentError> {
            Err(PaymentError::new("create customer", "Invalid email address"))
        }

        async fn create_refund(&self, _request: CreateRefundRequest) -> Result<Refund, PaymentError> {
            Err(PaymentError::new("create refund", "Charge has already been refunded."))
        }

        fn is_test_mode(&self) -> bool {
            true
        }

        fn name(&self) -> &'static str {
            "declining"
        }
    }

    const SECRET: &str = "whsec_test_secret_12345678901234567890";

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    }

    fn live() -> PaymentService {
        PaymentService::with_backend(Arc::new(DecliningBackend), FacadeMode::Live)
    }

    #[tokio::test]
    async fn test_disabled_returns_simulated_records() {
        let payments = PaymentService::new(PaymentConfig::default());
        assert_eq!(payments.mode(), FacadeMode::Degraded);
        assert!(payments.is_test_mode());

        let intent = payments
            .create_payment_intent(CreatePaymentIntentRequest::new(1000, "usd"))
            .await
            .unwrap();
        assert_eq!(intent.status, PaymentStatus::Succeeded);
        assert_eq!(intent.amount, Some(1000));
        assert_eq!(intent.currency.as_deref(), Some("usd"));
        assert!(intent.test_mode);
    }

    #[tokio::test]
    async fn test_simulated_ids_are_distinct() {
        let payments = PaymentService::simulated();
        let mut ids = HashSet::new();
        for _ in 0..20 {
            let intent = payments
                .create_payment_intent(CreatePaymentIntentRequest::usd(1000))
                .await
                .unwrap();
            assert!(intent.id.starts_with("pi_test_"));
            ids.insert(intent.id);
        }
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn test_enabled_without_key_falls_back() {
        let payments = PaymentService::new(PaymentConfig::default().enabled(true));
        assert_eq!(payments.mode(), FacadeMode::Degraded);
        match payments.binding().degraded_reason() {
            Some(DegradedReason::Fallback(reason)) => assert!(reason.contains("STRIPE_SECRET_KEY")),
            other => panic!("unexpected reason: {:?}", other),
        }
    }

    #[test]
    fn test_enabled_with_malformed_key_falls_back() {
        let config = PaymentConfig::default().enabled(true).secret_key("pk_test_not_a_secret_key");
        let payments = PaymentService::new(config);
        assert_eq!(payments.mode(), FacadeMode::Degraded);
    }

    #[tokio::test]
    async fn test_live_errors_are_returned() {
        let payments = live();

        let err = payments
            .create_payment_intent(CreatePaymentIntentRequest::usd(1000))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to create payment intent: Your card was declined."
        );

        let err = payments.retrieve_payment_intent("pi_missing").await.unwrap_err();
        assert_eq!(err.operation, "retrieve payment intent");
        assert!(err.message.contains("pi_missing"));

        assert!(payments.create_customer(CreateCustomerRequest::new("nope")).await.is_err());
        assert!(payments.create_refund(CreateRefundRequest::new("pi_123")).await.is_err());
    }

    #[test]
    fn test_degraded_webhook_always_valid() {
        let payments = PaymentService::simulated();
        assert!(payments.verify_webhook_signature(b"{}", "garbage", None));
        assert!(payments.verify_webhook_signature(b"anything", "", Some("whsec_x")));
    }

    #[test]
    fn test_live_webhook_verification() {
        let payments = live().with_webhook_secret(SECRET);
        let payload = br#"{"id":"evt_123","type":"payment_intent.succeeded"}"#;
        let timestamp = now();
        let header = format!("t={},v1={}", timestamp, compute_signature(SECRET, timestamp, payload));

        assert!(payments.verify_webhook_signature(payload, &header, None));
        assert!(!payments.verify_webhook_signature(b"{\"tampered\":true}", &header, None));
        assert!(!payments.verify_webhook_signature(payload, "not a header", None));
        assert!(!payments.verify_webhook_signature(payload, &header, Some("whsec_other")));
    }

    #[test]
    fn test_live_webhook_without_secret_is_invalid() {
        let payments = live();
        let timestamp = now();
        let header = format!("t={},v1={}", timestamp, compute_signature(SECRET, timestamp, b"{}"));

        assert!(!payments.verify_webhook_signature(b"{}", &header, None));
        assert!(payments.verify_webhook_signature(b"{}", &header, Some(SECRET)));
    }

    #[test]
    fn test_publishable_key_passthrough() {
        let payments = PaymentService::new(PaymentConfig::default().publishable_key("pk_test_123"));
        assert_eq!(payments.publishable_key(), Some("pk_test_123"));
    }
}
