//! Live Stripe backend.
//!
//! Parameters are forwarded verbatim and any failure, whether Stripe rejected
//! the request or it never arrived, is reported as one [`PaymentError`].

use super::{
    CreateCustomerRequest, CreatePaymentIntentRequest, CreateRefundRequest, Customer, Metadata,
    PaymentError, PaymentIntent, PaymentStatus, Refund, RefundReason,
};
use crate::error::SetupError;
use crate::traits::payment::PaymentBackend;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;

const CREATE_PAYMENT_INTENT: &str = "create payment intent";
const RETRIEVE_PAYMENT_INTENT: &str = "retrieve payment intent";
const CREATE_CUSTOMER: &str = "create customer";
const CREATE_REFUND: &str = "create refund";

/// Validate a Stripe API key format.
///
/// Valid formats:
/// - `sk_test_*` - Test mode secret key
/// - `sk_live_*` - Live mode secret key
/// - `rk_test_*` - Test mode restricted key
/// - `rk_live_*` - Live mode restricted key
pub(crate) fn validate_api_key(key: &str) -> Result<(), SetupError> {
    const MIN_KEY_LENGTH: usize = 20;

    if key.len() < MIN_KEY_LENGTH {
        return Err(SetupError::invalid_credential(format!(
            "Stripe API key too short (minimum {} characters)",
            MIN_KEY_LENGTH
        )));
    }

    let valid_prefixes = ["sk_test_", "sk_live_", "rk_test_", "rk_live_"];
    if !valid_prefixes.iter().any(|prefix| key.starts_with(prefix)) {
        return Err(SetupError::invalid_credential(
            "Stripe API key must start with sk_test_, sk_live_, rk_test_, or rk_live_",
        ));
    }

    Ok(())
}

/// Convert between a Stripe type and ours through their shared JSON form.
///
/// Used for enums and optional fields whose Rust shape differs between
/// `async-stripe` releases while the wire form does not.
fn recast<T: DeserializeOwned>(value: &impl Serialize) -> Option<T> {
    serde_json::to_value(value)
        .ok()
        .and_then(|json| serde_json::from_value(json).ok())
}

fn stripe_error(operation: &'static str, err: stripe::StripeError) -> PaymentError {
    let message = match err {
        stripe::StripeError::Stripe(request_error) => request_error
            .message
            .unwrap_or_else(|| format!("Stripe returned HTTP {}", request_error.http_status)),
        other => other.to_string(),
    };
    PaymentError::new(operation, message)
}

/// Stripe payment processing
#[derive(Clone)]
pub struct StripePayments {
    client: stripe::Client,
    api_key: SecretString,
}

impl StripePayments {
    /// Create a client. The key format is checked; no request is made.
    pub fn new(api_key: SecretString) -> Result<Self, SetupError> {
        validate_api_key(api_key.expose_secret())?;

        let client = stripe::Client::new(api_key.expose_secret()).with_app_info(
            env!("CARGO_PKG_NAME").to_string(),
            Some(env!("CARGO_PKG_VERSION").to_string()),
            None,
        );

        Ok(Self { client, api_key })
    }

    /// Check if the client is using a test mode API key.
    pub fn is_test_key(&self) -> bool {
        let key = self.api_key.expose_secret();
        key.starts_with("sk_test_") || key.starts_with("rk_test_")
    }

    /// Label for the startup notice.
    pub fn key_mode(&self) -> &'static str {
        if self.is_test_key() {
            "TEST mode"
        } else {
            "LIVE mode - real money"
        }
    }

    fn intent_from_stripe(intent: stripe::PaymentIntent) -> PaymentIntent {
        let status: Option<String> = recast(&intent.status);
        PaymentIntent {
            id: intent.id.to_string(),
            amount: Some(intent.amount),
            currency: recast(&intent.currency),
            status: status
                .as_deref()
                .map(PaymentStatus::from_stripe)
                .unwrap_or(PaymentStatus::Pending),
            client_secret: intent.client_secret,
            metadata: recast::<Option<Metadata>>(&intent.metadata)
                .flatten()
                .unwrap_or_default(),
            test_mode: false,
        }
    }
}

// Debug implementation that doesn't expose the API key
impl std::fmt::Debug for StripePayments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripePayments")
            .field("is_test_key", &self.is_test_key())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PaymentBackend for StripePayments {
    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        let currency: stripe::Currency = recast(&request.currency.to_ascii_lowercase())
            .ok_or_else(|| {
                PaymentError::new(
                    CREATE_PAYMENT_INTENT,
                    format!("Invalid currency: {}", request.currency),
                )
            })?;

        let mut params = stripe::CreatePaymentIntent::new(request.amount, currency);
        params.metadata = Some(request.metadata);

        if let Some(ref customer_id) = request.customer_id {
            let customer_id: stripe::CustomerId = customer_id.parse().map_err(|_| {
                PaymentError::new(
                    CREATE_PAYMENT_INTENT,
                    format!("Invalid customer ID: {}", customer_id),
                )
            })?;
            params.customer = Some(customer_id);
        }

        let intent = stripe::PaymentIntent::create(&self.client, params)
            .await
            .map_err(|e| stripe_error(CREATE_PAYMENT_INTENT, e))?;

        Ok(Self::intent_from_stripe(intent))
    }

    async fn retrieve_payment_intent(&self, payment_intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        let id: stripe::PaymentIntentId = payment_intent_id.parse().map_err(|_| {
            PaymentError::new(
                RETRIEVE_PAYMENT_INTENT,
                format!("Invalid payment intent ID: {}", payment_intent_id),
            )
        })?;

        let intent = stripe::PaymentIntent::retrieve(&self.client, &id, &[])
            .await
            .map_err(|e| stripe_error(RETRIEVE_PAYMENT_INTENT, e))?;

        Ok(Self::intent_from_stripe(intent))
    }

    async fn create_customer(&self, request: CreateCustomerRequest) -> Result<Customer, PaymentError> {
        let mut params = stripe::CreateCustomer::new();
        params.email = Some(&request.email);
        if let Some(ref name) = request.name {
            params.name = Some(name);
        }
        params.metadata = Some(request.metadata.clone());

        let customer = stripe::Customer::create(&self.client, params)
            .await
            .map_err(|e| stripe_error(CREATE_CUSTOMER, e))?;

        Ok(Customer {
            id: customer.id.to_string(),
            email: customer.email,
            name: customer.name,
            metadata: recast::<Option<Metadata>>(&customer.metadata)
                .flatten()
                .unwrap_or_default(),
            test_mode: false,
        })
    }

    async fn create_refund(&self, request: CreateRefundRequest) -> Result<Refund, PaymentError> {
        let intent_id: stripe::PaymentIntentId = request.payment_intent_id.parse().map_err(|_| {
            PaymentError::new(
                CREATE_REFUND,
                format!("Invalid payment intent ID: {}", request.payment_intent_id),
            )
        })?;

        let mut params = stripe::CreateRefund::new();
        params.payment_intent = Some(intent_id);
        params.amount = request.amount;
        if let Some(reason) = request.reason {
            params.reason = recast(&reason.as_str());
        }

        let refund = stripe::Refund::create(&self.client, params)
            .await
            .map_err(|e| stripe_error(CREATE_REFUND, e))?;

        let status: Option<String> = recast::<Option<String>>(&refund.status).flatten();
        let reason: Option<String> = recast::<Option<String>>(&refund.reason).flatten();

        Ok(Refund {
            id: refund.id.to_string(),
            payment_intent: refund
                .payment_intent
                .as_ref()
                .map(|intent| intent.id().to_string())
                .unwrap_or(request.payment_intent_id),
            amount: Some(refund.amount),
            status: status
                .as_deref()
                .map(PaymentStatus::from_stripe)
                .unwrap_or(PaymentStatus::Pending),
            reason: reason.as_deref().and_then(RefundReason::from_stripe),
            test_mode: false,
        })
    }

    fn is_test_mode(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "stripe"
    }
}
