use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Key/value metadata attached to Stripe objects.
pub type Metadata = HashMap<String, String>;

/// Lifecycle state of a payment
///
/// Pending -> Succeeded | Failed | Canceled, and Succeeded -> Refunded.
/// Transitions are not enforced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
    Canceled,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Refunded => "refunded",
        }
    }

    /// Convert from a Stripe status string.
    ///
    /// `processing` and every `requires_*` state count as pending, as does
    /// anything unrecognised.
    #[must_use]
    pub fn from_stripe(status: &str) -> Self {
        match status {
            "succeeded" => Self::Succeeded,
            "canceled" | "cancelled" => Self::Canceled,
            "failed" => Self::Failed,
            "refunded" => Self::Refunded,
            _ => Self::Pending,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason for a refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundReason {
    /// Duplicate charge.
    Duplicate,
    /// Fraudulent charge.
    Fraudulent,
    /// Requested by customer.
    RequestedByCustomer,
}

impl RefundReason {
    /// Convert to Stripe reason string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duplicate => "duplicate",
            Self::Fraudulent => "fraudulent",
            Self::RequestedByCustomer => "requested_by_customer",
        }
    }

    /// Convert from Stripe reason string.
    #[must_use]
    pub fn from_stripe(reason: &str) -> Option<Self> {
        match reason {
            "duplicate" => Some(Self::Duplicate),
            "fraudulent" => Some(Self::Fraudulent),
            "requested_by_customer" => Some(Self::RequestedByCustomer),
            _ => None,
        }
    }
}

/// A payment intent as returned by either backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Amount in the smallest currency unit. `None` when retrieved in test mode.
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub status: PaymentStatus,
    pub client_secret: Option<String>,
    pub metadata: Metadata,
    /// Whether this record was simulated rather than created by Stripe.
    pub test_mode: bool,
}

/// A customer as returned by either backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Customer {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub metadata: Metadata,
    pub test_mode: bool,
}

/// A refund as returned by either backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Refund {
    pub id: String,
    pub payment_intent: String,
    /// Refunded amount. `None` for a simulated full refund.
    pub amount: Option<i64>,
    pub status: PaymentStatus,
    pub reason: Option<RefundReason>,
    pub test_mode: bool,
}

/// Request to create a payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePaymentIntentRequest {
    /// Amount in the smallest currency unit (cents for USD).
    pub amount: i64,
    /// Three-letter currency code, e.g. `usd`.
    pub currency: String,
    pub metadata: Metadata,
    pub customer_id: Option<String>,
}

impl CreatePaymentIntentRequest {
    pub fn new(amount: i64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
            metadata: Metadata::new(),
            customer_id: None,
        }
    }

    /// A USD payment of `amount` cents.
    pub fn usd(amount: i64) -> Self {
        Self::new(amount, "usd")
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }
}

/// Request to create a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCustomerRequest {
    pub email: String,
    pub name: Option<String>,
    pub metadata: Metadata,
}

impl CreateCustomerRequest {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
            metadata: Metadata::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Request to refund a payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRefundRequest {
    pub payment_intent_id: String,
    /// Amount to refund in cents. If None, refunds the full amount.
    pub amount: Option<i64>,
    pub reason: Option<RefundReason>,
}

impl CreateRefundRequest {
    /// Refund the full amount of a payment intent.
    pub fn new(payment_intent_id: impl Into<String>) -> Self {
        Self {
            payment_intent_id: payment_intent_id.into(),
            amount: None,
            reason: None,
        }
    }

    pub fn amount(mut self, amount: i64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn reason(mut self, reason: RefundReason) -> Self {
        self.reason = Some(reason);
        self
    }
}
