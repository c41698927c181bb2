//! Payment trait for payment processors

use crate::payment::{
    CreateCustomerRequest, CreatePaymentIntentRequest, CreateRefundRequest, Customer,
    PaymentError, PaymentIntent, Refund,
};
use async_trait::async_trait;

/// Payment processor operations
///
/// Implementations do not validate amounts, currencies or state transitions;
/// whatever the processor accepts is accepted.
#[async_trait]
pub trait PaymentBackend: Send + Sync {
    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError>;

    async fn retrieve_payment_intent(&self, payment_intent_id: &str) -> Result<PaymentIntent, PaymentError>;

    async fn create_customer(&self, request: CreateCustomerRequest) -> Result<Customer, PaymentError>;

    async fn create_refund(&self, request: CreateRefundRequest) -> Result<Refund, PaymentError>;

    /// Whether records returned by this backend are test data.
    fn is_test_mode(&self) -> bool;

    /// Short backend name used in logs and health reports.
    fn name(&self) -> &'static str;
}
