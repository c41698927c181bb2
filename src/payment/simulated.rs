use super::{
    CreateCustomerRequest, CreatePaymentIntentRequest, CreateRefundRequest, Customer, PaymentError,
    PaymentIntent, PaymentStatus, Refund,
};
use crate::traits::payment::PaymentBackend;
use async_trait::async_trait;
use rand::RngCore;
use rand::rngs::OsRng;

/// Client secret returned on every simulated payment intent.
pub const SIMULATED_CLIENT_SECRET: &str = "test_secret";

/// Generate `<prefix>_test_<24 hex chars>` from 12 OS-random bytes.
pub(crate) fn simulated_id(prefix: &str) -> String {
    let mut bytes = [0u8; 12];
    OsRng.fill_bytes(&mut bytes);
    format!("{}_test_{}", prefix, hex::encode(bytes))
}

/// Payment processing without a processor
///
/// Every operation succeeds immediately with a freshly generated record.
/// Nothing is validated or stored: retrieving an intent simply echoes the id.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedPayments;

impl SimulatedPayments {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentBackend for SimulatedPayments {
    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        Ok(PaymentIntent {
            id: simulated_id("pi"),
            amount: Some(request.amount),
            currency: Some(request.currency),
            status: PaymentStatus::Succeeded,
            client_secret: Some(SIMULATED_CLIENT_SECRET.to_string()),
            metadata: request.metadata,
            test_mode: true,
        })
    }

    async fn retrieve_payment_intent(&self, payment_intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        Ok(PaymentIntent {
            id: payment_intent_id.to_string(),
            amount: None,
            currency: None,
            status: PaymentStatus::Succeeded,
            client_secret: None,
            metadata: Default::default(),
            test_mode: true,
        })
    }

    async fn create_customer(&self, request: CreateCustomerRequest) -> Result<Customer, PaymentError> {
        Ok(Customer {
            id: simulated_id("cus"),
            email: Some(request.email),
            name: request.name,
            metadata: request.metadata,
            test_mode: true,
        })
    }

    async fn create_refund(&self, request: CreateRefundRequest) -> Result<Refund, PaymentError> {
        Ok(Refund {
            id: simulated_id("re"),
            payment_intent: request.payment_intent_id,
            amount: request.amount,
            status: PaymentStatus::Succeeded,
            reason: request.reason,
            test_mode: true,
        })
    }

    fn is_test_mode(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::RefundReason;

    #[test]
    fn test_simulated_id_format() {
        let id = simulated_id("pi");
        assert!(id.starts_with("pi_test_"));

        let suffix = &id["pi_test_".len()..];
        assert_eq!(suffix.len(), 24);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_payment_intent_echoes_request() {
        let payments = SimulatedPayments::new();
        let intent = payments
            .create_payment_intent(CreatePaymentIntentRequest::usd(1000).metadata("order_id", "123"))
            .await
            .unwrap();

        assert!(intent.id.starts_with("pi_test_"));
        assert_eq!(intent.amount, Some(1000));
        assert_eq!(intent.currency.as_deref(), Some("usd"));
        assert_eq!(intent.status, PaymentStatus::Succeeded);
        assert_eq!(intent.client_secret.as_deref(), Some("test_secret"));
        assert_eq!(intent.metadata.get("order_id").map(String::as_str), Some("123"));
        assert!(intent.test_mode);
    }

    #[tokio::test]
    async fn test_no_input_validation() {
        let payments = SimulatedPayments::new();
        let intent = payments
            .create_payment_intent(CreatePaymentIntentRequest::new(-5, "not-a-currency"))
            .await
            .unwrap();
        assert_eq!(intent.amount, Some(-5));
        assert_eq!(intent.status, PaymentStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_retrieve_echoes_id() {
        let payments = SimulatedPayments::new();
        let intent = payments.retrieve_payment_intent("pi_anything").await.unwrap();

        assert_eq!(intent.id, "pi_anything");
        assert_eq!(intent.status, PaymentStatus::Succeeded);
        assert_eq!(intent.amount, None);
        assert_eq!(intent.currency, None);
    }

    #[tokio::test]
    async fn test_customer_and_refund() {
        let payments = SimulatedPayments::new();
        let customer = payments
            .create_customer(CreateCustomerRequest::new("user@example.com").name("Ada"))
            .await
            .unwrap();
        assert!(customer.id.starts_with("cus_test_"));
        assert_eq!(customer.email.as_deref(), Some("user@example.com"));
        assert_eq!(customer.name.as_deref(), Some("Ada"));

        let refund = payments
            .create_refund(CreateRefundRequest::new("pi_123").reason(RefundReason::Duplicate))
            .await
            .unwrap();
        assert!(refund.id.starts_with("re_test_"));
        assert_eq!(refund.payment_intent, "pi_123");
        assert_eq!(refund.amount, None);
        assert_eq!(refund.reason, Some(RefundReason::Duplicate));
        assert_eq!(refund.status, PaymentStatus::Succeeded);
    }
}
