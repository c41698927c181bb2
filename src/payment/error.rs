/// A failed payment operation
///
/// Every processor failure (declined card, bad parameter, network error,
/// unparsable id or currency) is reported as this one type, carrying the
/// processor's message as text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Failed to {operation}: {message}")]
pub struct PaymentError {
    /// What was being attempted, e.g. `create payment intent`.
    pub operation: &'static str,
    pub message: String,
}

impl PaymentError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}
