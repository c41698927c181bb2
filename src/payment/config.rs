use crate::utils::{get_env_with_prefix, non_empty, parse_flag};
use secrecy::SecretString;
use std::time::Duration;

/// Payment (Stripe) configuration
///
/// Secrets are held as [`SecretString`] and never appear in `Debug` output.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Call Stripe instead of returning simulated records
    pub enabled: bool,

    /// Stripe secret key (required when enabled)
    pub secret_key: Option<SecretString>,

    /// Publishable key, passed through for frontends
    pub publishable_key: Option<String>,

    /// Webhook signing secret
    pub webhook_secret: Option<SecretString>,

    /// Maximum age of a webhook signature timestamp (in seconds)
    pub webhook_tolerance_seconds: u64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            secret_key: None,
            publishable_key: None,
            webhook_secret: None,
            webhook_tolerance_seconds: default_webhook_tolerance(),
        }
    }
}

impl PaymentConfig {
    /// Load payment configuration from environment variables
    ///
    /// - `STRIPE_ENABLED`, `STRIPE_SECRET_KEY`
    /// - `STRIPE_PUBLISHABLE_KEY`, `STRIPE_WEBHOOK_SECRET`
    pub fn from_env() -> Self {
        Self::from_lookup(get_env_with_prefix)
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(enabled) = lookup("STRIPE_ENABLED") {
            config.enabled = parse_flag(&enabled);
        }

        config.secret_key = non_empty(lookup("STRIPE_SECRET_KEY")).map(SecretString::from);
        config.publishable_key = non_empty(lookup("STRIPE_PUBLISHABLE_KEY"));
        config.webhook_secret = non_empty(lookup("STRIPE_WEBHOOK_SECRET")).map(SecretString::from);

        config
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn secret_key(mut self, key: impl Into<String>) -> Self {
        self.secret_key = Some(SecretString::from(key.into()));
        self
    }

    pub fn publishable_key(mut self, key: impl Into<String>) -> Self {
        self.publishable_key = Some(key.into());
        self
    }

    pub fn webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = Some(SecretString::from(secret.into()));
        self
    }

    pub fn webhook_tolerance(mut self, tolerance: Duration) -> Self {
        self.webhook_tolerance_seconds = tolerance.as_secs();
        self
    }

    pub fn webhook_tolerance_duration(&self) -> Duration {
        Duration::from_secs(self.webhook_tolerance_seconds)
    }
}

fn default_webhook_tolerance() -> u64 {
    300 // 5 minutes
}
