/// Shared application state
use crate::config::PaymentSettings;
use crate::services::{IdentityVerifier, PaymentReconciler};
use bloodbridge_checkout::CheckoutGateway;
use bloodbridge_core::DocumentStore;
use std::sync::Arc;

/// Checkout parameters that do not vary per request
#[derive(Debug, Clone)]
pub struct CheckoutOptions {
    /// Public site origin, without trailing slash
    pub site_domain: String,
    pub currency: String,
    pub product_name: String,
}

impl CheckoutOptions {
    pub fn from_settings(settings: &PaymentSettings) -> Self {
        Self {
            site_domain: settings.site_domain.trim().trim_end_matches('/').to_string(),
            currency: settings.currency.to_ascii_lowercase(),
            product_name: settings.product_name.clone(),
        }
    }

    pub fn success_url(&self) -> String {
        format!(
            "{}/payment-success?session_id={}",
            self.site_domain,
            bloodbridge_checkout::SESSION_ID_PLACEHOLDER
        )
    }

    pub fn cancel_url(&self) -> String {
        format!("{}/funding", self.site_domain)
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub checkout: Arc<dyn CheckoutGateway>,
    pub reconciler: Arc<PaymentReconciler>,
    pub checkout_options: Arc<CheckoutOptions>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityVerifier>,
        checkout: Arc<dyn CheckoutGateway>,
        checkout_options: CheckoutOptions,
    ) -> Self {
        let reconciler = PaymentReconciler::new(Arc::clone(&store), Arc::clone(&checkout))
            .with_fallback_currency(checkout_options.currency.clone());

        Self {
            store,
            identity,
            checkout,
            reconciler: Arc::new(reconciler),
            checkout_options: Arc::new(checkout_options),
        }
    }
}
