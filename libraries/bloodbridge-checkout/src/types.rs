//! Request and response types for hosted checkout sessions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Placeholder the processor substitutes with the session id in the
/// success redirect.
pub const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Connection settings for the payment processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// API base URL (e.g., "https://api.stripe.com")
    pub api_base: String,
    /// Secret API key, sent as a bearer token
    pub secret_key: String,
}

impl CheckoutConfig {
    /// Create a config pointing at the production API.
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            api_base: "https://api.stripe.com".to_string(),
            secret_key: secret_key.into(),
        }
    }

    /// Override the API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

/// A one-off donation to open a hosted checkout for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCheckoutSession {
    /// Amount in minor currency units (cents)
    pub amount_minor: i64,
    /// Three-letter currency code, lowercase
    pub currency: String,
    /// Line item label shown on the checkout page
    pub product_name: String,
    /// Payer email; prefilled and copied into metadata
    pub customer_email: String,
    pub donor_name: Option<String>,
    /// Redirect after payment; should contain [`SESSION_ID_PLACEHOLDER`]
    pub success_url: String,
    pub cancel_url: String,
}

impl NewCheckoutSession {
    /// Form-encoded parameters for the create-session call.
    pub(crate) fn form_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("mode".to_string(), "payment".to_string()),
            (
                "line_items[0][price_data][currency]".to_string(),
                self.currency.clone(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                self.product_name.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                self.amount_minor.to_string(),
            ),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("customer_email".to_string(), self.customer_email.clone()),
            (
                "metadata[donorEmail]".to_string(),
                self.customer_email.clone(),
            ),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
        ];

        if let Some(name) = self.donor_name.as_deref().filter(|n| !n.trim().is_empty()) {
            params.push(("metadata[donorName]".to_string(), name.to_string()));
        }

        params
    }
}

/// Payer details collected on the checkout page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A checkout session as reported by the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted page URL; absent once the session is complete
    #[serde(default)]
    pub url: Option<String>,
    /// Processor transaction id, present once a charge was attempted
    #[serde(default)]
    pub payment_intent: Option<String>,
    /// "paid", "unpaid" or "no_payment_required"
    pub payment_status: String,
    /// Total in minor units
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    /// Whether the processor reports the payment as captured.
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }

    /// The payer's email: the prefilled customer email, then what the payer
    /// entered, then the email recorded in metadata.
    pub fn payer_email(&self) -> Option<&str> {
        let given = |email: Option<_>| email.filter(|e: &&str| !e.is_empty());

        given(self.customer_email.as_deref())
            .or_else(|| {
                given(
                    self.customer_details
                        .as_ref()
                        .and_then(|d| d.email.as_deref()),
                )
            })
            .or_else(|| given(self.metadata.get("donorEmail").map(String::as_str)))
    }

    /// Donor display name from metadata or the checkout page.
    pub fn donor_name(&self) -> Option<&str> {
        self.metadata
            .get("donorName")
            .map(String::as_str)
            .or_else(|| {
                self.customer_details
                    .as_ref()
                    .and_then(|d| d.name.as_deref())
            })
    }
}

/// Processor error envelope: `{"error": {"message": ...}}`
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(json: serde_json::Value) -> CheckoutSession {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_minimal_session_deserializes() {
        let s = session(serde_json::json!({
            "id": "cs_1",
            "payment_status": "unpaid",
            "object": "checkout.session",
            "livemode": false
        }));
        assert_eq!(s.id, "cs_1");
        assert!(!s.is_paid());
        assert!(s.payment_intent.is_none());
        assert!(s.metadata.is_empty());
    }

    #[test]
    fn test_payer_email_fallbacks() {
        let direct = session(serde_json::json!({
            "id": "cs_1",
            "payment_status": "paid",
            "customer_email": "a@b.com",
            "customer_details": {"email": "other@b.com"}
        }));
        assert_eq!(direct.payer_email(), Some("a@b.com"));

        let details = session(serde_json::json!({
            "id": "cs_1",
            "payment_status": "paid",
            "customer_email": null,
            "customer_details": {"email": "c@b.com", "name": "Karim"}
        }));
        assert_eq!(details.payer_email(), Some("c@b.com"));
        assert_eq!(details.donor_name(), Some("Karim"));

        let meta = session(serde_json::json!({
            "id": "cs_1",
            "payment_status": "paid",
            "metadata": {"donorEmail": "m@b.com", "donorName": "Mita"}
        }));
        assert_eq!(meta.payer_email(), Some("m@b.com"));
        assert_eq!(meta.donor_name(), Some("Mita"));

        let none = session(serde_json::json!({"id": "cs_1", "payment_status": "paid"}));
        assert_eq!(none.payer_email(), None);
    }

    #[test]
    fn test_form_params() {
        let new = NewCheckoutSession {
            amount_minor: 2550,
            currency: "usd".into(),
            product_name: "Donation".into(),
            customer_email: "a@b.com".into(),
            donor_name: Some("  ".into()),
            success_url: format!("https://site.test/ok?session_id={SESSION_ID_PLACEHOLDER}"),
            cancel_url: "https://site.test/cancel".into(),
        };
        let params = new.form_params();
        let get = |k: &str| {
            params
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("mode"), Some("payment"));
        assert_eq!(get("line_items[0][price_data][unit_amount]"), Some("2550"));
        assert_eq!(get("line_items[0][quantity]"), Some("1"));
        assert_eq!(get("metadata[donorEmail]"), Some("a@b.com"));
        // Blank names are not sent
        assert_eq!(get("metadata[donorName]"), None);
    }
}
