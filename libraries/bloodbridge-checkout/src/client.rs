//! Stripe Checkout client.

use crate::error::{CheckoutError, Result};
use crate::types::{ApiErrorBody, CheckoutConfig, CheckoutSession, NewCheckoutSession};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Creates hosted checkout sessions and looks them up again.
///
/// The server depends on this trait rather than on [`StripeCheckoutClient`]
/// so tests can substitute an in-process fake.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    /// Open a hosted checkout for a single donation.
    async fn create_session(&self, request: &NewCheckoutSession) -> Result<CheckoutSession>;

    /// Fetch the current state of a session by id.
    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession>;
}

/// [`CheckoutGateway`] over the Stripe REST API.
///
/// # Example
///
/// ```ignore
/// use bloodbridge_checkout::{CheckoutConfig, CheckoutGateway, StripeCheckoutClient};
///
/// let client = StripeCheckoutClient::new(CheckoutConfig::new("sk_test_..."))?;
/// let session = client.retrieve_session("cs_test_123").await?;
/// if session.is_paid() {
///     println!("paid by {:?}", session.payer_email());
/// }
/// ```
pub struct StripeCheckoutClient {
    http: Client,
    base_url: String,
    secret_key: String,
}

impl StripeCheckoutClient {
    /// Create a new client with the given configuration.
    pub fn new(config: CheckoutConfig) -> Result<Self> {
        if config.api_base.is_empty() {
            return Err(CheckoutError::InvalidConfig(
                "API base URL cannot be empty".into(),
            ));
        }

        let base_url = config.api_base.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(CheckoutError::InvalidConfig(
                "API base URL must start with http:// or https://".into(),
            ));
        }
        url::Url::parse(&base_url)
            .map_err(|e| CheckoutError::InvalidConfig(format!("API base URL: {}", e)))?;

        if config.secret_key.trim().is_empty() {
            return Err(CheckoutError::InvalidConfig(
                "secret key cannot be empty".into(),
            ));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("BloodBridge/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CheckoutError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            secret_key: config.secret_key,
        })
    }

    /// Get the API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn sessions_url(&self) -> String {
        format!("{}/v1/checkout/sessions", self.base_url)
    }
}

#[async_trait]
impl CheckoutGateway for StripeCheckoutClient {
    async fn create_session(&self, request: &NewCheckoutSession) -> Result<CheckoutSession> {
        if request.amount_minor <= 0 {
            return Err(CheckoutError::Api {
                status: 400,
                message: "amount must be positive".into(),
            });
        }

        let url = self.sessions_url();
        debug!(
            url = %url,
            amount_minor = request.amount_minor,
            currency = %request.currency,
            "Creating checkout session"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&request.form_params())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let session = parse_session(response).await?;
            info!(session_id = %session.id, "Checkout session created");
            Ok(session)
        } else {
            Err(error_from_response(response, None).await)
        }
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession> {
        if !is_valid_session_id(session_id) {
            return Err(CheckoutError::SessionNotFound(session_id.to_string()));
        }

        let url = format!("{}/{}", self.sessions_url(), session_id);
        debug!(url = %url, "Retrieving checkout session");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        if response.status().is_success() {
            parse_session(response).await
        } else {
            Err(error_from_response(response, Some(session_id)).await)
        }
    }
}

/// Session ids are opaque tokens of ASCII letters, digits and underscores.
fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 255
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

async fn parse_session(response: Response) -> Result<CheckoutSession> {
    response
        .json()
        .await
        .map_err(|e| CheckoutError::Parse(format!("Failed to parse checkout session: {}", e)))
}

/// Map a non-success response. `session_id` is set for lookups, where a 404
/// means the session is unknown.
async fn error_from_response(response: Response, session_id: Option<&str>) -> CheckoutError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .ok()
        .and_then(|body| body.error.message)
        .unwrap_or(text);

    match (status, session_id) {
        (StatusCode::NOT_FOUND, Some(id)) => CheckoutError::SessionNotFound(id.to_string()),
        (StatusCode::TOO_MANY_REQUESTS, _) => {
            warn!(status = %status, "Payment processor rate limited the request");
            CheckoutError::Unreachable(format!("rate limited: {}", message))
        }
        (s, _) if s.is_server_error() => {
            warn!(status = %status, error = %message, "Payment processor failed");
            CheckoutError::Unreachable(format!("{}: {}", status, message))
        }
        _ => CheckoutError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_validation() {
        assert!(is_valid_session_id("cs_test_a1B2c3"));
        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id("../../v1/charges"));
        assert!(!is_valid_session_id("cs_1?expand=x"));
        assert!(!is_valid_session_id(&"a".repeat(256)));
    }
}
