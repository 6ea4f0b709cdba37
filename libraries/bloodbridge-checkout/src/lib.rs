//! BloodBridge Checkout
//!
//! Client for the hosted-checkout payment processor.
//!
//! A donation opens a hosted checkout session; after the payer returns, the
//! session is retrieved again to learn whether it was paid and under which
//! transaction id.
//!
//! # Example
//!
//! ```ignore
//! use bloodbridge_checkout::{
//!     CheckoutConfig, CheckoutGateway, NewCheckoutSession, StripeCheckoutClient,
//!     SESSION_ID_PLACEHOLDER,
//! };
//!
//! let client = StripeCheckoutClient::new(CheckoutConfig::new("sk_test_..."))?;
//! let session = client
//!     .create_session(&NewCheckoutSession {
//!         amount_minor: 5000,
//!         currency: "usd".into(),
//!         product_name: "Donation".into(),
//!         customer_email: "donor@example.com".into(),
//!         donor_name: None,
//!         success_url: format!("https://example.com/ok?session_id={SESSION_ID_PLACEHOLDER}"),
//!         cancel_url: "https://example.com/funding".into(),
//!     })
//!     .await?;
//! println!("redirect to {:?}", session.url);
//! ```

mod client;
mod error;
mod types;

pub use client::{CheckoutGateway, StripeCheckoutClient};
pub use error::{CheckoutError, Result};
pub use types::{
    CheckoutConfig, CheckoutSession, CustomerDetails, NewCheckoutSession, SESSION_ID_PLACEHOLDER,
};
