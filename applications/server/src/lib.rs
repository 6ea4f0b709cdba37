//! BloodBridge Server Library
//!
//! Blood-donation coordination server: donor records, donation requests,
//! role-based administration and donation payments.
//!
//! This library exposes the core components for testing purposes.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use routes::create_router;
pub use services::{
    IdentityVerifier, ManagedIdentityVerifier, PaymentReconciler, ReconcileOutcome,
    SharedSecretVerifier,
};
pub use state::{AppState, CheckoutOptions};
