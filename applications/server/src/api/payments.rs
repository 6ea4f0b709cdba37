/// Funding API routes
use crate::{
    api::PageQuery,
    error::{Result, ServerError},
    middleware::AuthenticatedUser,
    services::{ReconcileError, ReconcileOutcome},
    state::AppState,
};
use axum::{
    extract::{Query, State},
    Json,
};
use bloodbridge_checkout::{CheckoutError, NewCheckoutSession};
use bloodbridge_core::{types::major_to_minor, Collection, Document, Filter, Paged, SortOrder};
use serde::{Deserialize, Serialize};

/// Largest single donation accepted, in major units
pub const MAX_DONATION: f64 = 1_000_000.0;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    /// Amount in major currency units
    pub amount: f64,
    pub donor_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutResponse {
    pub session_id: String,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessPaymentRequest {
    pub session_id: String,
}

/// POST /create-payment-checkout
/// Open a hosted checkout for a donation by the caller
pub async fn create_payment_checkout(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Json(req): Json<CreateCheckoutRequest>,
) -> Result<Json<CreateCheckoutResponse>> {
    if !req.amount.is_finite() || req.amount <= 0.0 || req.amount > MAX_DONATION {
        return Err(ServerError::BadRequest(format!(
            "amount must be greater than 0 and at most {}",
            MAX_DONATION
        )));
    }
    let amount_minor = major_to_minor(req.amount);
    if amount_minor < 1 {
        return Err(ServerError::BadRequest(
            "amount is smaller than the currency's minor unit".to_string(),
        ));
    }

    let options = &app_state.checkout_options;
    let request = NewCheckoutSession {
        amount_minor,
        currency: options.currency.clone(),
        product_name: options.product_name.clone(),
        customer_email: auth.email().to_string(),
        donor_name: req.donor_name.filter(|n| !n.trim().is_empty()),
        success_url: options.success_url(),
        cancel_url: options.cancel_url(),
    };

    let session = app_state
        .checkout
        .create_session(&request)
        .await
        .map_err(|e| match e {
            e if e.is_transient() => ServerError::UpstreamUnavailable(e.to_string()),
            CheckoutError::Api { status, message } => {
                ServerError::Internal(format!("checkout rejected ({}): {}", status, message))
            }
            e => ServerError::Checkout(e),
        })?;

    tracing::info!(
        session_id = %session.id,
        email = %auth.email(),
        amount_minor,
        "Checkout session opened"
    );

    Ok(Json(CreateCheckoutResponse {
        session_id: session.id,
        url: session.url,
    }))
}

/// POST /success-payment
/// Record a completed checkout, at most once per transaction
pub async fn success_payment(
    State(app_state): State<AppState>,
    _auth: AuthenticatedUser,
    Json(req): Json<SuccessPaymentRequest>,
) -> Result<Json<ReconcileOutcome>> {
    let outcome = app_state
        .reconciler
        .reconcile(req.session_id.trim())
        .await
        .map_err(|e| match e {
            ReconcileError::NotFound(id) => {
                ServerError::NotFound(format!("Checkout session not found: {}", id))
            }
            ReconcileError::UpstreamUnavailable(msg) => ServerError::UpstreamUnavailable(msg),
            e @ (ReconcileError::ProcessorRejected(_) | ReconcileError::StoreWriteFailed(_)) => {
                ServerError::Internal(e.to_string())
            }
        })?;

    Ok(Json(outcome))
}

/// GET /all-funds
/// Recorded payments, newest first
pub async fn all_funds(
    State(app_state): State<AppState>,
    _auth: AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paged<Document>>> {
    let pagination = query.pagination();
    let filter = Filter::new();

    let total = app_state.store.count(Collection::Payments, &filter).await?;
    let payments = app_state
        .store
        .find_many(
            Collection::Payments,
            &filter,
            pagination.find_options(SortOrder::Newest),
        )
        .await?;

    Ok(Json(Paged::new(payments, total, pagination)))
}
