/// Dashboard statistics
use crate::{api::access, error::Result, middleware::AuthenticatedUser, state::AppState};
use axum::{extract::State, Json};
use bloodbridge_core::{fields, Collection, Filter, Role};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_donors: u64,
    pub total_requests: u64,
    /// Sum of recorded payments, in major currency units
    pub total_funding: f64,
}

/// GET /stats
/// Donor, request and funding totals (staff only)
pub async fn stats(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<StatsResponse>> {
    access::require_staff(&app_state, &auth).await?;

    let total_donors = app_state
        .store
        .count(
            Collection::Users,
            &Filter::new().eq(fields::ROLE, Role::Donor.as_str()),
        )
        .await?;
    let total_requests = app_state
        .store
        .count(Collection::Requests, &Filter::new())
        .await?;
    let total_funding = app_state
        .store
        .sum_field(Collection::Payments, fields::AMOUNT)
        .await?;

    Ok(Json(StatsResponse {
        total_donors,
        total_requests,
        total_funding,
    }))
}
