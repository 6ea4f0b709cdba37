/// Donation requests API routes
use crate::{
    api::{access, blood_group_param, into_document, non_empty, timestamp_now, PageQuery},
    error::{Result, ServerError},
    middleware::AuthenticatedUser,
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use bloodbridge_core::{
    fields, str_field, strip_fields, Collection, DeleteResult, Document,
    DonationStatus, Filter, InsertOneResult, Paged, Pagination, Role, SortOrder, UpdateResult,
};
use serde::Deserialize;
use serde_json::Value;

/// Fields the server owns on a request
const REQUEST_PROTECTED_FIELDS: &[&str] = &[
    fields::ID,
    fields::REQUESTER_EMAIL,
    fields::DONATION_STATUS,
    fields::DONOR_NAME,
    fields::DONOR_EMAIL,
    fields::CREATED_AT,
];

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RequestSearchQuery {
    #[serde(rename = "bloodGroup")]
    pub blood_group: Option<String>,
    pub district: Option<String>,
    pub upazila: Option<String>,
    pub status: Option<String>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SetRequestStatusQuery {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DonateRequest {
    #[serde(rename = "donorName")]
    pub donor_name: Option<String>,
}

fn parse_status(raw: Option<&String>) -> Result<Option<DonationStatus>> {
    Ok(non_empty(raw)
        .map(str::parse::<DonationStatus>)
        .transpose()?)
}

async fn paged_requests(
    app_state: &AppState,
    filter: Filter,
    pagination: Pagination,
) -> Result<Json<Paged<Document>>> {
    let total = app_state.store.count(Collection::Requests, &filter).await?;
    let requests = app_state
        .store
        .find_many(
            Collection::Requests,
            &filter,
            pagination.find_options(SortOrder::Newest),
        )
        .await?;

    Ok(Json(Paged::new(requests, total, pagination)))
}

async fn find_request(app_state: &AppState, id: &str) -> Result<Document> {
    app_state
        .store
        .find_one(Collection::Requests, &Filter::by_id(id))
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("Donation request not found: {}", id)))
}

fn status_of(request: &Document) -> Result<DonationStatus> {
    str_field(request, fields::DONATION_STATUS)
        .unwrap_or(DonationStatus::Pending.as_str())
        .parse()
        .map_err(|_| ServerError::Conflict("request has an unknown status".to_string()))
}

/// POST /requests
/// Create a donation request owned by the caller
pub async fn create_request(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Json(body): Json<Value>,
) -> Result<Json<InsertOneResult>> {
    let caller = access::require_active(&app_state, &auth).await?;

    let mut request = into_document(body)?;
    strip_fields(
        &mut request,
        &[fields::ID, fields::DONOR_NAME, fields::DONOR_EMAIL],
    );
    request.insert(
        fields::REQUESTER_EMAIL.to_string(),
        Value::String(caller.email.clone()),
    );
    request.insert(
        fields::DONATION_STATUS.to_string(),
        Value::from(DonationStatus::Pending.as_str()),
    );
    request.insert(fields::CREATED_AT.to_string(), timestamp_now());

    let result = app_state
        .store
        .insert_one(Collection::Requests, request)
        .await?;
    tracing::info!(requester = %caller.email, id = %result.inserted_id, "Donation request created");

    Ok(Json(result))
}

/// GET /all-requests
/// Every request, newest first (staff only)
pub async fn all_requests(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Paged<Document>>> {
    access::require_staff(&app_state, &auth).await?;

    let status = parse_status(query.status.as_ref())?;
    let filter = Filter::new().eq_opt(fields::DONATION_STATUS, status.map(|s| s.as_str()));

    paged_requests(&app_state, filter, Pagination::new(query.page, query.size)).await
}

/// GET /my-request
/// The caller's own requests, newest first
pub async fn my_requests(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Paged<Document>>> {
    let status = parse_status(query.status.as_ref())?;
    let filter = Filter::new()
        .eq(fields::REQUESTER_EMAIL, auth.email())
        .eq_opt(fields::DONATION_STATUS, status.map(|s| s.as_str()));

    paged_requests(&app_state, filter, Pagination::new(query.page, query.size)).await
}

/// GET /search-requests
/// Requests by blood group, location and status
pub async fn search_requests(
    State(app_state): State<AppState>,
    Query(query): Query<RequestSearchQuery>,
) -> Result<Json<Paged<Document>>> {
    let blood_group = blood_group_param(query.blood_group.as_ref())?;
    let status = parse_status(query.status.as_ref())?;

    let filter = Filter::new()
        .eq_opt(fields::BLOOD_GROUP, blood_group.map(|g| g.as_str()))
        .eq_opt(fields::DISTRICT, non_empty(query.district.as_ref()))
        .eq_opt(fields::UPAZILA, non_empty(query.upazila.as_ref()))
        .eq_opt(fields::DONATION_STATUS, status.map(|s| s.as_str()));

    paged_requests(&app_state, filter, Pagination::new(query.page, query.size)).await
}

/// GET /pending-requests
/// Requests still waiting for a donor
pub async fn pending_requests(
    State(app_state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paged<Document>>> {
    let filter = Filter::new().eq(fields::DONATION_STATUS, DonationStatus::Pending.as_str());
    paged_requests(&app_state, filter, query.pagination()).await
}

/// GET /details/:id
/// A single request
pub async fn request_details(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    _auth: AuthenticatedUser,
) -> Result<Json<Document>> {
    Ok(Json(find_request(&app_state, &id).await?))
}

/// PATCH /donate-blood/:id
/// Claim a pending request as its donor
pub async fn donate_blood(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    body: Option<Json<DonateRequest>>,
) -> Result<Json<UpdateResult>> {
    let caller = access::require_active(&app_state, &auth).await?;

    let request = find_request(&app_state, &id).await?;
    if status_of(&request)? != DonationStatus::Pending {
        return Err(ServerError::Conflict(
            "request is no longer pending".to_string(),
        ));
    }

    let donor_name = body
        .and_then(|Json(b)| b.donor_name)
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .or_else(|| caller.name().map(str::to_string));

    let mut patch = Document::new();
    patch.insert(
        fields::DONATION_STATUS.to_string(),
        Value::from(DonationStatus::InProgress.as_str()),
    );
    patch.insert(
        fields::DONOR_EMAIL.to_string(),
        Value::String(caller.email.clone()),
    );
    if let Some(name) = donor_name {
        patch.insert(fields::DONOR_NAME.to_string(), Value::String(name));
    }

    // Only claim if nobody else did in the meantime
    let filter = Filter::by_id(id.as_str())
        .eq(fields::DONATION_STATUS, DonationStatus::Pending.as_str());
    let result = app_state
        .store
        .update_one(Collection::Requests, &filter, patch)
        .await?;
    if result.matched_count == 0 {
        return Err(ServerError::Conflict(
            "request is no longer pending".to_string(),
        ));
    }

    tracing::info!(id = %id, donor = %caller.email, "Donation request claimed");
    Ok(Json(result))
}

/// DELETE /delete-my-request/:id
/// Delete one of the caller's own requests
pub async fn delete_my_request(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<DeleteResult>> {
    let filter = Filter::by_id(id.as_str()).eq(fields::REQUESTER_EMAIL, auth.email());
    let result = app_state
        .store
        .delete_one(Collection::Requests, &filter)
        .await?;
    if result.deleted_count == 0 {
        return Err(ServerError::NotFound(format!(
            "Donation request not found: {}",
            id
        )));
    }

    tracing::info!(id = %id, requester = %auth.email(), "Donation request deleted");
    Ok(Json(result))
}

/// PUT /update/:id
/// Edit a request's details (owner or admin)
pub async fn update_request(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Json(body): Json<Value>,
) -> Result<Json<UpdateResult>> {
    let mut patch = into_document(body)?;
    strip_fields(&mut patch, REQUEST_PROTECTED_FIELDS);
    if patch.is_empty() {
        return Err(ServerError::BadRequest("no updatable fields".to_string()));
    }

    let request = find_request(&app_state, &id).await?;
    if str_field(&request, fields::REQUESTER_EMAIL) != Some(auth.email()) {
        let caller = access::load_caller(&app_state, &auth).await?;
        if caller.role != Role::Admin {
            return Err(ServerError::Forbidden(
                "only the requester or an admin may edit this request".to_string(),
            ));
        }
    }

    let result = app_state
        .store
        .update_one(Collection::Requests, &Filter::by_id(id.as_str()), patch)
        .await?;
    if result.matched_count == 0 {
        return Err(ServerError::NotFound(format!(
            "Donation request not found: {}",
            id
        )));
    }

    Ok(Json(result))
}

/// PATCH /update/request/status?id=&status=
/// Move a request through its lifecycle
pub async fn update_request_status(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<SetRequestStatusQuery>,
) -> Result<Json<UpdateResult>> {
    let next: DonationStatus = query.status.parse()?;
    let request = find_request(&app_state, &query.id).await?;

    let is_owner = str_field(&request, fields::REQUESTER_EMAIL) == Some(auth.email());
    let owner_may_set = matches!(next, DonationStatus::Done | DonationStatus::Canceled);
    if !(is_owner && owner_may_set) {
        access::require_staff(&app_state, &auth).await?;
    }

    let current = status_of(&request)?;
    if !current.can_transition_to(next) {
        return Err(ServerError::Conflict(format!(
            "cannot move request from {} to {}",
            current, next
        )));
    }

    let mut patch = Document::new();
    patch.insert(
        fields::DONATION_STATUS.to_string(),
        Value::from(next.as_str()),
    );

    let filter = Filter::by_id(query.id.as_str()).eq(fields::DONATION_STATUS, current.as_str());
    let result = app_state
        .store
        .update_one(Collection::Requests, &filter, patch)
        .await?;
    if result.matched_count == 0 {
        return Err(ServerError::Conflict(
            "request status changed concurrently".to_string(),
        ));
    }

    tracing::info!(id = %query.id, from = %current, to = %next, "Donation request status updated");
    Ok(Json(result))
}
