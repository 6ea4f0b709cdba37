/// Users API routes
use crate::{
    api::{access, blood_group_param, into_document, non_empty, timestamp_now},
    error::{Result, ServerError},
    middleware::AuthenticatedUser,
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use bloodbridge_core::{
    fields, strip_fields, Collection, Document, Filter, InsertOneResult, Paged,
    Pagination, Role, SortOrder, UpdateResult, UserStatus,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fields a profile update may never touch
const PROFILE_PROTECTED_FIELDS: &[&str] = &[
    fields::ID,
    fields::EMAIL,
    fields::ROLE,
    fields::STATUS,
    fields::CREATED_AT,
];

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub status: Option<String>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusQuery {
    pub email: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct SetRoleQuery {
    pub email: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct DonorSearchQuery {
    #[serde(rename = "bloodGroup")]
    pub blood_group: Option<String>,
    pub district: Option<String>,
    pub upazila: Option<String>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role: Role,
    pub status: UserStatus,
}

/// POST /users
/// Register a user. Role and status are always set by the server.
pub async fn create_user(
    State(app_state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<InsertOneResult>> {
    let mut user = into_document(body)?;

    let email = user
        .get(fields::EMAIL)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ServerError::BadRequest("email is required".to_string()))?
        .to_string();

    let existing = app_state
        .store
        .find_one(Collection::Users, &Filter::new().eq(fields::EMAIL, email.as_str()))
        .await?;
    if existing.is_some() {
        return Err(ServerError::Conflict(format!("user {} already exists", email)));
    }

    strip_fields(&mut user, &[fields::ID]);
    user.insert(fields::EMAIL.to_string(), Value::String(email.clone()));
    user.insert(fields::ROLE.to_string(), Value::from(Role::Donor.as_str()));
    user.insert(
        fields::STATUS.to_string(),
        Value::from(UserStatus::Active.as_str()),
    );
    user.insert(fields::CREATED_AT.to_string(), timestamp_now());

    let result = app_state.store.insert_one(Collection::Users, user).await?;
    tracing::info!(email = %email, id = %result.inserted_id, "User registered");

    Ok(Json(result))
}

/// GET /users
/// List users, newest first (admin only)
pub async fn list_users(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Paged<Document>>> {
    access::require_admin(&app_state, &auth).await?;

    let status = non_empty(query.status.as_ref())
        .map(str::parse::<UserStatus>)
        .transpose()?;
    let filter = Filter::new().eq_opt(fields::STATUS, status.map(|s| s.as_str()));

    let pagination = Pagination::new(query.page, query.size);
    let total = app_state.store.count(Collection::Users, &filter).await?;
    let users = app_state
        .store
        .find_many(
            Collection::Users,
            &filter,
            pagination.find_options(SortOrder::Newest),
        )
        .await?;

    Ok(Json(Paged::new(users, total, pagination)))
}

/// GET /users/:email
/// A user's profile (the user themself or staff)
pub async fn get_user(
    Path(email): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Document>> {
    if auth.email() != email {
        access::require_staff(&app_state, &auth).await?;
    }

    let user = app_state
        .store
        .find_one(Collection::Users, &Filter::new().eq(fields::EMAIL, email.as_str()))
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("User not found: {}", email)))?;

    Ok(Json(user))
}

/// GET /users/role/:email
/// Role and status of a user
pub async fn get_user_role(
    Path(email): Path<String>,
    State(app_state): State<AppState>,
) -> Result<Json<RoleResponse>> {
    let user = app_state
        .store
        .find_one(Collection::Users, &Filter::new().eq(fields::EMAIL, email.as_str()))
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("User not found: {}", email)))?;

    Ok(Json(RoleResponse {
        role: access::role_of(&user),
        status: access::status_of(&user),
    }))
}

/// PATCH /update-profile/:email
/// Update the caller's own profile fields
pub async fn update_profile(
    Path(email): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Json(body): Json<Value>,
) -> Result<Json<UpdateResult>> {
    if auth.email() != email {
        return Err(ServerError::Forbidden(
            "profiles can only be updated by their owner".to_string(),
        ));
    }

    let mut patch = into_document(body)?;
    strip_fields(&mut patch, PROFILE_PROTECTED_FIELDS);
    if patch.is_empty() {
        return Err(ServerError::BadRequest("no updatable fields".to_string()));
    }

    let result = app_state
        .store
        .update_one(
            Collection::Users,
            &Filter::new().eq(fields::EMAIL, email.as_str()),
            patch,
        )
        .await?;
    if result.matched_count == 0 {
        return Err(ServerError::NotFound(format!("User not found: {}", email)));
    }

    Ok(Json(result))
}

/// PATCH /update/user/status?email=&status=
/// Block or unblock a user (admin only)
pub async fn update_user_status(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<SetStatusQuery>,
) -> Result<Json<UpdateResult>> {
    access::require_admin(&app_state, &auth).await?;
    let status: UserStatus = query.status.parse()?;

    set_user_field(&app_state, &query.email, fields::STATUS, status.as_str()).await
}

/// PATCH /update/user/role?email=&role=
/// Change a user's role (admin only)
pub async fn update_user_role(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<SetRoleQuery>,
) -> Result<Json<UpdateResult>> {
    access::require_admin(&app_state, &auth).await?;
    let role: Role = query.role.parse()?;

    set_user_field(&app_state, &query.email, fields::ROLE, role.as_str()).await
}

async fn set_user_field(
    app_state: &AppState,
    email: &str,
    field: &str,
    value: &str,
) -> Result<Json<UpdateResult>> {
    let mut patch = Document::new();
    patch.insert(field.to_string(), Value::from(value));

    let result = app_state
        .store
        .update_one(Collection::Users, &Filter::new().eq(fields::EMAIL, email), patch)
        .await?;
    if result.matched_count == 0 {
        return Err(ServerError::NotFound(format!("User not found: {}", email)));
    }

    tracing::info!(email = %email, field = %field, value = %value, "User updated");
    Ok(Json(result))
}

/// GET /search-donors
/// Active donors by blood group and location
pub async fn search_donors(
    State(app_state): State<AppState>,
    Query(query): Query<DonorSearchQuery>,
) -> Result<Json<Paged<Document>>> {
    let blood_group = blood_group_param(query.blood_group.as_ref())?;

    let filter = Filter::new()
        .eq(fields::ROLE, Role::Donor.as_str())
        .eq(fields::STATUS, UserStatus::Active.as_str())
        .eq_opt(fields::BLOOD_GROUP, blood_group.map(|g| g.as_str()))
        .eq_opt(fields::DISTRICT, non_empty(query.district.as_ref()))
        .eq_opt(fields::UPAZILA, non_empty(query.upazila.as_ref()));

    let pagination = Pagination::new(query.page, query.size);
    let total = app_state.store.count(Collection::Users, &filter).await?;
    let donors = app_state
        .store
        .find_many(
            Collection::Users,
            &filter,
            pagination.find_options(SortOrder::Oldest),
        )
        .await?;

    Ok(Json(Paged::new(donors, total, pagination)))
}
