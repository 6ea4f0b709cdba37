/// Role and status checks
///
/// Authorization reads the caller's user document by verified email on every
/// gated request, so role and status changes take effect immediately.
use crate::{
    error::{Result, ServerError},
    middleware::AuthenticatedUser,
    state::AppState,
};
use bloodbridge_core::{fields, str_field, Collection, Document, Filter, Role, UserStatus};

/// A registered caller
pub struct Caller {
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub profile: Document,
}

impl Caller {
    pub fn name(&self) -> Option<&str> {
        str_field(&self.profile, fields::NAME).filter(|n| !n.trim().is_empty())
    }
}

/// Role stored on a user document; absent or unknown means donor
pub fn role_of(profile: &Document) -> Role {
    str_field(profile, fields::ROLE)
        .and_then(|r| r.parse().ok())
        .unwrap_or_default()
}

/// Status stored on a user document; absent or unknown means active
pub fn status_of(profile: &Document) -> UserStatus {
    str_field(profile, fields::STATUS)
        .and_then(|s| s.parse().ok())
        .unwrap_or_default()
}

/// Load the caller's user document; unregistered callers are forbidden.
pub async fn load_caller(state: &AppState, auth: &AuthenticatedUser) -> Result<Caller> {
    let profile = state
        .store
        .find_one(Collection::Users, &Filter::new().eq(fields::EMAIL, auth.email()))
        .await?
        .ok_or_else(|| ServerError::Forbidden("caller is not a registered user".to_string()))?;

    Ok(Caller {
        email: auth.email().to_string(),
        role: role_of(&profile),
        status: status_of(&profile),
        profile,
    })
}

/// Caller must be an admin or a volunteer
pub async fn require_staff(state: &AppState, auth: &AuthenticatedUser) -> Result<Caller> {
    let caller = load_caller(state, auth).await?;
    if !caller.role.is_staff() {
        return Err(ServerError::Forbidden("staff access required".to_string()));
    }
    Ok(caller)
}

/// Caller must be an admin
pub async fn require_admin(state: &AppState, auth: &AuthenticatedUser) -> Result<Caller> {
    let caller = load_caller(state, auth).await?;
    if caller.role != Role::Admin {
        return Err(ServerError::Forbidden("admin access required".to_string()));
    }
    Ok(caller)
}

/// Caller must not be blocked
pub async fn require_active(state: &AppState, auth: &AuthenticatedUser) -> Result<Caller> {
    let caller = load_caller(state, auth).await?;
    if caller.status != UserStatus::Active {
        return Err(ServerError::Forbidden("account is blocked".to_string()));
    }
    Ok(caller)
}
