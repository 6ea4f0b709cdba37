/// Authentication middleware
use crate::{error::ServerError, services::IdentityVerifier};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Verified email of the caller, stored in request extensions by
/// [`auth_middleware`]. Can be used as an extractor in handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

impl AuthenticatedUser {
    pub fn email(&self) -> &str {
        &self.0
    }
}

/// Middleware that verifies the bearer token in the Authorization header
pub async fn auth_middleware(
    State(verifier): State<Arc<dyn IdentityVerifier>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    // Extract Authorization header
    let auth_header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ServerError::Unauthenticated("missing authorization header".into()))?;

    // Scheme names are case-insensitive
    let token = auth_header
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("Bearer"))
        .map(|(_, token)| token.trim())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ServerError::Unauthenticated("malformed authorization header".into()))?;

    // Verify token
    let identity = verifier
        .verify(token)
        .await
        .map_err(|e| ServerError::Unauthenticated(e.to_string()))?;

    tracing::debug!(email = %identity.email, "Request authenticated");

    // Insert the verified email into request extensions
    request
        .extensions_mut()
        .insert(AuthenticatedUser(identity.email));

    Ok(next.run(request).await)
}

/// Implement FromRequestParts so AuthenticatedUser can be used as an extractor
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ServerError::Unauthenticated("not authenticated".to_string()))
    }
}
