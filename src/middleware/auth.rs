use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth;
use crate::error::ApiError;
use crate::tenant::TenantId;

/// Authenticated caller extracted from a bearer token.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub tenant_id: Option<TenantId>,
}

/// Validates the Authorization header when one is present.
///
/// Requests without credentials pass through anonymously; routes that need a
/// caller check for the [`AuthUser`] extension themselves. A malformed or
/// expired token is always a 401, never silently anonymous.
pub async fn authenticate(mut request: Request, next: Next) -> Result<Response, ApiError> {
    if let Some(value) = request.headers().get(header::AUTHORIZATION) {
        let token = bearer_token(value).ok_or_else(|| {
            ApiError::unauthorized("Authorization header must use Bearer token format")
        })?;

        let claims = auth::validate_token(token)?;
        request
            .extensions_mut()
            .insert(AuthUser { user_id: claims.sub, tenant_id: claims.tenant_id });
    }

    Ok(next.run(request).await)
}

fn bearer_token(value: &HeaderValue) -> Option<&str> {
    value
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
