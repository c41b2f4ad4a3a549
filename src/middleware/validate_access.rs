use axum::{extract::Request, middleware::Next, response::Response};

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::tenant::context;
use crate::tenant::TenantError;

/// Rejects callers whose home tenant differs from the resolved one.
///
/// Only applies when both sides name a tenant: anonymous callers and
/// tenantless platform operators pass, and administrative scopes have no
/// resolved tenant to mismatch against.
pub async fn validate_access(request: Request, next: Next) -> Result<Response, ApiError> {
    let caller_tenant = request.extensions().get::<AuthUser>().and_then(|user| user.tenant_id);

    if let (Some(caller), Some(resolved)) = (caller_tenant, context::current_tenant()) {
        if caller != resolved {
            return Err(TenantError::Mismatch { caller, resolved }.into());
        }
    }

    Ok(next.run(request).await)
}
