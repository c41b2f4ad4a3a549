use axum::Extension;
use serde_json::{json, Value};

use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::tenant::{context, Tenant};

/// GET /api/whoami - reports the scope this request resolved to.
///
/// Useful for smoke-testing a deployment's host and header wiring without
/// touching any data.
pub async fn whoami(
    tenant: Option<Extension<Tenant>>,
    user: Option<Extension<AuthUser>>,
) -> ApiResult<Value> {
    let scope = context::current().map(|scope| scope.to_string());

    Ok(ApiResponse::success(json!({
        "scope": scope,
        "tenant": tenant.map(|Extension(t)| json!({
            "id": t.id,
            "name": t.name,
            "routing_key": t.routing_key,
            "status": t.status,
        })),
        "user_id": user.map(|Extension(u)| u.user_id),
    })))
}
