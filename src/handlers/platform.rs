use axum::extract::State;

use crate::middleware::response::{ApiResponse, ApiResult};
use crate::tenant::Tenant;
use crate::AppState;

/// GET /platform/tenants - tenant directory listing for operators.
///
/// Reached through the administrative path allowlist, so it works from any
/// host without resolving a tenant first.
pub async fn tenant_list(State(state): State<AppState>) -> ApiResult<Vec<Tenant>> {
    let tenants = state.directory.list().await?;
    Ok(ApiResponse::success(tenants))
}
