use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::database::repository::{Repository, TenantOwned};
use crate::filter::FilterData;
use crate::handlers::dispatch;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::AppState;

/// POST /api/find/:collection - filtered search
pub async fn find_post(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(filter_data): Json<FilterData>,
) -> ApiResult<Value> {
    dispatch!(collection, search(&state, filter_data))
}

/// DELETE /api/find/:collection - filtered bulk archive
pub async fn find_delete(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(filter_data): Json<FilterData>,
) -> ApiResult<Value> {
    dispatch!(collection, archive_matching(&state, filter_data))
}

async fn search<T: TenantOwned>(state: &AppState, filter_data: FilterData) -> ApiResult<Value> {
    let rows = Repository::<T>::new(state.db.clone()).select_any(filter_data).await?;
    Ok(ApiResponse::success(serde_json::to_value(rows)?))
}

async fn archive_matching<T: TenantOwned>(
    state: &AppState,
    filter_data: FilterData,
) -> ApiResult<Value> {
    let rows = Repository::<T>::new(state.db.clone()).archive_any(filter_data).await?;
    Ok(ApiResponse::success(serde_json::to_value(rows)?))
}
