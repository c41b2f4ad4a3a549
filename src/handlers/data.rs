use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::record::Record;
use crate::database::repository::{Repository, TenantOwned};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::handlers::dispatch;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/data/:collection - list records in scope
pub async fn collection_get(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Value> {
    dispatch!(collection, list(&state, query))
}

/// POST /api/data/:collection - create one record or an array of records
pub async fn collection_post(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    dispatch!(collection, create(&state, body))
}

/// PATCH /api/data/:collection - bulk update, each record carrying its id
pub async fn collection_patch(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    dispatch!(collection, update_many(&state, body))
}

/// DELETE /api/data/:collection - bulk archive by id
pub async fn collection_delete(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(ids): Json<Vec<Uuid>>,
) -> ApiResult<Value> {
    dispatch!(collection, archive_many(&state, ids))
}

/// GET /api/data/:collection/:id
pub async fn record_get(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, Uuid)>,
) -> ApiResult<Value> {
    dispatch!(collection, get_one(&state, id))
}

/// PATCH /api/data/:collection/:id
pub async fn record_patch(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, Uuid)>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    dispatch!(collection, update_one(&state, id, body))
}

/// DELETE /api/data/:collection/:id - archive
pub async fn record_delete(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, Uuid)>,
) -> ApiResult<Value> {
    dispatch!(collection, archive_one(&state, id))
}

async fn list<T: TenantOwned>(state: &AppState, query: ListQuery) -> ApiResult<Value> {
    let filter_data =
        FilterData { limit: query.limit, offset: query.offset, ..Default::default() };
    let rows = Repository::<T>::new(state.db.clone()).select_any(filter_data).await?;
    Ok(ApiResponse::success(serde_json::to_value(rows)?))
}

async fn create<T: TenantOwned>(state: &AppState, body: Value) -> ApiResult<Value> {
    let records = Record::from_json_flexible(body)?;
    if records.is_empty() {
        return Err(ApiError::bad_request("Nothing to create"));
    }
    let created = Repository::<T>::new(state.db.clone()).create_all(records).await?;
    Ok(ApiResponse::created(serde_json::to_value(created)?))
}

async fn update_many<T: TenantOwned>(state: &AppState, body: Value) -> ApiResult<Value> {
    let items = match body {
        Value::Array(items) => items,
        other => vec![other],
    };

    let repo = Repository::<T>::new(state.db.clone());
    let mut updated = Vec::with_capacity(items.len());
    for item in items {
        let (id, changes) = split_update(item)?;
        updated.push(repo.update_by_id(id, &changes).await?);
    }
    Ok(ApiResponse::success(serde_json::to_value(updated)?))
}

async fn archive_many<T: TenantOwned>(state: &AppState, ids: Vec<Uuid>) -> ApiResult<Value> {
    let repo = Repository::<T>::new(state.db.clone());
    let mut archived = Vec::with_capacity(ids.len());
    for id in ids {
        archived.push(repo.archive_by_id(id).await?);
    }
    Ok(ApiResponse::success(serde_json::to_value(archived)?))
}

async fn get_one<T: TenantOwned>(state: &AppState, id: Uuid) -> ApiResult<Value> {
    let row = Repository::<T>::new(state.db.clone()).select_by_id(id).await?;
    Ok(ApiResponse::success(serde_json::to_value(row)?))
}

async fn update_one<T: TenantOwned>(state: &AppState, id: Uuid, body: Value) -> ApiResult<Value> {
    let changes = Record::from_json(body)?;
    let updated = Repository::<T>::new(state.db.clone()).update_by_id(id, &changes).await?;
    Ok(ApiResponse::success(serde_json::to_value(updated)?))
}

async fn archive_one<T: TenantOwned>(state: &AppState, id: Uuid) -> ApiResult<Value> {
    let archived = Repository::<T>::new(state.db.clone()).archive_by_id(id).await?;
    Ok(ApiResponse::success(serde_json::to_value(archived)?))
}

/// Pulls the id out of a bulk update element, leaving the changes.
fn split_update(item: Value) -> Result<(Uuid, Record), ApiError> {
    let mut fields = match item {
        Value::Object(fields) => fields,
        _ => return Err(ApiError::bad_request("Expected a record object")),
    };

    let id_value =
        fields.remove("id").ok_or_else(|| ApiError::bad_request("Record is missing an id"))?;
    let id = id_value
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| ApiError::bad_request("Record id must be a UUID"))?;

    Ok((id, Record::from_json(Value::Object(fields))?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn split_update_separates_id_from_changes() {
        let id = Uuid::new_v4();
        let (parsed, changes) =
            split_update(json!({ "id": id.to_string(), "name": "Updated" })).unwrap();

        assert_eq!(parsed, id);
        assert_eq!(changes.get("name"), Some(&json!("Updated")));
        assert!(changes.get("id").is_none());
    }

    #[test]
    fn split_update_rejects_records_without_ids() {
        assert!(split_update(json!({ "name": "No id" })).is_err());
        assert!(split_update(json!({ "id": 42, "name": "Numeric id" })).is_err());
        assert!(split_update(json!("not an object")).is_err());
    }
}
