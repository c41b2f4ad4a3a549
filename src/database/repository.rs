use serde::Serialize;
use serde_json::json;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::query::{self, QueryBuilder};
use crate::database::record::Record;
use crate::filter::FilterData;
use crate::tenant::guard;

/// A row type stored in a tenant-owned collection table.
pub trait TenantOwned: for<'r> FromRow<'r, PgRow> + Send + Unpin + Serialize {
    const TABLE: &'static str;

    /// Fields a new record must carry. Partial updates are exempt.
    const REQUIRED: &'static [&'static str];
}

/// Data access for one collection.
///
/// Every operation derives its scope from the ambient request context, so
/// callers never pass tenant ids and cannot pass the wrong one. Cross-tenant
/// rows are invisible here: reads skip them and by-id operations report them
/// as not found.
pub struct Repository<T> {
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: TenantOwned> Repository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, _phantom: std::marker::PhantomData }
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        self.builder()?.filter(filter_data)?.select_all(&self.pool).await
    }

    pub async fn select_one(&self, filter_data: FilterData) -> Result<Option<T>, DatabaseError> {
        self.builder()?.filter(filter_data)?.select_optional(&self.pool).await
    }

    pub async fn select_by_id(&self, id: Uuid) -> Result<T, DatabaseError> {
        self.builder()?
            .filter(Self::id_filter(id))?
            .select_optional(&self.pool)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    pub async fn select_ids(&self, ids: Vec<Uuid>) -> Result<Vec<T>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let filter_data = FilterData {
            where_clause: Some(json!({ "id": { "$in": ids } })),
            ..Default::default()
        };
        self.select_any(filter_data).await
    }

    pub async fn count(&self, filter_data: FilterData) -> Result<i64, DatabaseError> {
        self.builder()?.filter(filter_data)?.count(&self.pool).await
    }

    pub async fn create_one(&self, record: Record) -> Result<T, DatabaseError> {
        let mut created = self.create_all(vec![record]).await?;
        created.pop().ok_or_else(|| DatabaseError::NotFound("created row missing".to_string()))
    }

    /// Creates a batch inside one transaction: either every record is
    /// stamped, valid and stored, or nothing is.
    pub async fn create_all(&self, mut records: Vec<Record>) -> Result<Vec<T>, DatabaseError> {
        for record in &records {
            record.validate_required_fields(T::REQUIRED)?;
        }
        guard::stamp_writes(T::TABLE, &mut records)?;

        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(records.len());
        for record in &records {
            created.push(query::insert_one(&mut *tx, T::TABLE, record).await?);
        }
        tx.commit().await?;
        Ok(created)
    }

    pub async fn update_any(
        &self,
        filter_data: FilterData,
        changes: &Record,
    ) -> Result<Vec<T>, DatabaseError> {
        self.builder()?.filter(filter_data)?.update_all(&self.pool, changes).await
    }

    pub async fn update_by_id(&self, id: Uuid, changes: &Record) -> Result<T, DatabaseError> {
        let mut rows =
            self.builder()?.filter(Self::id_filter(id))?.update_all(&self.pool, changes).await?;
        rows.pop().ok_or_else(|| Self::not_found(id))
    }

    pub async fn archive_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        self.builder()?.filter(filter_data)?.archive_all(&self.pool).await
    }

    pub async fn archive_by_id(&self, id: Uuid) -> Result<T, DatabaseError> {
        let mut rows = self.builder()?.filter(Self::id_filter(id))?.archive_all(&self.pool).await?;
        rows.pop().ok_or_else(|| Self::not_found(id))
    }

    fn builder(&self) -> Result<QueryBuilder<T>, DatabaseError> {
        QueryBuilder::new(T::TABLE, guard::read_scope(T::TABLE))
    }

    fn id_filter(id: Uuid) -> FilterData {
        FilterData { where_clause: Some(json!({ "id": id })), ..Default::default() }
    }

    fn not_found(id: Uuid) -> DatabaseError {
        DatabaseError::NotFound(format!("no {} record with id {}", T::TABLE, id))
    }
}
