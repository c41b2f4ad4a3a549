use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::record::{Record, TENANT_FIELD};
use crate::filter::types::SqlResult;
use crate::filter::{valid_identifier, Filter, FilterData, FilterError, QueryScope};

/// Assembles and executes scoped SQL for one table.
///
/// Every builder starts from a [`QueryScope`], so the tenant condition is in
/// place before any caller filter is applied and no execution path can drop
/// it.
pub struct QueryBuilder<T> {
    filter: Filter,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table_name: &str, scope: QueryScope) -> Result<Self, DatabaseError> {
        let mut filter = Filter::new(table_name)?;
        filter.scope(scope);
        Ok(Self { filter, _phantom: std::marker::PhantomData })
    }

    pub fn filter(mut self, filter_data: FilterData) -> Result<Self, DatabaseError> {
        self.filter.assign(filter_data)?;
        Ok(self)
    }

    pub async fn select_all(self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let sql = self.filter.to_sql()?;
        let mut q = sqlx::query_as::<_, T>(&sql.query);
        for value in &sql.params {
            q = bind_value_as(q, value);
        }
        Ok(q.fetch_all(pool).await?)
    }

    pub async fn select_optional(self, pool: &PgPool) -> Result<Option<T>, DatabaseError> {
        let sql = self.filter.to_sql()?;
        let mut q = sqlx::query_as::<_, T>(&sql.query);
        for value in &sql.params {
            q = bind_value_as(q, value);
        }
        Ok(q.fetch_optional(pool).await?)
    }

    pub async fn count(self, pool: &PgPool) -> Result<i64, DatabaseError> {
        let sql = self.filter.to_count_sql()?;
        let mut q = sqlx::query(&sql.query);
        for value in &sql.params {
            q = bind_value(q, value);
        }
        let row = q.fetch_one(pool).await?;
        Ok(row.try_get("count")?)
    }

    /// Updates every row the scope and filter reach, returning the new rows.
    pub async fn update_all(self, pool: &PgPool, changes: &Record) -> Result<Vec<T>, DatabaseError> {
        let (set_clause, set_params) = update_set_sql(changes)?;
        let where_result = self.filter.to_where_sql(set_params.len())?;

        let query = if where_result.query.is_empty() {
            format!(
                "UPDATE \"{}\" SET {} RETURNING *",
                self.filter.table_name(),
                set_clause
            )
        } else {
            format!(
                "UPDATE \"{}\" SET {} WHERE {} RETURNING *",
                self.filter.table_name(),
                set_clause,
                where_result.query
            )
        };

        let mut q = sqlx::query_as::<_, T>(&query);
        for value in set_params.iter().chain(where_result.params.iter()) {
            q = bind_value_as(q, value);
        }
        Ok(q.fetch_all(pool).await?)
    }

    /// Soft-deletes every row the scope and filter reach.
    pub async fn archive_all(self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let where_result = self.filter.to_where_sql(0)?;

        let query = if where_result.query.is_empty() {
            format!(
                "UPDATE \"{}\" SET \"archived_at\" = now(), \"updated_at\" = now() RETURNING *",
                self.filter.table_name()
            )
        } else {
            format!(
                "UPDATE \"{}\" SET \"archived_at\" = now(), \"updated_at\" = now() WHERE {} RETURNING *",
                self.filter.table_name(),
                where_result.query
            )
        };

        let mut q = sqlx::query_as::<_, T>(&query);
        for value in &where_result.params {
            q = bind_value_as(q, value);
        }
        Ok(q.fetch_all(pool).await?)
    }
}

/// Inserts one record, returning the stored row. Runs on any executor so
/// batch creation can hold a transaction.
pub async fn insert_one<'e, T, E>(
    executor: E,
    table_name: &str,
    record: &Record,
) -> Result<T, DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    E: sqlx::PgExecutor<'e>,
{
    let sql = insert_sql(table_name, record)?;
    let mut q = sqlx::query_as::<_, T>(&sql.query);
    for value in &sql.params {
        q = bind_value_as(q, value);
    }
    Ok(q.fetch_one(executor).await?)
}

pub fn insert_sql(table_name: &str, record: &Record) -> Result<SqlResult, FilterError> {
    let mut columns = Vec::new();
    let mut placeholders = Vec::new();
    let mut params = Vec::new();

    for (column, value) in record.fields() {
        if !valid_identifier(column) {
            return Err(FilterError::InvalidColumn(column.to_string()));
        }
        params.push(value.clone());
        columns.push(format!("\"{}\"", column));
        placeholders.push(format!("${}", params.len()));
    }

    Ok(SqlResult {
        query: format!(
            "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING *",
            table_name,
            columns.join(", "),
            placeholders.join(", ")
        ),
        params,
    })
}

/// SET clause for an update. The primary key and the owning tenant never
/// change through this path; `updated_at` is bumped on every update.
pub fn update_set_sql(changes: &Record) -> Result<(String, Vec<Value>), FilterError> {
    let mut assignments = Vec::new();
    let mut params = Vec::new();

    for (column, value) in changes.fields() {
        if column == "id" || column == TENANT_FIELD {
            continue;
        }
        if !valid_identifier(column) {
            return Err(FilterError::InvalidColumn(column.to_string()));
        }
        params.push(value.clone());
        assignments.push(format!("\"{}\" = ${}", column, params.len()));
    }
    assignments.push("\"updated_at\" = now()".to_string());

    Ok((assignments.join(", "), params))
}

/// Binds one JSON value as a SQL parameter.
///
/// Strings that parse as UUIDs or RFC 3339 timestamps bind with those types,
/// so record fields compare and insert cleanly against `uuid` and
/// `timestamptz` columns. Objects and arrays bind as JSONB.
fn bind_value<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    value: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match value {
        Value::Null => q.bind(None::<String>),
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => {
            if let Ok(id) = Uuid::parse_str(s) {
                q.bind(id)
            } else if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                q.bind(ts.with_timezone(&Utc))
            } else {
                q.bind(s.as_str())
            }
        }
        Value::Object(_) | Value::Array(_) => q.bind(value.clone()),
    }
}

fn bind_value_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    value: &'q Value,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match value {
        Value::Null => q.bind(None::<String>),
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => {
            if let Ok(id) = Uuid::parse_str(s) {
                q.bind(id)
            } else if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                q.bind(ts.with_timezone(&Utc))
            } else {
                q.bind(s.as_str())
            }
        }
        Value::Object(_) | Value::Array(_) => q.bind(value.clone()),
    }
}
