use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterOrderInfo, QueryScope, SqlResult};
use super::valid_identifier;

/// One validated query description for a single table.
///
/// The caller's filter document is validated on assignment; SQL generation
/// conjoins the [`QueryScope`] conditions ahead of everything the caller
/// asked for, so a scoped query cannot escape its tenant.
pub struct Filter {
    table_name: String,
    select_columns: Vec<String>,
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
    scope: QueryScope,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        if !valid_identifier(&table_name) {
            return Err(FilterError::InvalidTableName(table_name));
        }
        Ok(Self {
            table_name,
            select_columns: vec![],
            where_data: None,
            order_data: vec![],
            limit: None,
            offset: None,
            scope: QueryScope::default(),
        })
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(select) = data.select {
            self.select(select)?;
        }
        if let Some(where_clause) = data.where_clause {
            self.where_clause(where_clause)?;
        }
        if let Some(order) = data.order {
            self.order(order)?;
        }
        if let Some(limit) = data.limit {
            self.limit(limit, data.offset)?;
        }
        Ok(self)
    }

    /// Sets the system conditions. Called by the data layer, never from
    /// request input.
    pub fn scope(&mut self, scope: QueryScope) -> &mut Self {
        self.scope = scope;
        self
    }

    pub fn select(&mut self, columns: Vec<String>) -> Result<&mut Self, FilterError> {
        for column in &columns {
            if column == "*" {
                continue;
            }
            if !valid_identifier(column) {
                return Err(FilterError::InvalidColumn(column.clone()));
            }
        }
        self.select_columns = columns;
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(&order_spec)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: i64, offset: Option<i64>) -> Result<&mut Self, FilterError> {
        if limit < 0 {
            return Err(FilterError::InvalidLimit("limit must be non-negative".to_string()));
        }
        if let Some(off) = offset {
            if off < 0 {
                return Err(FilterError::InvalidOffset("offset must be non-negative".to_string()));
            }
        }

        let max_limit = crate::config::config().filter.max_limit.unwrap_or(i64::MAX);
        let applied_limit = if limit > max_limit {
            tracing::debug!(limit, max_limit, "capping limit to configured maximum");
            max_limit
        } else {
            limit
        };

        self.limit = Some(applied_limit);
        self.offset = offset;
        Ok(self)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let select_clause = self.build_select_clause();
        let where_result = self.to_where_sql(0)?;
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT {}", select_clause),
            format!("FROM \"{}\"", self.table_name),
            if where_result.query.is_empty() {
                String::new()
            } else {
                format!("WHERE {}", where_result.query)
            },
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params: where_result.params })
    }

    /// The full WHERE expression: scope conditions first, then the caller's
    /// conditions. Parameter numbering starts after `starting_param_index`.
    pub fn to_where_sql(&self, starting_param_index: usize) -> Result<SqlResult, FilterError> {
        let mut conditions: Vec<String> = vec![];
        let mut params: Vec<Value> = vec![];

        if let Some(tenant) = self.scope.tenant {
            params.push(Value::String(tenant.to_string()));
            conditions.push(format!("\"tenant_id\" = ${}", starting_param_index + params.len()));
        }
        if !self.scope.include_archived {
            conditions.push("\"archived_at\" IS NULL".to_string());
        }

        if let Some(ref where_data) = self.where_data {
            let (clause, caller_params) =
                FilterWhere::generate(where_data, starting_param_index + params.len())?;
            if !clause.is_empty() {
                conditions.push(clause);
            }
            params.extend(caller_params);
        }

        Ok(SqlResult { query: conditions.join(" AND "), params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql(0)?;
        let query = if where_result.query.is_empty() {
            format!("SELECT COUNT(*) as count FROM \"{}\"", self.table_name)
        } else {
            format!(
                "SELECT COUNT(*) as count FROM \"{}\" WHERE {}",
                self.table_name, where_result.query
            )
        };
        Ok(SqlResult { query, params: where_result.params })
    }

    fn build_select_clause(&self) -> String {
        if self.select_columns.is_empty() || self.select_columns.contains(&"*".to_string()) {
            "*".to_string()
        } else {
            self.select_columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", ")
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::model::TenantId;
    use serde_json::json;

    fn filter(table: &str) -> Filter {
        Filter::new(table).unwrap()
    }

    #[test]
    fn rejects_invalid_table_names() {
        assert!(Filter::new("customers; drop table tenants").is_err());
        assert!(Filter::new("").is_err());
        assert!(Filter::new("7days").is_err());
        assert!(Filter::new("customers").is_ok());
    }

    #[test]
    fn bare_select_hides_archived_rows() {
        let f = filter("customers");
        let sql = f.to_sql().unwrap();
        assert_eq!(sql.query, "SELECT * FROM \"customers\" WHERE \"archived_at\" IS NULL");
        assert!(sql.params.is_empty());
    }

    #[test]
    fn tenant_scope_is_the_first_condition() {
        let tenant = TenantId::new();
        let mut f = filter("customers");
        f.scope(QueryScope::tenant(tenant));
        f.where_clause(json!({ "name": "Acme" })).unwrap();

        let sql = f.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"customers\" WHERE \"tenant_id\" = $1 AND \"archived_at\" IS NULL AND \"name\" = $2"
        );
        assert_eq!(sql.params[0], json!(tenant.to_string()));
        assert_eq!(sql.params[1], json!("Acme"));
    }

    #[test]
    fn caller_filters_cannot_displace_the_tenant_condition() {
        let tenant = TenantId::new();
        let other = TenantId::new();
        let mut f = filter("customers");
        f.scope(QueryScope::tenant(tenant));
        f.where_clause(json!({ "tenant_id": other.to_string() })).unwrap();

        let sql = f.to_sql().unwrap();
        // Both conditions are conjoined; the caller can only narrow, never widen.
        assert!(sql.query.contains("\"tenant_id\" = $1 AND"));
        assert!(sql.query.contains("\"tenant_id\" = $2"));
        assert_eq!(sql.params[0], json!(tenant.to_string()));
    }

    #[test]
    fn unscoped_filter_omits_the_tenant_condition() {
        let mut f = filter("customers");
        f.scope(QueryScope::unscoped());
        let sql = f.to_sql().unwrap();
        assert!(!sql.query.contains("tenant_id"));
    }

    #[test]
    fn include_archived_drops_the_soft_delete_condition() {
        let mut f = filter("customers");
        f.scope(QueryScope::unscoped().with_archived());
        let sql = f.to_sql().unwrap();
        assert_eq!(sql.query, "SELECT * FROM \"customers\"");
    }

    #[test]
    fn full_query_shape() {
        let tenant = TenantId::new();
        let mut f = filter("appointments");
        f.scope(QueryScope::tenant(tenant));
        f.assign(FilterData {
            select: Some(vec!["id".to_string(), "status".to_string()]),
            where_clause: Some(json!({ "status": { "$in": ["scheduled", "confirmed"] } })),
            order: Some(json!("scheduled_at desc")),
            limit: Some(25),
            offset: Some(50),
        })
        .unwrap();

        let sql = f.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT \"id\", \"status\" FROM \"appointments\" WHERE \"tenant_id\" = $1 AND \"archived_at\" IS NULL AND \"status\" IN ($2, $3) ORDER BY \"scheduled_at\" DESC LIMIT 25 OFFSET 50"
        );
        assert_eq!(sql.params.len(), 3);
    }

    #[test]
    fn count_sql_carries_the_same_scope() {
        let tenant = TenantId::new();
        let mut f = filter("services");
        f.scope(QueryScope::tenant(tenant));
        let sql = f.to_count_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT COUNT(*) as count FROM \"services\" WHERE \"tenant_id\" = $1 AND \"archived_at\" IS NULL"
        );
        assert_eq!(sql.params.len(), 1);
    }

    #[test]
    fn where_sql_with_offset_for_update_statements() {
        let tenant = TenantId::new();
        let mut f = filter("customers");
        f.scope(QueryScope::tenant(tenant));
        f.where_clause(json!({ "city": "Austin" })).unwrap();

        let sql = f.to_where_sql(2).unwrap();
        assert_eq!(sql.query, "\"tenant_id\" = $3 AND \"archived_at\" IS NULL AND \"city\" = $4");
        assert_eq!(sql.params.len(), 2);
    }

    #[test]
    fn limit_is_capped_to_the_configured_maximum() {
        let max = crate::config::config().filter.max_limit.unwrap();
        let mut f = filter("customers");
        f.limit(max + 500, None).unwrap();
        let sql = f.to_sql().unwrap();
        assert!(sql.query.ends_with(&format!("LIMIT {}", max)));
    }
}
