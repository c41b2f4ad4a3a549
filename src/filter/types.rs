use serde::{Deserialize, Serialize};

use crate::tenant::model::TenantId;

/// A filter document as supplied by API callers.
///
/// `where` uses `$`-prefixed operators (`$eq`, `$ne`, `$gt`, `$gte`, `$lt`,
/// `$lte`, `$like`, `$nlike`, `$ilike`, `$nilike`, `$in`, `$nin`, `$between`,
/// `$null`) and logical composition (`$and`, `$or`, `$not`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterData {
    pub select: Option<Vec<String>>,
    #[serde(rename = "where")]
    pub where_clause: Option<serde_json::Value>,
    pub order: Option<serde_json::Value>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Conditions the data layer conjoins ahead of whatever the caller supplied.
///
/// The tenant equality is the isolation boundary: when present it is emitted
/// as the first WHERE condition and the caller's filter document cannot
/// remove or replace it. Archived rows are hidden unless explicitly included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryScope {
    pub tenant: Option<TenantId>,
    pub include_archived: bool,
}

impl QueryScope {
    pub fn tenant(id: TenantId) -> Self {
        Self { tenant: Some(id), include_archived: false }
    }

    pub fn unscoped() -> Self {
        Self { tenant: None, include_archived: false }
    }

    pub fn with_archived(mut self) -> Self {
        self.include_archived = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<serde_json::Value>,
}
