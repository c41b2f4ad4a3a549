use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::repository::TenantOwned;
use crate::tenant::TenantId;

/// A line of business a tenant offers, with its standard price.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Service {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub name: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl TenantOwned for Service {
    const TABLE: &'static str = "services";
    const REQUIRED: &'static [&'static str] = &["name", "unit_price"];
}
