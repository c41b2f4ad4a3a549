use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::repository::TenantOwned;
use crate::tenant::TenantId;

/// One scheduled visit. `status` moves through scheduled, confirmed,
/// completed and cancelled; `total` is the billed amount once known.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub customer_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub status: String,
    pub total: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl TenantOwned for Appointment {
    const TABLE: &'static str = "appointments";
    const REQUIRED: &'static [&'static str] = &["customer_id", "scheduled_at"];
}
