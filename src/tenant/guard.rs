//! Scope enforcement around the data layer.
//!
//! Reads derive their [`QueryScope`] here and writes get their owning tenant
//! stamped here. Every repository operation passes through these two
//! functions, so handler code never threads tenant ids by hand and cannot
//! forget to.

use serde_json::json;

use crate::database::record::{Record, TENANT_FIELD};
use crate::filter::QueryScope;
use crate::tenant::context::{self, RequestScope};
use crate::tenant::error::TenantError;
use crate::tenant::model::TenantId;

/// The scope every select, count, update and archive runs under.
///
/// No ambient scope means an unfiltered query. That is the deliberate escape
/// hatch for provisioning jobs and platform tooling, so it stays legal, but
/// it is logged: request paths always establish a scope before touching data.
pub fn read_scope(table: &str) -> QueryScope {
    match context::current() {
        Some(RequestScope::Tenant(id)) => QueryScope::tenant(id),
        Some(RequestScope::Admin) => QueryScope::unscoped(),
        None => {
            tracing::warn!(table, "query running without a request scope");
            QueryScope::unscoped()
        }
    }
}

/// Stamps the owning tenant onto every record about to be persisted.
///
/// A record that already carries an owner keeps it; otherwise the ambient
/// tenant is used. When neither exists the whole batch is refused before any
/// record is touched.
pub fn stamp_writes(table: &str, records: &mut [Record]) -> Result<(), TenantError> {
    let ambient = context::current_tenant();

    if ambient.is_none() && records.iter().any(|r| explicit_owner(r).is_none()) {
        tracing::error!(table, "refusing write: no tenant scope and no explicit owner");
        return Err(TenantError::ContextMissing);
    }

    for record in records.iter_mut() {
        if explicit_owner(record).is_some() {
            continue;
        }
        if let Some(tenant) = ambient {
            record.set_system_field(TENANT_FIELD, json!(tenant));
        }
    }

    Ok(())
}

fn explicit_owner(record: &Record) -> Option<TenantId> {
    record.tenant_id().map(TenantId::from_uuid)
}
