use thiserror::Error;

use super::model::{TenantId, TenantStatus};

/// Tenant isolation failures, resolved at the boundary and never retried.
///
/// The first three are request errors surfaced to the caller. `ContextMissing`
/// is different in kind: it means a write path ran without any tenant scope
/// and without an explicit owner, which indicates code that bypassed the
/// resolver.
#[derive(Debug, Error)]
pub enum TenantError {
    #[error("no tenant is registered for '{0}'")]
    NotFound(String),

    #[error("tenant '{routing_key}' is {status} and cannot be accessed")]
    Inactive {
        routing_key: String,
        status: TenantStatus,
    },

    #[error("caller belongs to tenant {caller} but the request resolved to tenant {resolved}")]
    Mismatch { caller: TenantId, resolved: TenantId },

    #[error("no tenant context present while persisting tenant-owned data")]
    ContextMissing,
}
