//! Tenant identity, ambient request scope, and the enforcement pieces that
//! keep one tenant's data invisible to every other tenant.

pub mod context;
pub mod error;
pub mod guard;
pub mod model;
pub mod registry;

pub use context::RequestScope;
pub use error::TenantError;
pub use model::{Tenant, TenantId, TenantStatus};
pub use registry::{MemoryDirectory, PgTenantDirectory, TenantDirectory};
