use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::tenant::model::Tenant;

/// Durable store of tenant registrations.
///
/// The registry is read-only inside the request path; routing keys are
/// matched case-insensitively. Provisioning and lifecycle changes happen
/// elsewhere.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn find_by_routing_key(&self, routing_key: &str) -> Result<Option<Tenant>, sqlx::Error>;

    async fn list(&self) -> Result<Vec<Tenant>, sqlx::Error>;
}

/// Registry backed by the `tenants` table.
pub struct PgTenantDirectory {
    pool: PgPool,
}

impl PgTenantDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantDirectory for PgTenantDirectory {
    async fn find_by_routing_key(&self, routing_key: &str) -> Result<Option<Tenant>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(
            "SELECT id, name, routing_key, status, created_at, updated_at
             FROM tenants
             WHERE lower(routing_key) = lower($1)",
        )
        .bind(routing_key)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list(&self) -> Result<Vec<Tenant>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(
            "SELECT id, name, routing_key, status, created_at, updated_at
             FROM tenants
             ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
    }
}

/// Map-backed registry for tests and local tooling.
#[derive(Default)]
pub struct MemoryDirectory {
    tenants: HashMap<String, Tenant>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenants(tenants: impl IntoIterator<Item = Tenant>) -> Self {
        let mut directory = Self::new();
        for tenant in tenants {
            directory.insert(tenant);
        }
        directory
    }

    pub fn insert(&mut self, tenant: Tenant) {
        self.tenants.insert(tenant.routing_key.to_lowercase(), tenant);
    }
}

#[async_trait]
impl TenantDirectory for MemoryDirectory {
    async fn find_by_routing_key(&self, routing_key: &str) -> Result<Option<Tenant>, sqlx::Error> {
        Ok(self.tenants.get(&routing_key.to_lowercase()).cloned())
    }

    async fn list(&self) -> Result<Vec<Tenant>, sqlx::Error> {
        let mut tenants: Vec<Tenant> = self.tenants.values().cloned().collect();
        tenants.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tenants)
    }
}
