use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Opaque tenant identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct TenantId(Uuid);

impl TenantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TenantId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[derive(Debug, Error)]
#[error("unknown tenant status '{0}'")]
pub struct UnknownStatus(String);

/// Lifecycle status of a tenant. Only `active` and `trialing` tenants are
/// routable; the rest are rejected at the resolver before any handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    Active,
    Trialing,
    Inactive,
    Suspended,
}

impl TenantStatus {
    pub const fn is_routable(&self) -> bool {
        matches!(self, Self::Active | Self::Trialing)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Trialing => "trialing",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }
}

impl std::fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TenantStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "trialing" => Ok(Self::Trialing),
            "inactive" => Ok(Self::Inactive),
            "suspended" => Ok(Self::Suspended),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for TenantStatus {
    type Error = UnknownStatus;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A registered tenant organization.
///
/// Rows live in the shared `tenants` table. This subsystem only ever reads
/// them; provisioning and status changes happen elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub routing_key: String,
    #[sqlx(try_from = "String")]
    pub status: TenantStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_routability() {
        assert!(TenantStatus::Active.is_routable());
        assert!(TenantStatus::Trialing.is_routable());
        assert!(!TenantStatus::Inactive.is_routable());
        assert!(!TenantStatus::Suspended.is_routable());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            TenantStatus::Active,
            TenantStatus::Trialing,
            TenantStatus::Inactive,
            TenantStatus::Suspended,
        ] {
            let parsed: TenantStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("deleted".parse::<TenantStatus>().is_err());
    }

    #[test]
    fn tenant_id_displays_as_uuid() {
        let id = TenantId::new();
        let parsed: TenantId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }
}
