use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub tenancy: TenancyConfig,
    pub filter: FilterConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// How inbound requests are mapped to tenants.
///
/// `admin_domains` and `admin_path_prefixes` are the administrative bypass
/// allowlists: requests matching either resolve to the administrative scope
/// without ever consulting the tenant registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenancyConfig {
    pub override_header: String,
    pub base_domain: String,
    pub admin_domains: Vec<String>,
    pub admin_path_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub max_limit: Option<i64>,
    pub max_nested_depth: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Tenancy overrides
        if let Ok(v) = env::var("TENANCY_OVERRIDE_HEADER") {
            if !v.trim().is_empty() {
                self.tenancy.override_header = v.trim().to_lowercase();
            }
        }
        if let Ok(v) = env::var("TENANCY_BASE_DOMAIN") {
            if !v.trim().is_empty() {
                self.tenancy.base_domain = v.trim().to_lowercase();
            }
        }
        if let Ok(v) = env::var("TENANCY_ADMIN_DOMAINS") {
            self.tenancy.admin_domains = v.split(',').map(|s| s.trim().to_lowercase()).collect();
        }
        if let Ok(v) = env::var("TENANCY_ADMIN_PATHS") {
            self.tenancy.admin_path_prefixes = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Filter overrides
        if let Ok(v) = env::var("FILTER_MAX_LIMIT") {
            self.filter.max_limit = v.parse().ok();
        }
        if let Ok(v) = env::var("FILTER_MAX_NESTED_DEPTH") {
            self.filter.max_nested_depth = v.parse().unwrap_or(self.filter.max_nested_depth);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            tenancy: TenancyConfig {
                override_header: "x-tenant-domain".to_string(),
                base_domain: "platform.example".to_string(),
                admin_domains: vec![
                    "platform.example".to_string(),
                    "api.platform.example".to_string(),
                    "localhost".to_string(),
                    "127.0.0.1".to_string(),
                ],
                admin_path_prefixes: vec!["/platform".to_string()],
            },
            filter: FilterConfig {
                max_limit: Some(1000),
                max_nested_depth: 10,
            },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                jwt_secret: "dev-secret-change-me".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            tenancy: TenancyConfig {
                override_header: "x-tenant-domain".to_string(),
                base_domain: "platform.example".to_string(),
                admin_domains: vec![
                    "platform.example".to_string(),
                    "api.platform.example".to_string(),
                ],
                admin_path_prefixes: vec!["/platform".to_string()],
            },
            filter: FilterConfig {
                max_limit: Some(500),
                max_nested_depth: 5,
            },
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            tenancy: TenancyConfig {
                override_header: "x-tenant-domain".to_string(),
                base_domain: "platform.example".to_string(),
                admin_domains: vec![
                    "platform.example".to_string(),
                    "api.platform.example".to_string(),
                ],
                admin_path_prefixes: vec!["/platform".to_string()],
            },
            filter: FilterConfig {
                max_limit: Some(100),
                max_nested_depth: 3,
            },
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

// Helper macros for common checks
#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
