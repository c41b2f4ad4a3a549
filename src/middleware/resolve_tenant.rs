use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::config::{self, TenancyConfig};
use crate::error::ApiError;
use crate::tenant::context::{self, RequestScope};
use crate::tenant::TenantError;
use crate::AppState;

/// Resolves which tenant a request belongs to and establishes the request
/// scope for everything downstream.
///
/// Resolution order: the override header wins over the Host header, and the
/// administrative allowlists (path prefixes and domains) are checked before
/// any registry lookup, so platform surfaces work even when no tenant matches
/// the host. Unknown hosts get 404, registered but non-routable tenants 403.
pub async fn resolve_tenant(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let tenancy = &config::config().tenancy;

    if is_admin_path(request.uri().path(), &tenancy.admin_path_prefixes) {
        return Ok(context::run(RequestScope::Admin, next.run(request)).await);
    }

    let raw_host = override_host(request.headers(), tenancy)
        .or_else(|| host_header(&request))
        .ok_or_else(|| ApiError::bad_request("Missing Host header"))?;

    let host = normalize_host(&raw_host)
        .ok_or_else(|| ApiError::bad_request(format!("Invalid host: {}", raw_host)))?;

    if tenancy.admin_domains.iter().any(|domain| domain == &host) {
        return Ok(context::run(RequestScope::Admin, next.run(request)).await);
    }

    let routing_key = routing_key_for(&host, &tenancy.base_domain);

    let tenant = state
        .directory
        .find_by_routing_key(routing_key)
        .await?
        .ok_or_else(|| TenantError::NotFound(routing_key.to_string()))?;

    if !tenant.status.is_routable() {
        return Err(TenantError::Inactive {
            routing_key: tenant.routing_key.clone(),
            status: tenant.status,
        }
        .into());
    }

    tracing::debug!(tenant = %tenant.id, host, "resolved tenant");

    let scope = RequestScope::Tenant(tenant.id);
    request.extensions_mut().insert(tenant);

    Ok(context::run(scope, next.run(request)).await)
}

fn is_admin_path(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| {
        path == prefix
            || path.strip_prefix(prefix.as_str()).is_some_and(|rest| rest.starts_with('/'))
    })
}

fn override_host(headers: &HeaderMap, tenancy: &TenancyConfig) -> Option<String> {
    headers
        .get(tenancy.override_header.as_str())
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn host_header(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().authority().map(|authority| authority.to_string()))
}

/// Lowercases the host and strips any port. Returns None for values that do
/// not parse as a host at all.
fn normalize_host(raw: &str) -> Option<String> {
    let url = url::Url::parse(&format!("http://{}", raw.trim())).ok()?;
    url.host_str().map(str::to_string)
}

/// The subdomain under the platform base domain, or the whole host for
/// tenants fronted by a custom domain.
fn routing_key_for<'h>(host: &'h str, base_domain: &str) -> &'h str {
    host.strip_suffix(base_domain)
        .and_then(|prefix| prefix.strip_suffix('.'))
        .filter(|key| !key.is_empty())
        .unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hosts_normalize_to_lowercase_without_ports() {
        assert_eq!(normalize_host("Acme.Platform.Example:8080"), Some("acme.platform.example".to_string()));
        assert_eq!(normalize_host("acme.platform.example"), Some("acme.platform.example".to_string()));
        assert_eq!(normalize_host("  localhost:3000 "), Some("localhost".to_string()));
        assert_eq!(normalize_host(""), None);
        assert_eq!(normalize_host("not a host"), None);
    }

    #[test]
    fn routing_keys_come_from_the_subdomain_or_the_whole_host() {
        assert_eq!(routing_key_for("acme.platform.example", "platform.example"), "acme");
        assert_eq!(routing_key_for("a.b.platform.example", "platform.example"), "a.b");
        assert_eq!(routing_key_for("schedule.acme.com", "platform.example"), "schedule.acme.com");
        // The bare base domain is not a subdomain of itself.
        assert_eq!(routing_key_for("platform.example", "platform.example"), "platform.example");
    }

    #[test]
    fn admin_paths_match_on_segment_boundaries() {
        let prefixes = vec!["/platform".to_string()];
        assert!(is_admin_path("/platform", &prefixes));
        assert!(is_admin_path("/platform/tenants", &prefixes));
        assert!(!is_admin_path("/platformx", &prefixes));
        assert!(!is_admin_path("/api/data/customers", &prefixes));
    }
}
