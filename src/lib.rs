use std::sync::Arc;

use axum::{
    middleware as layer,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod tenant;

use crate::tenant::TenantDirectory;

/// Shared application state: one pool holding every tenant's rows, plus the
/// directory the resolver looks tenants up in.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub directory: Arc<dyn TenantDirectory>,
}

/// Builds the full router.
///
/// Everything under /api and /platform passes through tenant resolution,
/// authentication and the access check, in that order. The banner and health
/// endpoints stay outside so they answer from any host.
pub fn app(state: AppState) -> Router {
    let scoped = Router::new()
        .merge(api_routes())
        .merge(platform_routes())
        .layer(layer::from_fn(middleware::validate_access))
        .layer(layer::from_fn(middleware::authenticate))
        .layer(layer::from_fn_with_state(state.clone(), middleware::resolve_tenant));

    Router::new()
        .route("/", get(handlers::system::root))
        .route("/health", get(handlers::system::health))
        .merge(scoped)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    use handlers::data;

    Router::new()
        .route("/api/whoami", get(handlers::whoami::whoami))
        .route(
            "/api/data/:collection",
            get(data::collection_get)
                .post(data::collection_post)
                .patch(data::collection_patch)
                .delete(data::collection_delete),
        )
        .route(
            "/api/data/:collection/:id",
            get(data::record_get).patch(data::record_patch).delete(data::record_delete),
        )
        .route(
            "/api/find/:collection",
            post(handlers::find::find_post).delete(handlers::find::find_delete),
        )
}

fn platform_routes() -> Router<AppState> {
    Router::new().route("/platform/tenants", get(handlers::platform::tenant_list))
}
