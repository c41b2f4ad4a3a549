//! Ambient tenant scope for one request's execution chain.
//!
//! The resolver binds a [`RequestScope`] around downstream handling with
//! [`run`]; anything executed inside that future, across any number of
//! `.await` suspensions, reads the same binding through [`current`]. The
//! binding is task-local: concurrent requests interleaving on the same worker
//! threads never observe each other's scope, and the binding cannot outlive
//! the future it wraps.

use std::future::Future;

use tokio::task::JoinHandle;

use super::model::TenantId;

tokio::task_local! {
    static CURRENT_SCOPE: RequestScope;
}

/// The resolved scope of the request currently being processed.
///
/// `Admin` is only established by the resolver's administrative allowlist
/// branch. It is deliberately distinct from having no scope bound at all, so
/// that a cross-tenant administrative query and a code path that skipped
/// resolution entirely do not look alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestScope {
    Tenant(TenantId),
    Admin,
}

impl RequestScope {
    pub fn tenant_id(&self) -> Option<TenantId> {
        match self {
            Self::Tenant(id) => Some(*id),
            Self::Admin => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for RequestScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tenant(id) => write!(f, "tenant {id}"),
            Self::Admin => write!(f, "administrative"),
        }
    }
}

/// Runs `fut` with `scope` bound as the ambient scope.
///
/// Nested calls shadow the outer binding for their duration; the outer
/// binding is restored when the inner future finishes, including on panic or
/// cancellation.
pub async fn run<F>(scope: RequestScope, fut: F) -> F::Output
where
    F: Future,
{
    CURRENT_SCOPE.scope(scope, fut).await
}

/// Returns the innermost scope bound on this execution chain, or `None` when
/// called outside any scope (startup, background jobs, tests).
pub fn current() -> Option<RequestScope> {
    CURRENT_SCOPE.try_with(|scope| *scope).ok()
}

/// The current tenant id, when a tenant scope is bound.
pub fn current_tenant() -> Option<TenantId> {
    current().and_then(|scope| scope.tenant_id())
}

/// Spawns a task that inherits the current scope.
///
/// `tokio::spawn` does not carry task-locals into the new task; request
/// workloads that fan out use this instead so the scope follows them.
pub fn spawn<F>(fut: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match current() {
        Some(scope) => tokio::spawn(run(scope, fut)),
        None => tokio::spawn(fut),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fresh_scope() -> (TenantId, RequestScope) {
        let id = TenantId::new();
        (id, RequestScope::Tenant(id))
    }

    #[tokio::test]
    async fn absent_outside_any_scope() {
        assert_eq!(current(), None);
        assert_eq!(current_tenant(), None);
    }

    #[tokio::test]
    async fn binding_survives_await_points() {
        let (id, scope) = fresh_scope();
        run(scope, async move {
            assert_eq!(current_tenant(), Some(id));
            tokio::time::sleep(Duration::from_millis(5)).await;
            assert_eq!(current_tenant(), Some(id));
        })
        .await;
        assert_eq!(current(), None);
    }

    #[tokio::test]
    async fn nested_scopes_shadow_and_restore() {
        let (outer_id, outer) = fresh_scope();
        let (inner_id, inner) = fresh_scope();
        run(outer, async move {
            assert_eq!(current_tenant(), Some(outer_id));
            run(inner, async move {
                assert_eq!(current_tenant(), Some(inner_id));
                run(RequestScope::Admin, async {
                    assert_eq!(current(), Some(RequestScope::Admin));
                    assert_eq!(current_tenant(), None);
                })
                .await;
                assert_eq!(current_tenant(), Some(inner_id));
            })
            .await;
            assert_eq!(current_tenant(), Some(outer_id));
        })
        .await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_scopes_never_observe_each_other() {
        let (id_a, scope_a) = fresh_scope();
        let (id_b, scope_b) = fresh_scope();

        let workload = |id: TenantId, scope: RequestScope, pause_ms: u64| async move {
            run(scope, async move {
                for _ in 0..25 {
                    assert_eq!(current_tenant(), Some(id));
                    tokio::time::sleep(Duration::from_millis(pause_ms)).await;
                    assert_eq!(current_tenant(), Some(id));
                }
            })
            .await;
        };

        let a = tokio::spawn(workload(id_a, scope_a, 1));
        let b = tokio::spawn(workload(id_b, scope_b, 2));
        a.await.unwrap();
        b.await.unwrap();

        assert_eq!(current(), None);
    }

    #[tokio::test]
    async fn spawned_work_inherits_the_scope() {
        let (id, scope) = fresh_scope();
        run(scope, async move {
            let handle = spawn(async { current_tenant() });
            assert_eq!(handle.await.unwrap(), Some(id));
        })
        .await;
    }

    #[tokio::test]
    async fn spawn_outside_a_scope_stays_unscoped() {
        let handle = spawn(async { current() });
        assert_eq!(handle.await.unwrap(), None);
    }

    #[tokio::test]
    async fn binding_is_dropped_when_the_workload_panics() {
        let (_, scope) = fresh_scope();
        let result = tokio::spawn(run(scope, async {
            panic!("workload failed");
        }))
        .await;
        assert!(result.is_err());
        assert_eq!(current(), None);
    }
}
