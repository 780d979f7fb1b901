//! HTTP surface for result delivery.
//!
//! - `GET /health` — liveness probe
//! - `GET /api/v1/conversations/{conversation}/results` — conditional
//!   delivery of the latest clustering snapshot (gzip payload + validator
//!   token, or an empty not-modified response)
//! - `GET /api/v1/conversations/{conversation}/participants/{participant}/assignment`
//!   — the participant's base-cluster and group assignment
//! - `POST /api/v1/conversations/{conversation}/recompute` — queue a
//!   recompute for the external math worker
//!
//! Handlers are generic over the store and recompute-queue seams so tests
//! run against the in-memory implementations.

use std::sync::Arc;

use crate::cache::ResultCache;
use crate::store::{RecomputeQueue, Store};

pub mod assignment;
pub mod health;
pub mod recompute;
pub mod results;

pub use assignment::assignment_handler;
pub use health::health_handler;
pub use recompute::recompute_handler;
pub use results::results_handler;

/// Shared application state, passed to handlers via Axum's `State`.
pub struct AppState<S, Q> {
    inner: Arc<AppStateInner<S, Q>>,
}

struct AppStateInner<S, Q> {
    cache: Arc<ResultCache>,
    store: Arc<S>,
    recompute: Arc<Q>,
}

impl<S, Q> AppState<S, Q> {
    pub fn new(cache: Arc<ResultCache>, store: Arc<S>, recompute: Arc<Q>) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                cache,
                store,
                recompute,
            }),
        }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.inner.cache
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    pub fn recompute(&self) -> &Q {
        &self.inner.recompute
    }
}

// Manual impl: `derive(Clone)` would demand `S: Clone` and `Q: Clone`.
impl<S, Q> Clone for AppState<S, Q> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Builds the axum router with all endpoints.
pub fn build_router<S, Q>(app_state: AppState<S, Q>) -> axum::Router
where
    S: Store + 'static,
    Q: RecomputeQueue + 'static,
{
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/v1/conversations/{conversation}/results",
            get(results_handler::<S, Q>),
        )
        .route(
            "/api/v1/conversations/{conversation}/participants/{participant}/assignment",
            get(assignment_handler::<S, Q>),
        )
        .route(
            "/api/v1/conversations/{conversation}/recompute",
            post(recompute_handler::<S, Q>),
        )
        .with_state(app_state)
}
