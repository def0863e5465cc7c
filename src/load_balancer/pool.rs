//! Backend pool management.
//!
//! # Responsibilities
//! - Own the ordered set of registered backends
//! - Select backends round-robin, skipping dead ones
//! - Evict dead backends
//!
//! # Design Decisions
//! - Membership and the rotation cursor share one mutex; the critical
//!   section is synchronous and never spans a network call
//! - Backend liveness lives on the backend itself, outside this lock
//! - Eviction preserves the relative order of surviving backends

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::load_balancer::{
    backend::Backend,
    round_robin::{self, Selection},
    PoolError,
};
use crate::observability::metrics;

#[derive(Debug, Default)]
struct PoolState {
    backends: Vec<Arc<Backend>>,
    cursor: usize,
}

/// The live collection of backends plus the rotation cursor.
#[derive(Debug, Default)]
pub struct BackendPool {
    state: Mutex<PoolState>,
}

impl BackendPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        // The state is consistent after every statement, so a panic in
        // another holder leaves nothing half-updated.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new live backend at the end of the rotation.
    pub fn add(&self, endpoint: impl Into<String>) -> Arc<Backend> {
        let backend = Arc::new(Backend::new(endpoint));
        let size = {
            let mut state = self.lock();
            state.backends.push(backend.clone());
            state.backends.len()
        };

        metrics::record_pool_size(size);
        tracing::info!(
            backend = %backend.id(),
            endpoint = %backend.endpoint(),
            pool_size = size,
            "Backend registered"
        );
        backend
    }

    /// Select the next live backend in rotation.
    pub fn select_next(&self) -> Result<Selection, PoolError> {
        let mut state = self.lock();
        let PoolState { backends, cursor } = &mut *state;
        round_robin::next_live(backends, cursor)
    }

    /// Remove every backend flagged dead. Returns how many were removed.
    pub fn evict(&self) -> usize {
        let (removed, remaining) = {
            let mut state = self.lock();
            let before = state.backends.len();
            state.backends.retain(|b| !b.is_dead());
            (before - state.backends.len(), state.backends.len())
        };

        if removed > 0 {
            metrics::record_eviction(removed);
            metrics::record_pool_size(remaining);
            tracing::info!(removed, remaining, "Evicted dead backends");
        }
        removed
    }

    /// Number of registered backends, dead or alive.
    pub fn len(&self) -> usize {
        self.lock().backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all registered backends in rotation order.
    pub fn all_backends(&self) -> Vec<Arc<Backend>> {
        self.lock().backends.clone()
    }
}
