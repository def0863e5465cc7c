//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single registered backend server
//! - Track liveness (alive until a dispatch failure marks it dead)
//!
//! # Design Decisions
//! - The endpoint is stored exactly as registered; it is parsed when a
//!   request is forwarded, not at registration time
//! - Liveness is synchronized independently of the pool lock so that
//!   selection reads never contend with each other
//! - There is no revival: a dead backend is evicted, not resurrected

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Global counter for backend IDs.
static BACKEND_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a registered backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackendId(u64);

impl BackendId {
    fn next() -> Self {
        Self(BACKEND_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for BackendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "backend-{}", self.0)
    }
}

/// A single registered backend server.
#[derive(Debug)]
pub struct Backend {
    id: BackendId,
    /// Target address as registered (e.g. "http://10.0.0.5:9000").
    endpoint: String,
    dead: AtomicBool,
}

impl Backend {
    /// Create a new, live backend.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            id: BackendId::next(),
            endpoint: endpoint.into(),
            dead: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> BackendId {
        self.id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Flag the backend as dead. Idempotent.
    ///
    /// Returns `true` if this call performed the transition.
    pub fn mark_dead(&self) -> bool {
        !self.dead.swap(true, Ordering::AcqRel)
    }

    /// Return true once the backend has been marked dead.
    pub fn is_dead(&self) -> bool {
        self.dead.load(Ordering::Acquire)
    }
}
