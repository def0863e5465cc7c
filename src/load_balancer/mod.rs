//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration → pool.rs (append backend)
//!
//! Client request
//!     → pool.rs (lock, pick next slot)
//!     → round_robin.rs (skip dead backends, at most one rotation)
//!     → unlock, return Selection { backend, encountered_dead }
//!     → dispatch (outside the lock)
//!     → if encountered_dead: pool.rs evict()
//! ```
//!
//! # Design Decisions
//! - One pool instance per process, shared by `Arc` with both planes
//! - Dead backends are never revived, only evicted
//! - Selection re-checks liveness on every attempt, so eviction may lag

use thiserror::Error;

pub mod backend;
pub mod pool;
pub mod round_robin;

pub use backend::{Backend, BackendId};
pub use pool::BackendPool;
pub use round_robin::Selection;

/// Reasons a selection cannot produce a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    /// No backend has been registered (or all were evicted).
    #[error("no backends registered")]
    Empty,

    /// Every registered backend is flagged dead.
    #[error("all backends are dead")]
    AllBackendsDead,
}
