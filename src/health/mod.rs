//! Health tracking subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatch failed
//!     → passive.rs (classify: cancelled vs. backend failure)
//!     → backend failure: Backend::mark_dead()
//!     → next selection that skips it triggers pool eviction
//! ```
//!
//! # Design Decisions
//! - Passive only; there are no periodic probes
//! - Health state is per-backend, not per-pool

pub mod passive;

pub use passive::{record_failure, DispatchFailure};
