//! Round-robin selection over a backend list.

use std::sync::Arc;

use crate::load_balancer::{backend::Backend, PoolError};

/// Result of a successful selection.
#[derive(Debug, Clone)]
pub struct Selection {
    /// The live backend that should serve the request.
    pub backend: Arc<Backend>,
    /// Whether at least one dead backend was skipped on the way.
    pub encountered_dead: bool,
}

/// Pick the next live backend starting at `cursor % len`.
///
/// Dead backends are skipped by advancing the cursor, for at most one full
/// rotation. On success the cursor is left one past the selected slot.
pub(crate) fn next_live(
    backends: &[Arc<Backend>],
    cursor: &mut usize,
) -> Result<Selection, PoolError> {
    let len = backends.len();
    if len == 0 {
        return Err(PoolError::Empty);
    }

    let mut encountered_dead = false;
    for _ in 0..len {
        let backend = &backends[*cursor % len];
        *cursor = cursor.wrapping_add(1);

        if !backend.is_dead() {
            return Ok(Selection {
                backend: backend.clone(),
                encountered_dead,
            });
        }
        encountered_dead = true;
    }

    Err(PoolError::AllBackendsDead)
}
