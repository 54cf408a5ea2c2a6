//! Backend growth policy shared by the collections.

use offheap_storage::StorageBackend;
use tracing::debug;

use crate::Result;

/// Make sure the backend holds at least `required` bytes.
///
/// Capacity doubles, or jumps straight to `required` when doubling is not
/// enough. Returns whether a resize happened.
pub(crate) fn ensure_capacity<B: StorageBackend>(storage: &mut B, required: u64) -> Result<bool> {
    let current = storage.capacity();
    if required <= current {
        return Ok(false);
    }

    let target = current.saturating_mul(2).max(required);
    storage.resize(target)?;
    debug!(
        kind = %storage.kind(),
        old_bytes = current,
        new_bytes = target,
        "grew collection storage"
    );
    Ok(true)
}
