use libpulse_sys::*;
use std::ptr::NonNull;

use crate::callback::{ClosureHandle, WeakRegistry};
use crate::refcount::RefCounted;

/// A request that is in flight on a [`PaContext`](struct.PaContext.html).
///
/// Dropping the handle does not stop the request, its callback still runs.
pub struct PaOperation {
    raw: RefCounted<pa_operation>,
    registry: WeakRegistry,
    handle: ClosureHandle,
}

impl PaOperation {
    pub(crate) fn new(raw: NonNull<pa_operation>, registry: WeakRegistry, handle: ClosureHandle) -> PaOperation {
        PaOperation { raw: unsafe { RefCounted::new(raw.as_ptr()) }, registry, handle }
    }

    /// Whether the callback is still outstanding.
    pub fn is_running(&self) -> bool {
        unsafe { pa_operation_get_state(self.raw.get()) == PA_OPERATION_RUNNING }
    }

    /// The registry handle of this operation's closure.
    pub fn handle(&self) -> ClosureHandle {
        self.handle
    }

    /// Cancels the request. The closure is dropped without being called.
    ///
    /// Has no effect on the closure if the request already completed.
    pub fn cancel(self) {
        unsafe { pa_operation_cancel(self.raw.get()) };
        if let Some(registry) = self.registry.upgrade() {
            if registry.discard(self.handle) {
                debug!("cancelled operation for callback {}", self.handle);
            }
        }
    }
}

pa_refcountable!(pa_operation, pa_operation_ref, pa_operation_unref);
