//! Bridging libpulse callbacks into Rust closures.
//!
//! libpulse reports the outcome of an asynchronous request by calling a C
//! function pointer with an opaque `userdata` pointer, later, from inside the
//! mainloop. This module keeps the Rust closure for such a request alive in a
//! [`Registry`] until the terminal callback arrives, provides the `extern "C"`
//! trampolines that find the closure again, and multiplexes the single
//! subscription callback libpulse allows per context onto a
//! [`SubscriptionTable`].
//!
//! Closures must not unwind into libpulse. Trampolines catch panics, log
//! them and park the payload for the current thread; the mainloop adapters
//! resume it as soon as the native iteration has returned.
//!
//! [`Registry`]: struct.Registry.html
//! [`SubscriptionTable`]: struct.SubscriptionTable.html
mod registry;
mod subscription;
pub(crate) mod trampoline;

use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};

pub use self::registry::{Callback, ClosureHandle, RegisteredClosure, Registry, WeakRegistry};
pub use self::subscription::{EventKind, Facility, SubscriptionEvent, SubscriptionTable};

thread_local! {
    static PENDING_PANIC: RefCell<Option<Box<dyn Any + Send>>> = RefCell::new(None);
}

/// Runs a closure invocation without letting a panic escape.
pub(crate) fn guarded<F: FnOnce()>(f: F) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
        error!("callback closure panicked: {}", panic_message(&*payload));
        PENDING_PANIC.with(|pending| {
            let mut pending = pending.borrow_mut();
            if pending.is_none() {
                *pending = Some(payload);
            } else {
                warn!("dropping panic payload, an earlier one has not been resumed yet");
            }
        });
    }
}

/// Takes the panic payload caught in a callback on this thread, if any.
pub fn take_callback_panic() -> Option<Box<dyn Any + Send>> {
    PENDING_PANIC.with(|pending| pending.borrow_mut().take())
}

/// Resumes a panic caught in a callback on this thread.
///
/// Must only be called while no native frames are on the stack.
pub fn resume_pending_panic() {
    if let Some(payload) = take_callback_panic() {
        panic::resume_unwind(payload);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "<non-string payload>"
    }
}
