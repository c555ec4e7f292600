//! Implementation of [`PaMainLoopApi`] with libpulse's own `pa_mainloop`.
//!
//! Useful where no GLib main context is running, e.g. command line tools and tests.
//!
//! [`PaMainLoopApi`]: ../mainloop_api/trait.PaMainLoopApi.html
use libpulse_sys::*;
use std::ptr::null_mut;
use std::rc::Rc;

use crate::callback;
use crate::mainloop_api::PaMainLoopApi;

struct StandardMainLoopImpl(*mut pa_mainloop);

impl Drop for StandardMainLoopImpl {
    fn drop(&mut self) {
        unsafe { pa_mainloop_free(self.0) }
    }
}

#[derive(Clone)]
pub struct PaStandardMainLoop {
    intern: Rc<StandardMainLoopImpl>,
}

impl PaStandardMainLoop {
    pub fn new() -> PaStandardMainLoop {
        let raw = unsafe { pa_mainloop_new() };
        assert!(raw != null_mut());
        PaStandardMainLoop { intern: Rc::new(StandardMainLoopImpl(raw)) }
    }

    /// Runs one iteration of the mainloop.
    ///
    /// Returns the number of dispatched sources, or `None` if the loop was quit or failed.
    pub fn iterate(&self, block: bool) -> Option<u32> {
        let mut retval = 0;
        let dispatched = unsafe { pa_mainloop_iterate(self.intern.0, block as i32, &mut retval) };
        callback::resume_pending_panic();
        if dispatched < 0 {
            None
        } else {
            Some(dispatched as u32)
        }
    }

    /// Iterates, blocking, until `done` returns true or the loop stops.
    pub fn run_until<F: FnMut() -> bool>(&self, mut done: F) {
        while !done() {
            if self.iterate(true).is_none() {
                break;
            }
        }
    }
}

impl Default for PaStandardMainLoop {
    fn default() -> Self {
        PaStandardMainLoop::new()
    }
}

unsafe impl PaMainLoopApi for PaStandardMainLoop {
    fn get_api(&self) -> *mut pa_mainloop_api {
        unsafe { pa_mainloop_get_api(self.intern.0) as *mut pa_mainloop_api }
    }
}
