//! Implementation of [`PaMainLoopApi`] on top of a GLib main context.
//!
//! [`PaMainLoopApi`]: ../mainloop_api/trait.PaMainLoopApi.html
use libc;
use libpulse_sys::pa_mainloop_api;
use std::ptr::null_mut;
use std::rc::Rc;

use crate::callback;
use crate::error::Error;
use crate::mainloop_api::PaMainLoopApi;

/// Opaque GLib main context.
pub enum GMainContext {}

/// Opaque libpulse GLib mainloop adapter.
#[allow(non_camel_case_types)]
pub enum pa_glib_mainloop {}

#[link(name = "pulse-mainloop-glib")]
extern "C" {
    fn pa_glib_mainloop_new(c: *mut GMainContext) -> *mut pa_glib_mainloop;
    fn pa_glib_mainloop_free(g: *mut pa_glib_mainloop);
    fn pa_glib_mainloop_get_api(g: *mut pa_glib_mainloop) -> *mut pa_mainloop_api;
}

#[link(name = "glib-2.0")]
extern "C" {
    fn g_main_context_default() -> *mut GMainContext;
    fn g_main_context_ref(context: *mut GMainContext) -> *mut GMainContext;
    fn g_main_context_unref(context: *mut GMainContext);
    fn g_main_context_iteration(context: *mut GMainContext, may_block: libc::c_int) -> libc::c_int;
}

struct GlibMainLoopImpl {
    raw: *mut pa_glib_mainloop,
    context: *mut GMainContext,
}

impl Drop for GlibMainLoopImpl {
    fn drop(&mut self) {
        unsafe {
            pa_glib_mainloop_free(self.raw);
            g_main_context_unref(self.context);
        }
    }
}

/// Drives libpulse from a GLib main context.
///
/// All pulseaudio callbacks, and therefore all closures handed to a
/// [`PaContext`](../context/struct.PaContext.html), run while the main context
/// is being iterated, either by [`iterate`](#method.iterate) or by whoever else
/// runs that context (e.g. a GTK application).
#[derive(Clone)]
pub struct PaGlibMainLoop {
    intern: Rc<GlibMainLoopImpl>,
}

impl PaGlibMainLoop {
    /// Creates a mainloop adapter on the global default main context.
    pub fn new() -> Result<PaGlibMainLoop, Error> {
        let context = unsafe { g_main_context_default() };
        if context.is_null() {
            return Err(Error::MainContext);
        }
        Ok(unsafe { Self::with_context(context) })
    }

    /// Creates a mainloop adapter on a specific main context.
    ///
    /// # Safety
    ///
    /// `context` must point to a valid `GMainContext`. The adapter takes its own reference.
    pub unsafe fn with_context(context: *mut GMainContext) -> PaGlibMainLoop {
        assert!(context != null_mut());
        let context = g_main_context_ref(context);
        let raw = pa_glib_mainloop_new(context);
        assert!(raw != null_mut());
        debug!("created glib mainloop adapter");
        PaGlibMainLoop { intern: Rc::new(GlibMainLoopImpl { raw, context }) }
    }

    /// Runs a single iteration of the main context.
    ///
    /// Returns whether any event was dispatched. A panic raised by a callback
    /// closure during the iteration is resumed here.
    pub fn iterate(&self, may_block: bool) -> bool {
        let dispatched = unsafe { g_main_context_iteration(self.intern.context, may_block as libc::c_int) != 0 };
        callback::resume_pending_panic();
        dispatched
    }

    /// Iterates the main context, blocking, until `done` returns true.
    pub fn run_until<F: FnMut() -> bool>(&self, mut done: F) {
        while !done() {
            self.iterate(true);
        }
    }
}

unsafe impl PaMainLoopApi for PaGlibMainLoop {
    fn get_api(&self) -> *mut pa_mainloop_api {
        unsafe { pa_glib_mainloop_get_api(self.intern.raw) }
    }
}
