//! Rust trait for a pulseaudio mainloop abstraction.
use libpulse_sys::pa_mainloop_api;

/// Trait for types that provide a pulseaudio mainloop abstraction.
///
/// A user of the asynchronous pulseaudio API must hook into a mainloop.
/// This requires a [mainloop abstraction](https://freedesktop.org/software/pulseaudio/doxygen/async.html#mainloop_sec).
/// This crate ships two: [`PaGlibMainLoop`] drives libpulse from a GLib main
/// context, [`PaStandardMainLoop`] uses libpulse's own `pa_mainloop`.
///
/// Types that implement this trait must implement `Clone`, since every
/// [`PaContext`] holds a copy of the mainloop API to ensure that it lives
/// long enough.
///
/// # Safety
///
/// Implementers of this trait must ensure that all callbacks in the structure returned
/// by [`get_api`] are set and that they have defined behaviour when they are called from
/// `libpulse`. All callbacks must be dispatched on the thread that owns the
/// mainloop, since the callback registry of a context is not synchronized.
///
/// [`get_api`]: #tymethod.get_api
/// [`PaGlibMainLoop`]: ../glib_mainloop/struct.PaGlibMainLoop.html
/// [`PaStandardMainLoop`]: ../standard_mainloop/struct.PaStandardMainLoop.html
/// [`PaContext`]: ../context/struct.PaContext.html
pub unsafe trait PaMainLoopApi: Clone {
    /// Returns a raw pointer to a mainloop API structure.
    fn get_api(&self) -> *mut pa_mainloop_api;
}
