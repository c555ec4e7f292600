//! Asynchronous pulseaudio client bindings driven by a GLib main loop.
//!
//! Requests are issued on a [`PaContext`](context/struct.PaContext.html)
//! together with a Rust closure; the closure is called from the main loop
//! once libpulse delivers the result.
extern crate futures;
extern crate libc;
extern crate libpulse_sys;
#[macro_use]
extern crate log;
extern crate thiserror;

#[macro_use]
mod refcount;

pub mod callback;
pub mod context;
pub mod error;
pub mod glib_mainloop;
pub mod info;
pub mod mainloop_api;
pub mod proplist;
pub mod standard_mainloop;
pub mod volume;

pub use crate::context::{PaContext, PaContextFlags, PaContextState, PaOperation, Target};
pub use crate::error::Error;
pub use crate::glib_mainloop::PaGlibMainLoop;
pub use crate::standard_mainloop::PaStandardMainLoop;
