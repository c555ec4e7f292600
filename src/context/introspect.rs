//! Server, device and stream introspection.
//!
//! Every request takes a one-shot closure and returns a [`PaOperation`].
//! Requests fail immediately with `Error::NotReady` while the context is not
//! ready, and with the context's error if libpulse rejects them. In both
//! cases the closure is dropped without being called. Otherwise it is called
//! exactly once from the mainloop.
//!
//! Lookups of a single object report a missing object as a
//! "No such entity" error.
//!
//! [`PaOperation`]: struct.PaOperation.html
use libc;
use libpulse_sys::*;
use std::ffi::CString;

use super::{PaContext, PaOperation};
use crate::callback::trampoline::{info_trampoline, server_info_trampoline, success_trampoline};
use crate::callback::RegisteredClosure;
use crate::error::Error;
use crate::info::{Record, ServerInfo, SinkInfo, SinkInputInfo, SourceInfo, SourceOutputInfo};
use crate::mainloop_api::PaMainLoopApi;
use crate::volume::ChannelVolumes;

type InfoCallback<R> = extern "C" fn(*mut pa_context, *const <R as Record>::Raw, libc::c_int, *mut libc::c_void);
type SuccessCallback = extern "C" fn(*mut pa_context, libc::c_int, *mut libc::c_void);

/// A device addressed either by index or by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    Index(u32),
    Name(&'a str),
}

impl From<u32> for Target<'static> {
    fn from(index: u32) -> Self {
        Target::Index(index)
    }
}

impl<'a> From<&'a str> for Target<'a> {
    fn from(name: &'a str) -> Self {
        Target::Name(name)
    }
}

impl<M: PaMainLoopApi + 'static> PaContext<M> {
    fn success_op<F, C>(&self, callback: F, call: C) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
        C: FnOnce(*mut pa_context, SuccessCallback, *mut libc::c_void) -> *mut pa_operation,
    {
        self.issue(RegisteredClosure::single(callback), |c, userdata| call(c, success_trampoline, userdata))
    }

    fn info_list<R, F, C>(&self, callback: F, call: C) -> Result<PaOperation, Error>
    where
        R: Record,
        F: FnOnce(Result<Vec<R>, Error>) + 'static,
        C: FnOnce(*mut pa_context, InfoCallback<R>, *mut libc::c_void) -> *mut pa_operation,
    {
        self.issue(RegisteredClosure::list(callback), |c, userdata| call(c, info_trampoline::<R>, userdata))
    }

    fn info_single<R, F, C>(&self, callback: F, call: C) -> Result<PaOperation, Error>
    where
        R: Record,
        F: FnOnce(Result<R, Error>) + 'static,
        C: FnOnce(*mut pa_context, InfoCallback<R>, *mut libc::c_void) -> *mut pa_operation,
    {
        self.issue(RegisteredClosure::single(callback), |c, userdata| call(c, info_trampoline::<R>, userdata))
    }

    /// Makes the named sink the server's default.
    pub fn set_default_sink<F>(&self, name: &str, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        let name = CString::new(name)?;
        self.success_op(callback, |c, cb, userdata| unsafe {
            pa_context_set_default_sink(c, name.as_ptr(), Some(cb), userdata)
        })
    }

    /// Makes the named source the server's default.
    pub fn set_default_source<F>(&self, name: &str, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        let name = CString::new(name)?;
        self.success_op(callback, |c, cb, userdata| unsafe {
            pa_context_set_default_source(c, name.as_ptr(), Some(cb), userdata)
        })
    }

    pub fn get_server_info<F>(&self, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<ServerInfo, Error>) + 'static,
    {
        self.issue(RegisteredClosure::single(callback), |c, userdata| unsafe {
            pa_context_get_server_info(c, Some(server_info_trampoline), userdata)
        })
    }

    // Sinks

    pub fn get_sink_info_list<F>(&self, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<Vec<SinkInfo>, Error>) + 'static,
    {
        self.info_list::<SinkInfo, _, _>(callback, |c, cb, userdata| unsafe {
            pa_context_get_sink_info_list(c, Some(cb), userdata)
        })
    }

    pub fn get_sink_info_by_name<F>(&self, name: &str, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<SinkInfo, Error>) + 'static,
    {
        let name = CString::new(name)?;
        self.info_single::<SinkInfo, _, _>(callback, |c, cb, userdata| unsafe {
            pa_context_get_sink_info_by_name(c, name.as_ptr(), Some(cb), userdata)
        })
    }

    pub fn get_sink_info_by_index<F>(&self, index: u32, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<SinkInfo, Error>) + 'static,
    {
        self.info_single::<SinkInfo, _, _>(callback, |c, cb, userdata| unsafe {
            pa_context_get_sink_info_by_index(c, index, Some(cb), userdata)
        })
    }

    pub fn get_sink_info<'a, T, F>(&self, target: T, callback: F) -> Result<PaOperation, Error>
    where
        T: Into<Target<'a>>,
        F: FnOnce(Result<SinkInfo, Error>) + 'static,
    {
        match target.into() {
            Target::Index(index) => self.get_sink_info_by_index(index, callback),
            Target::Name(name) => self.get_sink_info_by_name(name, callback),
        }
    }

    pub fn set_sink_volume_by_name<F>(
        &self,
        name: &str,
        volume: &ChannelVolumes,
        callback: F,
    ) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        let name = CString::new(name)?;
        let volume = volume.to_raw();
        self.success_op(callback, |c, cb, userdata| unsafe {
            pa_context_set_sink_volume_by_name(c, name.as_ptr(), &volume, Some(cb), userdata)
        })
    }

    pub fn set_sink_volume_by_index<F>(
        &self,
        index: u32,
        volume: &ChannelVolumes,
        callback: F,
    ) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        let volume = volume.to_raw();
        self.success_op(callback, |c, cb, userdata| unsafe {
            pa_context_set_sink_volume_by_index(c, index, &volume, Some(cb), userdata)
        })
    }

    pub fn set_sink_volume<'a, T, F>(
        &self,
        target: T,
        volume: &ChannelVolumes,
        callback: F,
    ) -> Result<PaOperation, Error>
    where
        T: Into<Target<'a>>,
        F: FnOnce(Result<(), Error>) + 'static,
    {
        match target.into() {
            Target::Index(index) => self.set_sink_volume_by_index(index, volume, callback),
            Target::Name(name) => self.set_sink_volume_by_name(name, volume, callback),
        }
    }

    pub fn set_sink_mute_by_name<F>(&self, name: &str, mute: bool, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        let name = CString::new(name)?;
        self.success_op(callback, |c, cb, userdata| unsafe {
            pa_context_set_sink_mute_by_name(c, name.as_ptr(), mute as libc::c_int, Some(cb), userdata)
        })
    }

    pub fn set_sink_mute_by_index<F>(&self, index: u32, mute: bool, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        self.success_op(callback, |c, cb, userdata| unsafe {
            pa_context_set_sink_mute_by_index(c, index, mute as libc::c_int, Some(cb), userdata)
        })
    }

    pub fn set_sink_mute<'a, T, F>(&self, target: T, mute: bool, callback: F) -> Result<PaOperation, Error>
    where
        T: Into<Target<'a>>,
        F: FnOnce(Result<(), Error>) + 'static,
    {
        match target.into() {
            Target::Index(index) => self.set_sink_mute_by_index(index, mute, callback),
            Target::Name(name) => self.set_sink_mute_by_name(name, mute, callback),
        }
    }

    pub fn suspend_sink_by_name<F>(&self, name: &str, suspend: bool, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        let name = CString::new(name)?;
        self.success_op(callback, |c, cb, userdata| unsafe {
            pa_context_suspend_sink_by_name(c, name.as_ptr(), suspend as libc::c_int, Some(cb), userdata)
        })
    }

    pub fn suspend_sink_by_index<F>(&self, index: u32, suspend: bool, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        self.success_op(callback, |c, cb, userdata| unsafe {
            pa_context_suspend_sink_by_index(c, index, suspend as libc::c_int, Some(cb), userdata)
        })
    }

    pub fn suspend_sink<'a, T, F>(&self, target: T, suspend: bool, callback: F) -> Result<PaOperation, Error>
    where
        T: Into<Target<'a>>,
        F: FnOnce(Result<(), Error>) + 'static,
    {
        match target.into() {
            Target::Index(index) => self.suspend_sink_by_index(index, suspend, callback),
            Target::Name(name) => self.suspend_sink_by_name(name, suspend, callback),
        }
    }

    // Sources

    pub fn get_source_info_list<F>(&self, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<Vec<SourceInfo>, Error>) + 'static,
    {
        self.info_list::<SourceInfo, _, _>(callback, |c, cb, userdata| unsafe {
            pa_context_get_source_info_list(c, Some(cb), userdata)
        })
    }

    pub fn get_source_info_by_name<F>(&self, name: &str, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<SourceInfo, Error>) + 'static,
    {
        let name = CString::new(name)?;
        self.info_single::<SourceInfo, _, _>(callback, |c, cb, userdata| unsafe {
            pa_context_get_source_info_by_name(c, name.as_ptr(), Some(cb), userdata)
        })
    }

    pub fn get_source_info_by_index<F>(&self, index: u32, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<SourceInfo, Error>) + 'static,
    {
        self.info_single::<SourceInfo, _, _>(callback, |c, cb, userdata| unsafe {
            pa_context_get_source_info_by_index(c, index, Some(cb), userdata)
        })
    }

    pub fn get_source_info<'a, T, F>(&self, target: T, callback: F) -> Result<PaOperation, Error>
    where
        T: Into<Target<'a>>,
        F: FnOnce(Result<SourceInfo, Error>) + 'static,
    {
        match target.into() {
            Target::Index(index) => self.get_source_info_by_index(index, callback),
            Target::Name(name) => self.get_source_info_by_name(name, callback),
        }
    }

    pub fn set_source_volume_by_name<F>(
        &self,
        name: &str,
        volume: &ChannelVolumes,
        callback: F,
    ) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        let name = CString::new(name)?;
        let volume = volume.to_raw();
        self.success_op(callback, |c, cb, userdata| unsafe {
            pa_context_set_source_volume_by_name(c, name.as_ptr(), &volume, Some(cb), userdata)
        })
    }

    pub fn set_source_volume_by_index<F>(
        &self,
        index: u32,
        volume: &ChannelVolumes,
        callback: F,
    ) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        let volume = volume.to_raw();
        self.success_op(callback, |c, cb, userdata| unsafe {
            pa_context_set_source_volume_by_index(c, index, &volume, Some(cb), userdata)
        })
    }

    pub fn set_source_volume<'a, T, F>(
        &self,
        target: T,
        volume: &ChannelVolumes,
        callback: F,
    ) -> Result<PaOperation, Error>
    where
        T: Into<Target<'a>>,
        F: FnOnce(Result<(), Error>) + 'static,
    {
        match target.into() {
            Target::Index(index) => self.set_source_volume_by_index(index, volume, callback),
            Target::Name(name) => self.set_source_volume_by_name(name, volume, callback),
        }
    }

    pub fn set_source_mute_by_name<F>(&self, name: &str, mute: bool, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        let name = CString::new(name)?;
        self.success_op(callback, |c, cb, userdata| unsafe {
            pa_context_set_source_mute_by_name(c, name.as_ptr(), mute as libc::c_int, Some(cb), userdata)
        })
    }

    pub fn set_source_mute_by_index<F>(&self, index: u32, mute: bool, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        self.success_op(callback, |c, cb, userdata| unsafe {
            pa_context_set_source_mute_by_index(c, index, mute as libc::c_int, Some(cb), userdata)
        })
    }

    pub fn set_source_mute<'a, T, F>(&self, target: T, mute: bool, callback: F) -> Result<PaOperation, Error>
    where
        T: Into<Target<'a>>,
        F: FnOnce(Result<(), Error>) + 'static,
    {
        match target.into() {
            Target::Index(index) => self.set_source_mute_by_index(index, mute, callback),
            Target::Name(name) => self.set_source_mute_by_name(name, mute, callback),
        }
    }

    pub fn suspend_source_by_name<F>(&self, name: &str, suspend: bool, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        let name = CString::new(name)?;
        self.success_op(callback, |c, cb, userdata| unsafe {
            pa_context_suspend_source_by_name(c, name.as_ptr(), suspend as libc::c_int, Some(cb), userdata)
        })
    }

    pub fn suspend_source_by_index<F>(&self, index: u32, suspend: bool, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        self.success_op(callback, |c, cb, userdata| unsafe {
            pa_context_suspend_source_by_index(c, index, suspend as libc::c_int, Some(cb), userdata)
        })
    }

    pub fn suspend_source<'a, T, F>(&self, target: T, suspend: bool, callback: F) -> Result<PaOperation, Error>
    where
        T: Into<Target<'a>>,
        F: FnOnce(Result<(), Error>) + 'static,
    {
        match target.into() {
            Target::Index(index) => self.suspend_source_by_index(index, suspend, callback),
            Target::Name(name) => self.suspend_source_by_name(name, suspend, callback),
        }
    }

    // Sink inputs

    pub fn get_sink_input_info_list<F>(&self, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<Vec<SinkInputInfo>, Error>) + 'static,
    {
        self.info_list::<SinkInputInfo, _, _>(callback, |c, cb, userdata| unsafe {
            pa_context_get_sink_input_info_list(c, Some(cb), userdata)
        })
    }

    pub fn get_sink_input_info<F>(&self, index: u32, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<SinkInputInfo, Error>) + 'static,
    {
        self.info_single::<SinkInputInfo, _, _>(callback, |c, cb, userdata| unsafe {
            pa_context_get_sink_input_info(c, index, Some(cb), userdata)
        })
    }

    /// Moves a playing stream to another sink.
    pub fn move_sink_input_by_name<F>(&self, index: u32, sink_name: &str, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        let sink_name = CString::new(sink_name)?;
        self.success_op(callback, |c, cb, userdata| unsafe {
            pa_context_move_sink_input_by_name(c, index, sink_name.as_ptr(), Some(cb), userdata)
        })
    }

    pub fn move_sink_input_by_index<F>(&self, index: u32, sink_index: u32, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        self.success_op(callback, |c, cb, userdata| unsafe {
            pa_context_move_sink_input_by_index(c, index, sink_index, Some(cb), userdata)
        })
    }

    pub fn move_sink_input<'a, T, F>(&self, index: u32, sink: T, callback: F) -> Result<PaOperation, Error>
    where
        T: Into<Target<'a>>,
        F: FnOnce(Result<(), Error>) + 'static,
    {
        match sink.into() {
            Target::Index(sink_index) => self.move_sink_input_by_index(index, sink_index, callback),
            Target::Name(sink_name) => self.move_sink_input_by_name(index, sink_name, callback),
        }
    }

    pub fn set_sink_input_volume<F>(
        &self,
        index: u32,
        volume: &ChannelVolumes,
        callback: F,
    ) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        let volume = volume.to_raw();
        self.success_op(callback, |c, cb, userdata| unsafe {
            pa_context_set_sink_input_volume(c, index, &volume, Some(cb), userdata)
        })
    }

    pub fn set_sink_input_mute<F>(&self, index: u32, mute: bool, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        self.success_op(callback, |c, cb, userdata| unsafe {
            pa_context_set_sink_input_mute(c, index, mute as libc::c_int, Some(cb), userdata)
        })
    }

    /// Disconnects a playing stream from the server.
    pub fn kill_sink_input<F>(&self, index: u32, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        self.success_op(callback, |c, cb, userdata| unsafe { pa_context_kill_sink_input(c, index, Some(cb), userdata) })
    }

    // Source outputs

    pub fn get_source_output_info_list<F>(&self, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<Vec<SourceOutputInfo>, Error>) + 'static,
    {
        self.info_list::<SourceOutputInfo, _, _>(callback, |c, cb, userdata| unsafe {
            pa_context_get_source_output_info_list(c, Some(cb), userdata)
        })
    }

    pub fn get_source_output_info<F>(&self, index: u32, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<SourceOutputInfo, Error>) + 'static,
    {
        self.info_single::<SourceOutputInfo, _, _>(callback, |c, cb, userdata| unsafe {
            pa_context_get_source_output_info(c, index, Some(cb), userdata)
        })
    }

    /// Moves a recording stream to another source.
    pub fn move_source_output_by_name<F>(
        &self,
        index: u32,
        source_name: &str,
        callback: F,
    ) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        let source_name = CString::new(source_name)?;
        self.success_op(callback, |c, cb, userdata| unsafe {
            pa_context_move_source_output_by_name(c, index, source_name.as_ptr(), Some(cb), userdata)
        })
    }

    pub fn move_source_output_by_index<F>(
        &self,
        index: u32,
        source_index: u32,
        callback: F,
    ) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        self.success_op(callback, |c, cb, userdata| unsafe {
            pa_context_move_source_output_by_index(c, index, source_index, Some(cb), userdata)
        })
    }

    pub fn move_source_output<'a, T, F>(&self, index: u32, source: T, callback: F) -> Result<PaOperation, Error>
    where
        T: Into<Target<'a>>,
        F: FnOnce(Result<(), Error>) + 'static,
    {
        match source.into() {
            Target::Index(source_index) => self.move_source_output_by_index(index, source_index, callback),
            Target::Name(source_name) => self.move_source_output_by_name(index, source_name, callback),
        }
    }

    pub fn set_source_output_volume<F>(
        &self,
        index: u32,
        volume: &ChannelVolumes,
        callback: F,
    ) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        let volume = volume.to_raw();
        self.success_op(callback, |c, cb, userdata| unsafe {
            pa_context_set_source_output_volume(c, index, &volume, Some(cb), userdata)
        })
    }

    pub fn set_source_output_mute<F>(&self, index: u32, mute: bool, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        self.success_op(callback, |c, cb, userdata| unsafe {
            pa_context_set_source_output_mute(c, index, mute as libc::c_int, Some(cb), userdata)
        })
    }

    /// Disconnects a recording stream from the server.
    pub fn kill_source_output<F>(&self, index: u32, callback: F) -> Result<PaOperation, Error>
    where
        F: FnOnce(Result<(), Error>) + 'static,
    {
        self.success_op(callback, |c, cb, userdata| unsafe {
            pa_context_kill_source_output(c, index, Some(cb), userdata)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_convert_from_index_and_name() {
        assert_eq!(Target::from(3u32), Target::Index(3));
        assert_eq!(Target::from("alsa_output.pci"), Target::Name("alsa_output.pci"));
    }
}
