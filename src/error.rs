//! Error values and libpulse error strings.
use libc;
use libpulse_sys::*;
use std::ffi::{CStr, NulError};
use thiserror::Error;

/// libpulse error code for "No such entity".
pub const PA_ERR_NOENTITY: libc::c_int = 5;
/// libpulse error code for "Bad state".
pub const PA_ERR_BADSTATE: libc::c_int = 15;
/// libpulse error code for "Unknown error code".
pub const PA_ERR_UNKNOWN: libc::c_int = 20;

pub fn strerror_ref(error: libc::c_int) -> &'static CStr {
    unsafe { CStr::from_ptr(pa_strerror(error)) }
}

pub fn strerror(error: libc::c_int) -> String {
    strerror_ref(error).to_string_lossy().into_owned()
}

/// Errors reported by this crate.
///
/// Failures of asynchronous operations are handed to the operation's callback
/// as `Err(Error)`. Requests rejected before anything was scheduled are
/// returned directly from the issuing call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An error reported by libpulse, displayed with `pa_strerror`.
    #[error("{}", strerror(*code))]
    Pulse { code: libc::c_int },
    /// The context is not in the `Ready` state.
    #[error("connection not ready")]
    NotReady,
    /// A string argument contained an interior nul byte.
    #[error("string argument contains an interior nul byte")]
    NulByte,
    /// `unsubscribe` was called with a position that is not subscribed.
    #[error("no subscription at position {0}")]
    UnknownSubscription(usize),
    /// A property list key was rejected by libpulse.
    #[error("invalid property key: {0}")]
    InvalidPropertyKey(String),
    /// `pa_context_new` returned null.
    #[error("failed to create pulseaudio context")]
    ContextCreation,
    /// No GLib main context could be acquired.
    #[error("failed to acquire the default GLib main context")]
    MainContext,
}

impl Error {
    /// Wraps a libpulse error code.
    pub fn from_code(code: libc::c_int) -> Error {
        Error::Pulse { code }
    }

    /// The error delivered when an operation finished without error but also without a record.
    pub fn no_entity() -> Error {
        Error::from_code(PA_ERR_NOENTITY)
    }

    /// Returns the libpulse error code, if this error came from libpulse.
    pub fn code(&self) -> Option<libc::c_int> {
        match *self {
            Error::Pulse { code } => Some(code),
            _ => None,
        }
    }
}

impl From<NulError> for Error {
    fn from(_: NulError) -> Error {
        Error::NulByte
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_errors_display_libpulse_text() {
        let err = Error::no_entity();
        assert_eq!(err.code(), Some(PA_ERR_NOENTITY));
        assert_eq!(err.to_string(), strerror(PA_ERR_NOENTITY));
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn local_errors_have_no_code() {
        assert_eq!(Error::NotReady.code(), None);
        assert_eq!(Error::NotReady.to_string(), "connection not ready");
        assert_eq!(Error::UnknownSubscription(3).to_string(), "no subscription at position 3");
    }

    #[test]
    fn nul_errors_convert() {
        let err: Error = std::ffi::CString::new("a\0b").unwrap_err().into();
        assert_eq!(err, Error::NulByte);
    }
}
