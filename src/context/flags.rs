use libpulse_sys::*;

/// Options for [`PaContext::connect`](struct.PaContext.html#method.connect).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaContextFlags {
    /// Do not start a daemon if none is running.
    pub no_autospawn: bool,
    /// Keep waiting for a daemon instead of failing when none is available.
    pub no_fail: bool,
}

impl PaContextFlags {
    pub fn to_raw(self) -> pa_context_flags_t {
        let mut raw = PA_CONTEXT_NOFLAGS;
        if self.no_autospawn {
            raw |= PA_CONTEXT_NOAUTOSPAWN;
        }
        if self.no_fail {
            raw |= PA_CONTEXT_NOFAIL;
        }
        raw
    }
}

impl Default for PaContextFlags {
    fn default() -> Self {
        PaContextFlags { no_autospawn: true, no_fail: false }
    }
}
