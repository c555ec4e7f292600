//! Property lists.
use libc;
use libpulse_sys::*;
use std::collections::BTreeMap;
use std::ffi::{CStr, CString};
use std::fmt;
use std::ptr::null_mut;

use crate::error::Error;
use crate::info::optional_string;

/// Owned snapshot of a property list.
pub type Properties = BTreeMap<String, String>;

/// Well known property keys.
pub mod keys {
    pub const MEDIA_NAME: &str = "media.name";
    pub const MEDIA_ROLE: &str = "media.role";
    pub const APPLICATION_NAME: &str = "application.name";
    pub const APPLICATION_ID: &str = "application.id";
    pub const APPLICATION_VERSION: &str = "application.version";
    pub const APPLICATION_ICON_NAME: &str = "application.icon_name";
    pub const APPLICATION_PROCESS_ID: &str = "application.process.id";
    pub const DEVICE_DESCRIPTION: &str = "device.description";
    pub const DEVICE_CLASS: &str = "device.class";
    pub const DEVICE_ICON_NAME: &str = "device.icon_name";
    pub const DEVICE_API: &str = "device.api";
}

/// Copies the string properties of a borrowed native property list.
///
/// A null list yields an empty map.
pub(crate) fn snapshot(raw: *mut pa_proplist) -> Properties {
    let mut properties = Properties::new();
    if raw.is_null() {
        return properties;
    }
    let mut state: *mut libc::c_void = null_mut();
    loop {
        let key = unsafe { pa_proplist_iterate(raw, &mut state) };
        if key.is_null() {
            break;
        }
        // Values that are not valid strings come back as null and are skipped.
        if let Some(value) = unsafe { optional_string(pa_proplist_gets(raw, key)) } {
            let key = unsafe { CStr::from_ptr(key) }.to_string_lossy().into_owned();
            properties.insert(key, value);
        }
    }
    properties
}

unsafe fn take_string(ptr: *const libc::c_char) -> String {
    assert!(!ptr.is_null());
    let s = CStr::from_ptr(ptr).to_string_lossy().into_owned();
    pa_xfree(ptr as *mut libc::c_void);
    s
}

/// An owned libpulse property list.
pub struct Proplist {
    raw: *mut pa_proplist,
}

impl Proplist {
    pub fn new() -> Proplist {
        let raw = unsafe { pa_proplist_new() };
        assert!(raw != null_mut());
        Proplist { raw }
    }

    /// Parses the `key = "value"` format produced by `Display`.
    pub fn from_string(s: &str) -> Result<Proplist, Error> {
        let s = CString::new(s)?;
        let raw = unsafe { pa_proplist_from_string(s.as_ptr()) };
        if raw.is_null() {
            Err(Error::from_code(crate::error::PA_ERR_UNKNOWN))
        } else {
            Ok(Proplist { raw })
        }
    }

    pub fn key_valid(key: &str) -> bool {
        match CString::new(key) {
            Ok(key) => unsafe { pa_proplist_key_valid(key.as_ptr()) != 0 },
            Err(_) => false,
        }
    }

    pub(crate) fn as_ptr(&self) -> *mut pa_proplist {
        self.raw
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        let c_key = CString::new(key)?;
        let c_value = CString::new(value)?;
        if unsafe { pa_proplist_sets(self.raw, c_key.as_ptr(), c_value.as_ptr()) } < 0 {
            return Err(Error::InvalidPropertyKey(key.to_owned()));
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let key = CString::new(key).ok()?;
        unsafe { optional_string(pa_proplist_gets(self.raw, key.as_ptr())) }
    }

    /// Removes a key. Returns whether it was present.
    pub fn unset(&mut self, key: &str) -> Result<bool, Error> {
        let c_key = CString::new(key)?;
        match unsafe { pa_proplist_unset(self.raw, c_key.as_ptr()) } {
            0 => Ok(true),
            r if r < 0 && Proplist::key_valid(key) => Ok(false),
            _ => Err(Error::InvalidPropertyKey(key.to_owned())),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        match CString::new(key) {
            Ok(key) => unsafe { pa_proplist_contains(self.raw, key.as_ptr()) > 0 },
            Err(_) => false,
        }
    }

    pub fn clear(&mut self) {
        unsafe { pa_proplist_clear(self.raw) }
    }

    pub fn len(&self) -> usize {
        unsafe { pa_proplist_size(self.raw) as usize }
    }

    pub fn is_empty(&self) -> bool {
        unsafe { pa_proplist_isempty(self.raw) != 0 }
    }

    /// Serializes with a custom separator between entries.
    pub fn to_string_sep(&self, sep: &str) -> Result<String, Error> {
        let sep = CString::new(sep)?;
        Ok(unsafe { take_string(pa_proplist_to_string_sep(self.raw, sep.as_ptr())) })
    }

    /// Copies all string properties into a map.
    pub fn to_map(&self) -> Properties {
        snapshot(self.raw)
    }
}

impl Default for Proplist {
    fn default() -> Self {
        Proplist::new()
    }
}

impl Clone for Proplist {
    fn clone(&self) -> Proplist {
        let raw = unsafe { pa_proplist_copy(self.raw) };
        assert!(raw != null_mut());
        Proplist { raw }
    }
}

impl PartialEq for Proplist {
    fn eq(&self, other: &Proplist) -> bool {
        unsafe { pa_proplist_equal(self.raw, other.raw) != 0 }
    }
}

impl fmt::Display for Proplist {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&unsafe { take_string(pa_proplist_to_string(self.raw)) })
    }
}

impl fmt::Debug for Proplist {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.to_map()).finish()
    }
}

impl Drop for Proplist {
    fn drop(&mut self) {
        unsafe { pa_proplist_free(self.raw) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_unset() {
        let mut props = Proplist::new();
        assert!(props.is_empty());
        props.set(keys::APPLICATION_NAME, "mixer").unwrap();
        assert_eq!(props.get(keys::APPLICATION_NAME).as_ref().map(String::as_str), Some("mixer"));
        assert!(props.contains(keys::APPLICATION_NAME));
        assert_eq!(props.len(), 1);
        assert_eq!(props.unset(keys::APPLICATION_NAME), Ok(true));
        assert_eq!(props.unset(keys::APPLICATION_NAME), Ok(false));
        assert!(!props.contains(keys::APPLICATION_NAME));
    }

    #[test]
    fn invalid_keys_are_rejected() {
        let mut props = Proplist::new();
        assert!(!Proplist::key_valid(""));
        assert_eq!(props.set("", "x"), Err(Error::InvalidPropertyKey(String::new())));
        assert_eq!(props.set("a\0b", "x"), Err(Error::NulByte));
    }

    #[test]
    fn copies_compare_equal_and_snapshot() {
        let mut props = Proplist::new();
        props.set(keys::MEDIA_ROLE, "music").unwrap();
        props.set(keys::MEDIA_NAME, "song").unwrap();
        let copy = props.clone();
        assert_eq!(copy, props);
        let map = copy.to_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map[keys::MEDIA_ROLE], "music");
        props.clear();
        assert!(props.is_empty());
        assert_eq!(copy.len(), 2);
    }

    #[test]
    fn string_round_trip() {
        let mut props = Proplist::new();
        props.set(keys::DEVICE_DESCRIPTION, "Built-in Audio").unwrap();
        let parsed = Proplist::from_string(&props.to_string()).unwrap();
        assert_eq!(parsed.get(keys::DEVICE_DESCRIPTION).as_ref().map(String::as_str), Some("Built-in Audio"));
        assert!(props.to_string_sep(", ").unwrap().contains("Built-in Audio"));
    }

    #[test]
    fn null_snapshot_is_empty() {
        assert!(snapshot(null_mut()).is_empty());
    }
}
