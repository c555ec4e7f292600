//! `extern "C"` entry points handed to libpulse as operation callbacks.
//!
//! Each trampoline recovers the registry and handle from `userdata`, copies
//! what libpulse passed in, releases the handle on the terminal event and
//! only then invokes the closure, so the closure may issue new operations.
use libc;
use libpulse_sys::*;

use super::guarded;
use super::registry::Registry;
use crate::error::{Error, PA_ERR_UNKNOWN};
use crate::info::{Record, ServerInfo};

/// The error libpulse recorded for the last failed operation on `c`.
fn context_error(c: *mut pa_context) -> Error {
    if c.is_null() {
        return Error::from_code(PA_ERR_UNKNOWN);
    }
    Error::from_code(unsafe { pa_context_errno(c) })
}

/// `pa_context_success_cb_t` for operations without a result.
pub extern "C" fn success_trampoline(c: *mut pa_context, success: libc::c_int, userdata: *mut libc::c_void) {
    let (registry, handle) = unsafe { Registry::from_userdata(userdata) };
    let result = if success != 0 { Ok(()) } else { Err(context_error(c)) };
    let closure = registry.release::<()>(handle);
    guarded(move || closure.complete(result));
}

/// `pa_server_info_cb_t`. Called exactly once, with null on failure.
pub extern "C" fn server_info_trampoline(c: *mut pa_context, info: *const pa_server_info, userdata: *mut libc::c_void) {
    let (registry, handle) = unsafe { Registry::from_userdata(userdata) };
    let result = match unsafe { info.as_ref() } {
        Some(info) => Ok(ServerInfo::from_raw(info)),
        None => Err(context_error(c)),
    };
    let closure = registry.release::<ServerInfo>(handle);
    guarded(move || closure.complete(result));
}

/// Info callbacks of the `pa_sink_info_cb_t` family.
///
/// libpulse calls these once per record with `eol == 0`, then once with
/// `eol > 0` at the end of the list, or once with `eol < 0` on failure.
pub extern "C" fn info_trampoline<R: Record>(
    c: *mut pa_context,
    info: *const R::Raw,
    eol: libc::c_int,
    userdata: *mut libc::c_void,
) {
    let (registry, handle) = unsafe { Registry::from_userdata(userdata) };
    if eol < 0 {
        let error = context_error(c);
        let closure = registry.release::<R>(handle);
        guarded(move || closure.fail(error));
    } else if eol > 0 {
        let closure = registry.release::<R>(handle);
        guarded(move || closure.finish());
    } else {
        match unsafe { info.as_ref() } {
            Some(raw) => {
                let record = R::from_raw(raw);
                registry.resolve::<R, _, _>(handle, move |closure| closure.accumulate(record));
            }
            None => warn!("info callback for {} without a record", handle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::{take_callback_panic, RegisteredClosure};
    use std::cell::RefCell;
    use std::mem;
    use std::ptr::{null, null_mut};
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(u32);

    impl Record for Item {
        type Raw = u32;

        fn from_raw(raw: &u32) -> Item {
            Item(*raw)
        }
    }

    type Calls<T> = Rc<RefCell<Vec<Result<T, Error>>>>;

    fn list_closure(registry: &Registry) -> (Calls<Vec<Item>>, *mut libc::c_void) {
        let calls: Calls<Vec<Item>> = Rc::new(RefCell::new(Vec::new()));
        let sink = calls.clone();
        let handle = registry.register(RegisteredClosure::list(move |r| sink.borrow_mut().push(r)));
        (calls, registry.userdata(handle))
    }

    fn single_closure(registry: &Registry) -> (Calls<Item>, *mut libc::c_void) {
        let calls: Calls<Item> = Rc::new(RefCell::new(Vec::new()));
        let sink = calls.clone();
        let handle = registry.register(RegisteredClosure::single(move |r| sink.borrow_mut().push(r)));
        (calls, registry.userdata(handle))
    }

    #[test]
    fn list_delivers_all_records_once() {
        let registry = Registry::new();
        let (calls, userdata) = list_closure(&registry);
        for n in 1..4 {
            info_trampoline::<Item>(null_mut(), &n, 0, userdata);
            assert!(calls.borrow().is_empty());
        }
        info_trampoline::<Item>(null_mut(), null(), 1, userdata);
        assert_eq!(*calls.borrow(), vec![Ok(vec![Item(1), Item(2), Item(3)])]);
        assert!(registry.is_empty());
    }

    #[test]
    fn empty_list_delivers_empty_sequence() {
        let registry = Registry::new();
        let (calls, userdata) = list_closure(&registry);
        info_trampoline::<Item>(null_mut(), null(), 1, userdata);
        assert_eq!(*calls.borrow(), vec![Ok(Vec::new())]);
        assert!(registry.is_empty());
    }

    #[test]
    fn list_failure_delivers_error() {
        let registry = Registry::new();
        let (calls, userdata) = list_closure(&registry);
        info_trampoline::<Item>(null_mut(), &5, 0, userdata);
        info_trampoline::<Item>(null_mut(), null(), -1, userdata);
        assert_eq!(*calls.borrow(), vec![Err(Error::from_code(PA_ERR_UNKNOWN))]);
        assert!(registry.is_empty());
    }

    #[test]
    fn single_lookup_delivers_the_record() {
        let registry = Registry::new();
        let (calls, userdata) = single_closure(&registry);
        info_trampoline::<Item>(null_mut(), &9, 0, userdata);
        info_trampoline::<Item>(null_mut(), null(), 1, userdata);
        assert_eq!(*calls.borrow(), vec![Ok(Item(9))]);
        assert!(registry.is_empty());
    }

    #[test]
    fn single_lookup_without_record_is_no_entity() {
        let registry = Registry::new();
        let (calls, userdata) = single_closure(&registry);
        info_trampoline::<Item>(null_mut(), null(), 1, userdata);
        assert_eq!(*calls.borrow(), vec![Err(Error::no_entity())]);
    }

    #[test]
    fn success_callback_completes_once() {
        let registry = Registry::new();
        let calls: Calls<()> = Rc::new(RefCell::new(Vec::new()));
        let sink = calls.clone();
        let handle = registry.register(RegisteredClosure::single(move |r| sink.borrow_mut().push(r)));
        success_trampoline(null_mut(), 1, registry.userdata(handle));
        assert_eq!(*calls.borrow(), vec![Ok(())]);
        assert!(!registry.contains(handle));
    }

    #[test]
    fn failed_success_callback_reports_error() {
        let registry = Registry::new();
        let calls: Calls<()> = Rc::new(RefCell::new(Vec::new()));
        let sink = calls.clone();
        let handle = registry.register(RegisteredClosure::single(move |r| sink.borrow_mut().push(r)));
        success_trampoline(null_mut(), 0, registry.userdata(handle));
        assert_eq!(*calls.borrow(), vec![Err(Error::from_code(PA_ERR_UNKNOWN))]);
    }

    #[test]
    fn server_info_is_copied() {
        let registry = Registry::new();
        let calls: Calls<ServerInfo> = Rc::new(RefCell::new(Vec::new()));
        let sink = calls.clone();
        let handle = registry.register(RegisteredClosure::single(move |r| sink.borrow_mut().push(r)));
        let mut raw: pa_server_info = unsafe { mem::zeroed() };
        raw.cookie = 77;
        raw.sample_spec.rate = 48000;
        raw.sample_spec.channels = 2;
        server_info_trampoline(null_mut(), &raw, registry.userdata(handle));
        let calls = calls.borrow();
        let info = calls[0].as_ref().unwrap();
        assert_eq!(info.cookie, 77);
        assert_eq!(info.sample_rate, 48000);
        assert_eq!(info.channels, 2);
        assert_eq!(info.server_name, None);
        assert!(registry.is_empty());
    }

    #[test]
    fn closure_may_issue_new_operations() {
        let registry = Registry::new();
        let inner_registry = registry.clone();
        let handle = registry.register(RegisteredClosure::<()>::single(move |_| {
            inner_registry.register(RegisteredClosure::<()>::single(|_| ()));
        }));
        success_trampoline(null_mut(), 1, registry.userdata(handle));
        assert_eq!(registry.len(), 1);
        assert!(!registry.contains(handle));
    }

    #[test]
    fn panicking_closure_is_released_and_parked() {
        let registry = Registry::new();
        let handle = registry.register(RegisteredClosure::<()>::single(|_| panic!("closure failed")));
        success_trampoline(null_mut(), 1, registry.userdata(handle));
        assert!(registry.is_empty());
        assert!(take_callback_panic().is_some());
    }
}
