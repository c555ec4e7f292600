use std::ptr::null_mut;

/// Native objects whose lifetime is managed by libpulse reference counting.
pub unsafe trait RefCountable {
    fn decref(ptr: *mut Self);
    fn incref(ptr: *mut Self);
}

/// An owned reference to a reference counted libpulse object.
///
/// Cloning takes another native reference, dropping gives it back.
#[derive(Debug)]
pub struct RefCounted<T: RefCountable>(*mut T);

impl<T: RefCountable> RefCounted<T> {
    /// Takes ownership of one reference held by the caller.
    pub unsafe fn new(ptr: *mut T) -> RefCounted<T> {
        assert!(ptr != null_mut());
        RefCounted(ptr)
    }

    /// Like `new`, but returns `None` for a null pointer.
    pub unsafe fn from_nullable(ptr: *mut T) -> Option<RefCounted<T>> {
        if ptr.is_null() {
            None
        } else {
            Some(RefCounted(ptr))
        }
    }

    pub fn get(&self) -> *mut T {
        self.0
    }
}

impl<T: RefCountable> Clone for RefCounted<T> {
    fn clone(&self) -> Self {
        RefCountable::incref(self.0);
        RefCounted(self.0)
    }
}

impl<T: RefCountable> Drop for RefCounted<T> {
    fn drop(&mut self) {
        RefCountable::decref(self.0);
    }
}

/// Implements `RefCountable` for a libpulse type given its ref and unref functions.
macro_rules! pa_refcountable {
    ($t:ty, $incref:ident, $decref:ident) => {
        unsafe impl $crate::refcount::RefCountable for $t {
            fn decref(ptr: *mut Self) {
                unsafe { $decref(ptr) }
            }

            fn incref(ptr: *mut Self) {
                unsafe {
                    $incref(ptr);
                }
            }
        }
    };
}
