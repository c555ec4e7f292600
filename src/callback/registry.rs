//! Ownership of closures while libpulse holds a reference to them.
use libc;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::rc::{Rc, Weak};

use crate::error::Error;

/// A one-shot closure receiving the outcome of an operation.
pub type Callback<T> = Box<dyn FnOnce(Result<T, Error>)>;

/// Opaque token for a closure stored in a [`Registry`](struct.Registry.html).
///
/// Handles come from a per-registry counter and are never reused, so a
/// released handle can not accidentally resolve to a newer closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClosureHandle(u64);

impl fmt::Display for ClosureHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

enum Delivery<T> {
    Single(Callback<T>),
    List(Callback<Vec<T>>),
}

/// A closure waiting for the terminal event of one native operation.
///
/// In single mode the closure receives exactly one value. In list mode the
/// records delivered before end-of-list are accumulated and handed over
/// together, in delivery order.
pub struct RegisteredClosure<T> {
    delivery: Delivery<T>,
    buffer: Vec<T>,
}

impl<T> RegisteredClosure<T> {
    pub fn single<F>(callback: F) -> RegisteredClosure<T>
    where
        F: FnOnce(Result<T, Error>) + 'static,
    {
        RegisteredClosure { delivery: Delivery::Single(Box::new(callback)), buffer: Vec::new() }
    }

    pub fn list<F>(callback: F) -> RegisteredClosure<T>
    where
        F: FnOnce(Result<Vec<T>, Error>) + 'static,
    {
        RegisteredClosure { delivery: Delivery::List(Box::new(callback)), buffer: Vec::new() }
    }

    pub fn is_list(&self) -> bool {
        match self.delivery {
            Delivery::List(_) => true,
            Delivery::Single(_) => false,
        }
    }

    /// Number of records accumulated so far.
    pub fn accumulated(&self) -> usize {
        self.buffer.len()
    }

    /// Appends a record delivered before the end-of-list marker.
    ///
    /// A single-mode closure keeps only the first record.
    pub fn accumulate(&mut self, item: T) {
        if !self.is_list() && !self.buffer.is_empty() {
            warn!("discarding additional record for a single-value operation");
            return;
        }
        self.buffer.push(item);
    }

    /// Terminal event without error: flushes the accumulated records.
    ///
    /// A single-mode closure that never received a record gets a
    /// "No such entity" error.
    pub fn finish(self) {
        let RegisteredClosure { delivery, buffer } = self;
        match delivery {
            Delivery::List(callback) => callback(Ok(buffer)),
            Delivery::Single(callback) => match buffer.into_iter().next() {
                Some(item) => callback(Ok(item)),
                None => callback(Err(Error::no_entity())),
            },
        }
    }

    /// Terminal event carrying the one result of a single-event operation.
    pub fn complete(mut self, result: Result<T, Error>) {
        match result {
            Ok(item) => {
                self.buffer.clear();
                self.buffer.push(item);
                self.finish()
            }
            Err(error) => self.fail(error),
        }
    }

    /// Terminal event carrying an error. Accumulated records are dropped.
    pub fn fail(self, error: Error) {
        match self.delivery {
            Delivery::List(callback) => callback(Err(error)),
            Delivery::Single(callback) => callback(Err(error)),
        }
    }
}

struct Slot {
    closure: Box<dyn Any>,
    ticket: Box<Ticket>,
}

struct Slots {
    next: u64,
    live: HashMap<ClosureHandle, Slot>,
}

/// What libpulse receives as `userdata`.
///
/// Owned by its slot, so the pointer stays valid exactly as long as the handle is live.
pub(crate) struct Ticket {
    slots: Weak<RefCell<Slots>>,
    handle: ClosureHandle,
}

/// Keeps closures alive across the native asynchronous boundary.
///
/// Each context owns one registry. A closure is stored from the moment its
/// operation is issued until the trampoline releases it at the terminal
/// event, the issuing call is rejected, the operation is cancelled or the
/// context is disconnected.
///
/// Resolving or releasing a handle that is not live is a contract violation and panics.
#[derive(Clone)]
pub struct Registry {
    slots: Rc<RefCell<Slots>>,
}

/// A non-owning reference to a [`Registry`](struct.Registry.html).
#[derive(Clone)]
pub struct WeakRegistry(Weak<RefCell<Slots>>);

impl WeakRegistry {
    pub fn upgrade(&self) -> Option<Registry> {
        self.0.upgrade().map(|slots| Registry { slots })
    }
}

impl Registry {
    pub fn new() -> Registry {
        Registry { slots: Rc::new(RefCell::new(Slots { next: 1, live: HashMap::new() })) }
    }

    pub fn downgrade(&self) -> WeakRegistry {
        WeakRegistry(Rc::downgrade(&self.slots))
    }

    /// Stores a closure and returns a fresh handle for it.
    pub fn register<T: 'static>(&self, closure: RegisteredClosure<T>) -> ClosureHandle {
        let mut slots = self.slots.borrow_mut();
        let handle = ClosureHandle(slots.next);
        slots.next += 1;
        let ticket = Box::new(Ticket { slots: Rc::downgrade(&self.slots), handle });
        slots.live.insert(handle, Slot { closure: Box::new(closure), ticket });
        trace!("registered callback {} ({} live)", handle, slots.live.len());
        handle
    }

    /// The opaque pointer to hand to libpulse for a live handle.
    pub fn userdata(&self, handle: ClosureHandle) -> *mut libc::c_void {
        let slots = self.slots.borrow();
        match slots.live.get(&handle) {
            Some(slot) => &*slot.ticket as *const Ticket as *mut libc::c_void,
            None => panic!("callback handle {} is not registered", handle),
        }
    }

    /// Runs `f` on the closure of a live handle.
    ///
    /// `f` must not call back into the registry.
    pub fn resolve<T, R, F>(&self, handle: ClosureHandle, f: F) -> R
    where
        T: 'static,
        F: FnOnce(&mut RegisteredClosure<T>) -> R,
    {
        let mut slots = self.slots.borrow_mut();
        let slot = match slots.live.get_mut(&handle) {
            Some(slot) => slot,
            None => panic!("resolved callback handle {} after it was released", handle),
        };
        match slot.closure.downcast_mut::<RegisteredClosure<T>>() {
            Some(closure) => f(closure),
            None => panic!("callback handle {} was registered for another record type", handle),
        }
    }

    /// Removes a live handle and hands its closure back to the caller.
    ///
    /// The handle is invalid afterwards.
    pub fn release<T: 'static>(&self, handle: ClosureHandle) -> RegisteredClosure<T> {
        let slot = self.slots.borrow_mut().live.remove(&handle);
        let slot = match slot {
            Some(slot) => slot,
            None => panic!("released callback handle {} twice", handle),
        };
        trace!("released callback {}", handle);
        match slot.closure.downcast::<RegisteredClosure<T>>() {
            Ok(closure) => *closure,
            Err(_) => panic!("callback handle {} was registered for another record type", handle),
        }
    }

    /// Drops the closure of a handle without invoking it, if it is still live.
    pub fn discard(&self, handle: ClosureHandle) -> bool {
        let slot = self.slots.borrow_mut().live.remove(&handle);
        if slot.is_some() {
            trace!("discarded callback {}", handle);
        }
        slot.is_some()
    }

    /// Drops every stored closure without invoking it. Returns how many were dropped.
    pub fn release_all(&self) -> usize {
        let live = mem::replace(&mut self.slots.borrow_mut().live, HashMap::new());
        let count = live.len();
        if count > 0 {
            debug!("released {} pending callbacks", count);
        }
        count
    }

    pub fn contains(&self, handle: ClosureHandle) -> bool {
        self.slots.borrow().live.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registers `closure` and passes its userdata to the native issuing call.
    ///
    /// `call` returns `None` when the native library rejected the request. In
    /// that case the closure is released without being invoked and the error
    /// produced by `reject` is returned.
    pub fn issue<T, O, F, E>(
        &self,
        closure: RegisteredClosure<T>,
        call: F,
        reject: E,
    ) -> Result<(ClosureHandle, O), Error>
    where
        T: 'static,
        F: FnOnce(*mut libc::c_void) -> Option<O>,
        E: FnOnce() -> Error,
    {
        let handle = self.register(closure);
        match call(self.userdata(handle)) {
            Some(operation) => Ok((handle, operation)),
            None => {
                let error = reject();
                drop(self.release::<T>(handle));
                debug!("operation for callback {} rejected: {}", handle, error);
                Err(error)
            }
        }
    }

    /// Recovers the registry and handle from a libpulse `userdata` pointer.
    ///
    /// # Safety
    ///
    /// `userdata` must come from [`userdata`](#method.userdata) for a handle that is still live.
    pub(crate) unsafe fn from_userdata(userdata: *mut libc::c_void) -> (Registry, ClosureHandle) {
        assert!(!userdata.is_null(), "callback invoked without userdata");
        let ticket = &*(userdata as *const Ticket);
        let slots = ticket.slots.upgrade().expect("callback invoked after its registry was dropped");
        (Registry { slots }, ticket.handle)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}
