//! Pulseaudio context.
mod flags;
mod introspect;
mod operation;
mod state;

use libc;
use libpulse_sys::*;
use std::cell::{Cell, RefCell};
use std::ffi::CString;
use std::ptr::{null, null_mut, NonNull};
use std::rc::{Rc, Weak};

use crate::callback::{self, trampoline, RegisteredClosure, Registry, SubscriptionEvent, SubscriptionTable};
use crate::error::{Error, PA_ERR_UNKNOWN};
use crate::mainloop_api::PaMainLoopApi;
use crate::proplist::Proplist;
use crate::refcount::RefCounted;

pub use self::flags::PaContextFlags;
pub use self::introspect::Target;
pub use self::operation::PaOperation;
pub use self::state::PaContextState;
pub use self::state::PaContextStateStream;

type StateCallback<M> = Box<dyn FnMut(&PaContext<M>, PaContextState)>;

struct ContextInner<M: PaMainLoopApi + 'static> {
    raw: RefCounted<pa_context>,
    mainloop_api: M,
    weak_self: Weak<ContextInner<M>>,
    registry: Registry,
    subscriptions: SubscriptionTable<PaContext<M>>,
    state_callback: RefCell<Option<StateCallback<M>>>,
    // Bumped whenever the state callback slot is replaced or cleared.
    state_generation: Cell<u64>,
    state_fanout: state::StateFanout,
    connected: Cell<bool>,
}

/// The basic object for a connection to a pulseaudio server.
///
/// A context multiplexes commands, data streams and events through a single channel.
/// There is no need for more than one context per application, unless connections to multiple servers are needed.
///
/// Every closure handed to a context is kept in the context's callback
/// registry until libpulse delivers the final result. Disconnecting or
/// dropping the context, or losing the connection, drops all closures that
/// are still waiting.
#[derive(Clone)]
pub struct PaContext<M: PaMainLoopApi + 'static> {
    inner: Rc<ContextInner<M>>,
}

impl<M: PaMainLoopApi + 'static> PaContext<M> {
    /// Creates a new pulseaudio context.
    ///
    /// # Arguments
    ///
    /// * `api`: Reference to a pulseaudio mainloop API.
    /// * `name`: Application name.
    pub fn new(api: &M, name: &str) -> Result<PaContext<M>, Error> {
        let name = CString::new(name)?;
        let ptr = unsafe { pa_context_new(api.get_api(), name.as_ptr()) };
        PaContext::from_raw(api, ptr)
    }

    /// Creates a new pulseaudio context with initial client properties.
    pub fn new_with_proplist(api: &M, name: &str, properties: &Proplist) -> Result<PaContext<M>, Error> {
        let name = CString::new(name)?;
        let ptr = unsafe { pa_context_new_with_proplist(api.get_api(), name.as_ptr(), properties.as_ptr()) };
        PaContext::from_raw(api, ptr)
    }

    fn from_raw(api: &M, ptr: *mut pa_context) -> Result<PaContext<M>, Error> {
        let raw = match unsafe { RefCounted::from_nullable(ptr) } {
            Some(raw) => raw,
            None => return Err(Error::ContextCreation),
        };
        let inner = Rc::new_cyclic(|weak_self| ContextInner {
            raw,
            mainloop_api: api.clone(),
            weak_self: weak_self.clone(),
            registry: Registry::new(),
            subscriptions: SubscriptionTable::new(),
            state_callback: RefCell::new(None),
            state_generation: Cell::new(0),
            state_fanout: state::StateFanout::new(),
            connected: Cell::new(false),
        });
        let userdata = &*inner as *const ContextInner<M> as *mut libc::c_void;
        unsafe {
            pa_context_set_state_callback(inner.raw.get(), Some(state_trampoline::<M>), userdata);
            pa_context_set_subscribe_callback(inner.raw.get(), Some(subscribe_trampoline::<M>), userdata);
        }
        debug!("created pulseaudio context");
        Ok(PaContext { inner })
    }

    /// The mainloop API this context was created with.
    pub fn mainloop_api(&self) -> &M {
        &self.inner.mainloop_api
    }

    /// Returns the error number of the last failed operation.
    ///
    /// This number can be converted into a human-readable string using the
    /// [`strerror`](../error/fn.strerror.html) and [`strerror_ref`](../error/fn.strerror_ref.html)
    /// functions.
    pub fn errno(&self) -> libc::c_int {
        unsafe { pa_context_errno(self.inner.raw.get()) }
    }

    /// Returns the current context status.
    pub fn state(&self) -> PaContextState {
        state::get_state(self.inner.raw.get())
    }

    /// Whether [`connect`](#method.connect) succeeded and the connection has not
    /// failed, terminated or been disconnected since.
    pub fn is_connected(&self) -> bool {
        self.inner.connected.get()
    }

    /// Returns a stream that notifies of context status changes.
    pub fn state_stream(&self) -> PaContextStateStream {
        self.inner.state_fanout.stream()
    }

    /// Number of closures waiting for the result of an operation.
    pub fn pending_callbacks(&self) -> usize {
        self.inner.registry.len()
    }

    /// Connect the context to the specified server.
    ///
    /// If server is None, connect to the default server. `callback` replaces
    /// any previously installed state callback and is called for every state
    /// change, starting with the ones caused by this call. This routine may
    /// but will not always return synchronously on error.
    pub fn connect<F>(&self, server: Option<&str>, flags: PaContextFlags, callback: F) -> Result<(), Error>
    where
        F: FnMut(&PaContext<M>, PaContextState) + 'static,
    {
        let server = match server {
            Some(s) => Some(CString::new(s)?),
            None => None,
        };
        self.inner.replace_state_callback(Some(Box::new(callback)));
        let ret = unsafe {
            pa_context_connect(
                self.inner.raw.get(),
                server.as_ref().map_or(null(), |s| s.as_ptr()),
                flags.to_raw(),
                null(),
            )
        };
        if ret < 0 {
            return Err(self.last_error());
        }
        // A connection that already failed inside pa_context_connect is not connected.
        self.inner.connected.set(!self.state().is_final());
        debug!("connecting to {}", server.as_ref().map_or("the default server".into(), |s| s.to_string_lossy()));
        Ok(())
    }

    /// Terminate the context connection immediately.
    ///
    /// The state callback sees the final state, then it is dropped together
    /// with every closure still waiting for an operation and all
    /// subscriptions.
    pub fn disconnect(&self) {
        unsafe { pa_context_disconnect(self.inner.raw.get()) }
        self.inner.connected.set(false);
        self.inner.release_closures();
        self.inner.replace_state_callback(None);
    }

    /// Adds a closure for server events and returns its position.
    ///
    /// Event delivery is enabled on the server once the context is ready.
    pub fn subscribe<F>(&self, callback: F) -> usize
    where
        F: FnMut(&PaContext<M>, SubscriptionEvent, u32) + 'static,
    {
        let position = self.inner.subscriptions.subscribe(callback);
        self.inner.enable_subscription();
        position
    }

    /// Removes the closure at `position`.
    pub fn unsubscribe(&self, position: usize) -> Result<(), Error> {
        self.inner.subscriptions.unsubscribe(position)
    }

    fn last_error(&self) -> Error {
        self.inner.last_error()
    }

    /// Registers `closure` and starts the native request issued by `call`.
    ///
    /// The closure is dropped without being called if the context is not ready
    /// or libpulse rejects the request.
    fn issue<T, C>(&self, closure: RegisteredClosure<T>, call: C) -> Result<PaOperation, Error>
    where
        T: 'static,
        C: FnOnce(*mut pa_context, *mut libc::c_void) -> *mut pa_operation,
    {
        self.inner.issue(closure, call)
    }
}

impl<M: PaMainLoopApi + 'static> ContextInner<M> {
    fn last_error(&self) -> Error {
        match unsafe { pa_context_errno(self.raw.get()) } {
            0 => Error::from_code(PA_ERR_UNKNOWN),
            code => Error::from_code(code),
        }
    }

    fn issue<T, C>(&self, closure: RegisteredClosure<T>, call: C) -> Result<PaOperation, Error>
    where
        T: 'static,
        C: FnOnce(*mut pa_context, *mut libc::c_void) -> *mut pa_operation,
    {
        if state::get_state(self.raw.get()) != PaContextState::Ready {
            return Err(Error::NotReady);
        }
        let raw = self.raw.get();
        let (handle, op) =
            self.registry.issue(closure, |userdata| NonNull::new(call(raw, userdata)), || self.last_error())?;
        Ok(PaOperation::new(op, self.registry.downgrade(), handle))
    }

    fn replace_state_callback(&self, callback: Option<StateCallback<M>>) {
        self.state_generation.set(self.state_generation.get() + 1);
        let previous = self.state_callback.replace(callback);
        drop(previous);
    }

    fn release_closures(&self) {
        self.registry.release_all();
        self.subscriptions.clear();
        self.subscriptions.reset_latch();
    }

    /// Asks the server for events, once per connection, as soon as someone listens.
    fn enable_subscription(&self) {
        if self.subscriptions.is_empty() || state::get_state(self.raw.get()) != PaContextState::Ready {
            return;
        }
        if !self.subscriptions.latch() {
            return;
        }
        let weak_self = self.weak_self.clone();
        let closure = RegisteredClosure::<()>::single(move |result| {
            if let Err(err) = result {
                warn!("failed to enable server events: {}", err);
                if let Some(inner) = weak_self.upgrade() {
                    inner.subscriptions.reset_latch();
                }
            }
        });
        let issued = self.issue(closure, |c, userdata| unsafe {
            pa_context_subscribe(c, PA_SUBSCRIPTION_MASK_ALL, Some(trampoline::success_trampoline), userdata)
        });
        match issued {
            Ok(_) => debug!("enabled server events"),
            Err(err) => {
                warn!("failed to enable server events: {}", err);
                self.subscriptions.reset_latch();
            }
        }
    }

    fn on_state_change(&self, context: &PaContext<M>) {
        let state = state::get_state(self.raw.get());
        debug!("context state changed to {:?}", state);
        self.state_fanout.publish(state);

        // Taken out of the slot so the callback may replace or clear it.
        let generation = self.state_generation.get();
        let taken = self.state_callback.borrow_mut().take();
        if let Some(mut f) = taken {
            callback::guarded(|| f(context, state));
            if self.state_generation.get() == generation {
                *self.state_callback.borrow_mut() = Some(f);
            }
        }

        self.apply_state(state);
    }

    /// Bookkeeping after the state callback has seen `state`.
    fn apply_state(&self, state: PaContextState) {
        match state {
            PaContextState::Ready => self.enable_subscription(),
            PaContextState::Failed | PaContextState::Terminated => {
                // libpulse cancels outstanding operations without calling them back.
                self.connected.set(false);
                self.subscriptions.reset_latch();
                self.registry.release_all();
            }
            _ => (),
        }
    }
}

impl<M: PaMainLoopApi + 'static> Drop for ContextInner<M> {
    fn drop(&mut self) {
        let raw = self.raw.get();
        unsafe {
            pa_context_set_state_callback(raw, None, null_mut());
            pa_context_set_subscribe_callback(raw, None, null_mut());
        }
        if self.connected.replace(false) {
            unsafe { pa_context_disconnect(raw) };
        }
        self.release_closures();
        self.state_fanout.close();
        debug!("dropped pulseaudio context");
    }
}

unsafe fn context_from_userdata<M: PaMainLoopApi + 'static>(userdata: *mut libc::c_void) -> Option<PaContext<M>> {
    assert!(!userdata.is_null(), "context callback invoked without userdata");
    let inner = &*(userdata as *const ContextInner<M>);
    inner.weak_self.upgrade().map(|inner| PaContext { inner })
}

extern "C" fn state_trampoline<M: PaMainLoopApi + 'static>(_c: *mut pa_context, userdata: *mut libc::c_void) {
    if let Some(context) = unsafe { context_from_userdata::<M>(userdata) } {
        context.inner.on_state_change(&context);
    }
}

extern "C" fn subscribe_trampoline<M: PaMainLoopApi + 'static>(
    _c: *mut pa_context,
    event: pa_subscription_event_type_t,
    index: u32,
    userdata: *mut libc::c_void,
) {
    if let Some(context) = unsafe { context_from_userdata::<M>(userdata) } {
        let event = SubscriptionEvent::from_raw(event as u32);
        trace!("server event {:?} for index {}", event, index);
        context.inner.subscriptions.dispatch(&context, event, index);
    }
}

pa_refcountable!(pa_context, pa_context_ref, pa_context_unref);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standard_mainloop::PaStandardMainLoop;

    fn context() -> PaContext<PaStandardMainLoop> {
        PaContext::new(&PaStandardMainLoop::new(), "context-test").unwrap()
    }

    #[test]
    fn final_state_releases_pending_closures() {
        for &state in &[PaContextState::Failed, PaContextState::Terminated] {
            let ctx = context();
            let held = ctx.clone();
            ctx.inner.registry.register(RegisteredClosure::<()>::single(move |_| {
                let _ = held.state();
            }));
            ctx.inner.connected.set(true);
            assert!(ctx.inner.subscriptions.latch());
            assert_eq!(Rc::strong_count(&ctx.inner), 2);

            ctx.inner.apply_state(state);

            assert_eq!(ctx.pending_callbacks(), 0);
            assert!(!ctx.is_connected());
            assert!(!ctx.inner.subscriptions.is_latched());
            assert_eq!(Rc::strong_count(&ctx.inner), 1);
        }
    }

    #[test]
    fn intermediate_states_keep_pending_closures() {
        let ctx = context();
        ctx.inner.registry.register(RegisteredClosure::<()>::single(|_| ()));
        ctx.inner.connected.set(true);
        ctx.inner.apply_state(PaContextState::Connecting);
        ctx.inner.apply_state(PaContextState::Authorizing);
        assert_eq!(ctx.pending_callbacks(), 1);
        assert!(ctx.is_connected());
    }

    #[test]
    fn subscription_is_not_enabled_before_ready() {
        let ctx = context();
        ctx.subscribe(|_, _, _| ());
        ctx.inner.apply_state(PaContextState::Ready);
        assert!(!ctx.inner.subscriptions.is_latched());
        assert_eq!(ctx.pending_callbacks(), 0);
    }
}
