use futures::prelude::*;
use futures::unsync::mpsc;
use libpulse_sys::*;
use std::cell::RefCell;

/// State of a [`PaContext`](struct.PaContext.html).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaContextState {
    /// The context hasn't been connected yet.
    Unconnected,
    /// A connection is being established.
    Connecting,
    /// The client is authorizing itself to the daemon.
    Authorizing,
    /// The client is passing its application name to the daemon.
    SettingName,
    /// The connection is established, the context is ready to execute operations.
    Ready,
    /// The connection failed or was disconnected.
    Failed,
    /// The connection was terminated cleanly.
    Terminated
}

impl PaContextState {
    fn new(s: pa_context_state_t) -> Option<PaContextState> {
        match s {
            PA_CONTEXT_UNCONNECTED => Some(PaContextState::Unconnected),
            PA_CONTEXT_CONNECTING => Some(PaContextState::Connecting),
            PA_CONTEXT_AUTHORIZING => Some(PaContextState::Authorizing),
            PA_CONTEXT_SETTING_NAME => Some(PaContextState::SettingName),
            PA_CONTEXT_READY => Some(PaContextState::Ready),
            PA_CONTEXT_FAILED => Some(PaContextState::Failed),
            PA_CONTEXT_TERMINATED => Some(PaContextState::Terminated),
            _ => None
        }
    }

    /// Connecting, authorizing, setting the name or ready.
    pub fn is_good(self) -> bool {
        match self {
            PaContextState::Connecting
            | PaContextState::Authorizing
            | PaContextState::SettingName
            | PaContextState::Ready => true,
            _ => false,
        }
    }

    /// Failed or terminated. A context in one of these states can not be connected again.
    pub fn is_final(self) -> bool {
        self == PaContextState::Failed || self == PaContextState::Terminated
    }
}

pub fn get_state(raw: *mut pa_context) -> PaContextState {
    match PaContextState::new(unsafe { pa_context_get_state(raw) }) {
        Some(state) => state,
        None => {
            warn!("libpulse reported an unknown context state");
            PaContextState::Failed
        }
    }
}

/// Hands every state change to all live [`PaContextStateStream`]s.
///
/// [`PaContextStateStream`]: struct.PaContextStateStream.html
pub struct StateFanout {
    senders: RefCell<Vec<mpsc::UnboundedSender<PaContextState>>>,
}

impl StateFanout {
    pub fn new() -> StateFanout {
        StateFanout { senders: RefCell::new(Vec::new()) }
    }

    pub fn stream(&self) -> PaContextStateStream {
        let (sender, receiver) = mpsc::unbounded();
        self.senders.borrow_mut().push(sender);
        PaContextStateStream(receiver)
    }

    /// Sends `state` to every stream, forgetting the ones that were dropped.
    pub fn publish(&self, state: PaContextState) {
        self.senders.borrow_mut().retain(|sender| sender.unbounded_send(state).is_ok());
    }

    /// Ends all streams.
    pub fn close(&self) {
        self.senders.borrow_mut().clear();
    }
}

/// A stream for receiving context status updates.
///
/// Only sees changes that happen after it was created. Ends when the
/// context is dropped.
pub struct PaContextStateStream(mpsc::UnboundedReceiver<PaContextState>);

impl Stream for PaContextStateStream {
    type Item = PaContextState;
    type Error = ();

    fn poll(&mut self) -> Poll<Option<PaContextState>, ()> {
        self.0.poll()
    }
}
