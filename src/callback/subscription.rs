//! Fan-out of server events to any number of closures.
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::Error;

const FACILITY_MASK: u32 = 0x000f;
const TYPE_MASK: u32 = 0x0030;
const TYPE_NEW: u32 = 0x0000;
const TYPE_CHANGE: u32 = 0x0010;
const TYPE_REMOVE: u32 = 0x0020;

/// The kind of object a subscription event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facility {
    Sink,
    Source,
    SinkInput,
    SourceOutput,
    Module,
    Client,
    SampleCache,
    Server,
    Card,
    Unknown(u32),
}

/// What happened to the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    New,
    Change,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionEvent {
    pub facility: Facility,
    pub kind: EventKind,
}

impl SubscriptionEvent {
    /// Decodes a `pa_subscription_event_type_t`.
    pub fn from_raw(raw: u32) -> SubscriptionEvent {
        let facility = match raw & FACILITY_MASK {
            0 => Facility::Sink,
            1 => Facility::Source,
            2 => Facility::SinkInput,
            3 => Facility::SourceOutput,
            4 => Facility::Module,
            5 => Facility::Client,
            6 => Facility::SampleCache,
            7 => Facility::Server,
            9 => Facility::Card,
            other => Facility::Unknown(other),
        };
        let kind = match raw & TYPE_MASK {
            TYPE_NEW => EventKind::New,
            TYPE_CHANGE => EventKind::Change,
            TYPE_REMOVE => EventKind::Remove,
            _ => EventKind::Change,
        };
        SubscriptionEvent { facility, kind }
    }
}

type Subscriber<C> = Rc<RefCell<Box<dyn FnMut(&C, SubscriptionEvent, u32)>>>;

/// Closures interested in the events of one context.
///
/// Positions start at 1 and are never reused. Unsubscribing leaves a
/// tombstone in place, so positions handed out earlier stay valid and a
/// second removal of the same position is reported instead of hitting a
/// different closure.
///
/// Dispatch walks the positions that existed when it started. Closures
/// removed during a dispatch are skipped, closures added during a dispatch
/// only see later events.
pub struct SubscriptionTable<C> {
    entries: RefCell<Vec<Option<Subscriber<C>>>>,
    enabled: Cell<bool>,
}

impl<C> SubscriptionTable<C> {
    pub fn new() -> SubscriptionTable<C> {
        SubscriptionTable { entries: RefCell::new(Vec::new()), enabled: Cell::new(false) }
    }

    /// Appends a closure and returns its position.
    pub fn subscribe<F>(&self, callback: F) -> usize
    where
        F: FnMut(&C, SubscriptionEvent, u32) + 'static,
    {
        let mut entries = self.entries.borrow_mut();
        entries.push(Some(Rc::new(RefCell::new(Box::new(callback)))));
        entries.len()
    }

    pub fn unsubscribe(&self, position: usize) -> Result<(), Error> {
        let removed = {
            let mut entries = self.entries.borrow_mut();
            match position.checked_sub(1).and_then(|i| entries.get_mut(i)) {
                Some(entry) => entry.take(),
                None => None,
            }
        };
        match removed {
            Some(_) => Ok(()),
            None => Err(Error::UnknownSubscription(position)),
        }
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.entries.borrow().iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops all subscriptions. Positions keep counting up.
    pub fn clear(&self) {
        let removed: Vec<_> = self.entries.borrow_mut().iter_mut().filter_map(Option::take).collect();
        drop(removed);
    }

    /// Returns true exactly once until [`reset_latch`](#method.reset_latch) is called.
    ///
    /// Guards the native request that enables event delivery.
    pub fn latch(&self) -> bool {
        !self.enabled.replace(true)
    }

    pub fn reset_latch(&self) {
        self.enabled.set(false);
    }

    pub fn is_latched(&self) -> bool {
        self.enabled.get()
    }

    /// Calls every live closure, in position order.
    pub fn dispatch(&self, source: &C, event: SubscriptionEvent, index: u32) {
        let count = self.entries.borrow().len();
        for i in 0..count {
            let subscriber = match self.entries.borrow().get(i) {
                Some(Some(subscriber)) => subscriber.clone(),
                _ => continue,
            };
            let mut callback = match subscriber.try_borrow_mut() {
                Ok(callback) => callback,
                Err(_) => {
                    warn!("subscription {} is already running, skipping nested event", i + 1);
                    continue;
                }
            };
            super::guarded(|| (&mut **callback)(source, event, index));
        }
    }
}

impl<C> Default for SubscriptionTable<C> {
    fn default() -> Self {
        SubscriptionTable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const SINK_CHANGE: u32 = 0x0010;

    fn logging(table: &SubscriptionTable<()>, log: &Rc<RefCell<Vec<usize>>>, id: usize) -> usize {
        let log = log.clone();
        table.subscribe(move |_, _, _| log.borrow_mut().push(id))
    }

    #[test]
    fn decodes_events() {
        assert_eq!(
            SubscriptionEvent::from_raw(SINK_CHANGE),
            SubscriptionEvent { facility: Facility::Sink, kind: EventKind::Change }
        );
        assert_eq!(
            SubscriptionEvent::from_raw(0x0020 | 2),
            SubscriptionEvent { facility: Facility::SinkInput, kind: EventKind::Remove }
        );
        assert_eq!(SubscriptionEvent::from_raw(9).facility, Facility::Card);
        assert_eq!(SubscriptionEvent::from_raw(8).facility, Facility::Unknown(8));
    }

    #[test]
    fn positions_count_up_from_one() {
        let table = SubscriptionTable::<()>::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        assert_eq!(logging(&table, &log, 1), 1);
        assert_eq!(logging(&table, &log, 2), 2);
        assert_eq!(logging(&table, &log, 3), 3);
        table.unsubscribe(3).unwrap();
        assert_eq!(logging(&table, &log, 4), 4);
    }

    #[test]
    fn unsubscribed_closures_are_not_called() {
        let table = SubscriptionTable::<()>::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for id in 1..4 {
            logging(&table, &log, id);
        }
        table.unsubscribe(2).unwrap();
        table.dispatch(&(), SubscriptionEvent::from_raw(SINK_CHANGE), 0);
        assert_eq!(*log.borrow(), vec![1, 3]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn second_unsubscribe_is_an_error() {
        let table = SubscriptionTable::<()>::new();
        table.subscribe(|_, _, _| ());
        table.subscribe(|_, _, _| ());
        assert_eq!(table.unsubscribe(2), Ok(()));
        assert_eq!(table.unsubscribe(2), Err(Error::UnknownSubscription(2)));
        assert_eq!(table.unsubscribe(0), Err(Error::UnknownSubscription(0)));
        assert_eq!(table.unsubscribe(7), Err(Error::UnknownSubscription(7)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn closures_see_source_and_index() {
        let table = SubscriptionTable::<String>::new();
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        table.subscribe(move |source: &String, event, index| {
            *sink.borrow_mut() = Some((source.clone(), event.kind, index));
        });
        table.dispatch(&"ctx".to_owned(), SubscriptionEvent::from_raw(SINK_CHANGE), 42);
        assert_eq!(*seen.borrow(), Some(("ctx".to_owned(), EventKind::Change, 42)));
    }

    #[test]
    fn subscribing_during_dispatch_takes_effect_next_time() {
        let table = Rc::new(SubscriptionTable::<()>::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let table_ref = Rc::downgrade(&table);
            let log = log.clone();
            table.subscribe(move |_, _, _| {
                log.borrow_mut().push(1);
                if let Some(table) = table_ref.upgrade() {
                    let log = log.clone();
                    table.subscribe(move |_, _, _| log.borrow_mut().push(2));
                }
            });
        }
        table.dispatch(&(), SubscriptionEvent::from_raw(SINK_CHANGE), 0);
        assert_eq!(*log.borrow(), vec![1]);
        table.dispatch(&(), SubscriptionEvent::from_raw(SINK_CHANGE), 0);
        assert_eq!(*log.borrow(), vec![1, 1, 2]);
    }

    #[test]
    fn unsubscribing_during_dispatch_is_safe() {
        let table = Rc::new(SubscriptionTable::<()>::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let table_ref = Rc::downgrade(&table);
            let log = log.clone();
            table.subscribe(move |_, _, _| {
                log.borrow_mut().push(1);
                if let Some(table) = table_ref.upgrade() {
                    let _ = table.unsubscribe(1);
                    let _ = table.unsubscribe(2);
                }
            });
        }
        logging(&table, &log, 2);
        logging(&table, &log, 3);
        table.dispatch(&(), SubscriptionEvent::from_raw(SINK_CHANGE), 0);
        assert_eq!(*log.borrow(), vec![1, 3]);
        table.dispatch(&(), SubscriptionEvent::from_raw(SINK_CHANGE), 0);
        assert_eq!(*log.borrow(), vec![1, 3, 3]);
    }

    #[test]
    fn latch_fires_once_until_reset() {
        let table = SubscriptionTable::<()>::new();
        assert!(table.latch());
        assert!(!table.latch());
        assert!(table.is_latched());
        table.reset_latch();
        assert!(table.latch());
    }

    #[test]
    fn clear_keeps_counting() {
        let table = SubscriptionTable::<()>::new();
        table.subscribe(|_, _, _| ());
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.subscribe(|_, _, _| ()), 2);
    }

    #[test]
    fn panicking_subscriber_does_not_stop_dispatch() {
        let table = SubscriptionTable::<()>::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        table.subscribe(|_, _, _| panic!("subscriber failed"));
        logging(&table, &log, 2);
        table.dispatch(&(), SubscriptionEvent::from_raw(SINK_CHANGE), 0);
        assert_eq!(*log.borrow(), vec![2]);
        assert!(crate::callback::take_callback_panic().is_some());
    }
}
