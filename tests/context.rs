// Context behaviour that does not need a running sound server.
extern crate futures;
extern crate pulseaudio_glib as pulseaudio;

use futures::Stream;
use pulseaudio::proplist::{keys, Proplist};
use pulseaudio::volume::{ChannelVolumes, VOLUME_NORM};
use pulseaudio::error::PA_ERR_BADSTATE;
use pulseaudio::{Error, PaContext, PaContextFlags, PaContextState, PaStandardMainLoop};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn unconnected() -> PaContext<PaStandardMainLoop> {
    let mainloop = PaStandardMainLoop::new();
    PaContext::new(&mainloop, "pulseaudio-glib-test").unwrap()
}

#[test]
fn new_context_is_unconnected() {
    let ctx = unconnected();
    assert_eq!(ctx.state(), PaContextState::Unconnected);
    assert!(!ctx.is_connected());
    assert_eq!(ctx.pending_callbacks(), 0);
}

#[test]
fn context_with_properties() {
    let mainloop = PaStandardMainLoop::new();
    let mut props = Proplist::new();
    props.set(keys::APPLICATION_ID, "org.example.mixer").unwrap();
    let ctx = PaContext::new_with_proplist(&mainloop, "mixer", &props).unwrap();
    assert_eq!(ctx.state(), PaContextState::Unconnected);
}

#[test]
fn nul_in_name_is_rejected() {
    let mainloop = PaStandardMainLoop::new();
    assert_eq!(PaContext::new(&mainloop, "a\0b").err(), Some(Error::NulByte));
}

#[test]
fn requests_before_ready_never_call_back() {
    let ctx = unconnected();
    let called = Rc::new(Cell::new(false));

    let flag = called.clone();
    let result = ctx.get_server_info(move |_| flag.set(true));
    assert_eq!(result.err(), Some(Error::NotReady));

    let flag = called.clone();
    let result = ctx.get_sink_info_list(move |_| flag.set(true));
    assert_eq!(result.err(), Some(Error::NotReady));

    let flag = called.clone();
    let volume = ChannelVolumes::new(2, VOLUME_NORM);
    let result = ctx.set_sink_volume("alsa_output.pci", &volume, move |_| flag.set(true));
    assert_eq!(result.err(), Some(Error::NotReady));

    let flag = called.clone();
    let result = ctx.move_sink_input(4, 1u32, move |_| flag.set(true));
    assert_eq!(result.err(), Some(Error::NotReady));

    assert!(!called.get());
    assert_eq!(ctx.pending_callbacks(), 0);
    assert_eq!(Rc::strong_count(&called), 1);
}

#[test]
fn nul_in_device_name_is_rejected() {
    let ctx = unconnected();
    let result = ctx.get_sink_info_by_name("bad\0name", |_| ());
    assert_eq!(result.err(), Some(Error::NulByte));
}

#[test]
fn subscriptions_count_from_one() {
    let ctx = unconnected();
    assert_eq!(ctx.subscribe(|_, _, _| ()), 1);
    assert_eq!(ctx.subscribe(|_, _, _| ()), 2);
    assert_eq!(ctx.subscribe(|_, _, _| ()), 3);
    assert_eq!(ctx.unsubscribe(2), Ok(()));
    assert_eq!(ctx.unsubscribe(2), Err(Error::UnknownSubscription(2)));
    assert_eq!(ctx.subscribe(|_, _, _| ()), 4);
}

#[test]
fn disconnect_drops_subscriptions() {
    let ctx = unconnected();
    let marker = Rc::new(());
    let held = marker.clone();
    ctx.subscribe(move |_, _, _| {
        let _ = held.clone();
    });
    assert_eq!(Rc::strong_count(&marker), 2);
    ctx.disconnect();
    assert_eq!(Rc::strong_count(&marker), 1);
    assert_eq!(ctx.unsubscribe(1), Err(Error::UnknownSubscription(1)));
}

#[test]
fn state_stream_ends_with_the_context() {
    let ctx = unconnected();
    let stream = ctx.state_stream();
    drop(ctx);
    assert!(stream.wait().next().is_none());
}

const MISSING_SERVER: &str = "unix:/nonexistent/pulse-socket";

fn connect_and_settle<F>(mainloop: &PaStandardMainLoop, ctx: &PaContext<PaStandardMainLoop>, callback: F)
where
    F: FnMut(&PaContext<PaStandardMainLoop>, PaContextState) + 'static,
{
    let _ = ctx.connect(Some(MISSING_SERVER), PaContextFlags::default(), callback);
    mainloop.run_until(|| ctx.state().is_final());
}

#[test]
fn unreachable_server_fails() {
    let mainloop = PaStandardMainLoop::new();
    let ctx = PaContext::new(&mainloop, "pulseaudio-glib-test").unwrap();
    let stream = ctx.state_stream();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let log = seen.clone();
    connect_and_settle(&mainloop, &ctx, move |_, state| log.borrow_mut().push(state));

    assert_eq!(*seen.borrow(), vec![PaContextState::Connecting, PaContextState::Failed]);
    assert_eq!(ctx.state(), PaContextState::Failed);
    assert!(!ctx.is_connected());
    assert_eq!(ctx.pending_callbacks(), 0);
    assert_ne!(ctx.errno(), 0);

    drop(ctx);
    let streamed: Vec<_> = stream.wait().map(|s| s.unwrap()).collect();
    assert_eq!(streamed, vec![PaContextState::Connecting, PaContextState::Failed]);
}

#[test]
fn state_callback_can_replace_itself() {
    let mainloop = PaStandardMainLoop::new();
    let ctx = PaContext::new(&mainloop, "pulseaudio-glib-test").unwrap();
    let first = Rc::new(RefCell::new(Vec::new()));
    let second = Rc::new(RefCell::new(Vec::new()));
    let reconnect = Rc::new(RefCell::new(None));

    let (first_log, second_log, result) = (first.clone(), second.clone(), reconnect.clone());
    connect_and_settle(&mainloop, &ctx, move |ctx, state| {
        first_log.borrow_mut().push(state);
        if state == PaContextState::Connecting {
            let second_log = second_log.clone();
            let r = ctx.connect(Some(MISSING_SERVER), PaContextFlags::default(), move |_, state| {
                second_log.borrow_mut().push(state)
            });
            *result.borrow_mut() = Some(r);
        }
    });

    // A context that is already connecting can not be connected again.
    assert_eq!(*reconnect.borrow(), Some(Err(Error::from_code(PA_ERR_BADSTATE))));
    assert_eq!(*first.borrow(), vec![PaContextState::Connecting]);
    assert_eq!(*second.borrow(), vec![PaContextState::Failed]);
    // The first callback was dropped when it was replaced.
    assert_eq!(Rc::strong_count(&first), 1);
}

#[test]
fn state_callback_can_disconnect() {
    let mainloop = PaStandardMainLoop::new();
    let ctx = PaContext::new(&mainloop, "pulseaudio-glib-test").unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let log = seen.clone();
    connect_and_settle(&mainloop, &ctx, move |ctx, state| {
        log.borrow_mut().push(state);
        if state.is_final() {
            ctx.disconnect();
        }
    });

    assert_eq!(*seen.borrow(), vec![PaContextState::Connecting, PaContextState::Failed]);
    assert!(!ctx.is_connected());
    // Disconnecting cleared the slot, so the callback is gone.
    assert_eq!(Rc::strong_count(&seen), 1);
}
