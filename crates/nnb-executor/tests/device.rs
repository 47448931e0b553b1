mod common;

use std::cell::Cell as StdCell;
use std::rc::Rc;
use std::time::Duration;

use common::*;
use nnb_core::consts::*;
use nnb_core::{BridgeError, Domain, Flags, NnError, Protocol, SocketHandle};
use nnb_executor::Bridge;
use nnb_module::MemoryBackend;
use pretty_assertions::assert_eq;

fn with_timeout(b: &Bridge<MemoryBackend>, s: SocketHandle) {
    b.set_option(s, NN_SOL_SOCKET, NN_RCVTIMEO, 5000).unwrap();
}

#[test]
fn both_sockets_absent_is_a_configuration_error() {
    let (ev, b) = setup();
    let err = b.device(None, None, |_| panic!("must not run")).unwrap_err();
    assert!(matches!(err, BridgeError::Configuration));
    assert!(matches!(b.device_sync(None, None), Err(BridgeError::Configuration)));
    assert_eq!(ev.pending_offloads(), 0);
}

#[test]
fn sync_device_reports_why_it_stopped() {
    let (_ev, b) = setup();
    let cooked = b.open(Domain::Sp, Protocol::Bus).unwrap();
    let err = b.device_sync(Some(cooked), None).unwrap_err();
    assert_eq!(err.library_code(), Some(libc::EINVAL));
}

#[test]
fn closing_a_side_ends_the_device_once() {
    let (mut ev, b) = setup();
    let r1 = b.open(Domain::SpRaw, Protocol::Pull).unwrap();
    let r2 = b.open(Domain::SpRaw, Protocol::Push).unwrap();
    let ended: Cell<NnError> = cell();
    let calls = Rc::new(StdCell::new(0usize));
    {
        let (ended, calls) = (Rc::clone(&ended), Rc::clone(&calls));
        b.device(Some(r1), Some(r2), move |e| {
            calls.set(calls.get() + 1);
            *ended.borrow_mut() = Some(e);
        })
        .unwrap();
    }
    ev.run_once(Some(Duration::from_millis(20))).unwrap();
    b.close(r1).unwrap();
    assert!(ev.run_until(is_set(&ended), WAIT).unwrap());
    assert_eq!(ended.borrow().as_ref().unwrap().code(), libc::EBADF);
    ev.run_once(Some(Duration::from_millis(20))).unwrap();
    assert_eq!(calls.get(), 1);
    assert!(ev.is_idle());
}

#[test]
fn pipeline_through_raw_device_then_terminate() {
    let (mut ev, b) = setup();
    let r1 = b.open(Domain::SpRaw, Protocol::Pull).unwrap();
    let r2 = b.open(Domain::SpRaw, Protocol::Push).unwrap();
    b.bind_sync(r1, "inproc://in").unwrap();
    b.bind_sync(r2, "inproc://out").unwrap();
    let producer = b.open(Domain::Sp, Protocol::Push).unwrap();
    let consumer = b.open(Domain::Sp, Protocol::Pull).unwrap();
    b.connect(producer, "inproc://in").unwrap();
    b.connect(consumer, "inproc://out").unwrap();

    let ended: Cell<NnError> = cell();
    let sink = Rc::clone(&ended);
    b.device(Some(r1), Some(r2), move |e| *sink.borrow_mut() = Some(e)).unwrap();

    let got = Rc::new(StdCell::new(0usize));
    let id = {
        let (got, rx) = (Rc::clone(&got), b.clone());
        b.poll_recv(consumer, move |_| {
            while let Ok(msg) = rx.recv(consumer, Flags::DONTWAIT) {
                assert_eq!(msg, b"job");
                got.set(got.get() + 1);
            }
        })
        .unwrap()
        .unwrap()
    };
    for _ in 0..3 {
        b.send(producer, b"job", Flags::NONE).unwrap();
    }
    assert!(ev.run_until(|| got.get() == 3, WAIT).unwrap());
    b.stop_poll(id).unwrap();

    b.terminate();
    assert!(ev.run_until(is_set(&ended), WAIT).unwrap());
    assert_eq!(ended.borrow().as_ref().unwrap().code(), ETERM);
}

#[test]
fn request_reply_through_raw_device() {
    let (mut ev, b) = setup();
    let front = b.open(Domain::SpRaw, Protocol::Rep).unwrap();
    let back = b.open(Domain::SpRaw, Protocol::Req).unwrap();
    b.bind_sync(front, "inproc://front").unwrap();
    b.bind_sync(back, "inproc://back").unwrap();
    let client = b.open(Domain::Sp, Protocol::Req).unwrap();
    let server = b.open(Domain::Sp, Protocol::Rep).unwrap();
    b.connect(client, "inproc://front").unwrap();
    b.connect(server, "inproc://back").unwrap();
    with_timeout(&b, client);
    with_timeout(&b, server);

    let ended: Cell<NnError> = cell();
    let sink = Rc::clone(&ended);
    b.device(Some(front), Some(back), move |e| *sink.borrow_mut() = Some(e)).unwrap();

    b.send(client, b"ping", Flags::NONE).unwrap();
    assert_eq!(b.recv(server, Flags::NONE).unwrap(), b"ping");
    b.send(server, b"pong", Flags::NONE).unwrap();
    assert_eq!(b.recv(client, Flags::NONE).unwrap(), b"pong");

    b.close(back).unwrap();
    assert!(ev.run_until(is_set(&ended), WAIT).unwrap());
    assert_eq!(ended.borrow().as_ref().unwrap().code(), libc::EBADF);
}

#[test]
fn bus_loopback_device_does_not_echo() {
    let (mut ev, b) = setup();
    let hub = b.open(Domain::SpRaw, Protocol::Bus).unwrap();
    b.bind_sync(hub, "inproc://bus").unwrap();
    let a = b.open(Domain::Sp, Protocol::Bus).unwrap();
    let c = b.open(Domain::Sp, Protocol::Bus).unwrap();
    b.connect(a, "inproc://bus").unwrap();
    b.connect(c, "inproc://bus").unwrap();
    with_timeout(&b, c);

    let ended: Cell<NnError> = cell();
    let sink = Rc::clone(&ended);
    b.device(Some(hub), None, move |e| *sink.borrow_mut() = Some(e)).unwrap();

    b.send(a, b"hello bus", Flags::NONE).unwrap();
    assert_eq!(b.recv(c, Flags::NONE).unwrap(), b"hello bus");
    let echo = b.recv(a, Flags::DONTWAIT).unwrap_err();
    assert_eq!(echo.library_code(), Some(libc::EAGAIN));

    b.terminate();
    assert!(ev.run_until(is_set(&ended), WAIT).unwrap());
}
