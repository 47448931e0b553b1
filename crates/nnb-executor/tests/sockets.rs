mod common;

use common::*;
use nnb_core::consts::*;
use nnb_core::{BridgeError, Domain, Flags, OptionValue, Protocol};
use nnb_executor::BridgeConfig;
use pretty_assertions::assert_eq;

#[test]
fn open_close_leaves_loop_idle() {
    let (ev, b) = setup();
    let s = b.open(Domain::Sp, Protocol::Pair).unwrap();
    b.close(s).unwrap();
    assert!(ev.is_idle());
    assert_eq!(ev.active_polls(), 0);
    assert_eq!(ev.pending_offloads(), 0);
    let err = b.close(s).unwrap_err();
    assert_eq!(err.library_code(), Some(libc::EBADF));
}

#[test]
fn fresh_sub_receives_everything() {
    let (_ev, b) = setup();
    let publisher = b.open(Domain::Sp, Protocol::Pub).unwrap();
    let sub = b.open(Domain::Sp, Protocol::Sub).unwrap();
    b.bind_sync(publisher, "inproc://news").unwrap();
    b.connect(sub, "inproc://news").unwrap();
    b.send(publisher, b"sports: 3-1", Flags::NONE).unwrap();
    b.send(publisher, b"\x00binary", Flags::NONE).unwrap();
    assert_eq!(b.recv(sub, Flags::DONTWAIT).unwrap(), b"sports: 3-1");
    assert_eq!(b.recv(sub, Flags::DONTWAIT).unwrap(), b"\x00binary");
}

#[test]
fn catch_all_can_be_removed_or_disabled() {
    let (_ev, b) = setup();
    let publisher = b.open(Domain::Sp, Protocol::Pub).unwrap();
    let sub = b.open(Domain::Sp, Protocol::Sub).unwrap();
    b.bind_sync(publisher, "inproc://narrow").unwrap();
    b.connect(sub, "inproc://narrow").unwrap();
    b.set_option(sub, NN_SUB, NN_SUB_SUBSCRIBE, "a.").unwrap();
    b.set_option(sub, NN_SUB, NN_SUB_UNSUBSCRIBE, "").unwrap();
    b.send(publisher, b"b.skip", Flags::NONE).unwrap();
    b.send(publisher, b"a.keep", Flags::NONE).unwrap();
    assert_eq!(b.recv(sub, Flags::DONTWAIT).unwrap(), b"a.keep");
    let err = b.recv(sub, Flags::DONTWAIT).unwrap_err();
    assert_eq!(err.library_code(), Some(libc::EAGAIN));

    let (_ev, b) = setup_with(BridgeConfig::new().subscribe_all(false));
    let publisher = b.open(Domain::Sp, Protocol::Pub).unwrap();
    let sub = b.open(Domain::Sp, Protocol::Sub).unwrap();
    b.bind_sync(publisher, "inproc://quiet").unwrap();
    b.connect(sub, "inproc://quiet").unwrap();
    b.send(publisher, b"anything", Flags::NONE).unwrap();
    assert_eq!(b.recv(sub, Flags::DONTWAIT).unwrap_err().library_code(), Some(libc::EAGAIN));
}

#[test]
fn options_round_trip() {
    let (_ev, b) = setup();
    let s = b.open(Domain::Sp, Protocol::Pair).unwrap();
    b.set_option(s, NN_SOL_SOCKET, NN_SOCKET_NAME, "worker-1").unwrap();
    assert_eq!(
        b.get_option(s, NN_SOL_SOCKET, NN_SOCKET_NAME).unwrap(),
        OptionValue::Str("worker-1".into())
    );
    b.set_option(s, NN_SOL_SOCKET, NN_SNDBUF, 42).unwrap();
    assert_eq!(b.get_option(s, NN_SOL_SOCKET, NN_SNDBUF).unwrap(), OptionValue::Int(42));
    assert_eq!(
        b.get_option(s, NN_SOL_SOCKET, NN_PROTOCOL).unwrap(),
        OptionValue::Int(NN_PAIR)
    );
}

#[test]
fn option_shape_errors_never_reach_the_library() {
    let (_ev, b) = setup();
    let s = b.open(Domain::Sp, Protocol::Pair).unwrap();
    let err = b.set_option(s, NN_SOL_SOCKET, NN_SOCKET_NAME, 7).unwrap_err();
    assert!(matches!(err, BridgeError::Argument(_)));
    let err = b.set_option(s, NN_SOL_SOCKET, NN_LINGER, "long").unwrap_err();
    assert!(matches!(err, BridgeError::Argument(_)));
    let err = b.get_option(s, NN_SOL_SOCKET, 999).unwrap_err();
    assert_eq!(err.library_code(), Some(libc::ENOPROTOOPT));
}

#[test]
fn address_validation() {
    let (_ev, b) = setup();
    let s = b.open(Domain::Sp, Protocol::Pair).unwrap();
    let code = |addr: &str| b.bind_sync(s, addr).unwrap_err().library_code();
    assert_eq!(code("tcp://127.0.0.1:"), Some(libc::EINVAL));
    assert_eq!(code("xyz://somewhere"), Some(libc::EPROTONOSUPPORT));
    assert_eq!(code(&format!("inproc://{}", "a".repeat(128))), Some(libc::ENAMETOOLONG));
    assert_eq!(code("tcp://eth99:555"), Some(libc::ENODEV));
    let err = b.bind_sync(s, "inproc://a\0b").unwrap_err();
    assert!(matches!(err, BridgeError::Argument(_)));
}

#[test]
fn library_error_matches_last_error() {
    let (_ev, b) = setup();
    let s = b.open(Domain::Sp, Protocol::Pair).unwrap();
    let err = b.connect(s, "bogus").unwrap_err();
    let BridgeError::Library(e) = err else { panic!("expected a library error") };
    assert_eq!(e.code(), b.last_error().code());
    assert_eq!(e.description(), b.describe_error(e.code()));
}

#[test]
fn shutdown_detaches_an_endpoint() {
    let (_ev, b) = setup();
    let x = b.open(Domain::Sp, Protocol::Pair).unwrap();
    let y = b.open(Domain::Sp, Protocol::Pair).unwrap();
    let ep = b.bind_sync(x, "inproc://short").unwrap();
    b.connect(y, "inproc://short").unwrap();
    b.send(y, b"1", Flags::DONTWAIT).unwrap();
    b.shutdown(x, ep).unwrap();
    let err = b.send(y, b"2", Flags::DONTWAIT).unwrap_err();
    assert_eq!(err.library_code(), Some(libc::EAGAIN));
    assert_eq!(b.shutdown(x, ep).unwrap_err().library_code(), Some(libc::EINVAL));
    // The endpoint is free again.
    b.bind_sync(y, "inproc://short").unwrap();
}

#[test]
fn reflection() {
    let (_ev, b) = setup();
    let table = b.symbols();
    assert_eq!(table.get("NN_PAIR"), Some(NN_PAIR));
    assert_eq!(table.get("AF_SP_RAW"), Some(AF_SP_RAW));
    assert_eq!(table.get("EADDRINUSE"), Some(libc::EADDRINUSE));
    assert_eq!(b.symbol(0).unwrap(), ("NN_NS_NAMESPACE".to_owned(), NN_NS_NAMESPACE));
    let err = b.symbol(table.len() as i32).unwrap_err();
    assert_eq!(err.library_code(), Some(libc::EINVAL));
}

#[test]
fn terminate_is_idempotent_and_final() {
    let (_ev, b) = setup();
    let s = b.open(Domain::Sp, Protocol::Pair).unwrap();
    b.terminate();
    b.terminate();
    assert_eq!(b.send(s, b"x", Flags::DONTWAIT).unwrap_err().library_code(), Some(ETERM));
    let err = b.open(Domain::Sp, Protocol::Pair).unwrap_err();
    assert_eq!(err.library_code(), Some(ETERM));
    assert_eq!(err.to_string(), "Nanomsg library was terminated");
}
