mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::*;
use nnb_core::consts::EFSM;
use nnb_core::{Domain, Flags, Protocol};
use pretty_assertions::assert_eq;

#[test]
fn survey_round_trip() {
    let (_ev, b) = setup();
    let surveyor = b.open(Domain::Sp, Protocol::Surveyor).unwrap();
    b.bind_sync(surveyor, "ipc:///tmp/nnb-survey.ipc").unwrap();
    let answers: Vec<_> = (0..2)
        .map(|_| {
            let r = b.open(Domain::Sp, Protocol::Respondent).unwrap();
            b.connect(r, "ipc:///tmp/nnb-survey.ipc").unwrap();
            r
        })
        .collect();

    b.send(surveyor, b"lunch?", Flags::DONTWAIT).unwrap();
    for (i, r) in answers.iter().enumerate() {
        assert_eq!(b.recv(*r, Flags::DONTWAIT).unwrap(), b"lunch?");
        b.send(*r, format!("yes-{i}").as_bytes(), Flags::DONTWAIT).unwrap();
    }
    let mut got = vec![
        b.recv(surveyor, Flags::DONTWAIT).unwrap(),
        b.recv(surveyor, Flags::DONTWAIT).unwrap(),
    ];
    got.sort();
    assert_eq!(got, vec![b"yes-0".to_vec(), b"yes-1".to_vec()]);
}

#[test]
fn request_reply_round_trip_on_the_loop() {
    let (mut ev, b) = setup();
    let rep = b.open(Domain::Sp, Protocol::Rep).unwrap();
    let req = b.open(Domain::Sp, Protocol::Req).unwrap();
    b.bind_sync(rep, "tcp://*:7001").unwrap();
    b.connect(req, "tcp://127.0.0.1:7001").unwrap();

    // A reply without a pending request is a state error.
    let err = b.send(rep, b"early", Flags::DONTWAIT).unwrap_err();
    assert_eq!(err.library_code(), Some(EFSM));

    let server = b.clone();
    let served = b
        .poll_recv(rep, move |_| {
            while let Ok(msg) = server.recv(rep, Flags::DONTWAIT) {
                let mut reply = b"re: ".to_vec();
                reply.extend_from_slice(&msg);
                server.send(rep, &reply, Flags::DONTWAIT).unwrap();
            }
        })
        .unwrap()
        .unwrap();

    let replies = Rc::new(RefCell::new(Vec::new()));
    let client = {
        let (replies, rx) = (Rc::clone(&replies), b.clone());
        b.poll_recv(req, move |_| {
            while let Ok(msg) = rx.recv(req, Flags::DONTWAIT) {
                replies.borrow_mut().push(msg);
            }
        })
        .unwrap()
        .unwrap()
    };

    b.send(req, b"ping", Flags::DONTWAIT).unwrap();
    assert!(ev.run_until(|| replies.borrow().len() == 1, WAIT).unwrap());
    assert_eq!(replies.borrow()[0], b"re: ping");

    b.stop_poll(served).unwrap();
    b.stop_poll(client).unwrap();
    assert!(ev.is_idle());
}

#[test]
fn pair_is_bidirectional() {
    let (_ev, b) = setup();
    let x = b.open(Domain::Sp, Protocol::Pair).unwrap();
    let y = b.open(Domain::Sp, Protocol::Pair).unwrap();
    b.connect(y, "ws://127.0.0.1:9000/chat").unwrap();
    b.bind_sync(x, "ws://*:9000/chat").unwrap();
    b.send(x, b"hi y", Flags::DONTWAIT).unwrap();
    b.send(y, b"hi x", Flags::DONTWAIT).unwrap();
    assert_eq!(b.recv(y, Flags::DONTWAIT).unwrap(), b"hi y");
    assert_eq!(b.recv(x, Flags::DONTWAIT).unwrap(), b"hi x");
}
