//! nnb End-to-End Smoke Test
//!
//! Exercises the bridge over the build's default backend:
//!   Part A — Reflection: symbol table, single-symbol lookup
//!   Part B — Polling: PUSH → PULL over the loop, stop_poll semantics
//!   Part C — Offload: async bind collision against a sync bind
//!   Part D — Device: raw PULL → PUSH forwarder, ended by terminate()
//!
//! Run: NNB_LOG=debug ./target/release/nnb-smoke

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use nnb_core::consts::*;
use nnb_core::{Domain, EndpointId, Flags, NnError, Protocol};
use nnb_executor::{Bridge, EventLoop};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const WAIT: Duration = Duration::from_secs(5);

// ── Test harness ──

struct TestRunner {
    total: usize,
    passed: usize,
    failed: usize,
}

const LINE: &str = "────────────────────────────────────────────────────────────";

impl TestRunner {
    fn new() -> Self {
        Self { total: 0, passed: 0, failed: 0 }
    }

    fn section(&self, name: &str) {
        println!("\n{}", LINE);
        println!("  {}", name);
        println!("{}", LINE);
    }

    fn check(&mut self, name: &str, ok: bool, reason: &str) {
        self.total += 1;
        if ok {
            self.passed += 1;
            println!("  [{:2}] {:<52} PASS", self.total, name);
        } else {
            self.failed += 1;
            println!("  [{:2}] {:<52} FAIL: {}", self.total, name, reason);
        }
    }

    fn summary(&self) {
        println!("\n{}", LINE);
        println!(
            "  Total: {}  Passed: {}  Failed: {}",
            self.total, self.passed, self.failed
        );
        println!("{}", LINE);
    }
}

// ════════════════════════════════════════════════════════════
// Part A: Reflection
// ════════════════════════════════════════════════════════════

fn test_reflection(t: &mut TestRunner, b: &Bridge) {
    t.section("Part A: Reflection");
    let table = b.symbols();
    t.check("symbol table is populated", !table.is_empty(), "empty table");
    t.check(
        "NN_PAIR resolves",
        table.get("NN_PAIR") == Some(NN_PAIR),
        &format!("{:?}", table.get("NN_PAIR")),
    );
    let past_end = b.symbol(table.len() as i32);
    t.check(
        "lookup past the end is EINVAL",
        past_end.as_ref().err().and_then(|e| e.library_code()) == Some(libc::EINVAL),
        &format!("{past_end:?}"),
    );
}

// ════════════════════════════════════════════════════════════
// Part B: Polling
// ════════════════════════════════════════════════════════════

fn test_polling(t: &mut TestRunner, ev: &mut EventLoop, b: &Bridge) -> nnb_core::Result<()> {
    t.section("Part B: Readiness polling");
    let pull = b.open(Domain::Sp, Protocol::Pull)?;
    let push = b.open(Domain::Sp, Protocol::Push)?;
    b.bind_sync(pull, "inproc://smoke.jobs")?;
    b.connect(push, "inproc://smoke.jobs")?;

    let got = Rc::new(Cell::new(0usize));
    let rx = b.clone();
    let counter = Rc::clone(&got);
    let id = b.poll_recv(pull, move |_| {
        while rx.recv(pull, Flags::DONTWAIT).is_ok() {
            counter.set(counter.get() + 1);
        }
    })?;
    t.check("PULL exposes a receive handle", id.is_some(), "absent");
    t.check(
        "PULL has no send handle",
        b.poll_send(pull, |_| {})?.is_none(),
        "registration returned",
    );

    for i in 0..16u32 {
        b.send(push, &i.to_le_bytes(), Flags::DONTWAIT)?;
    }
    let all = ev.run_until(|| got.get() == 16, WAIT)?;
    t.check("16 messages arrive through callbacks", all, &format!("got {}", got.get()));

    if let Some(id) = id {
        b.stop_poll(id)?;
        t.check("second stop_poll is rejected", b.stop_poll(id).is_err(), "accepted");
    }
    b.close(push)?;
    b.close(pull)?;
    t.check("loop is idle", ev.is_idle(), "registrations left");
    Ok(())
}

// ════════════════════════════════════════════════════════════
// Part C: Offloaded bind
// ════════════════════════════════════════════════════════════

fn test_offload(t: &mut TestRunner, ev: &mut EventLoop, b: &Bridge) -> nnb_core::Result<()> {
    t.section("Part C: Offloaded bind");
    let first = b.open(Domain::Sp, Protocol::Pub)?;
    let second = b.open(Domain::Sp, Protocol::Pub)?;
    b.bind_sync(first, "tcp://127.0.0.1:5555")?;

    let result: Rc<RefCell<Option<Result<EndpointId, NnError>>>> = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&result);
    b.bind(second, "tcp://127.0.0.1:5555", move |r| *sink.borrow_mut() = Some(r))?;
    let done = ev.run_until(|| result.borrow().is_some(), WAIT)?;
    t.check("completion delivered", done, "timed out");
    let code = result.borrow().as_ref().and_then(|r| r.as_ref().err().map(NnError::code));
    t.check("duplicate bind fails with EADDRINUSE", code == Some(libc::EADDRINUSE), &format!("{code:?}"));

    b.close(first)?;
    b.close(second)?;
    Ok(())
}

// ════════════════════════════════════════════════════════════
// Part D: Device
// ════════════════════════════════════════════════════════════

fn test_device(t: &mut TestRunner, ev: &mut EventLoop, b: &Bridge) -> nnb_core::Result<()> {
    t.section("Part D: Device forwarder");
    let r1 = b.open(Domain::SpRaw, Protocol::Pull)?;
    let r2 = b.open(Domain::SpRaw, Protocol::Push)?;
    b.bind_sync(r1, "inproc://smoke.in")?;
    b.bind_sync(r2, "inproc://smoke.out")?;
    let producer = b.open(Domain::Sp, Protocol::Push)?;
    let consumer = b.open(Domain::Sp, Protocol::Pull)?;
    b.connect(producer, "inproc://smoke.in")?;
    b.connect(consumer, "inproc://smoke.out")?;
    b.set_option(consumer, NN_SOL_SOCKET, NN_RCVTIMEO, 5000)?;

    let ended: Rc<RefCell<Option<NnError>>> = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&ended);
    b.device(Some(r1), Some(r2), move |e| *sink.borrow_mut() = Some(e))?;

    b.send(producer, b"forwarded", Flags::NONE)?;
    let msg = b.recv(consumer, Flags::NONE)?;
    t.check("message crosses the device", msg == b"forwarded", &format!("{msg:?}"));

    b.terminate();
    let done = ev.run_until(|| ended.borrow().is_some(), WAIT)?;
    let code = ended.borrow().as_ref().map(NnError::code);
    t.check("terminate ends the device", done && code == Some(ETERM), &format!("{code:?}"));
    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_env("NNB_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== nnb End-to-End Smoke Test ===");

    let mut ev = match EventLoop::new() {
        Ok(ev) => ev,
        Err(e) => {
            error!(error = %e, "event loop setup failed");
            std::process::exit(1);
        }
    };
    let b = Bridge::with_default_backend(&ev);
    info!(symbols = b.symbols().len(), "bridge up");

    let mut t = TestRunner::new();
    test_reflection(&mut t, &b);
    let parts: [(&str, fn(&mut TestRunner, &mut EventLoop, &Bridge) -> nnb_core::Result<()>); 3] = [
        ("polling", test_polling),
        ("offload", test_offload),
        ("device", test_device),
    ];
    for (name, part) in parts {
        if let Err(e) = part(&mut t, &mut ev, &b) {
            t.check(name, false, &e.to_string());
        }
    }

    t.summary();
    std::process::exit(if t.failed > 0 { 1 } else { 0 });
}
