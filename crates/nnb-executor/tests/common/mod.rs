#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use nnb_executor::{Bridge, BridgeConfig, EventLoop};
use nnb_module::MemoryBackend;

pub const WAIT: Duration = Duration::from_secs(5);

pub fn setup() -> (EventLoop, Bridge<MemoryBackend>) {
    setup_with(BridgeConfig::new())
}

pub fn setup_with(config: BridgeConfig) -> (EventLoop, Bridge<MemoryBackend>) {
    let ev = EventLoop::with_config(config).expect("event loop");
    let bridge = Bridge::new(&ev, MemoryBackend::new());
    (ev, bridge)
}

/// A value filled in by a callback and read back by the test.
pub type Cell<T> = Rc<RefCell<Option<T>>>;

pub fn cell<T>() -> Cell<T> {
    Rc::new(RefCell::new(None))
}

pub fn is_set<T>(c: &Cell<T>) -> impl Fn() -> bool + '_ {
    move || c.borrow().is_some()
}
