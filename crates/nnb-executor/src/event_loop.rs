//! # The control-thread event loop
//!
//! One `EventLoop` per control thread. It owns the `mio::Poll`; everything
//! else (poll arena, pending offloads, config) sits behind an `Rc` shared
//! with every [`LoopHandle`], so callbacks can start and stop polls or
//! submit offloads while the loop is dispatching.
//!
//! ```text
//! run_once(timeout):
//!     1. Wait for readiness (or the waker) up to `timeout`
//!     2. For each readiness event → detach callback, invoke, reattach
//!     3. Drain the completion queue → invoke each sink exactly once
//!     4. Release indices quarantined during this batch
//! ```
//!
//! Offload workers never touch the `Rc` side. They reach the loop only
//! through [`Remote`]: a lock-free id queue plus a `mio::Waker`.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;
use std::os::fd::{AsRawFd, BorrowedFd, RawFd};
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_queue::SegQueue;
use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Registry, Token, Waker};
use nnb_core::error::{BridgeError, Result};
use nnb_core::poll::{EventMask, PollId};
use nnb_core::socket::{Direction, SocketHandle};
use tracing::{debug, trace, warn};

use crate::config::BridgeConfig;
use crate::poller::{PollArena, PollCallback};

const WAKER_TOKEN: Token = Token(0);

/// Type-erased delivery of one finished offload.
pub(crate) type Delivery = Box<dyn FnOnce()>;

/// The thread-safe half of the loop, shared with offload workers.
pub(crate) struct Remote {
    waker: Waker,
    ready: SegQueue<u64>,
}

impl Remote {
    /// Announce that offload `id` has published its result.
    pub fn complete(&self, id: u64) {
        self.ready.push(id);
        if let Err(e) = self.waker.wake() {
            warn!(offload = id, error = %e, "failed to wake event loop");
        }
    }
}

pub(crate) struct Shared {
    registry: Registry,
    pub(crate) remote: Arc<Remote>,
    polls: RefCell<PollArena>,
    offloads: RefCell<HashMap<u64, Delivery>>,
    next_offload: Cell<u64>,
    pub(crate) config: BridgeConfig,
}

impl Shared {
    fn dispatch_poll(&self, token: Token, mask: EventMask) -> usize {
        // The arena borrow ends before the callback runs.
        let detached = self.polls.borrow_mut().take_callback(token);
        let Some((id, mut callback)) = detached else {
            trace!(token = token.0, "event for inactive registration");
            return 0;
        };
        callback(mask);
        self.polls.borrow_mut().restore(id, callback);
        1
    }

    fn drain_completions(&self) -> usize {
        let mut delivered = 0;
        while let Some(id) = self.remote.ready.pop() {
            let pending = self.offloads.borrow_mut().remove(&id);
            match pending {
                Some(deliver) => {
                    trace!(offload = id, "delivering completion");
                    deliver();
                    delivered += 1;
                }
                None => warn!(offload = id, "completion for unknown offload"),
            }
        }
        delivered
    }
}

/// Single-threaded host event loop.
pub struct EventLoop {
    poll: Poll,
    events: Events,
    shared: Rc<Shared>,
}

impl EventLoop {
    /// Loop configured from the environment (see [`BridgeConfig::from_env`]).
    pub fn new() -> Result<Self> {
        Self::with_config(BridgeConfig::from_env())
    }

    pub fn with_config(config: BridgeConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|msg| BridgeError::Argument(msg.to_owned()))?;
        let poll = Poll::new()?;
        let registry = poll.registry().try_clone()?;
        let waker = Waker::new(poll.registry(), WAKER_TOKEN)?;
        let shared = Rc::new(Shared {
            registry,
            remote: Arc::new(Remote { waker, ready: SegQueue::new() }),
            polls: RefCell::new(PollArena::default()),
            offloads: RefCell::new(HashMap::new()),
            next_offload: Cell::new(1),
            config: config.clone(),
        });
        debug!(events_capacity = config.events_capacity, "event loop created");
        Ok(Self {
            poll,
            events: Events::with_capacity(config.events_capacity),
            shared,
        })
    }

    pub fn handle(&self) -> LoopHandle {
        LoopHandle { shared: Rc::clone(&self.shared) }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.shared.config
    }

    /// Wait up to `timeout` (`None` = indefinitely) and dispatch.
    ///
    /// Returns the number of callbacks and completions invoked. An
    /// interrupted wait dispatches nothing and returns `0`.
    pub fn run_once(&mut self, timeout: Option<Duration>) -> Result<usize> {
        match self.poll.poll(&mut self.events, timeout) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(0),
            Err(e) => return Err(e.into()),
        }
        let fired: Vec<(Token, EventMask)> = self
            .events
            .iter()
            .filter(|ev| ev.token() != WAKER_TOKEN)
            .map(|ev| {
                let mask = if ev.is_readable() { EventMask::READABLE } else { EventMask::EMPTY };
                (ev.token(), mask)
            })
            .collect();

        let mut dispatched = 0;
        for (token, mask) in fired {
            dispatched += self.shared.dispatch_poll(token, mask);
        }
        dispatched += self.shared.drain_completions();
        self.shared.polls.borrow_mut().end_batch();
        Ok(dispatched)
    }

    /// Turn the loop until `done()` holds or `timeout` elapses.
    /// Returns whether `done()` became true.
    pub fn run_until(&mut self, mut done: impl FnMut() -> bool, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if done() {
                return Ok(true);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            self.run_once(Some(deadline - now))?;
        }
    }

    /// Turn the loop until no registration is live and no offload pending.
    pub fn run(&mut self) -> Result<()> {
        while !self.is_idle() {
            self.run_once(None)?;
        }
        Ok(())
    }

    pub fn active_polls(&self) -> usize {
        self.shared.polls.borrow().len()
    }

    pub fn pending_offloads(&self) -> usize {
        self.shared.offloads.borrow().len()
    }

    pub fn is_idle(&self) -> bool {
        self.active_polls() == 0 && self.pending_offloads() == 0
    }
}

/// Control-thread handle to an [`EventLoop`].
///
/// Cheap to clone; not `Send`. Every method must be called on the thread
/// that runs the loop.
#[derive(Clone)]
pub struct LoopHandle {
    shared: Rc<Shared>,
}

impl LoopHandle {
    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.shared.config
    }

    pub fn active_polls(&self) -> usize {
        self.shared.polls.borrow().len()
    }

    pub fn pending_offloads(&self) -> usize {
        self.shared.offloads.borrow().len()
    }

    /// Live registrations watching `socket`.
    pub fn polls_for(&self, socket: SocketHandle) -> usize {
        self.shared.polls.borrow().count_for(socket)
    }

    /// Register a duplicate of `fd` edge-triggered for readability.
    ///
    /// The registration owns the duplicate, so it outlives a `close` of the
    /// socket and several registrations may watch the same wait-handle.
    pub(crate) fn start_poll(
        &self,
        fd: RawFd,
        socket: SocketHandle,
        direction: Direction,
        callback: PollCallback,
    ) -> Result<PollId> {
        // `fd` was just reported by the library for a live socket.
        let watched = unsafe { BorrowedFd::borrow_raw(fd) }.try_clone_to_owned()?;
        let raw = watched.as_raw_fd();
        let id = self.shared.polls.borrow_mut().insert(watched, socket, direction, callback);
        let token = Token(id.index() as usize + 1);
        if let Err(e) = self
            .shared
            .registry
            .register(&mut SourceFd(&raw), token, Interest::READABLE)
        {
            let _ = self.shared.polls.borrow_mut().remove(id);
            return Err(e.into());
        }
        debug!(poll = %id, %socket, ?direction, fd, watched = raw, "poll started");
        Ok(id)
    }

    /// Deregister and release `id`. No callback for `id` runs after this
    /// returns, including the one currently running.
    pub fn stop_poll(&self, id: PollId) -> Result<()> {
        let reg = self.shared.polls.borrow_mut().remove(id)?;
        if let Err(e) = self
            .shared
            .registry
            .deregister(&mut SourceFd(&reg.fd.as_raw_fd()))
        {
            warn!(poll = %id, socket = %reg.socket, error = %e, "deregister failed");
        }
        debug!(poll = %id, socket = %reg.socket, direction = ?reg.direction, "poll stopped");
        Ok(())
    }

    /// Park `deliver` until offload `id` reports back.
    pub(crate) fn park_offload(&self, deliver: Delivery) -> u64 {
        let id = self.shared.next_offload.get();
        self.shared.next_offload.set(id + 1);
        self.shared.offloads.borrow_mut().insert(id, deliver);
        id
    }

    pub(crate) fn unpark_offload(&self, id: u64) {
        self.shared.offloads.borrow_mut().remove(&id);
    }
}
