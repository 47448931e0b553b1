//! `MemoryBackend` — in-process implementation of the library API.
//!
//! Sockets live in one process-wide table behind a single mutex. Endpoints
//! rendezvous by address key (see [`address`]): a bind and a connect with
//! the same key link the two sockets if their protocols are peers, in
//! whichever order they happen. Messages are copied straight into the
//! peer's inbox.
//!
//! Blocking calls (`send`/`recv` without `NN_DONTWAIT`, `device`) park on
//! one condvar that every state change broadcasts. `term()` wakes them all
//! with `ETERM`.
//!
//! Each socket exposes an eventfd per direction it supports; it polls
//! readable exactly while a non-blocking call in that direction would not
//! return `EAGAIN`.

mod address;
mod options;
mod state;

use std::cell::Cell;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use nnb_core::backend::Backend;
use nnb_core::consts::*;
use nnb_core::socket::{Domain, Protocol};
use nnb_core::symbol::{SymbolProperties, CATALOG};
use tracing::{debug, trace};

use crate::errno;
use crate::eventfd::EventFd;
use address::Role;
use state::{Endpoint, Link, Sock, State};

/// Most sockets open at once; the next `socket()` fails with `EMFILE`.
pub const MAX_SOCKETS: usize = 512;

thread_local! {
    static LAST_ERROR: Cell<i32> = const { Cell::new(0) };
}

fn fail(code: i32) -> i32 {
    LAST_ERROR.with(|e| e.set(code));
    -1
}

pub struct MemoryBackend {
    state: Mutex<State>,
    changed: Condvar,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Park until the next state change or `deadline`.
    fn wait<'a>(&self, guard: MutexGuard<'a, State>, deadline: Option<Instant>) -> MutexGuard<'a, State> {
        match deadline {
            None => self.changed.wait(guard).unwrap_or_else(PoisonError::into_inner),
            Some(d) => {
                let left = d.saturating_duration_since(Instant::now());
                self.changed
                    .wait_timeout(guard, left)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
        }
    }

    fn deadline(st: &State, s: i32, option: i32) -> Option<Instant> {
        let ms = st
            .sockets
            .get(&s)
            .and_then(|sock| options::int_value(sock, NN_SOL_SOCKET, option))
            .unwrap_or(-1);
        (ms >= 0).then(|| Instant::now() + Duration::from_millis(ms as u64))
    }

    fn attach(&self, s: i32, addr: &str, role: Role) -> i32 {
        let mut st = self.lock();
        if st.terminated {
            return fail(ETERM);
        }
        if !st.sockets.contains_key(&s) {
            return fail(libc::EBADF);
        }
        let key = match address::endpoint_key(addr, role) {
            Ok(key) => key,
            Err(code) => return fail(code),
        };
        if role == Role::Bind && st.bound.contains_key(&key) {
            return fail(libc::EADDRINUSE);
        }
        let Some(sock) = st.sockets.get_mut(&s) else { return fail(libc::EBADF) };
        let eid = sock.next_endpoint;
        sock.next_endpoint += 1;
        sock.endpoints.insert(eid, Endpoint { key: key.clone(), bound: role == Role::Bind });
        match role {
            Role::Bind => {
                st.bound.insert(key.clone(), (s, eid));
                st.link_connectors(&key, s, eid);
            }
            Role::Connect => st.link_binder(&key, s, eid),
        }
        trace!(socket = s, endpoint = eid, %addr, ?role, "endpoint attached");
        self.changed.notify_all();
        eid
    }

    /// Move at most one message from `src` out through `dst`.
    fn forward(st: &mut State, src: i32, dst: i32) -> bool {
        let (Some(from), Some(to)) = (st.sockets.get(&src), st.sockets.get(&dst)) else {
            return false;
        };
        if !from.protocol.can_recv() || !to.protocol.can_send() || from.inbox.is_empty() {
            return false;
        }
        let returns_replies = matches!(from.protocol, Protocol::Rep | Protocol::Respondent);
        if !st.can_send_now(dst) {
            return false;
        }
        let Some(frame) = st.take_frame(src) else { return false };
        let mut trail = frame.trail;
        if returns_replies {
            trail.push(frame.origin);
        }
        let exclude = (src == dst).then_some(frame.origin);
        // No route on the far side: the message is dropped like a full pipe would.
        let _ = st.route(dst, &frame.body, trail, exclude);
        true
    }
}

impl Backend for MemoryBackend {
    fn socket(&self, domain: i32, protocol: i32) -> i32 {
        let domain = match domain {
            AF_SP => Domain::Sp,
            AF_SP_RAW => Domain::SpRaw,
            _ => return fail(libc::EAFNOSUPPORT),
        };
        let Some(protocol) = Protocol::ALL.into_iter().find(|p| p.raw() == protocol) else {
            return fail(libc::EINVAL);
        };
        let mut st = self.lock();
        if st.terminated {
            return fail(ETERM);
        }
        if st.sockets.len() >= MAX_SOCKETS {
            return fail(libc::EMFILE);
        }
        let fd_for = |supported: bool| -> Result<Option<EventFd>, i32> {
            if !supported {
                return Ok(None);
            }
            EventFd::create()
                .map(Some)
                .map_err(|e| e.raw_os_error().unwrap_or(libc::ENOMEM))
        };
        let (snd, rcv) = match (fd_for(protocol.can_send()), fd_for(protocol.can_recv())) {
            (Ok(snd), Ok(rcv)) => (snd, rcv),
            (Err(code), _) | (_, Err(code)) => return fail(code),
        };
        let id = st.next_socket;
        st.next_socket += 1;
        st.sockets.insert(id, Sock::new(id, domain, protocol, snd, rcv));
        st.refresh(id);
        debug!(socket = id, %protocol, raw = domain == Domain::SpRaw, "socket opened");
        id
    }

    fn close(&self, s: i32) -> i32 {
        let mut st = self.lock();
        if st.sockets.remove(&s).is_none() {
            return fail(libc::EBADF);
        }
        st.bound.retain(|_, (owner, _)| *owner != s);
        st.unlink(|l: &Link| l.binder.0 == s || l.connector.0 == s);
        debug!(socket = s, "socket closed");
        self.changed.notify_all();
        0
    }

    fn setsockopt(&self, s: i32, level: i32, option: i32, value: &[u8]) -> i32 {
        let mut st = self.lock();
        if st.terminated {
            return fail(ETERM);
        }
        let Some(sock) = st.sockets.get_mut(&s) else { return fail(libc::EBADF) };
        match options::set(sock, level, option, value) {
            Ok(()) => {
                // Timeouts may have changed under a blocked caller.
                self.changed.notify_all();
                0
            }
            Err(code) => fail(code),
        }
    }

    fn getsockopt(&self, s: i32, level: i32, option: i32, buf: &mut [u8], len: &mut usize) -> i32 {
        let st = self.lock();
        if st.terminated {
            return fail(ETERM);
        }
        let Some(sock) = st.sockets.get(&s) else { return fail(libc::EBADF) };
        match options::get(sock, level, option) {
            Ok(value) => {
                let n = value.len().min(buf.len());
                buf[..n].copy_from_slice(&value[..n]);
                *len = value.len();
                0
            }
            Err(code) => fail(code),
        }
    }

    fn bind(&self, s: i32, addr: &str) -> i32 {
        self.attach(s, addr, Role::Bind)
    }

    fn connect(&self, s: i32, addr: &str) -> i32 {
        self.attach(s, addr, Role::Connect)
    }

    fn shutdown(&self, s: i32, endpoint: i32) -> i32 {
        let mut st = self.lock();
        if st.terminated {
            return fail(ETERM);
        }
        let Some(sock) = st.sockets.get_mut(&s) else { return fail(libc::EBADF) };
        let Some(ep) = sock.endpoints.remove(&endpoint) else { return fail(libc::EINVAL) };
        if ep.bound {
            st.bound.remove(&ep.key);
            st.unlink(|l: &Link| l.binder == (s, endpoint));
        } else {
            st.unlink(|l: &Link| l.connector == (s, endpoint));
        }
        trace!(socket = s, endpoint, "endpoint shut down");
        self.changed.notify_all();
        0
    }

    fn send(&self, s: i32, buf: &[u8], flags: i32) -> i32 {
        let dontwait = flags & NN_DONTWAIT != 0;
        let mut st = self.lock();
        let deadline = Self::deadline(&st, s, NN_SNDTIMEO);
        loop {
            if st.terminated {
                return fail(ETERM);
            }
            match st.route(s, buf, Vec::new(), None) {
                Ok(()) => {
                    self.changed.notify_all();
                    return buf.len() as i32;
                }
                Err(libc::EAGAIN) if !dontwait => {
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        return fail(libc::ETIMEDOUT);
                    }
                    st = self.wait(st, deadline);
                }
                Err(code) => return fail(code),
            }
        }
    }

    fn recv(&self, s: i32, out: &mut Vec<u8>, flags: i32) -> i32 {
        let dontwait = flags & NN_DONTWAIT != 0;
        let mut st = self.lock();
        let deadline = Self::deadline(&st, s, NN_RCVTIMEO);
        loop {
            if st.terminated {
                return fail(ETERM);
            }
            let Some(sock) = st.sockets.get(&s) else { return fail(libc::EBADF) };
            if !sock.protocol.can_recv() {
                return fail(libc::ENOTSUP);
            }
            if let Some(frame) = st.take_frame(s) {
                *out = frame.body;
                self.changed.notify_all();
                return out.len() as i32;
            }
            if dontwait {
                return fail(libc::EAGAIN);
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return fail(libc::ETIMEDOUT);
            }
            st = self.wait(st, deadline);
        }
    }

    fn device(&self, s1: i32, s2: i32) -> i32 {
        let mut st = self.lock();
        let present: Vec<i32> = [s1, s2].into_iter().filter(|&s| s >= 0).collect();
        if present.is_empty() {
            return fail(libc::EBADF);
        }
        for s in &present {
            match st.sockets.get(s) {
                None => return fail(libc::EBADF),
                Some(sock) if !sock.is_raw() => return fail(libc::EINVAL),
                Some(_) => {}
            }
        }
        let (a, b) = match present[..] {
            [only] => (only, only),
            [a, b] => (a, b),
            _ => return fail(libc::EINVAL),
        };
        if a != b {
            let (pa, pb) = (st.sockets[&a].protocol, st.sockets[&b].protocol);
            if !pa.is_peer_of(pb) {
                return fail(libc::EINVAL);
            }
        }
        debug!(s1, s2, "device running");
        loop {
            if st.terminated {
                return fail(ETERM);
            }
            if !st.sockets.contains_key(&a) || !st.sockets.contains_key(&b) {
                return fail(libc::EBADF);
            }
            let mut moved = Self::forward(&mut st, a, b);
            if a != b {
                moved |= Self::forward(&mut st, b, a);
            }
            if moved {
                self.changed.notify_all();
            } else {
                st = self.wait(st, None);
            }
        }
    }

    fn symbol_info(&self, index: i32) -> Option<SymbolProperties> {
        let index = usize::try_from(index).ok()?;
        if let Some(def) = CATALOG.get(index) {
            return Some(def.to_properties());
        }
        let (name, value) = errno::REFLECTED.get(index - CATALOG.len())?;
        Some(SymbolProperties {
            name: (*name).to_owned(),
            value: *value,
            ns: NN_NS_ERROR,
            kind: NN_TYPE_NONE,
            unit: NN_UNIT_NONE,
        })
    }

    fn errno(&self) -> i32 {
        LAST_ERROR.with(Cell::get)
    }

    fn strerror(&self, code: i32) -> String {
        errno::describe(code)
    }

    fn term(&self) {
        let mut st = self.lock();
        if st.terminated {
            return;
        }
        st.terminated = true;
        let ids: Vec<i32> = st.sockets.keys().copied().collect();
        for s in ids {
            st.refresh(s);
        }
        debug!("library terminated");
        self.changed.notify_all();
    }
}
