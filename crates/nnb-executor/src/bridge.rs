//! `Bridge` — the caller-facing API.
//!
//! Every library call is turned into a `Result`: a negative return becomes
//! `BridgeError::Library` carrying the calling thread's errno. Shape errors
//! (NUL in an address, wrong option value type) are `BridgeError::Argument`
//! and never reach the library.
//!
//! Calls that may block for long (`bind`, `device`) have an offloaded form
//! whose completion runs on the loop thread; the rest are direct.

use std::convert::Infallible;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use nnb_core::backend::Backend;
use nnb_core::consts::*;
use nnb_core::error::{BridgeError, NnError, Result};
use nnb_core::option::{self, OptionValue, GET_BUFFER_LEN};
use nnb_core::poll::{EventMask, PollId};
use nnb_core::socket::{Direction, Domain, EndpointId, Flags, Protocol, SocketHandle};
use nnb_core::symbol::SymbolTable;
use nnb_module::DefaultBackend;
use tracing::{debug, warn};

use crate::device;
use crate::event_loop::{EventLoop, LoopHandle};

/// Socket API bound to one event loop.
///
/// Clones share the backend, the loop and the symbol table.
pub struct Bridge<B: Backend = DefaultBackend> {
    backend: Arc<B>,
    handle: LoopHandle,
    symbols: Rc<SymbolTable>,
}

impl<B: Backend> Clone for Bridge<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            handle: self.handle.clone(),
            symbols: Rc::clone(&self.symbols),
        }
    }
}

impl<B: Backend> fmt::Debug for Bridge<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("symbols", &self.symbols.len())
            .field("active_polls", &self.handle.active_polls())
            .field("pending_offloads", &self.handle.pending_offloads())
            .finish()
    }
}

impl Bridge<DefaultBackend> {
    /// Bridge over the build's default backend.
    pub fn with_default_backend(ev: &EventLoop) -> Self {
        Self::new(ev, DefaultBackend::default())
    }
}

fn check_addr(addr: &str) -> Result<()> {
    if addr.contains('\0') {
        return Err(BridgeError::Argument(format!("address {addr:?} contains NUL")));
    }
    Ok(())
}

impl<B: Backend> Bridge<B> {
    /// Bind to `ev` and reflect the library's symbols once.
    pub fn new(ev: &EventLoop, backend: B) -> Self {
        Self::from_arc(ev.handle(), Arc::new(backend))
    }

    pub fn from_arc(handle: LoopHandle, backend: Arc<B>) -> Self {
        let symbols = Rc::new(SymbolTable::load(&*backend));
        debug!(symbols = symbols.len(), "bridge ready");
        Self { backend, handle, symbols }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn handle(&self) -> &LoopHandle {
        &self.handle
    }

    /// `rc` as a `Result`, reading errno on failure.
    fn check(&self, rc: i32) -> Result<i32> {
        if rc < 0 {
            return Err(self.backend.last_error().into());
        }
        Ok(rc)
    }

    // ── Reflection ──

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Name and value of the symbol at `index`; `EINVAL` past the end.
    pub fn symbol(&self, index: i32) -> Result<(String, i32)> {
        match self.backend.symbol_info(index) {
            Some(props) => Ok((props.name, props.value)),
            None => Err(NnError::new(libc::EINVAL, self.backend.strerror(libc::EINVAL)).into()),
        }
    }

    // ── Errors and teardown ──

    /// The calling thread's last library error.
    pub fn last_error(&self) -> NnError {
        self.backend.last_error()
    }

    pub fn describe_error(&self, code: i32) -> String {
        self.backend.strerror(code)
    }

    /// Shut the library down. Idempotent.
    pub fn terminate(&self) {
        debug!("terminating library");
        self.backend.term();
    }

    // ── Socket lifecycle ──

    /// Create a socket. SUB sockets start subscribed to every topic unless
    /// the loop's config turns that off.
    pub fn open(&self, domain: Domain, protocol: Protocol) -> Result<SocketHandle> {
        let s = self.check(self.backend.socket(domain.raw(), protocol.raw()))?;
        let handle = SocketHandle::from_raw(s);
        if protocol == Protocol::Sub && self.handle.config().subscribe_all {
            let rc = self.backend.setsockopt(s, NN_SUB, NN_SUB_SUBSCRIBE, b"");
            if rc < 0 {
                let err = self.backend.last_error();
                self.backend.close(s);
                warn!(socket = %handle, error = %err, "catch-all subscription failed");
                return Err(err.into());
            }
        }
        debug!(socket = %handle, %protocol, ?domain, "opened");
        Ok(handle)
    }

    pub fn close(&self, s: SocketHandle) -> Result<()> {
        let live = self.handle.polls_for(s);
        if live > 0 {
            warn!(socket = %s, live, "closing a socket with active poll registrations");
        }
        self.check(self.backend.close(s.raw()))?;
        debug!(socket = %s, "closed");
        Ok(())
    }

    // ── Endpoints ──

    /// Bind on the calling thread.
    pub fn bind_sync(&self, s: SocketHandle, addr: &str) -> Result<EndpointId> {
        check_addr(addr)?;
        let eid = self.check(self.backend.bind(s.raw(), addr))?;
        Ok(EndpointId::from_raw(eid))
    }

    /// Bind on an offload thread. The address is validated before
    /// anything is scheduled.
    pub fn bind<F>(&self, s: SocketHandle, addr: &str, completion: F) -> Result<()>
    where
        F: FnOnce(std::result::Result<EndpointId, NnError>) + 'static,
    {
        check_addr(addr)?;
        let backend = Arc::clone(&self.backend);
        let addr = addr.to_owned();
        self.handle.submit(
            move || {
                let rc = backend.bind(s.raw(), &addr);
                if rc < 0 {
                    return Err(backend.last_error());
                }
                Ok(EndpointId::from_raw(rc))
            },
            completion,
        )
    }

    pub fn connect(&self, s: SocketHandle, addr: &str) -> Result<EndpointId> {
        check_addr(addr)?;
        let eid = self.check(self.backend.connect(s.raw(), addr))?;
        Ok(EndpointId::from_raw(eid))
    }

    pub fn shutdown(&self, s: SocketHandle, endpoint: EndpointId) -> Result<()> {
        self.check(self.backend.shutdown(s.raw(), endpoint.raw()))?;
        Ok(())
    }

    // ── Messages ──

    /// Returns the number of bytes sent.
    pub fn send(&self, s: SocketHandle, msg: &[u8], flags: Flags) -> Result<usize> {
        let n = self.check(self.backend.send(s.raw(), msg, flags.bits()))?;
        Ok(n as usize)
    }

    pub fn recv(&self, s: SocketHandle, flags: Flags) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.check(self.backend.recv(s.raw(), &mut out, flags.bits()))?;
        Ok(out)
    }

    // ── Options ──

    pub fn set_option(
        &self,
        s: SocketHandle,
        level: i32,
        opt: i32,
        value: impl Into<OptionValue>,
    ) -> Result<()> {
        let wire = option::encode(level, opt, &value.into())?;
        self.check(self.backend.setsockopt(s.raw(), level, opt, &wire))?;
        Ok(())
    }

    pub fn get_option(&self, s: SocketHandle, level: i32, opt: i32) -> Result<OptionValue> {
        let mut buf = [0u8; GET_BUFFER_LEN];
        let mut len = buf.len();
        self.check(self.backend.getsockopt(s.raw(), level, opt, &mut buf, &mut len))?;
        option::decode(level, opt, &buf[..len.min(buf.len())])
    }

    // ── Readiness ──

    /// Call `callback` on every edge of `s` becoming send-ready.
    /// `Ok(None)` when the socket cannot send at all.
    pub fn poll_send<F>(&self, s: SocketHandle, callback: F) -> Result<Option<PollId>>
    where
        F: FnMut(EventMask) + 'static,
    {
        self.start_poll(s, Direction::Send, Box::new(callback))
    }

    /// Call `callback` on every edge of `s` becoming receive-ready.
    /// `Ok(None)` when the socket cannot receive at all.
    pub fn poll_recv<F>(&self, s: SocketHandle, callback: F) -> Result<Option<PollId>>
    where
        F: FnMut(EventMask) + 'static,
    {
        self.start_poll(s, Direction::Recv, Box::new(callback))
    }

    fn start_poll(
        &self,
        s: SocketHandle,
        direction: Direction,
        callback: Box<dyn FnMut(EventMask)>,
    ) -> Result<Option<PollId>> {
        let mut buf = [0u8; 4];
        let mut len = buf.len();
        let rc = self
            .backend
            .getsockopt(s.raw(), NN_SOL_SOCKET, direction.fd_option(), &mut buf, &mut len);
        if rc < 0 {
            let err = self.backend.last_error();
            if err.code() == libc::ENOPROTOOPT {
                debug!(socket = %s, ?direction, "no wait-handle for direction");
                return Ok(None);
            }
            return Err(err.into());
        }
        let fd = i32::from_ne_bytes(buf);
        self.handle.start_poll(fd, s, direction, callback).map(Some)
    }

    /// Stop a registration. Safe from inside its own callback.
    pub fn stop_poll(&self, id: PollId) -> Result<()> {
        self.handle.stop_poll(id)
    }

    // ── Devices ──

    /// Forward on the calling thread. Blocks until the device fails.
    pub fn device_sync(&self, a: Option<SocketHandle>, b: Option<SocketHandle>) -> Result<Infallible> {
        device::forward_sync(&*self.backend, a, b)
    }

    /// Forward on an offload thread; `completion` receives the error that
    /// ended the device.
    pub fn device<F>(&self, a: Option<SocketHandle>, b: Option<SocketHandle>, completion: F) -> Result<()>
    where
        F: FnOnce(NnError) + 'static,
    {
        device::forward(&self.handle, Arc::clone(&self.backend), a, b, completion)
    }
}
