//! Messaging-library abstraction.
//!
//! A `Backend` is the synchronous `nn_*` API, one method per library call,
//! with the library's own conventions kept intact:
//!
//! - integer returns: `>= 0` success (often a resource id), `< 0` failure;
//! - the failure code is read afterwards with [`Backend::errno`], which is
//!   per-thread, so it must be read on the thread that made the call;
//! - [`Backend::device`] only ever returns on failure.
//!
//! # Implementors
//!
//! - `MemoryBackend` (default): in-process implementation of the full API
//!   surface. Used by tests and the smoke binary.
//! - `NanomsgBackend` (feature `nanomsg`): raw FFI to `libnanomsg`.

use crate::error::NnError;
use crate::symbol::SymbolProperties;

/// The synchronous, possibly-blocking messaging library.
///
/// **Contract:**
/// - Every method may be called from any thread.
/// - `bind`, `send`/`recv` without `NN_DONTWAIT`, and `device` may block;
///   the bridge only calls the blocking ones from offload workers.
/// - `term()` is idempotent and makes every blocked call return `ETERM`.
pub trait Backend: Send + Sync + 'static {
    /// Create a socket. Returns the socket id or `-1`.
    fn socket(&self, domain: i32, protocol: i32) -> i32;

    fn close(&self, s: i32) -> i32;

    /// Copy `value` into the option. Returns `0` or `-1`.
    fn setsockopt(&self, s: i32, level: i32, option: i32, value: &[u8]) -> i32;

    /// Copy the option into `buf`. On return `len` holds the option's full
    /// size, which may exceed `buf.len()` (the copy is truncated).
    fn getsockopt(&self, s: i32, level: i32, option: i32, buf: &mut [u8], len: &mut usize) -> i32;

    /// Attach a local endpoint. Returns the endpoint id or `-1`.
    fn bind(&self, s: i32, addr: &str) -> i32;

    /// Attach a remote endpoint. Returns the endpoint id or `-1`.
    fn connect(&self, s: i32, addr: &str) -> i32;

    fn shutdown(&self, s: i32, endpoint: i32) -> i32;

    /// Send one message. Returns the number of bytes sent or `-1`.
    fn send(&self, s: i32, buf: &[u8], flags: i32) -> i32;

    /// Receive one message into `out` (replacing its contents).
    /// Returns the message length or `-1`.
    fn recv(&self, s: i32, out: &mut Vec<u8>, flags: i32) -> i32;

    /// Forward messages between `s1` and `s2` (`-1` for loopback on the
    /// other). Blocks until failure; the return is always `-1`.
    fn device(&self, s1: i32, s2: i32) -> i32;

    /// Properties of the symbol at `index`, `None` past the end.
    fn symbol_info(&self, index: i32) -> Option<SymbolProperties>;

    /// The calling thread's last error code.
    fn errno(&self) -> i32;

    fn strerror(&self, code: i32) -> String;

    /// Shut the library down. Outstanding sockets become unusable.
    fn term(&self);

    /// The calling thread's last error as an [`NnError`].
    fn last_error(&self) -> NnError {
        let code = self.errno();
        NnError::new(code, self.strerror(code))
    }
}
