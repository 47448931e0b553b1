//! Device forwarder.
//!
//! The library's forwarding loop only ever returns on failure, so neither
//! entry point has a success path: [`forward_sync`] yields
//! `Result<Infallible, _>` and [`forward`] hands its completion a bare
//! [`NnError`].
//!
//! | `a`     | `b`     | Behavior                              |
//! |---------|---------|---------------------------------------|
//! | Some    | Some    | bidirectional between `a` and `b`     |
//! | Some    | None    | loopback on `a` (and vice versa)      |
//! | None    | None    | `BridgeError::Configuration`, at once |

use std::convert::Infallible;
use std::sync::Arc;

use nnb_core::backend::Backend;
use nnb_core::error::{BridgeError, NnError, Result};
use nnb_core::socket::SocketHandle;
use tracing::debug;

use crate::event_loop::LoopHandle;

fn raw_pair(a: Option<SocketHandle>, b: Option<SocketHandle>) -> Result<(i32, i32)> {
    if a.is_none() && b.is_none() {
        return Err(BridgeError::Configuration);
    }
    Ok((SocketHandle::raw_or_absent(a), SocketHandle::raw_or_absent(b)))
}

fn run_device<B: Backend + ?Sized>(backend: &B, s1: i32, s2: i32) -> NnError {
    backend.device(s1, s2);
    backend.last_error()
}

/// Run the forwarding loop on the calling thread until it fails.
pub fn forward_sync<B: Backend + ?Sized>(
    backend: &B,
    a: Option<SocketHandle>,
    b: Option<SocketHandle>,
) -> Result<Infallible> {
    let (s1, s2) = raw_pair(a, b)?;
    Err(run_device(backend, s1, s2).into())
}

/// Run the forwarding loop on an offload thread; `completion` gets the
/// error that ended it.
pub fn forward<B, Done>(
    handle: &LoopHandle,
    backend: Arc<B>,
    a: Option<SocketHandle>,
    b: Option<SocketHandle>,
    completion: Done,
) -> Result<()>
where
    B: Backend,
    Done: FnOnce(NnError) + 'static,
{
    let (s1, s2) = raw_pair(a, b)?;
    debug!(s1, s2, "device submitted");
    handle.submit(
        move || -> std::result::Result<Infallible, NnError> { Err(run_device(&*backend, s1, s2)) },
        move |result| match result {
            Err(e) => completion(e),
            Ok(never) => match never {},
        },
    )
}
