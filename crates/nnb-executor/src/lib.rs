//! # nnb-executor — Event loop, offload and polling
//!
//! Runs a blocking socket library under a single control thread:
//!
//! - [`EventLoop`]: the `mio`-based loop; all callbacks run inside
//!   `run_once`.
//! - [`LoopHandle::submit`]: offload a blocking call to a worker thread and
//!   receive its result back on the loop.
//! - Readiness polling: a socket's wait-handle registered edge-triggered,
//!   callbacks dispatched per edge.
//! - [`device`]: the forwarding loop, offloaded or inline.
//! - [`Bridge`]: the socket API over all of the above.
//!
//! The executor is generic over [`nnb_core::Backend`]; swapping the
//! library does not change it.
//!
//! ```rust,ignore
//! use nnb_core::{Domain, Flags, Protocol};
//! use nnb_executor::{Bridge, EventLoop};
//!
//! let mut ev = EventLoop::new()?;
//! let bridge = Bridge::with_default_backend(&ev);
//! let s = bridge.open(Domain::Sp, Protocol::Pull)?;
//! bridge.bind(s, "inproc://jobs", |r| println!("bound: {r:?}"))?;
//! let rx = bridge.clone();
//! bridge.poll_recv(s, move |_| {
//!     while let Ok(msg) = rx.recv(s, Flags::DONTWAIT) {
//!         println!("{} bytes", msg.len());
//!     }
//! })?;
//! ev.run()?;
//! ```

pub mod bridge;
pub mod config;
pub mod device;
pub mod event_loop;
pub mod offload;
pub mod poller;

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use event_loop::{EventLoop, LoopHandle};
pub use poller::PollCallback;
