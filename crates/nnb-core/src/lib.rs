//! # nnb-core — Trait definitions for nnb
//!
//! nnb bridges a blocking scalability-protocols socket library (nanomsg's
//! `nn_*` API) onto a single-threaded event loop. This crate holds the
//! platform-agnostic pieces every other crate builds on:
//!
//! - [`backend::Backend`] — the seam to the messaging library. It keeps the
//!   library's C calling convention (non-negative = success, negative =
//!   failure, per-thread errno) so every implementation is a thin shim.
//! - [`option`] — the option codec (typed host values ↔ option byte buffers).
//! - [`symbol`] — reflected constant table, materialized once.
//! - [`error`] — the bridge error taxonomy.
//! - [`consts`] — well-known library constants.
//!
//! ## Design principle
//!
//! > "Program to the interface. Start safe. Optimize with a new impl,
//! >  not by modifying the existing one."
//!
//! The executor depends on `Backend`, never on a concrete library. Tests run
//! against the in-process `MemoryBackend`; production links `libnanomsg`.

pub mod backend;
pub mod consts;
pub mod env;
pub mod error;
pub mod option;
pub mod poll;
pub mod socket;
pub mod symbol;

pub use backend::Backend;
pub use error::{BridgeError, NnError, Result};
pub use option::{OptionKind, OptionValue};
pub use poll::{EventMask, PollId};
pub use socket::{Direction, Domain, EndpointId, Flags, Protocol, SocketHandle};
pub use symbol::{SymbolProperties, SymbolTable};
