//! Library defaults for [`BridgeConfig`](super::BridgeConfig).

/// Apply the catch-all subscription to every new SUB socket.
pub const SUBSCRIBE_ALL: bool = true;

/// Readiness events fetched per `run_once`.
pub const EVENTS_CAPACITY: usize = 256;

/// Offload threads only park in one library call.
pub const WORKER_STACK_SIZE: usize = 256 * 1024;

pub const WORKER_NAME: &str = "nnb-offload";

/// Smallest stack an offload thread is given.
pub const MIN_WORKER_STACK_SIZE: usize = 16 * 1024;
