//! Bridge configuration
//!
//! Provides compile-time defaults with runtime environment overrides.
//!
//! # Configuration Priority (highest wins)
//!
//! 1. Builder calls
//! 2. Environment variables (runtime)
//! 3. Library defaults
//!
//! # Example
//!
//! ```rust,ignore
//! use nnb_executor::config::BridgeConfig;
//!
//! let config = BridgeConfig::from_env()
//!     .subscribe_all(false)
//!     .events_capacity(64);
//! ```

pub mod defaults;

use nnb_core::env::{env_get, env_get_bool};

/// Event loop and bridge configuration with builder pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Subscribe new SUB sockets to every topic
    pub subscribe_all: bool,
    /// `mio::Events` capacity
    pub events_capacity: usize,
    /// Stack size of offload threads
    pub worker_stack_size: usize,
    /// Thread-name prefix of offload threads
    pub worker_name: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl BridgeConfig {
    /// Create config from compile-time defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `NNB_SUBSCRIBE_ALL` - catch-all SUB subscription on open (0/1)
    /// - `NNB_EVENTS_CAPACITY` - readiness events per loop turn
    /// - `NNB_WORKER_STACK_SIZE` - offload thread stack size in bytes
    /// - `NNB_WORKER_NAME` - offload thread-name prefix
    pub fn from_env() -> Self {
        Self {
            subscribe_all: env_get_bool("NNB_SUBSCRIBE_ALL", defaults::SUBSCRIBE_ALL),
            events_capacity: env_get("NNB_EVENTS_CAPACITY", defaults::EVENTS_CAPACITY),
            worker_stack_size: env_get("NNB_WORKER_STACK_SIZE", defaults::WORKER_STACK_SIZE),
            worker_name: env_get("NNB_WORKER_NAME", defaults::WORKER_NAME.to_owned()),
        }
    }

    /// Create config with explicit defaults (no env override).
    pub fn new() -> Self {
        Self {
            subscribe_all: defaults::SUBSCRIBE_ALL,
            events_capacity: defaults::EVENTS_CAPACITY,
            worker_stack_size: defaults::WORKER_STACK_SIZE,
            worker_name: defaults::WORKER_NAME.to_owned(),
        }
    }

    // Builder methods

    pub fn subscribe_all(mut self, enable: bool) -> Self {
        self.subscribe_all = enable;
        self
    }

    pub fn events_capacity(mut self, n: usize) -> Self {
        self.events_capacity = n;
        self
    }

    pub fn worker_stack_size(mut self, size: usize) -> Self {
        self.worker_stack_size = size;
        self
    }

    pub fn worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.events_capacity == 0 {
            return Err("events_capacity must be at least 1");
        }
        if self.worker_stack_size < defaults::MIN_WORKER_STACK_SIZE {
            return Err("worker_stack_size is below the minimum");
        }
        if self.worker_name.is_empty() {
            return Err("worker_name must not be empty");
        }
        if self.worker_name.contains('\0') {
            return Err("worker_name must not contain NUL");
        }
        Ok(())
    }
}
