//! Bridge error taxonomy.
//!
//! | Variant         | Raised when                                              |
//! |-----------------|----------------------------------------------------------|
//! | `Argument`      | a value has the wrong shape; nothing was attempted        |
//! | `Library`       | the messaging library returned a failure code             |
//! | `Resource`      | a poll registration is unknown or already released        |
//! | `Configuration` | a device was asked to run with no socket at all           |
//! | `EventLoop`     | the host event loop failed (poll/register/wake)           |
//! | `Spawn`         | an offload worker thread could not be created             |
//!
//! Offloaded work never raises: its failures are `NnError` values delivered
//! through the completion sink.

use std::borrow::Cow;
use std::io;

use crate::poll::PollId;

/// A failure reported by the messaging library: errno plus its text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{description}")]
pub struct NnError {
    code: i32,
    description: Cow<'static, str>,
}

impl NnError {
    pub fn new(code: i32, description: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }

    /// The platform (or library-specific) errno value.
    #[inline]
    pub fn code(&self) -> i32 {
        self.code
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Poll-registration lifecycle errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    #[error("poll registration {0} is not active")]
    InvalidHandle(PollId),
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("invalid argument: {0}")]
    Argument(String),

    #[error(transparent)]
    Library(#[from] NnError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("invalid arguments: a device needs at least one socket")]
    Configuration,

    #[error("event loop: {0}")]
    EventLoop(#[from] io::Error),

    #[error("failed to spawn offload worker: {0}")]
    Spawn(#[source] io::Error),
}

impl BridgeError {
    /// The library errno, when this is a library failure.
    pub fn library_code(&self) -> Option<i32> {
        match self {
            BridgeError::Library(e) => Some(e.code()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_error_displays_description_only() {
        let e = BridgeError::from(NnError::new(98, "Address already in use"));
        assert_eq!(e.to_string(), "Address already in use");
        assert_eq!(e.library_code(), Some(98));
    }

    #[test]
    fn nn_error_is_a_std_error_showing_its_text() {
        let e = NnError::new(156_384_766, "Operation cannot be performed in this state");
        let dynamic: &dyn std::error::Error = &e;
        assert_eq!(dynamic.to_string(), "Operation cannot be performed in this state");
        assert!(dynamic.source().is_none());
    }

    #[test]
    fn non_library_errors_have_no_code() {
        assert_eq!(BridgeError::Configuration.library_code(), None);
        let stale = PollId::new(3, 1);
        let e = BridgeError::from(ResourceError::InvalidHandle(stale));
        assert_eq!(e.to_string(), "poll registration 3.1 is not active");
    }
}
