//! Poll registration identity and event masks.

use std::fmt;

/// Stable id of a poll registration: arena index plus generation.
///
/// The generation changes every time an index is reused, so an id from a
/// stopped registration never aliases a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PollId {
    index: u32,
    generation: u32,
}

impl PollId {
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for PollId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.index, self.generation)
    }
}

/// Event bits passed to a readiness callback.
///
/// Only `READABLE` is ever set: the wait-handle turning readable is how the
/// library says "the watched direction is ready".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMask(u32);

impl EventMask {
    pub const EMPTY: EventMask = EventMask(0);
    pub const READABLE: EventMask = EventMask(1);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_readable(self) -> bool {
        self.0 & Self::READABLE.0 != 0
    }
}
