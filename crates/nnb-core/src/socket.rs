//! Socket-level value types: handles, endpoints, domains, protocols.

use std::fmt;

use crate::consts::*;
use crate::error::BridgeError;

/// Library socket descriptor.
///
/// Owned by the caller and valid until closed. The bridge never keeps one
/// alive on its own; poll registrations only snapshot the wait-handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketHandle(i32);

impl SocketHandle {
    /// Sentinel the library's device call uses for "no socket".
    pub const ABSENT_RAW: i32 = -1;

    #[inline]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Raw value of an optional handle, `-1` when absent.
    #[inline]
    pub fn raw_or_absent(handle: Option<SocketHandle>) -> i32 {
        handle.map_or(Self::ABSENT_RAW, SocketHandle::raw)
    }
}

impl fmt::Display for SocketHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sock#{}", self.0)
    }
}

/// Endpoint id returned by bind/connect, needed for shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointId(i32);

impl EndpointId {
    #[inline]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ep#{}", self.0)
    }
}

/// Socket domain. Raw sockets skip the protocol state machine and are the
/// only kind a device accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Sp,
    SpRaw,
}

impl Domain {
    pub const fn raw(self) -> i32 {
        match self {
            Domain::Sp => AF_SP,
            Domain::SpRaw => AF_SP_RAW,
        }
    }
}

impl TryFrom<i32> for Domain {
    type Error = BridgeError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            AF_SP => Ok(Domain::Sp),
            AF_SP_RAW => Ok(Domain::SpRaw),
            other => Err(BridgeError::Argument(format!("unknown socket domain {other}"))),
        }
    }
}

/// Messaging pattern of a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Pair,
    Pub,
    Sub,
    Req,
    Rep,
    Push,
    Pull,
    Surveyor,
    Respondent,
    Bus,
}

impl Protocol {
    pub const ALL: [Protocol; 10] = [
        Protocol::Pair,
        Protocol::Pub,
        Protocol::Sub,
        Protocol::Req,
        Protocol::Rep,
        Protocol::Push,
        Protocol::Pull,
        Protocol::Surveyor,
        Protocol::Respondent,
        Protocol::Bus,
    ];

    pub const fn raw(self) -> i32 {
        match self {
            Protocol::Pair => NN_PAIR,
            Protocol::Pub => NN_PUB,
            Protocol::Sub => NN_SUB,
            Protocol::Req => NN_REQ,
            Protocol::Rep => NN_REP,
            Protocol::Push => NN_PUSH,
            Protocol::Pull => NN_PULL,
            Protocol::Surveyor => NN_SURVEYOR,
            Protocol::Respondent => NN_RESPONDENT,
            Protocol::Bus => NN_BUS,
        }
    }

    /// The protocol a socket of this kind talks to.
    pub const fn peer(self) -> Protocol {
        match self {
            Protocol::Pair => Protocol::Pair,
            Protocol::Pub => Protocol::Sub,
            Protocol::Sub => Protocol::Pub,
            Protocol::Req => Protocol::Rep,
            Protocol::Rep => Protocol::Req,
            Protocol::Push => Protocol::Pull,
            Protocol::Pull => Protocol::Push,
            Protocol::Surveyor => Protocol::Respondent,
            Protocol::Respondent => Protocol::Surveyor,
            Protocol::Bus => Protocol::Bus,
        }
    }

    #[inline]
    pub fn is_peer_of(self, other: Protocol) -> bool {
        self.peer() == other
    }

    /// Whether the pattern allows sending at all (SUB and PULL are receive-only).
    pub const fn can_send(self) -> bool {
        !matches!(self, Protocol::Sub | Protocol::Pull)
    }

    /// Whether the pattern allows receiving at all (PUB and PUSH are send-only).
    pub const fn can_recv(self) -> bool {
        !matches!(self, Protocol::Pub | Protocol::Push)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Protocol::Pair => "pair",
            Protocol::Pub => "pub",
            Protocol::Sub => "sub",
            Protocol::Req => "req",
            Protocol::Rep => "rep",
            Protocol::Push => "push",
            Protocol::Pull => "pull",
            Protocol::Surveyor => "surveyor",
            Protocol::Respondent => "respondent",
            Protocol::Bus => "bus",
        }
    }
}

impl TryFrom<i32> for Protocol {
    type Error = BridgeError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        Protocol::ALL
            .into_iter()
            .find(|p| p.raw() == raw)
            .ok_or_else(|| BridgeError::Argument(format!("unknown protocol {raw}")))
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Readiness direction a poll registration watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// A non-blocking send is expected to succeed.
    Send,
    /// A non-blocking receive is expected to succeed.
    Recv,
}

impl Direction {
    /// The socket option that yields this direction's wait-handle.
    pub const fn fd_option(self) -> i32 {
        match self {
            Direction::Send => NN_SNDFD,
            Direction::Recv => NN_RCVFD,
        }
    }
}

/// Send/recv flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags(i32);

impl Flags {
    pub const NONE: Flags = Flags(0);
    pub const DONTWAIT: Flags = Flags(NN_DONTWAIT);

    #[inline]
    pub const fn bits(self) -> i32 {
        self.0
    }

    #[inline]
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn is_dontwait(self) -> bool {
        self.0 & NN_DONTWAIT != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_ids_match_headers() {
        assert_eq!(Protocol::Pair.raw(), 16);
        assert_eq!(Protocol::Sub.raw(), 33);
        assert_eq!(Protocol::Pull.raw(), 81);
        assert_eq!(Protocol::Surveyor.raw(), 98);
        assert_eq!(Protocol::Respondent.raw(), 99);
        assert_eq!(Protocol::Bus.raw(), 112);
    }

    #[test]
    fn peers_are_symmetric() {
        for p in Protocol::ALL {
            assert!(p.peer().is_peer_of(p), "{p} <-> {}", p.peer());
        }
    }

    #[test]
    fn unknown_ids_are_argument_errors() {
        assert!(matches!(Protocol::try_from(7), Err(BridgeError::Argument(_))));
        assert!(matches!(Domain::try_from(3), Err(BridgeError::Argument(_))));
        assert_eq!(Protocol::try_from(NN_REP).ok(), Some(Protocol::Rep));
    }

    #[test]
    fn absent_handle_maps_to_sentinel() {
        assert_eq!(SocketHandle::raw_or_absent(None), -1);
        assert_eq!(SocketHandle::raw_or_absent(Some(SocketHandle::from_raw(4))), 4);
    }
}
