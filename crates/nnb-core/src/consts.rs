//! Well-known constants of the scalability-protocols library.
//!
//! Values match `nn.h` and the protocol headers. The full set is also
//! available at runtime through the reflected [`SymbolTable`](crate::SymbolTable);
//! these are the ones the bridge itself needs plus the common ones callers
//! reach for.

// ── Domains ───────────────────────────────────────────────────────

pub const AF_SP:     i32 = 1;
pub const AF_SP_RAW: i32 = 2;

// ── Protocols (family * 16 + role) ───────────────────────────────

pub const NN_PROTO_PAIR:     i32 = 1;
pub const NN_PROTO_PUBSUB:   i32 = 2;
pub const NN_PROTO_REQREP:   i32 = 3;
pub const NN_PROTO_PIPELINE: i32 = 5;
pub const NN_PROTO_SURVEY:   i32 = 6;
pub const NN_PROTO_BUS:      i32 = 7;

pub const NN_PAIR:       i32 = NN_PROTO_PAIR * 16;
pub const NN_PUB:        i32 = NN_PROTO_PUBSUB * 16;
pub const NN_SUB:        i32 = NN_PROTO_PUBSUB * 16 + 1;
pub const NN_REQ:        i32 = NN_PROTO_REQREP * 16;
pub const NN_REP:        i32 = NN_PROTO_REQREP * 16 + 1;
pub const NN_PUSH:       i32 = NN_PROTO_PIPELINE * 16;
pub const NN_PULL:       i32 = NN_PROTO_PIPELINE * 16 + 1;
pub const NN_SURVEYOR:   i32 = NN_PROTO_SURVEY * 16 + 2;
pub const NN_RESPONDENT: i32 = NN_PROTO_SURVEY * 16 + 3;
pub const NN_BUS:        i32 = NN_PROTO_BUS * 16;

// ── Transports ────────────────────────────────────────────────────

pub const NN_INPROC: i32 = -1;
pub const NN_IPC:    i32 = -2;
pub const NN_TCP:    i32 = -3;
pub const NN_WS:     i32 = -4;

// ── Option levels and socket options ─────────────────────────────

pub const NN_SOL_SOCKET: i32 = 0;

pub const NN_LINGER:            i32 = 1;
pub const NN_SNDBUF:            i32 = 2;
pub const NN_RCVBUF:            i32 = 3;
pub const NN_SNDTIMEO:          i32 = 4;
pub const NN_RCVTIMEO:          i32 = 5;
pub const NN_RECONNECT_IVL:     i32 = 6;
pub const NN_RECONNECT_IVL_MAX: i32 = 7;
pub const NN_SNDPRIO:           i32 = 8;
pub const NN_RCVPRIO:           i32 = 9;
pub const NN_SNDFD:             i32 = 10;
pub const NN_RCVFD:             i32 = 11;
pub const NN_DOMAIN:            i32 = 12;
pub const NN_PROTOCOL:          i32 = 13;
pub const NN_IPV4ONLY:          i32 = 14;
pub const NN_SOCKET_NAME:       i32 = 15;
pub const NN_RCVMAXSIZE:        i32 = 16;
pub const NN_MAXTTL:            i32 = 17;

// Protocol-level options (level = protocol id).
pub const NN_SUB_SUBSCRIBE:     i32 = 1;
pub const NN_SUB_UNSUBSCRIBE:   i32 = 2;
pub const NN_REQ_RESEND_IVL:    i32 = 1;
pub const NN_SURVEYOR_DEADLINE: i32 = 1;

// Transport-level options (level = transport id).
pub const NN_TCP_NODELAY: i32 = 1;

// ── Flags and limits ──────────────────────────────────────────────

pub const NN_DONTWAIT:     i32 = 1;
pub const NN_SOCKADDR_MAX: usize = 128;

/// Longest socket name the library stores (excluding the NUL).
pub const NN_SOCKET_NAME_MAX: usize = 63;

// ── Library-specific errno values ─────────────────────────────────

pub const NN_HAUSNUMERO: i32 = 156_384_712;
pub const ETERM:         i32 = NN_HAUSNUMERO + 53;
pub const EFSM:          i32 = NN_HAUSNUMERO + 54;

// ── Symbol reflection ─────────────────────────────────────────────

pub const NN_NS_NAMESPACE:        i32 = 0;
pub const NN_NS_VERSION:          i32 = 1;
pub const NN_NS_DOMAIN:           i32 = 2;
pub const NN_NS_TRANSPORT:        i32 = 3;
pub const NN_NS_PROTOCOL:         i32 = 4;
pub const NN_NS_OPTION_LEVEL:     i32 = 5;
pub const NN_NS_SOCKET_OPTION:    i32 = 6;
pub const NN_NS_TRANSPORT_OPTION: i32 = 7;
pub const NN_NS_OPTION_TYPE:      i32 = 8;
pub const NN_NS_OPTION_UNIT:      i32 = 9;
pub const NN_NS_FLAG:             i32 = 10;
pub const NN_NS_ERROR:            i32 = 11;
pub const NN_NS_LIMIT:            i32 = 12;

pub const NN_TYPE_NONE: i32 = 0;
pub const NN_TYPE_INT:  i32 = 1;
pub const NN_TYPE_STR:  i32 = 2;

pub const NN_UNIT_NONE:         i32 = 0;
pub const NN_UNIT_BYTES:        i32 = 1;
pub const NN_UNIT_MILLISECONDS: i32 = 2;
pub const NN_UNIT_PRIORITY:     i32 = 3;
pub const NN_UNIT_BOOLEAN:      i32 = 4;

// ── Version ───────────────────────────────────────────────────────

pub const NN_VERSION_CURRENT:  i32 = 5;
pub const NN_VERSION_REVISION: i32 = 1;
pub const NN_VERSION_AGE:      i32 = 0;
