//! Symbol reflection.
//!
//! The library can enumerate its own constants (`nn_symbol_info`). The
//! bridge walks that enumeration exactly once and freezes it into a
//! [`SymbolTable`]; nothing mutates it afterwards.

use std::collections::BTreeMap;

use crate::backend::Backend;
use crate::consts::*;

/// One reflected symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolProperties {
    pub name: String,
    pub value: i32,
    /// Namespace (`NN_NS_*`).
    pub ns: i32,
    /// Option type (`NN_TYPE_*`), meaningful for options only.
    pub kind: i32,
    /// Option unit (`NN_UNIT_*`), meaningful for options only.
    pub unit: i32,
}

/// Static description of a symbol, for backends that carry their own catalog.
#[derive(Debug, Clone, Copy)]
pub struct SymbolDef {
    pub name: &'static str,
    pub value: i32,
    pub ns: i32,
    pub kind: i32,
    pub unit: i32,
}

impl SymbolDef {
    const fn plain(name: &'static str, value: i32, ns: i32) -> Self {
        Self { name, value, ns, kind: NN_TYPE_NONE, unit: NN_UNIT_NONE }
    }

    const fn option(name: &'static str, value: i32, ns: i32, kind: i32, unit: i32) -> Self {
        Self { name, value, ns, kind, unit }
    }

    pub fn to_properties(self) -> SymbolProperties {
        SymbolProperties {
            name: self.name.to_owned(),
            value: self.value,
            ns: self.ns,
            kind: self.kind,
            unit: self.unit,
        }
    }
}

/// Library constants in enumeration order, errno values excluded (those
/// are platform-specific and appended by the backend).
pub static CATALOG: &[SymbolDef] = &[
    SymbolDef::plain("NN_NS_NAMESPACE", NN_NS_NAMESPACE, NN_NS_NAMESPACE),
    SymbolDef::plain("NN_NS_VERSION", NN_NS_VERSION, NN_NS_NAMESPACE),
    SymbolDef::plain("NN_NS_DOMAIN", NN_NS_DOMAIN, NN_NS_NAMESPACE),
    SymbolDef::plain("NN_NS_TRANSPORT", NN_NS_TRANSPORT, NN_NS_NAMESPACE),
    SymbolDef::plain("NN_NS_PROTOCOL", NN_NS_PROTOCOL, NN_NS_NAMESPACE),
    SymbolDef::plain("NN_NS_OPTION_LEVEL", NN_NS_OPTION_LEVEL, NN_NS_NAMESPACE),
    SymbolDef::plain("NN_NS_SOCKET_OPTION", NN_NS_SOCKET_OPTION, NN_NS_NAMESPACE),
    SymbolDef::plain("NN_NS_TRANSPORT_OPTION", NN_NS_TRANSPORT_OPTION, NN_NS_NAMESPACE),
    SymbolDef::plain("NN_NS_OPTION_TYPE", NN_NS_OPTION_TYPE, NN_NS_NAMESPACE),
    SymbolDef::plain("NN_NS_OPTION_UNIT", NN_NS_OPTION_UNIT, NN_NS_NAMESPACE),
    SymbolDef::plain("NN_NS_FLAG", NN_NS_FLAG, NN_NS_NAMESPACE),
    SymbolDef::plain("NN_NS_ERROR", NN_NS_ERROR, NN_NS_NAMESPACE),
    SymbolDef::plain("NN_NS_LIMIT", NN_NS_LIMIT, NN_NS_NAMESPACE),
    SymbolDef::plain("NN_VERSION_CURRENT", NN_VERSION_CURRENT, NN_NS_VERSION),
    SymbolDef::plain("NN_VERSION_REVISION", NN_VERSION_REVISION, NN_NS_VERSION),
    SymbolDef::plain("NN_VERSION_AGE", NN_VERSION_AGE, NN_NS_VERSION),
    SymbolDef::plain("AF_SP", AF_SP, NN_NS_DOMAIN),
    SymbolDef::plain("AF_SP_RAW", AF_SP_RAW, NN_NS_DOMAIN),
    SymbolDef::plain("NN_INPROC", NN_INPROC, NN_NS_TRANSPORT),
    SymbolDef::plain("NN_IPC", NN_IPC, NN_NS_TRANSPORT),
    SymbolDef::plain("NN_TCP", NN_TCP, NN_NS_TRANSPORT),
    SymbolDef::plain("NN_WS", NN_WS, NN_NS_TRANSPORT),
    SymbolDef::plain("NN_PAIR", NN_PAIR, NN_NS_PROTOCOL),
    SymbolDef::plain("NN_PUB", NN_PUB, NN_NS_PROTOCOL),
    SymbolDef::plain("NN_SUB", NN_SUB, NN_NS_PROTOCOL),
    SymbolDef::plain("NN_REP", NN_REP, NN_NS_PROTOCOL),
    SymbolDef::plain("NN_REQ", NN_REQ, NN_NS_PROTOCOL),
    SymbolDef::plain("NN_PUSH", NN_PUSH, NN_NS_PROTOCOL),
    SymbolDef::plain("NN_PULL", NN_PULL, NN_NS_PROTOCOL),
    SymbolDef::plain("NN_SURVEYOR", NN_SURVEYOR, NN_NS_PROTOCOL),
    SymbolDef::plain("NN_RESPONDENT", NN_RESPONDENT, NN_NS_PROTOCOL),
    SymbolDef::plain("NN_BUS", NN_BUS, NN_NS_PROTOCOL),
    SymbolDef::plain("NN_SOCKADDR_MAX", NN_SOCKADDR_MAX as i32, NN_NS_LIMIT),
    SymbolDef::plain("NN_SOL_SOCKET", NN_SOL_SOCKET, NN_NS_OPTION_LEVEL),
    SymbolDef::option("NN_LINGER", NN_LINGER, NN_NS_SOCKET_OPTION, NN_TYPE_INT, NN_UNIT_MILLISECONDS),
    SymbolDef::option("NN_SNDBUF", NN_SNDBUF, NN_NS_SOCKET_OPTION, NN_TYPE_INT, NN_UNIT_BYTES),
    SymbolDef::option("NN_RCVBUF", NN_RCVBUF, NN_NS_SOCKET_OPTION, NN_TYPE_INT, NN_UNIT_BYTES),
    SymbolDef::option("NN_RCVMAXSIZE", NN_RCVMAXSIZE, NN_NS_SOCKET_OPTION, NN_TYPE_INT, NN_UNIT_BYTES),
    SymbolDef::option("NN_SNDTIMEO", NN_SNDTIMEO, NN_NS_SOCKET_OPTION, NN_TYPE_INT, NN_UNIT_MILLISECONDS),
    SymbolDef::option("NN_RCVTIMEO", NN_RCVTIMEO, NN_NS_SOCKET_OPTION, NN_TYPE_INT, NN_UNIT_MILLISECONDS),
    SymbolDef::option("NN_RECONNECT_IVL", NN_RECONNECT_IVL, NN_NS_SOCKET_OPTION, NN_TYPE_INT, NN_UNIT_MILLISECONDS),
    SymbolDef::option("NN_RECONNECT_IVL_MAX", NN_RECONNECT_IVL_MAX, NN_NS_SOCKET_OPTION, NN_TYPE_INT, NN_UNIT_MILLISECONDS),
    SymbolDef::option("NN_SNDPRIO", NN_SNDPRIO, NN_NS_SOCKET_OPTION, NN_TYPE_INT, NN_UNIT_PRIORITY),
    SymbolDef::option("NN_RCVPRIO", NN_RCVPRIO, NN_NS_SOCKET_OPTION, NN_TYPE_INT, NN_UNIT_PRIORITY),
    SymbolDef::option("NN_SNDFD", NN_SNDFD, NN_NS_SOCKET_OPTION, NN_TYPE_INT, NN_UNIT_NONE),
    SymbolDef::option("NN_RCVFD", NN_RCVFD, NN_NS_SOCKET_OPTION, NN_TYPE_INT, NN_UNIT_NONE),
    SymbolDef::option("NN_DOMAIN", NN_DOMAIN, NN_NS_SOCKET_OPTION, NN_TYPE_INT, NN_UNIT_NONE),
    SymbolDef::option("NN_PROTOCOL", NN_PROTOCOL, NN_NS_SOCKET_OPTION, NN_TYPE_INT, NN_UNIT_NONE),
    SymbolDef::option("NN_IPV4ONLY", NN_IPV4ONLY, NN_NS_SOCKET_OPTION, NN_TYPE_INT, NN_UNIT_BOOLEAN),
    SymbolDef::option("NN_SOCKET_NAME", NN_SOCKET_NAME, NN_NS_SOCKET_OPTION, NN_TYPE_STR, NN_UNIT_NONE),
    SymbolDef::option("NN_MAXTTL", NN_MAXTTL, NN_NS_SOCKET_OPTION, NN_TYPE_INT, NN_UNIT_NONE),
    SymbolDef::option("NN_SUB_SUBSCRIBE", NN_SUB_SUBSCRIBE, NN_NS_TRANSPORT_OPTION, NN_TYPE_STR, NN_UNIT_NONE),
    SymbolDef::option("NN_SUB_UNSUBSCRIBE", NN_SUB_UNSUBSCRIBE, NN_NS_TRANSPORT_OPTION, NN_TYPE_STR, NN_UNIT_NONE),
    SymbolDef::option("NN_REQ_RESEND_IVL", NN_REQ_RESEND_IVL, NN_NS_TRANSPORT_OPTION, NN_TYPE_INT, NN_UNIT_MILLISECONDS),
    SymbolDef::option("NN_SURVEYOR_DEADLINE", NN_SURVEYOR_DEADLINE, NN_NS_TRANSPORT_OPTION, NN_TYPE_INT, NN_UNIT_MILLISECONDS),
    SymbolDef::option("NN_TCP_NODELAY", NN_TCP_NODELAY, NN_NS_TRANSPORT_OPTION, NN_TYPE_INT, NN_UNIT_BOOLEAN),
    SymbolDef::plain("NN_TYPE_NONE", NN_TYPE_NONE, NN_NS_OPTION_TYPE),
    SymbolDef::plain("NN_TYPE_INT", NN_TYPE_INT, NN_NS_OPTION_TYPE),
    SymbolDef::plain("NN_TYPE_STR", NN_TYPE_STR, NN_NS_OPTION_TYPE),
    SymbolDef::plain("NN_UNIT_NONE", NN_UNIT_NONE, NN_NS_OPTION_UNIT),
    SymbolDef::plain("NN_UNIT_BYTES", NN_UNIT_BYTES, NN_NS_OPTION_UNIT),
    SymbolDef::plain("NN_UNIT_MILLISECONDS", NN_UNIT_MILLISECONDS, NN_NS_OPTION_UNIT),
    SymbolDef::plain("NN_UNIT_PRIORITY", NN_UNIT_PRIORITY, NN_NS_OPTION_UNIT),
    SymbolDef::plain("NN_UNIT_BOOLEAN", NN_UNIT_BOOLEAN, NN_NS_OPTION_UNIT),
    SymbolDef::plain("NN_DONTWAIT", NN_DONTWAIT, NN_NS_FLAG),
    SymbolDef::plain("ETERM", ETERM, NN_NS_ERROR),
    SymbolDef::plain("EFSM", EFSM, NN_NS_ERROR),
];

/// Immutable name → value view of everything the library reflects.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: Vec<SymbolProperties>,
    by_name: BTreeMap<String, i32>,
}

impl SymbolTable {
    /// Walk `symbol_info(0..)` until the library reports the end.
    pub fn load<B: Backend + ?Sized>(backend: &B) -> Self {
        let mut entries = Vec::new();
        let mut index = 0;
        while let Some(props) = backend.symbol_info(index) {
            entries.push(props);
            index += 1;
        }
        Self::from_entries(entries)
    }

    pub fn from_entries(entries: Vec<SymbolProperties>) -> Self {
        let by_name = entries
            .iter()
            .map(|p| (p.name.clone(), p.value))
            .collect();
        Self { entries, by_name }
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<i32> {
        self.by_name.get(name).copied()
    }

    /// Symbols in enumeration order.
    pub fn entries(&self) -> &[SymbolProperties] {
        &self.entries
    }

    /// Symbols of one namespace (`NN_NS_*`), in enumeration order.
    pub fn in_namespace(&self, ns: i32) -> impl Iterator<Item = &SymbolProperties> {
        self.entries.iter().filter(move |p| p.ns == ns)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
