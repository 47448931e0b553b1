//! Endpoint address parsing.
//!
//! Addresses take the form `transport://rest`. Two endpoints rendezvous
//! when they produce the same key: `inproc` and `ipc` match on the full
//! address, `tcp` and `ws` on transport and port (every host is local).

use std::net::IpAddr;

use nnb_core::consts::NN_SOCKADDR_MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Bind,
    Connect,
}

/// Validate `addr` and return its rendezvous key, or the errno to report.
pub fn endpoint_key(addr: &str, role: Role) -> Result<String, i32> {
    if addr.len() >= NN_SOCKADDR_MAX {
        return Err(libc::ENAMETOOLONG);
    }
    let (scheme, rest) = addr.split_once("://").ok_or(libc::EINVAL)?;
    match scheme {
        "inproc" => Ok(format!("inproc://{rest}")),
        "ipc" => {
            if rest.is_empty() {
                return Err(libc::EINVAL);
            }
            Ok(format!("ipc://{rest}"))
        }
        "tcp" | "ws" => {
            let port = host_port(rest, role)?;
            Ok(format!("{scheme}:{port}"))
        }
        _ => Err(libc::EPROTONOSUPPORT),
    }
}

fn host_port(rest: &str, role: Role) -> Result<u16, i32> {
    // ws addresses may carry a resource path after the port.
    let authority = rest.split('/').next().unwrap_or(rest);
    // Connect addresses may name a local interface: `iface;host:port`.
    let authority = match role {
        Role::Connect => authority.rsplit(';').next().unwrap_or(authority),
        Role::Bind => authority,
    };
    let (host, port) = authority.rsplit_once(':').ok_or(libc::EINVAL)?;
    let port: u16 = port.parse().map_err(|_| libc::EINVAL)?;
    if port == 0 || host.is_empty() {
        return Err(libc::EINVAL);
    }
    if role == Role::Bind && !is_local_interface(host) {
        return Err(libc::ENODEV);
    }
    Ok(port)
}

fn is_local_interface(host: &str) -> bool {
    let literal = host.trim_start_matches('[').trim_end_matches(']');
    host == "*" || host == "lo" || literal.parse::<IpAddr>().is_ok()
}
