//! Socket option storage for the in-process backend.

use nnb_core::consts::*;
use nnb_core::socket::Protocol;

use super::state::Sock;

/// Socket-level integer options and their defaults.
const SOCKET_INTS: &[(i32, i32)] = &[
    (NN_LINGER, 1000),
    (NN_SNDBUF, 128 * 1024),
    (NN_RCVBUF, 128 * 1024),
    (NN_SNDTIMEO, -1),
    (NN_RCVTIMEO, -1),
    (NN_RECONNECT_IVL, 100),
    (NN_RECONNECT_IVL_MAX, 0),
    (NN_SNDPRIO, 8),
    (NN_RCVPRIO, 8),
    (NN_IPV4ONLY, 1),
    (NN_RCVMAXSIZE, 1024 * 1024),
    (NN_MAXTTL, 8),
];

/// Default of a writable integer option, `None` if `sock` has no such option.
fn int_default(sock: &Sock, level: i32, option: i32) -> Option<i32> {
    match (level, option) {
        (NN_SOL_SOCKET, _) => SOCKET_INTS.iter().find(|(o, _)| *o == option).map(|(_, d)| *d),
        (NN_REQ, NN_REQ_RESEND_IVL) if sock.protocol == Protocol::Req => Some(60_000),
        (NN_SURVEYOR, NN_SURVEYOR_DEADLINE) if sock.protocol == Protocol::Surveyor => Some(1000),
        (NN_TCP, NN_TCP_NODELAY) => Some(0),
        _ => None,
    }
}

/// Current integer value of a writable option.
pub(crate) fn int_value(sock: &Sock, level: i32, option: i32) -> Option<i32> {
    let default = int_default(sock, level, option)?;
    Some(sock.ints.get(&(level, option)).copied().unwrap_or(default))
}

/// Read an option. Errors are errno values.
pub(crate) fn get(sock: &Sock, level: i32, option: i32) -> Result<Vec<u8>, i32> {
    let int = |v: i32| -> Result<Vec<u8>, i32> { Ok(v.to_ne_bytes().to_vec()) };
    match (level, option) {
        (NN_SOL_SOCKET, NN_SNDFD) => sock.snd.raw_fd().map_or(Err(libc::ENOPROTOOPT), int),
        (NN_SOL_SOCKET, NN_RCVFD) => sock.rcv.raw_fd().map_or(Err(libc::ENOPROTOOPT), int),
        (NN_SOL_SOCKET, NN_DOMAIN) => int(sock.domain.raw()),
        (NN_SOL_SOCKET, NN_PROTOCOL) => int(sock.protocol.raw()),
        (NN_SOL_SOCKET, NN_SOCKET_NAME) => Ok(sock.name.as_bytes().to_vec()),
        _ => int_value(sock, level, option).map_or(Err(libc::ENOPROTOOPT), int),
    }
}

/// Write an option. Errors are errno values.
pub(crate) fn set(sock: &mut Sock, level: i32, option: i32, value: &[u8]) -> Result<(), i32> {
    match (level, option) {
        (NN_SOL_SOCKET, NN_SNDFD | NN_RCVFD | NN_DOMAIN | NN_PROTOCOL) => Err(libc::ENOPROTOOPT),
        (NN_SOL_SOCKET, NN_SOCKET_NAME) => {
            if value.len() > NN_SOCKET_NAME_MAX {
                return Err(libc::EINVAL);
            }
            sock.name = String::from_utf8_lossy(value).into_owned();
            Ok(())
        }
        (NN_SUB, NN_SUB_SUBSCRIBE) if sock.protocol == Protocol::Sub => {
            sock.subscriptions.push(value.to_vec());
            Ok(())
        }
        (NN_SUB, NN_SUB_UNSUBSCRIBE) if sock.protocol == Protocol::Sub => {
            let pos = sock.subscriptions.iter().position(|t| t == value).ok_or(libc::EINVAL)?;
            sock.subscriptions.remove(pos);
            Ok(())
        }
        _ => {
            int_default(sock, level, option).ok_or(libc::ENOPROTOOPT)?;
            let bytes: [u8; 4] = value.try_into().map_err(|_| libc::EINVAL)?;
            sock.ints.insert((level, option), i32::from_ne_bytes(bytes));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nnb_core::socket::Domain;
    use pretty_assertions::assert_eq;

    fn sock(protocol: Protocol) -> Sock {
        Sock::new(3, Domain::Sp, protocol, None, None)
    }

    #[test]
    fn defaults_and_overrides() {
        let mut s = sock(Protocol::Pair);
        assert_eq!(int_value(&s, NN_SOL_SOCKET, NN_LINGER), Some(1000));
        set(&mut s, NN_SOL_SOCKET, NN_LINGER, &250i32.to_ne_bytes()).unwrap();
        assert_eq!(get(&s, NN_SOL_SOCKET, NN_LINGER), Ok(250i32.to_ne_bytes().to_vec()));
    }

    #[test]
    fn name_defaults_to_socket_id() {
        let mut s = sock(Protocol::Bus);
        assert_eq!(get(&s, NN_SOL_SOCKET, NN_SOCKET_NAME), Ok(b"3".to_vec()));
        set(&mut s, NN_SOL_SOCKET, NN_SOCKET_NAME, b"bus-a").unwrap();
        assert_eq!(get(&s, NN_SOL_SOCKET, NN_SOCKET_NAME), Ok(b"bus-a".to_vec()));
    }

    #[test]
    fn read_only_and_unknown_options() {
        let mut s = sock(Protocol::Pair);
        assert_eq!(set(&mut s, NN_SOL_SOCKET, NN_PROTOCOL, &1i32.to_ne_bytes()), Err(libc::ENOPROTOOPT));
        assert_eq!(set(&mut s, NN_SOL_SOCKET, 99, &1i32.to_ne_bytes()), Err(libc::ENOPROTOOPT));
        assert_eq!(set(&mut s, NN_SOL_SOCKET, NN_LINGER, &[1, 2]), Err(libc::EINVAL));
        assert_eq!(get(&s, NN_REQ, NN_REQ_RESEND_IVL), Err(libc::ENOPROTOOPT));
    }

    #[test]
    fn subscriptions_are_counted() {
        let mut s = sock(Protocol::Sub);
        set(&mut s, NN_SUB, NN_SUB_SUBSCRIBE, b"a").unwrap();
        set(&mut s, NN_SUB, NN_SUB_SUBSCRIBE, b"a").unwrap();
        set(&mut s, NN_SUB, NN_SUB_UNSUBSCRIBE, b"a").unwrap();
        assert_eq!(s.subscriptions, vec![b"a".to_vec()]);
        set(&mut s, NN_SUB, NN_SUB_UNSUBSCRIBE, b"a").unwrap();
        assert_eq!(set(&mut s, NN_SUB, NN_SUB_UNSUBSCRIBE, b"a"), Err(libc::EINVAL));
    }

    #[test]
    fn missing_wait_handle_is_enoprotoopt() {
        let s = sock(Protocol::Sub);
        assert_eq!(get(&s, NN_SOL_SOCKET, NN_SNDFD), Err(libc::ENOPROTOOPT));
    }
}
