//! Error text for library error codes.
//!
//! Platform errno values are described by the C library's table; the two
//! library-specific codes live above `NN_HAUSNUMERO` and get their own text.

use nix::errno::Errno;
use nnb_core::consts::{EFSM, ETERM};

/// Errno values the library reflects through `nn_symbol_info`, in order.
pub static REFLECTED: &[(&str, i32)] = &[
    ("ENOTSUP", libc::ENOTSUP),
    ("EPROTONOSUPPORT", libc::EPROTONOSUPPORT),
    ("ENOBUFS", libc::ENOBUFS),
    ("ENETDOWN", libc::ENETDOWN),
    ("EADDRINUSE", libc::EADDRINUSE),
    ("EADDRNOTAVAIL", libc::EADDRNOTAVAIL),
    ("ECONNREFUSED", libc::ECONNREFUSED),
    ("EINPROGRESS", libc::EINPROGRESS),
    ("ENOTSOCK", libc::ENOTSOCK),
    ("EAFNOSUPPORT", libc::EAFNOSUPPORT),
    ("EPROTO", libc::EPROTO),
    ("EAGAIN", libc::EAGAIN),
    ("EBADF", libc::EBADF),
    ("EINVAL", libc::EINVAL),
    ("EMFILE", libc::EMFILE),
    ("EFAULT", libc::EFAULT),
    ("EACCES", libc::EACCES),
    ("ENETRESET", libc::ENETRESET),
    ("ENETUNREACH", libc::ENETUNREACH),
    ("EHOSTUNREACH", libc::EHOSTUNREACH),
    ("ENOTCONN", libc::ENOTCONN),
    ("EMSGSIZE", libc::EMSGSIZE),
    ("ETIMEDOUT", libc::ETIMEDOUT),
    ("ECONNABORTED", libc::ECONNABORTED),
    ("ECONNRESET", libc::ECONNRESET),
    ("ENOPROTOOPT", libc::ENOPROTOOPT),
    ("EISCONN", libc::EISCONN),
    ("ESOCKTNOSUPPORT", libc::ESOCKTNOSUPPORT),
];

/// Human-readable text for `code`.
pub fn describe(code: i32) -> String {
    match code {
        ETERM => "Nanomsg library was terminated".to_owned(),
        EFSM => "Operation cannot be performed in this state".to_owned(),
        _ => Errno::from_raw(code).desc().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_codes_have_their_own_text() {
        assert_eq!(describe(ETERM), "Nanomsg library was terminated");
        assert!(describe(EFSM).contains("state"));
    }

    #[test]
    fn platform_codes_use_libc_text() {
        assert_eq!(describe(libc::EADDRINUSE), Errno::EADDRINUSE.desc());
        assert!(!describe(libc::EINVAL).is_empty());
    }
}
