//! `NanomsgBackend` — the `Backend` trait over the system `libnanomsg`.
//!
//! Every method is one FFI call. Strings crossing into C are checked for
//! interior NULs first; such a failure never reaches the library, so it is
//! recorded in a local errno that `errno()` reports until the next call.

use std::cell::Cell;
use std::ffi::{CStr, CString};
use std::mem::MaybeUninit;
use std::ptr;

use libc::{c_char, c_int, c_void, size_t};
use nnb_core::backend::Backend;
use nnb_core::symbol::SymbolProperties;
use tracing::warn;

mod sys {
    use super::*;

    #[repr(C)]
    #[allow(non_camel_case_types)]
    pub struct nn_symbol_properties {
        pub value: c_int,
        pub name: *const c_char,
        pub ns: c_int,
        pub type_: c_int,
        pub unit: c_int,
    }

    /// Zero-copy length marker: the library allocates the message.
    pub const NN_MSG: size_t = size_t::MAX;

    #[link(name = "nanomsg")]
    extern "C" {
        pub fn nn_errno() -> c_int;
        pub fn nn_strerror(errnum: c_int) -> *const c_char;
        pub fn nn_symbol_info(i: c_int, buf: *mut nn_symbol_properties, buflen: c_int) -> c_int;
        pub fn nn_term();
        pub fn nn_freemsg(msg: *mut c_void) -> c_int;
        pub fn nn_socket(domain: c_int, protocol: c_int) -> c_int;
        pub fn nn_close(s: c_int) -> c_int;
        pub fn nn_setsockopt(
            s: c_int,
            level: c_int,
            option: c_int,
            optval: *const c_void,
            optvallen: size_t,
        ) -> c_int;
        pub fn nn_getsockopt(
            s: c_int,
            level: c_int,
            option: c_int,
            optval: *mut c_void,
            optvallen: *mut size_t,
        ) -> c_int;
        pub fn nn_bind(s: c_int, addr: *const c_char) -> c_int;
        pub fn nn_connect(s: c_int, addr: *const c_char) -> c_int;
        pub fn nn_shutdown(s: c_int, how: c_int) -> c_int;
        pub fn nn_send(s: c_int, buf: *const c_void, len: size_t, flags: c_int) -> c_int;
        pub fn nn_recv(s: c_int, buf: *mut c_void, len: size_t, flags: c_int) -> c_int;
        pub fn nn_device(s1: c_int, s2: c_int) -> c_int;
    }
}

thread_local! {
    static SHIM_ERROR: Cell<i32> = const { Cell::new(0) };
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NanomsgBackend;

impl NanomsgBackend {
    pub fn new() -> Self {
        Self
    }

    /// Run one library call with the local errno cleared.
    #[inline]
    fn call(f: impl FnOnce() -> c_int) -> i32 {
        SHIM_ERROR.with(|e| e.set(0));
        f()
    }

    fn with_addr(addr: &str, f: impl FnOnce(*const c_char) -> c_int) -> i32 {
        match CString::new(addr) {
            Ok(c) => Self::call(|| f(c.as_ptr())),
            Err(_) => {
                SHIM_ERROR.with(|e| e.set(libc::EINVAL));
                -1
            }
        }
    }
}

impl Backend for NanomsgBackend {
    fn socket(&self, domain: i32, protocol: i32) -> i32 {
        Self::call(|| unsafe { sys::nn_socket(domain, protocol) })
    }

    fn close(&self, s: i32) -> i32 {
        Self::call(|| unsafe { sys::nn_close(s) })
    }

    fn setsockopt(&self, s: i32, level: i32, option: i32, value: &[u8]) -> i32 {
        Self::call(|| unsafe {
            sys::nn_setsockopt(s, level, option, value.as_ptr() as *const c_void, value.len())
        })
    }

    fn getsockopt(&self, s: i32, level: i32, option: i32, buf: &mut [u8], len: &mut usize) -> i32 {
        let mut sz: size_t = buf.len();
        let rc = Self::call(|| unsafe {
            sys::nn_getsockopt(s, level, option, buf.as_mut_ptr() as *mut c_void, &mut sz)
        });
        *len = sz;
        rc
    }

    fn bind(&self, s: i32, addr: &str) -> i32 {
        Self::with_addr(addr, |a| unsafe { sys::nn_bind(s, a) })
    }

    fn connect(&self, s: i32, addr: &str) -> i32 {
        Self::with_addr(addr, |a| unsafe { sys::nn_connect(s, a) })
    }

    fn shutdown(&self, s: i32, endpoint: i32) -> i32 {
        Self::call(|| unsafe { sys::nn_shutdown(s, endpoint) })
    }

    fn send(&self, s: i32, buf: &[u8], flags: i32) -> i32 {
        Self::call(|| unsafe { sys::nn_send(s, buf.as_ptr() as *const c_void, buf.len(), flags) })
    }

    fn recv(&self, s: i32, out: &mut Vec<u8>, flags: i32) -> i32 {
        let mut msg: *mut c_void = ptr::null_mut();
        let n = Self::call(|| unsafe {
            sys::nn_recv(s, &mut msg as *mut *mut c_void as *mut c_void, sys::NN_MSG, flags)
        });
        if n >= 0 && !msg.is_null() {
            out.clear();
            out.extend_from_slice(unsafe { std::slice::from_raw_parts(msg as *const u8, n as usize) });
            unsafe {
                sys::nn_freemsg(msg);
            }
        }
        n
    }

    fn device(&self, s1: i32, s2: i32) -> i32 {
        Self::call(|| unsafe { sys::nn_device(s1, s2) })
    }

    fn symbol_info(&self, index: i32) -> Option<SymbolProperties> {
        let mut props = MaybeUninit::<sys::nn_symbol_properties>::zeroed();
        let size = std::mem::size_of::<sys::nn_symbol_properties>() as c_int;
        let rc = unsafe { sys::nn_symbol_info(index, props.as_mut_ptr(), size) };
        if rc < 0 {
            let code = self.errno();
            warn!(index, code, error = %self.strerror(code), "symbol lookup failed");
            return None;
        }
        if rc == 0 {
            return None;
        }
        let props = unsafe { props.assume_init() };
        if props.name.is_null() {
            return None;
        }
        let name = unsafe { CStr::from_ptr(props.name) }.to_string_lossy().into_owned();
        Some(SymbolProperties {
            name,
            value: props.value,
            ns: props.ns,
            kind: props.type_,
            unit: props.unit,
        })
    }

    fn errno(&self) -> i32 {
        match SHIM_ERROR.with(Cell::get) {
            0 => unsafe { sys::nn_errno() },
            code => code,
        }
    }

    fn strerror(&self, code: i32) -> String {
        let text = unsafe { sys::nn_strerror(code) };
        if text.is_null() {
            return crate::errno::describe(code);
        }
        unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned()
    }

    fn term(&self) {
        unsafe { sys::nn_term() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_walk_ends_without_an_error() {
        let b = NanomsgBackend;
        let first = b.symbol_info(0).unwrap();
        assert!(!first.name.is_empty());
        assert!(b.symbol_info(-1).is_none());
        let count = (0..).take_while(|&i| b.symbol_info(i).is_some()).count();
        assert!(count > 0);
        assert!(b.symbol_info(count as i32).is_none());
    }
}
