//! `EventFd` — level-style wait-handle backed by a Linux eventfd.
//!
//! The in-process backend hands one of these out per socket direction as
//! its `NN_SNDFD`/`NN_RCVFD`. While the direction is ready the counter is
//! non-zero and the fd polls readable; [`EventFd::drain`] clears it.
//! Repeated `notify()` calls coalesce (eventfd counter semantics).

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};

pub struct EventFd {
    fd: RawFd,
}

impl EventFd {
    /// Create a new non-blocking, close-on-exec eventfd.
    ///
    /// The `EventFd` OWNS the fd and closes it on Drop.
    pub fn create() -> io::Result<Self> {
        let fd = unsafe { libc::eventfd(0, libc::EFD_NONBLOCK | libc::EFD_CLOEXEC) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { fd })
    }

    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// Make the fd poll readable.
    pub fn notify(&self) -> io::Result<()> {
        let val: u64 = 1;
        let ret = unsafe {
            libc::write(
                self.fd,
                &val as *const u64 as *const libc::c_void,
                std::mem::size_of::<u64>(),
            )
        };
        if ret < 0 {
            let err = io::Error::last_os_error();
            // Counter saturated: a signal is already pending.
            if err.kind() == io::ErrorKind::WouldBlock {
                return Ok(());
            }
            return Err(err);
        }
        Ok(())
    }

    /// Reset the counter. Returns the value read, `0` if it was already clear.
    pub fn drain(&self) -> io::Result<u64> {
        let mut val: u64 = 0;
        let ret = unsafe {
            libc::read(
                self.fd,
                &mut val as *mut u64 as *mut libc::c_void,
                std::mem::size_of::<u64>(),
            )
        };
        if ret < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::WouldBlock {
                return Ok(0);
            }
            return Err(err);
        }
        Ok(val)
    }
}

impl AsRawFd for EventFd {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for EventFd {
    fn drop(&mut self) {
        if self.fd >= 0 {
            unsafe {
                libc::close(self.fd);
            }
            self.fd = -1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_coalesces_and_drain_clears() {
        let efd = EventFd::create().unwrap();
        assert_eq!(efd.drain().unwrap(), 0);
        efd.notify().unwrap();
        efd.notify().unwrap();
        assert_eq!(efd.drain().unwrap(), 2);
        assert_eq!(efd.drain().unwrap(), 0);
    }

    #[test]
    fn fd_is_valid_while_alive() {
        let efd = EventFd::create().unwrap();
        let fd = efd.as_raw_fd();
        assert!(fd >= 0);
        assert_ne!(unsafe { libc::fcntl(fd, libc::F_GETFD) }, -1);
    }
}
