//! `EventFdCounter`: default `Counter` implementation.
//!
//! An eventfd is the accumulator: `write(1)` is an atomic add done by the
//! kernel, and a plain `read` (no `EFD_SEMAPHORE`) returns the total and
//! resets it to zero in the same step. No userspace lock is involved, so
//! the producer thread and the poll loop never contend.

use udpoll_core::error::{PollError, Result};
use udpoll_core::source::{Counter, RawHandle};

use std::os::unix::io::RawFd;

use crate::last_errno;

pub struct EventFdCounter {
    fd: RawFd,
}

impl EventFdCounter {
    /// Create a new eventfd with value zero.
    ///
    /// Non-blocking: a read racing an earlier read that already drained
    /// the counter fails with EAGAIN instead of stalling the poll loop.
    pub fn create() -> Result<Self> {
        let fd = unsafe { libc::eventfd(0, libc::EFD_NONBLOCK | libc::EFD_CLOEXEC) };
        if fd < 0 {
            return Err(PollError::Os(last_errno()));
        }
        Ok(Self { fd })
    }

    pub fn fd(&self) -> RawFd {
        self.fd
    }
}

impl Counter for EventFdCounter {
    fn raw_handle(&self) -> RawHandle {
        self.fd
    }

    fn increment(&self) -> Result<()> {
        let val: u64 = 1;
        let ret = unsafe {
            libc::write(
                self.fd,
                &val as *const u64 as *const libc::c_void,
                std::mem::size_of::<u64>(),
            )
        };
        if ret < 0 {
            let errno = last_errno();
            // EAGAIN: the counter is at its maximum, so a wakeup is
            // already pending for the reader.
            if errno == libc::EAGAIN {
                return Ok(());
            }
            return Err(PollError::Os(errno));
        }
        Ok(())
    }

    fn read_and_reset(&self) -> Result<u64> {
        let mut val: u64 = 0;
        let ret = unsafe {
            libc::read(
                self.fd,
                &mut val as *mut u64 as *mut libc::c_void,
                std::mem::size_of::<u64>(),
            )
        };
        if ret < 0 {
            return Err(PollError::Os(last_errno()));
        }
        if ret as usize != std::mem::size_of::<u64>() {
            return Err(PollError::Os(libc::EIO));
        }
        Ok(val)
    }
}

impl Drop for EventFdCounter {
    fn drop(&mut self) {
        if self.fd >= 0 {
            let _ = nix::unistd::close(self.fd);
            self.fd = -1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_accumulates_between_reads() {
        let c = EventFdCounter::create().unwrap();
        c.increment().unwrap();
        c.increment().unwrap();
        c.increment().unwrap();
        assert_eq!(c.read_and_reset().unwrap(), 3);
    }

    #[test]
    fn test_read_resets_to_zero() {
        let c = EventFdCounter::create().unwrap();
        c.increment().unwrap();
        assert_eq!(c.read_and_reset().unwrap(), 1);
        // Drained: a second read would block, so non-blocking mode reports EAGAIN.
        assert_eq!(c.read_and_reset(), Err(PollError::Os(libc::EAGAIN)));
        c.increment().unwrap();
        assert_eq!(c.read_and_reset().unwrap(), 1);
    }

    #[test]
    fn test_concurrent_increments_never_lost() {
        const TICKS: u64 = 10_000;
        let c = Arc::new(EventFdCounter::create().unwrap());

        let producer = {
            let c = Arc::clone(&c);
            thread::spawn(move || {
                for _ in 0..TICKS {
                    c.increment().unwrap();
                }
            })
        };

        let mut total = 0u64;
        let mut reads = 0u64;
        while total < TICKS {
            match c.read_and_reset() {
                Ok(v) => {
                    assert!(v > 0);
                    total += v;
                    reads += 1;
                }
                Err(PollError::Os(e)) if e == libc::EAGAIN => thread::yield_now(),
                Err(e) => panic!("unexpected read error: {}", e),
            }
        }
        producer.join().unwrap();

        assert_eq!(total, TICKS);
        assert!(reads >= 1);
        assert_eq!(c.read_and_reset(), Err(PollError::Os(libc::EAGAIN)));
    }

    #[test]
    fn test_handle_is_the_fd() {
        let c = EventFdCounter::create().unwrap();
        assert!(c.fd() >= 0);
        assert_eq!(c.raw_handle(), c.fd());
    }
}
