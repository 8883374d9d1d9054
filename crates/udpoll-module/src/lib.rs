//! # udpoll-module — Default (Linux) implementations
//!
//! This crate provides the default implementation for every udpoll
//! capability trait. Each impl is a thin, direct wrapper over the
//! corresponding syscall.
//!
//! ## Default stack
//!
//! | Trait              | Default Impl     | Syscalls                         |
//! |--------------------|------------------|----------------------------------|
//! | Counter            | EventFdCounter   | eventfd, write(1), read          |
//! | DatagramEndpoint   | UdpEndpoint      | socket, connect, send, recv      |
//! | Waiter             | SysPoll          | poll                             |

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        pub mod eventfd_counter;
        pub mod udp_endpoint;
        pub mod sys_poll;

        pub use eventfd_counter::EventFdCounter;
        pub use udp_endpoint::UdpEndpoint;
        pub use sys_poll::{MixedKinds, SysPoll};
    } else {
        compile_error!("udpoll-module currently supports Linux only (eventfd)");
    }
}

use nix::errno::Errno;

/// errno of the last failed libc call on this thread.
#[inline]
pub(crate) fn last_errno() -> i32 {
    Errno::last() as i32
}

/// Human-readable description of an errno, for log lines.
pub fn errno_desc(code: i32) -> &'static str {
    Errno::from_raw(code).desc()
}
