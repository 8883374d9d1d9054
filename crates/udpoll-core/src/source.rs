//! Waitable sources and the capabilities they are built from.
//!
//! Two kinds of source exist:
//!
//! - **Socket**: a connected datagram endpoint. Readable when a datagram
//!   is queued; may also report error, hangup, or invalid-handle.
//! - **Notification**: a counter-backed descriptor. Writers add to it,
//!   one reader consumes the accumulated total and resets it to zero.
//!
//! The traits here are the capabilities the multiplexer relies on. The
//! Linux implementations are `UdpEndpoint` and `EventFdCounter` in
//! `udpoll-module`.

use crate::error::Result;
use std::fmt;

/// Raw OS handle number (a file descriptor on unix).
pub type RawHandle = i32;

/// Which kind of source occupies a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Socket,
    Notification,
}

impl SourceKind {
    pub fn name(self) -> &'static str {
        match self {
            SourceKind::Socket => "socket",
            SourceKind::Notification => "notification",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Handle held by a slot.
///
/// `Unset` is a dedicated sentinel rather than a magic number so that no
/// numbering scheme can make it look valid. An `Unset` slot is never part
/// of a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Unset,
    Raw(RawHandle),
}

impl Handle {
    #[inline]
    pub fn is_set(self) -> bool {
        matches!(self, Handle::Raw(_))
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handle::Unset => write!(f, "unset"),
            Handle::Raw(h) => write!(f, "{}", h),
        }
    }
}

/// A connected datagram endpoint.
///
/// Dropping the endpoint closes the underlying handle unless
/// `release_handle` was called first.
pub trait DatagramEndpoint: Send {
    /// The handle to include in a wait.
    fn raw_handle(&self) -> RawHandle;

    /// Send one datagram to the connected peer.
    fn send(&self, payload: &[u8]) -> Result<usize>;

    /// Receive one datagram into `buf`.
    ///
    /// Returns the datagram's *true* size, which may exceed `buf.len()`
    /// when the datagram was truncated. Only `min(size, buf.len())` bytes
    /// of `buf` were written.
    fn recv_truncating(&self, buf: &mut [u8]) -> Result<usize>;

    /// Disown the handle without closing it. Dropping the endpoint
    /// afterwards leaves the descriptor number alone.
    fn release_handle(&mut self);
}

/// Accumulating counter descriptor shared between a producer and the
/// multiplexer.
///
/// **Contract:**
/// - `increment()` must NEVER block and must be a single atomic add on
///   the descriptor, never a read followed by a write.
/// - Increments made before `read_and_reset()` are coalesced: one read
///   returns their sum and leaves the counter at zero.
/// - Nothing is lost or counted twice across concurrent increment/read.
pub trait Counter: Send + Sync {
    /// The handle to include in a wait.
    fn raw_handle(&self) -> RawHandle;

    /// Add one to the counter.
    fn increment(&self) -> Result<()>;

    /// Fetch the accumulated value and reset it to zero.
    fn read_and_reset(&self) -> Result<u64>;
}
