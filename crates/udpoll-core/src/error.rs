//! udpoll error types.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    /// The wait rejected its arguments (EINVAL). Commonly caused by an
    /// unready or not-yet-connected handle, or by a platform that cannot
    /// combine the active handle kinds in one wait.
    InvalidArgument { sources: usize },
    /// The socket handle is not open.
    InvalidDescriptor,
    /// Error condition on the socket; the socket has been closed.
    ConnectionAborted,
    /// Peer hung up; the socket has been closed.
    ConnectionReset,
    /// Datagram larger than the receive buffer; discarded.
    BufferTooSmall { size: usize, capacity: usize },
    /// Remote address could not be parsed.
    Address(String),
    /// Socket creation failed.
    SocketCreate(i32),
    /// Connecting the socket failed.
    Connect(i32),
    /// Every active slot is unset; nothing to wait on.
    NoActiveSources,
    /// Malformed configuration.
    InvalidConfig(String),
    /// OS error with errno.
    Os(i32),
}

impl PollError {
    /// Errors after which the socket endpoint is closed. `InvalidDescriptor`
    /// also retires the slot, but releases the handle instead of closing it.
    #[inline]
    pub fn closes_socket(&self) -> bool {
        matches!(self, Self::ConnectionAborted | Self::ConnectionReset)
    }

    /// Errors that abort startup when raised before the loop begins.
    #[inline]
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            Self::Address(_)
                | Self::SocketCreate(_)
                | Self::Connect(_)
                | Self::NoActiveSources
                | Self::InvalidConfig(_)
        )
    }

    /// Underlying errno, where the error carries one.
    pub fn os_code(&self) -> Option<i32> {
        match self {
            Self::SocketCreate(e) | Self::Connect(e) | Self::Os(e) => Some(*e),
            _ => None,
        }
    }
}

impl fmt::Display for PollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { sources } => write!(
                f,
                "invalid argument ({} event sources); is every handle connected and ready?",
                sources
            ),
            Self::InvalidDescriptor => write!(f, "invalid socket descriptor"),
            Self::ConnectionAborted => write!(f, "socket error condition, connection aborted"),
            Self::ConnectionReset => write!(f, "socket hangup, connection reset"),
            Self::BufferTooSmall { size, capacity } => write!(
                f,
                "buffer size insufficient: datagram of {} bytes, buffer holds {}",
                size, capacity
            ),
            Self::Address(a) => write!(f, "invalid remote address '{}'", a),
            Self::SocketCreate(e) => write!(f, "socket create: errno {}", e),
            Self::Connect(e) => write!(f, "connect: errno {}", e),
            Self::NoActiveSources => write!(f, "no active event sources"),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            Self::Os(e) => write!(f, "OS error: errno {}", e),
        }
    }
}

impl std::error::Error for PollError {}

pub type Result<T> = std::result::Result<T, PollError>;
