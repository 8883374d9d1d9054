//! The single blocking multiplex call.
//!
//! A `Waiter` is the only suspension point of the poll loop. The
//! executor hands it the active entries, in slot order, and reads back
//! the observed masks.
//!
//! # Implementors
//!
//! - `SysPoll` (default): one `poll(2)` call.
//! - Test doubles in `udpoll-executor` that script results.

use crate::readiness::Readiness;
use crate::source::{RawHandle, SourceKind};
use crate::error::PollError;
use std::fmt;
use std::str::FromStr;

/// One active slot as seen by the waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollEntry {
    /// Slot index in the source set.
    pub slot: usize,
    pub kind: SourceKind,
    pub handle: RawHandle,
    /// Requested mask.
    pub interest: Readiness,
    /// Observed mask, written by the waiter.
    pub observed: Readiness,
}

impl PollEntry {
    pub fn new(slot: usize, kind: SourceKind, handle: RawHandle, interest: Readiness) -> Self {
        Self {
            slot,
            kind,
            handle,
            interest,
            observed: Readiness::EMPTY,
        }
    }
}

/// Timeout for one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitTimeout {
    /// Block until a source is ready.
    Forever,
    /// Return immediately.
    NonBlocking,
    /// Block at most this many milliseconds.
    Millis(u32),
}

impl WaitTimeout {
    /// Map the conventional integer form: `-1` forever, `0` non-blocking,
    /// `N > 0` milliseconds. Other negative values are rejected.
    pub fn from_millis(ms: i64) -> Option<Self> {
        match ms {
            -1 => Some(WaitTimeout::Forever),
            0 => Some(WaitTimeout::NonBlocking),
            n if n > 0 && n <= i32::MAX as i64 => Some(WaitTimeout::Millis(n as u32)),
            _ => None,
        }
    }

    /// The integer form accepted by `poll(2)`.
    pub fn as_poll_millis(self) -> i32 {
        match self {
            WaitTimeout::Forever => -1,
            WaitTimeout::NonBlocking => 0,
            WaitTimeout::Millis(n) => n.min(i32::MAX as u32) as i32,
        }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        !matches!(self, WaitTimeout::Forever)
    }
}

impl FromStr for WaitTimeout {
    type Err = PollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("forever") || s.eq_ignore_ascii_case("infinite") {
            return Ok(WaitTimeout::Forever);
        }
        s.parse::<i64>()
            .ok()
            .and_then(WaitTimeout::from_millis)
            .ok_or_else(|| PollError::InvalidConfig(format!("invalid poll timeout '{}'", s)))
    }
}

impl fmt::Display for WaitTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitTimeout::Forever => write!(f, "indefinite (-1)"),
            WaitTimeout::NonBlocking => write!(f, "non-blocking (0)"),
            WaitTimeout::Millis(n) => write!(f, "{} ms", n),
        }
    }
}

/// Issues one blocking wait over a set of entries.
///
/// **Contract:**
/// - Exactly one underlying wait per call.
/// - On `Ok(n)` with `n > 0`, each entry's `observed` field holds the
///   mask reported for it (possibly empty). `Ok(0)` means the timeout
///   elapsed and every `observed` is empty.
/// - On `Err(code)` the code is the platform errno; `observed` fields
///   are unspecified.
pub trait Waiter {
    fn wait(&mut self, entries: &mut [PollEntry], timeout: WaitTimeout) -> Result<usize, i32>;

    /// Backend name for logging.
    fn name(&self) -> &'static str {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_millis() {
        assert_eq!(WaitTimeout::from_millis(-1), Some(WaitTimeout::Forever));
        assert_eq!(WaitTimeout::from_millis(0), Some(WaitTimeout::NonBlocking));
        assert_eq!(WaitTimeout::from_millis(2000), Some(WaitTimeout::Millis(2000)));
        assert_eq!(WaitTimeout::from_millis(-2), None);
        assert_eq!(WaitTimeout::from_millis(i64::MAX), None);
    }

    #[test]
    fn test_poll_millis_roundtrip_values() {
        assert_eq!(WaitTimeout::Forever.as_poll_millis(), -1);
        assert_eq!(WaitTimeout::NonBlocking.as_poll_millis(), 0);
        assert_eq!(WaitTimeout::Millis(250).as_poll_millis(), 250);
        assert!(!WaitTimeout::Forever.is_finite());
        assert!(WaitTimeout::Millis(1).is_finite());
    }

    #[test]
    fn test_parse() {
        assert_eq!("-1".parse::<WaitTimeout>().ok(), Some(WaitTimeout::Forever));
        assert_eq!("forever".parse::<WaitTimeout>().ok(), Some(WaitTimeout::Forever));
        assert_eq!(" 500 ".parse::<WaitTimeout>().ok(), Some(WaitTimeout::Millis(500)));
        assert!("soon".parse::<WaitTimeout>().is_err());
        assert!("-5".parse::<WaitTimeout>().is_err());
    }

    #[test]
    fn test_entry_starts_unobserved() {
        let e = PollEntry::new(1, SourceKind::Notification, 4, Readiness::READABLE);
        assert!(e.observed.is_empty());
        assert_eq!(e.slot, 1);
    }
}
