//! Scenario selection and the fixed slot layout.
//!
//! The source set always has two slots: socket at index 0, notification
//! at index 1. A scenario picks the active sub-range `[offset, offset + count)`.

use crate::error::PollError;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

pub const SOCKET_SLOT: usize = 0;
pub const NOTIFICATION_SLOT: usize = 1;
pub const SLOT_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    SocketOnly,
    NotificationOnly,
    SocketAndNotification,
}

impl Scenario {
    /// First active slot.
    pub const fn offset(self) -> usize {
        match self {
            Scenario::SocketOnly => SOCKET_SLOT,
            Scenario::NotificationOnly => NOTIFICATION_SLOT,
            Scenario::SocketAndNotification => SOCKET_SLOT,
        }
    }

    /// Number of active slots (1 or 2).
    pub const fn count(self) -> usize {
        match self {
            Scenario::SocketOnly | Scenario::NotificationOnly => 1,
            Scenario::SocketAndNotification => 2,
        }
    }

    pub const fn active_range(self) -> Range<usize> {
        self.offset()..self.offset() + self.count()
    }

    pub const fn uses_socket(self) -> bool {
        !matches!(self, Scenario::NotificationOnly)
    }

    pub const fn uses_notification(self) -> bool {
        !matches!(self, Scenario::SocketOnly)
    }

    pub fn name(self) -> &'static str {
        match self {
            Scenario::SocketOnly => "socket-only",
            Scenario::NotificationOnly => "notification-only",
            Scenario::SocketAndNotification => "socket-and-notification",
        }
    }

    /// What the scenario is expected to do, for the startup banner.
    pub fn expectation(self) -> &'static str {
        match self {
            Scenario::SocketOnly => "wait for incoming data on the socket",
            Scenario::NotificationOnly => "wait for the counter to be signaled",
            Scenario::SocketAndNotification => {
                "wait for the counter to be signaled or incoming data on the socket"
            }
        }
    }
}

impl FromStr for Scenario {
    type Err = PollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "socket" | "socket-only" | "socket_only" => Ok(Scenario::SocketOnly),
            "notification" | "notification-only" | "eventfd" | "eventfd-only"
            | "eventfd_only" => Ok(Scenario::NotificationOnly),
            "both" | "socket-and-notification" | "socket-and-eventfd"
            | "socket_and_eventfd" => Ok(Scenario::SocketAndNotification),
            other => Err(PollError::InvalidConfig(format!("unknown scenario '{}'", other))),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_ranges() {
        assert_eq!(Scenario::SocketOnly.active_range(), 0..1);
        assert_eq!(Scenario::NotificationOnly.active_range(), 1..2);
        assert_eq!(Scenario::SocketAndNotification.active_range(), 0..2);
    }

    #[test]
    fn test_ranges_fit_slots() {
        for s in [
            Scenario::SocketOnly,
            Scenario::NotificationOnly,
            Scenario::SocketAndNotification,
        ] {
            assert!(s.count() == 1 || s.count() == 2);
            assert!(s.offset() + s.count() <= SLOT_COUNT);
        }
    }

    #[test]
    fn test_uses_sources() {
        assert!(Scenario::SocketOnly.uses_socket());
        assert!(!Scenario::SocketOnly.uses_notification());
        assert!(!Scenario::NotificationOnly.uses_socket());
        assert!(Scenario::SocketAndNotification.uses_notification());
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("socket".parse::<Scenario>().ok(), Some(Scenario::SocketOnly));
        assert_eq!("EVENTFD-ONLY".parse::<Scenario>().ok(), Some(Scenario::NotificationOnly));
        assert_eq!(
            "socket_and_eventfd".parse::<Scenario>().ok(),
            Some(Scenario::SocketAndNotification)
        );
        assert!("neither".parse::<Scenario>().is_err());
    }
}
