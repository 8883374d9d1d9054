//! Readiness mask shared by requested interest and observed events.
//!
//! The bit layout is our own, not the platform's `POLL*` values; the
//! waiter implementation translates in both directions.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Readiness(u8);

impl Readiness {
    pub const EMPTY: Self = Self(0);
    /// Data can be read without blocking.
    pub const READABLE: Self = Self(1 << 0);
    /// Error condition pending on the handle.
    pub const ERROR: Self = Self(1 << 1);
    /// Peer hung up.
    pub const HANGUP: Self = Self(1 << 2);
    /// Handle is not open.
    pub const INVALID: Self = Self(1 << 3);

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0 && other.0 != 0
    }
}

impl BitOr for Readiness {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Readiness {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "EMPTY");
        }
        let names = [
            (Self::READABLE, "READABLE"),
            (Self::ERROR, "ERROR"),
            (Self::HANGUP, "HANGUP"),
            (Self::INVALID, "INVALID"),
        ];
        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    write!(f, " | ")?;
                }
                write!(f, "{}", name)?;
                first = false;
            }
        }
        Ok(())
    }
}
