//! Environment variable utilities
//!
//! Strict parsing: unset gives the default but a malformed value is an
//! `InvalidConfig` error, so a typo stops startup instead of silently
//! changing behaviour. The lookup is a closure so configuration can be
//! loaded from a table in tests.
//!
//! # Usage
//!
//! ```ignore
//! use udpoll_core::env::parse_with;
//!
//! let port: u16 = parse_with(&|k: &str| std::env::var(k).ok(), "UDPOLL_PORT", 5555)?;
//! ```

use crate::error::{PollError, Result};
use std::str::FromStr;

/// Parse `key` through `lookup`: default when unset, error when malformed.
///
/// `lookup` returns the raw value for a key, or `None` when unset.
pub fn parse_with<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| PollError::InvalidConfig(format!("{}={:?} is malformed", key, raw))),
    }
}

// ============================================================================
// Tests
// ============================================================================
