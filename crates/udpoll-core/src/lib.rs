//! # udpoll-core — Trait definitions for udpoll
//!
//! This crate defines the seams of the single-threaded multiplexer:
//! what a waitable source looks like, how one blocking wait is issued,
//! and how its outcome is classified. It contains no OS-specific code.
//! The Linux implementations live in `udpoll-module`; the loop that ties
//! them together lives in `udpoll-executor`.
//!
//! ## Modules
//!
//! - `readiness` - Requested/observed readiness mask
//! - `source` - Source kinds, the sentinel handle, endpoint and counter traits
//! - `waiter` - The single blocking multiplex call
//! - `scenario` - Which slots are active for a run
//! - `outcome` - Wait outcome and delivered events
//! - `error` - Error taxonomy
//! - `env` - Environment variable utilities

pub mod readiness;
pub mod source;
pub mod waiter;
pub mod scenario;
pub mod outcome;
pub mod error;
pub mod env;

// Re-exports for convenience
pub use readiness::Readiness;
pub use source::{Counter, DatagramEndpoint, Handle, RawHandle, SourceKind};
pub use waiter::{PollEntry, WaitTimeout, Waiter};
pub use scenario::{Scenario, NOTIFICATION_SLOT, SLOT_COUNT, SOCKET_SLOT};
pub use outcome::{Observer, SourceEvent, WaitOutcome};
pub use error::{PollError, Result};
