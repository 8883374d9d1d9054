//! # udpoll-executor — The Poll Loop
//!
//! Ties the core seams to their default implementations and runs the
//! single-threaded loop:
//!
//! ```text
//! loop {
//!     1. Check the shutdown flag
//!     2. Collect the active, set slots (socket before notification)
//!     3. One blocking wait over their handles
//!     4. Timeout / Error → log, sleep a fixed backoff
//!        Ready           → drain each ready slot, hand events to the observer
//! }
//! ```
//!
//! A periodic producer thread increments the counter concurrently. It
//! never touches the loop's state; the kernel counter is the only thing
//! shared between the two.
//!
//! The loop is generic over `Waiter` and `Observer`. Swap either and the
//! loop does not change.

pub mod source_set;
pub mod multiplexer;
pub mod poll_loop;
pub mod producer;
pub mod connection;
pub mod config;
pub mod app;

#[cfg(test)]
pub(crate) mod testing;

pub use app::{run, App};
pub use config::PollConfig;
pub use connection::ConnectionManager;
pub use multiplexer::{LogObserver, Multiplexer};
pub use poll_loop::{poll_loop, LoopStats};
pub use producer::{spawn_producer, ProducerConfig, ProducerHandle, ProducerStats};
pub use source_set::{Source, SourceSet, RX_BUF_SIZE};
