//! udpoll demo
//!
//! Connects a UDP socket to a remote peer, starts a periodic producer on
//! an eventfd, and polls whichever of the two the scenario selects, from
//! one thread, forever.
//!
//! Usage:
//!     cargo build --release -p udpoll-demo
//!     UDPOLL_REMOTE_IP=127.0.0.1 UDPOLL_SCENARIO=both ./target/release/udpoll-demo
//!
//! Test with:
//!     # Peer: prints the greeting, then type lines to send them back
//!     nc -u -l 5555
//!
//!     # Counter only, fast ticks:
//!     UDPOLL_SCENARIO=eventfd UDPOLL_TICK_MS=1000 ./target/release/udpoll-demo
//!
//!     # Reproduce a platform that cannot poll a socket and a counter together:
//!     UDPOLL_MIXED_KINDS=deny ./target/release/udpoll-demo
//!
//!     # Log filter (env_logger syntax, default info):
//!     UDPOLL_LOG_LEVEL=debug ./target/release/udpoll-demo

use std::sync::atomic::AtomicBool;

use env_logger::{Builder, Env};
use log::error;

use udpoll_executor::PollConfig;

const LOG_LEVEL_VAR: &str = "UDPOLL_LOG_LEVEL";

/// Logger builder filtered by `var`, falling back to info when unset.
fn log_builder(var: &str) -> Builder {
    Builder::from_env(Env::default().filter_or(var, "info"))
}

fn main() {
    log_builder(LOG_LEVEL_VAR).init();

    let config = match PollConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Never set: the loop runs for the life of the process.
    let shutdown = AtomicBool::new(false);

    if let Err(e) = udpoll_executor::run(config, &shutdown) {
        error!("Startup failed: {}", e);
        std::process::exit(1);
    }
}
