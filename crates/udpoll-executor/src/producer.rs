//! Periodic producer thread
//!
//! A single thread that increments the counter descriptor on a fixed
//! interval, after an initial delay.
//!
//! # Design
//!
//! The producer thread:
//! 1. Parks until the next deadline (or until shutdown unparks it)
//! 2. Takes the next process-wide tick number and logs it
//! 3. Issues exactly one `Counter::increment` (an atomic add in the kernel)
//!
//! Deadlines advance by whole intervals from the start, so a slow tick
//! does not shift later ones. If the thread falls more than one interval
//! behind, it resynchronises instead of firing a burst.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{error, info};

use udpoll_core::error::{PollError, Result};
use udpoll_core::source::Counter;

/// Process-wide tick sequence, starting at 1.
static TICK_SEQ: AtomicU64 = AtomicU64::new(1);

/// Configuration for the producer thread
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Delay before the first tick
    pub initial_delay: Duration,

    /// Interval between ticks
    pub interval: Duration,

    /// Thread name
    /// Default: "udpoll-producer"
    pub thread_name: String,
}

impl ProducerConfig {
    /// Tick every `interval`, first tick one interval after start.
    pub fn every(interval: Duration) -> Self {
        Self {
            initial_delay: interval,
            interval,
            thread_name: "udpoll-producer".into(),
        }
    }
}

/// Statistics from producer thread execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProducerStats {
    /// Ticks whose increment succeeded
    pub ticks: u64,

    /// Ticks whose increment failed
    pub write_errors: u64,
}

/// Handle to a running producer thread
///
/// Dropping the handle stops the thread and waits for it.
pub struct ProducerHandle {
    handle: Option<JoinHandle<ProducerStats>>,
    shutdown: Arc<AtomicBool>,
}

impl ProducerHandle {
    /// Request shutdown and wait for the producer thread to exit
    pub fn shutdown(mut self) -> ProducerStats {
        self.stop()
    }

    /// Request shutdown without waiting
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(h) = &self.handle {
            h.thread().unpark();
        }
    }

    fn stop(&mut self) -> ProducerStats {
        self.request_shutdown();
        match self.handle.take() {
            Some(h) => h.join().unwrap_or_else(|_| {
                error!("producer thread panicked");
                ProducerStats::default()
            }),
            None => ProducerStats::default(),
        }
    }
}

impl Drop for ProducerHandle {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
        }
    }
}

/// Spawn the producer thread
///
/// The counter must already exist: the first tick can fire as soon as
/// `initial_delay` elapses.
pub fn spawn_producer(counter: Arc<dyn Counter>, config: ProducerConfig) -> Result<ProducerHandle> {
    if config.interval.is_zero() {
        return Err(PollError::InvalidConfig("producer interval must be > 0".into()));
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    let handle = thread::Builder::new()
        .name(config.thread_name.clone())
        .spawn(move || producer_loop(counter, shutdown_clone, config))
        .map_err(|e| PollError::Os(e.raw_os_error().unwrap_or(libc::EAGAIN)))?;

    Ok(ProducerHandle {
        handle: Some(handle),
        shutdown,
    })
}

/// Main producer loop
fn producer_loop(
    counter: Arc<dyn Counter>,
    shutdown: Arc<AtomicBool>,
    config: ProducerConfig,
) -> ProducerStats {
    let mut stats = ProducerStats::default();
    let mut next = Instant::now() + config.initial_delay;

    while !shutdown.load(Ordering::Acquire) {
        let now = Instant::now();
        if now < next {
            thread::park_timeout(next - now);
            continue;
        }

        let seq = TICK_SEQ.fetch_add(1, Ordering::Relaxed);
        info!("Writing ({}) to counter handle {}", seq, counter.raw_handle());
        match counter.increment() {
            Ok(()) => stats.ticks += 1,
            Err(e) => {
                error!("Failed to write to counter handle {}: {}", counter.raw_handle(), e);
                stats.write_errors += 1;
            }
        }

        next += config.interval;
        let now = Instant::now();
        if next + config.interval < now {
            next = now + config.interval;
        }
    }

    stats
}
