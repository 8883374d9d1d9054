//! Multiplexer: one wait, then dispatch in slot order.
//!
//! ```text
//! wait_and_dispatch(set)
//!   1. Collect active, set slots → entries (socket first)
//!   2. Waiter::wait(entries, timeout)        ← sole suspension point
//!   3. 0 / ETIMEDOUT → Timeout
//!      EINVAL        → Error(InvalidArgument)
//!      other errno   → Error(Os)
//!   4. For each entry with a non-empty mask: slot handler → observer
//!   5. First handler error (if any) → Error, else Ready(masks)
//! ```
//!
//! Every active slot with a non-empty mask is dispatched before any
//! handler error is reported, so a socket hangup never hides a counter
//! value delivered in the same wake.

use log::{error, info, warn};

use udpoll_core::error::PollError;
use udpoll_core::outcome::{Observer, SourceEvent, WaitOutcome};
use udpoll_core::readiness::Readiness;
use udpoll_core::scenario::SLOT_COUNT;
use udpoll_core::source::{RawHandle, SourceKind};
use udpoll_core::waiter::{PollEntry, WaitTimeout, Waiter};
use udpoll_module::errno_desc;

use crate::source_set::SourceSet;

pub struct Multiplexer<W: Waiter> {
    waiter: W,
    timeout: WaitTimeout,
    entries: Vec<PollEntry>,
}

impl<W: Waiter> Multiplexer<W> {
    pub fn new(waiter: W, timeout: WaitTimeout) -> Self {
        Self {
            waiter,
            timeout,
            entries: Vec::with_capacity(SLOT_COUNT),
        }
    }

    pub fn timeout(&self) -> WaitTimeout {
        self.timeout
    }

    pub fn waiter(&self) -> &W {
        &self.waiter
    }

    pub fn into_waiter(self) -> W {
        self.waiter
    }

    /// Issue exactly one wait over the active set and dispatch what it reports.
    pub fn wait_and_dispatch<O>(&mut self, set: &mut SourceSet, observer: &mut O) -> WaitOutcome
    where
        O: Observer + ?Sized,
    {
        set.fill_entries(&mut self.entries);
        if self.entries.is_empty() {
            error!("Poll error: no active sources left to wait on");
            return WaitOutcome::Error(PollError::NoActiveSources);
        }

        let ready = match self.waiter.wait(&mut self.entries, self.timeout) {
            Ok(0) => return self.timed_out(),
            Ok(n) => n,
            Err(code) => return self.classify_errno(code),
        };

        let mut masks = [Readiness::EMPTY; SLOT_COUNT];
        let mut first_err: Option<PollError> = None;

        for entry in &self.entries {
            masks[entry.slot] = entry.observed;
            if entry.observed.is_empty() {
                continue;
            }
            match set.slot_mut(entry.slot).on_ready(entry.observed) {
                Ok(Some(event)) => observer.on_event(entry.kind, &event),
                Ok(None) => {}
                Err(e) => {
                    log_slot_error(entry.kind, entry.handle, &e);
                    first_err.get_or_insert(e);
                }
            }
        }

        match first_err {
            Some(e) => {
                set.warn_if_socket_unset();
                WaitOutcome::Error(e)
            }
            None => {
                log::trace!("{} ready of {} via {}", ready, self.entries.len(), self.waiter.name());
                WaitOutcome::Ready(masks)
            }
        }
    }

    fn timed_out(&self) -> WaitOutcome {
        if self.timeout.is_finite() {
            warn!("Poll timed out after {}", self.timeout);
        } else {
            error!("Poll error: unexpectedly timed out with an indefinite timeout");
        }
        WaitOutcome::Timeout
    }

    fn classify_errno(&self, code: i32) -> WaitOutcome {
        match code {
            libc::ETIMEDOUT => self.timed_out(),
            libc::EINVAL => {
                let sources = self.entries.len();
                error!(
                    "Poll error: invalid argument. {} event sources; is every handle connected and ready?",
                    sources
                );
                WaitOutcome::Error(PollError::InvalidArgument { sources })
            }
            _ => {
                error!("Poll error: {} ({})", code, errno_desc(code));
                WaitOutcome::Error(PollError::Os(code))
            }
        }
    }
}

fn log_slot_error(kind: SourceKind, handle: RawHandle, e: &PollError) {
    match e.os_code() {
        Some(code) => error!("{} handle {}: {} ({})", kind, handle, e, errno_desc(code)),
        None => error!("{} handle {}: {}", kind, handle, e),
    }
}

/// Observer that reports every delivered event through the log.
#[derive(Debug, Default)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn on_event(&mut self, _kind: SourceKind, event: &SourceEvent) {
        match event {
            SourceEvent::Datagram(bytes) => info!("Received: {}", printable(bytes)),
            SourceEvent::Notification(value) => info!("Received eventfd event, value: {}", value),
        }
    }
}

/// Datagram text up to the first NUL, lossily decoded.
pub fn printable(bytes: &[u8]) -> std::borrow::Cow<'_, str> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end])
}
