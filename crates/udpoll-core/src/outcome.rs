//! Wait outcome and the events delivered to an observer.

use crate::error::PollError;
use crate::readiness::Readiness;
use crate::scenario::SLOT_COUNT;
use crate::source::SourceKind;

/// Result of one wait-and-dispatch round.
///
/// Produced once per wait, consumed by the loop, then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The timeout elapsed with no source ready.
    Timeout,
    /// The wait failed, or a slot handler failed during dispatch.
    Error(PollError),
    /// At least one source was ready and every handler succeeded.
    /// Indexed by slot; inactive slots are empty.
    Ready([Readiness; SLOT_COUNT]),
}

impl WaitOutcome {
    /// Whether the loop backs off after this outcome.
    #[inline]
    pub fn needs_backoff(&self) -> bool {
        !matches!(self, WaitOutcome::Ready(_))
    }
}

/// Something a handler drained from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// One whole datagram, exactly as many bytes as were received.
    Datagram(Vec<u8>),
    /// The counter value fetched by one read-and-reset.
    Notification(u64),
}

/// Receives drained events, in dispatch order.
pub trait Observer {
    fn on_event(&mut self, kind: SourceKind, event: &SourceEvent);
}

impl<F> Observer for F
where
    F: FnMut(SourceKind, &SourceEvent),
{
    fn on_event(&mut self, kind: SourceKind, event: &SourceEvent) {
        (self)(kind, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_classification() {
        assert!(WaitOutcome::Timeout.needs_backoff());
        assert!(WaitOutcome::Error(PollError::ConnectionReset).needs_backoff());
        assert!(!WaitOutcome::Ready([Readiness::READABLE, Readiness::EMPTY]).needs_backoff());
    }

    #[test]
    fn test_closure_observer() {
        let mut seen = Vec::new();
        {
            let mut obs = |kind: SourceKind, ev: &SourceEvent| seen.push((kind, ev.clone()));
            obs.on_event(SourceKind::Notification, &SourceEvent::Notification(3));
        }
        assert_eq!(seen, vec![(SourceKind::Notification, SourceEvent::Notification(3))]);
    }
}
