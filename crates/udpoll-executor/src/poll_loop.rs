//! The poll loop: wait, dispatch, back off on anything but Ready.
//!
//! ```text
//! loop {
//!     1. shutdown set? → return stats
//!     2. wait_and_dispatch(set)
//!     3. Ready           → next iteration immediately
//!        Timeout / Error → sleep(backoff), next iteration
//! }
//! ```
//!
//! No exponential growth, no retry cap. The backoff sleep is not
//! interrupted by readiness; events arriving during it are picked up by
//! the next wait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::info;

use udpoll_core::outcome::{Observer, WaitOutcome};
use udpoll_core::waiter::Waiter;

use crate::multiplexer::Multiplexer;
use crate::source_set::SourceSet;

/// Counters for one run of the loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Wait rounds issued (including those short-circuited by an empty set).
    pub waits: u64,
    pub ready: u64,
    pub timeouts: u64,
    pub errors: u64,
}

/// Run until `shutdown` is observed before a wait.
pub fn poll_loop<W, O>(
    mux: &mut Multiplexer<W>,
    set: &mut SourceSet,
    observer: &mut O,
    backoff: Duration,
    shutdown: &AtomicBool,
) -> LoopStats
where
    W: Waiter,
    O: Observer + ?Sized,
{
    let mut stats = LoopStats::default();

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        let outcome = mux.wait_and_dispatch(set, observer);
        stats.waits += 1;
        match &outcome {
            WaitOutcome::Ready(_) => stats.ready += 1,
            WaitOutcome::Timeout => stats.timeouts += 1,
            WaitOutcome::Error(_) => stats.errors += 1,
        }

        if outcome.needs_backoff() {
            info!("Sleeping {} ms before the next poll", backoff.as_millis());
            std::thread::sleep(backoff);
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeCounter, FakeEndpoint, ScriptedWaiter, Step};
    use std::sync::Arc;
    use std::time::Instant;
    use udpoll_core::readiness::Readiness;
    use udpoll_core::scenario::{Scenario, NOTIFICATION_SLOT, SOCKET_SLOT};
    use udpoll_core::source::{Counter, SourceKind};
    use udpoll_core::outcome::SourceEvent;
    use udpoll_core::waiter::WaitTimeout;

    fn set_for(scenario: Scenario) -> (SourceSet, FakeEndpoint, Arc<FakeCounter>) {
        let ep = FakeEndpoint::new(11);
        let counter = Arc::new(FakeCounter::new(12));
        let set = SourceSet::new(
            scenario,
            Some(Box::new(ep.clone())),
            Some(counter.clone() as Arc<dyn Counter>),
        )
        .unwrap();
        (set, ep, counter)
    }

    fn run(
        steps: Vec<Step>,
        waits: usize,
        set: &mut SourceSet,
        backoff: Duration,
    ) -> (LoopStats, ScriptedWaiter) {
        let flag = Arc::new(AtomicBool::new(false));
        let waiter = ScriptedWaiter::new(steps).stop_after(flag.clone(), waits);
        let mut mux = Multiplexer::new(waiter, WaitTimeout::Forever);
        let mut obs = |_: SourceKind, _: &SourceEvent| {};
        let stats = poll_loop(&mut mux, set, &mut obs, backoff, &flag);
        (stats, mux.into_waiter())
    }

    #[test]
    fn test_shutdown_before_first_wait() {
        let (mut set, _, _) = set_for(Scenario::SocketOnly);
        let flag = AtomicBool::new(true);
        let mut mux = Multiplexer::new(ScriptedWaiter::new(vec![]), WaitTimeout::Forever);
        let mut obs = |_: SourceKind, _: &SourceEvent| {};
        let stats = poll_loop(&mut mux, &mut set, &mut obs, Duration::from_millis(1), &flag);
        assert_eq!(stats, LoopStats::default());
        assert!(mux.waiter().calls.is_empty());
    }

    #[test]
    fn test_backoff_between_error_and_next_wait() {
        let backoff = Duration::from_millis(60);
        let (mut set, _, _) = set_for(Scenario::SocketAndNotification);
        let steps = vec![Step::Errno(libc::EINVAL), Step::Timeout, Step::Timeout];
        let (stats, waiter) = run(steps, 3, &mut set, backoff);

        assert_eq!(stats.waits, 3);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.timeouts, 2);
        for pair in waiter.calls.windows(2) {
            let gap = pair[1].at.duration_since(pair[0].at);
            assert!(gap >= backoff.mul_f64(0.9), "gap {:?} shorter than backoff", gap);
        }
    }

    #[test]
    fn test_ready_does_not_back_off() {
        let backoff = Duration::from_secs(5);
        let (mut set, _, counter) = set_for(Scenario::NotificationOnly);
        counter.increment().unwrap();
        let ready = Step::Ready(vec![(NOTIFICATION_SLOT, Readiness::READABLE)]);

        let start = Instant::now();
        let (stats, _) = run(vec![ready], 1, &mut set, backoff);
        assert_eq!(stats.ready, 1);
        assert_eq!(stats.errors + stats.timeouts, 0);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_loop_survives_socket_loss() {
        let (mut set, ep, counter) = set_for(Scenario::SocketAndNotification);
        counter.increment().unwrap();
        let steps = vec![
            Step::Ready(vec![
                (SOCKET_SLOT, Readiness::HANGUP),
                (NOTIFICATION_SLOT, Readiness::READABLE),
            ]),
            Step::Timeout,
            Step::Timeout,
            Step::Timeout,
        ];
        let (stats, waiter) = run(steps, 4, &mut set, Duration::from_millis(1));

        assert_eq!(stats.waits, 4);
        assert_eq!(stats.errors, 1);
        assert!(ep.is_closed());
        for call in &waiter.calls[1..] {
            assert_eq!(call.entries, vec![(NOTIFICATION_SLOT, 12)]);
        }
    }

    #[test]
    fn test_socket_only_keeps_retrying_with_no_sources() {
        let (mut set, _, _) = set_for(Scenario::SocketOnly);
        let steps = vec![Step::Ready(vec![(SOCKET_SLOT, Readiness::ERROR)])];
        let mut mux = Multiplexer::new(ScriptedWaiter::new(steps), WaitTimeout::Forever);
        let mut obs = |_: SourceKind, _: &SourceEvent| {};

        for _ in 0..3 {
            assert!(mux.wait_and_dispatch(&mut set, &mut obs).needs_backoff());
        }
        // Only the first round reached the waiter.
        assert_eq!(mux.waiter().calls.len(), 1);
    }
}
