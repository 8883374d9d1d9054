//! Test doubles: a scripted waiter, an in-memory endpoint and counter.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use udpoll_core::error::{PollError, Result};
use udpoll_core::readiness::Readiness;
use udpoll_core::source::{Counter, DatagramEndpoint, RawHandle};
use udpoll_core::waiter::{PollEntry, WaitTimeout, Waiter};

/// One scripted wait result.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Timeout,
    Errno(i32),
    /// Observed mask per slot index.
    Ready(Vec<(usize, Readiness)>),
}

/// What the loop handed to one wait.
#[derive(Debug, Clone)]
pub(crate) struct WaitCall {
    pub at: Instant,
    pub entries: Vec<(usize, RawHandle)>,
    pub timeout: WaitTimeout,
}

/// Replays `steps` in order, then times out. Optionally raises a shutdown
/// flag once `stop_after` waits have been issued.
pub(crate) struct ScriptedWaiter {
    steps: VecDeque<Step>,
    pub calls: Vec<WaitCall>,
    stop: Option<(Arc<AtomicBool>, usize)>,
}

impl ScriptedWaiter {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
            calls: Vec::new(),
            stop: None,
        }
    }

    pub fn stop_after(mut self, flag: Arc<AtomicBool>, waits: usize) -> Self {
        self.stop = Some((flag, waits));
        self
    }
}

impl Waiter for ScriptedWaiter {
    fn wait(
        &mut self,
        entries: &mut [PollEntry],
        timeout: WaitTimeout,
    ) -> std::result::Result<usize, i32> {
        self.calls.push(WaitCall {
            at: Instant::now(),
            entries: entries.iter().map(|e| (e.slot, e.handle)).collect(),
            timeout,
        });
        if let Some((flag, n)) = &self.stop {
            if self.calls.len() >= *n {
                flag.store(true, Ordering::Relaxed);
            }
        }

        match self.steps.pop_front().unwrap_or(Step::Timeout) {
            Step::Timeout => Ok(0),
            Step::Errno(code) => Err(code),
            Step::Ready(masks) => {
                let mut ready = 0;
                for entry in entries.iter_mut() {
                    if let Some((_, m)) = masks.iter().find(|(slot, _)| *slot == entry.slot) {
                        entry.observed = *m;
                        if !m.is_empty() {
                            ready += 1;
                        }
                    }
                }
                Ok(ready)
            }
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// In-memory datagram endpoint. Clones share state, so a test keeps one
/// clone to inspect while the source set owns another.
pub(crate) struct FakeEndpoint {
    handle: RawHandle,
    queue: Arc<Mutex<VecDeque<Vec<u8>>>>,
    recv_calls: Arc<AtomicUsize>,
    fail_recv: Arc<AtomicI32>,
    closed: Arc<AtomicBool>,
    released: Arc<AtomicBool>,
    owners: Arc<AtomicUsize>,
}

impl FakeEndpoint {
    pub fn new(handle: RawHandle) -> Self {
        Self {
            handle,
            queue: Arc::new(Mutex::new(VecDeque::new())),
            recv_calls: Arc::new(AtomicUsize::new(0)),
            fail_recv: Arc::new(AtomicI32::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
            released: Arc::new(AtomicBool::new(false)),
            owners: Arc::new(AtomicUsize::new(1)),
        }
    }

    pub fn queue_datagram(&self, payload: &[u8]) {
        self.queue.lock().unwrap().push_back(payload.to_vec());
    }

    pub fn recv_calls(&self) -> usize {
        self.recv_calls.load(Ordering::Relaxed)
    }

    /// Make the next receive fail with `errno`.
    pub fn fail_next_recv(&self, errno: i32) {
        self.fail_recv.store(errno, Ordering::Relaxed);
    }

    /// True once the owning clone has been dropped without releasing.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    /// True once the owning clone disowned the handle.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Relaxed)
    }

    /// Live clones, including this one.
    pub fn owners(&self) -> usize {
        self.owners.load(Ordering::Acquire)
    }
}

impl Drop for FakeEndpoint {
    fn drop(&mut self) {
        // Closed once only the inspecting clone remains.
        if self.owners.fetch_sub(1, Ordering::AcqRel) == 2 && !self.is_released() {
            self.closed.store(true, Ordering::Relaxed);
        }
    }
}

impl Clone for FakeEndpoint {
    fn clone(&self) -> Self {
        self.owners.fetch_add(1, Ordering::AcqRel);
        Self {
            handle: self.handle,
            queue: self.queue.clone(),
            recv_calls: self.recv_calls.clone(),
            fail_recv: self.fail_recv.clone(),
            closed: self.closed.clone(),
            released: self.released.clone(),
            owners: self.owners.clone(),
        }
    }
}

impl DatagramEndpoint for FakeEndpoint {
    fn raw_handle(&self) -> RawHandle {
        self.handle
    }

    fn send(&self, payload: &[u8]) -> Result<usize> {
        Ok(payload.len())
    }

    fn recv_truncating(&self, buf: &mut [u8]) -> Result<usize> {
        self.recv_calls.fetch_add(1, Ordering::Relaxed);
        let errno = self.fail_recv.swap(0, Ordering::Relaxed);
        if errno != 0 {
            return Err(PollError::Os(errno));
        }
        match self.queue.lock().unwrap().pop_front() {
            Some(d) => {
                let n = d.len().min(buf.len());
                buf[..n].copy_from_slice(&d[..n]);
                Ok(d.len())
            }
            None => Err(PollError::Os(libc::EAGAIN)),
        }
    }

    fn release_handle(&mut self) {
        self.released.store(true, Ordering::Relaxed);
    }
}

/// Atomic accumulator standing in for an eventfd.
pub(crate) struct FakeCounter {
    handle: RawHandle,
    value: AtomicU64,
    fail_read: AtomicI32,
}

impl FakeCounter {
    pub fn new(handle: RawHandle) -> Self {
        Self {
            handle,
            value: AtomicU64::new(0),
            fail_read: AtomicI32::new(0),
        }
    }

    pub fn fail_next_read(&self, errno: i32) {
        self.fail_read.store(errno, Ordering::Relaxed);
    }
}

impl Counter for FakeCounter {
    fn raw_handle(&self) -> RawHandle {
        self.handle
    }

    fn increment(&self) -> Result<()> {
        self.value.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn read_and_reset(&self) -> Result<u64> {
        let errno = self.fail_read.swap(0, Ordering::Relaxed);
        if errno != 0 {
            return Err(PollError::Os(errno));
        }
        match self.value.swap(0, Ordering::AcqRel) {
            0 => Err(PollError::Os(libc::EAGAIN)),
            v => Ok(v),
        }
    }
}
