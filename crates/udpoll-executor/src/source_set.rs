//! Source set: two fixed slots and the scenario's active sub-range.
//!
//! ```text
//!   slot 0            slot 1
//! ┌──────────────┬────────────────────┐
//! │ SocketSource │ NotificationSource │
//! └──────────────┴────────────────────┘
//!   [offset, offset + count) chosen once by the Scenario
//! ```
//!
//! Slots outside the active range hold an `Unset` handle and exist only to
//! keep indices stable. A socket slot that hits an unrecoverable condition
//! becomes `Unset` for the rest of the process and is never polled again.

use std::sync::Arc;

use log::{debug, warn};

use udpoll_core::error::{PollError, Result};
use udpoll_core::outcome::SourceEvent;
use udpoll_core::readiness::Readiness;
use udpoll_core::scenario::{Scenario, NOTIFICATION_SLOT, SLOT_COUNT, SOCKET_SLOT};
use udpoll_core::source::{Counter, DatagramEndpoint, Handle, SourceKind};
use udpoll_core::waiter::PollEntry;

/// Receive buffer capacity. Larger datagrams are discarded.
pub const RX_BUF_SIZE: usize = 256;

/// Slot 0: the connected datagram endpoint.
pub struct SocketSource {
    endpoint: Option<Box<dyn DatagramEndpoint>>,
    rx_buf: [u8; RX_BUF_SIZE],
}

impl SocketSource {
    pub fn new(endpoint: Box<dyn DatagramEndpoint>) -> Self {
        Self {
            endpoint: Some(endpoint),
            rx_buf: [0u8; RX_BUF_SIZE],
        }
    }

    pub fn unset() -> Self {
        Self {
            endpoint: None,
            rx_buf: [0u8; RX_BUF_SIZE],
        }
    }

    pub fn handle(&self) -> Handle {
        match &self.endpoint {
            Some(ep) => Handle::Raw(ep.raw_handle()),
            None => Handle::Unset,
        }
    }

    /// Close the endpoint and unset the slot.
    fn close(&mut self) {
        // Dropping the endpoint closes its handle.
        self.endpoint = None;
    }

    /// Unset the slot without closing: the handle is already invalid and
    /// its number may since belong to something else.
    fn release(&mut self) {
        if let Some(mut ep) = self.endpoint.take() {
            ep.release_handle();
        }
    }

    /// Map the condition bits of `observed` to the error that retires the slot.
    fn failure(observed: Readiness) -> Option<PollError> {
        if observed.contains(Readiness::INVALID) {
            Some(PollError::InvalidDescriptor)
        } else if observed.contains(Readiness::ERROR) {
            Some(PollError::ConnectionAborted)
        } else if observed.contains(Readiness::HANGUP) {
            Some(PollError::ConnectionReset)
        } else {
            None
        }
    }

    /// Classify one observed mask and drain at most one datagram.
    pub fn on_ready(&mut self, observed: Readiness) -> Result<Option<SourceEvent>> {
        if self.endpoint.is_none() {
            return Err(PollError::InvalidDescriptor);
        }

        if observed.contains(Readiness::READABLE) {
            debug!("Received socket event: {:?}", observed);
        }

        if let Some(e) = Self::failure(observed) {
            if e.closes_socket() {
                self.close();
            } else {
                self.release();
            }
            return Err(e);
        }
        if !observed.contains(Readiness::READABLE) {
            return Ok(None);
        }

        let ep = match &self.endpoint {
            Some(ep) => ep,
            None => return Err(PollError::InvalidDescriptor),
        };
        self.rx_buf.fill(0);
        let size = ep.recv_truncating(&mut self.rx_buf)?;
        if size > RX_BUF_SIZE {
            return Err(PollError::BufferTooSmall {
                size,
                capacity: RX_BUF_SIZE,
            });
        }
        Ok(Some(SourceEvent::Datagram(self.rx_buf[..size].to_vec())))
    }
}

/// Slot 1: the counter descriptor fed by the periodic producer.
pub struct NotificationSource {
    counter: Option<Arc<dyn Counter>>,
}

impl NotificationSource {
    pub fn new(counter: Arc<dyn Counter>) -> Self {
        Self { counter: Some(counter) }
    }

    pub fn unset() -> Self {
        Self { counter: None }
    }

    pub fn handle(&self) -> Handle {
        match &self.counter {
            Some(c) => Handle::Raw(c.raw_handle()),
            None => Handle::Unset,
        }
    }

    /// Drain the accumulated count. A failed read leaves the slot usable.
    pub fn on_ready(&mut self, observed: Readiness) -> Result<Option<SourceEvent>> {
        let counter = match &self.counter {
            Some(c) => c,
            None => return Err(PollError::InvalidDescriptor),
        };
        if !observed.contains(Readiness::READABLE) {
            return Ok(None);
        }
        let value = counter.read_and_reset()?;
        Ok(Some(SourceEvent::Notification(value)))
    }
}

/// A tagged source occupying one slot.
pub enum Source {
    Socket(SocketSource),
    Notification(NotificationSource),
}

impl Source {
    pub fn kind(&self) -> SourceKind {
        match self {
            Source::Socket(_) => SourceKind::Socket,
            Source::Notification(_) => SourceKind::Notification,
        }
    }

    pub fn handle(&self) -> Handle {
        match self {
            Source::Socket(s) => s.handle(),
            Source::Notification(n) => n.handle(),
        }
    }

    /// Requested mask. Both kinds only ask for readability; error and
    /// hangup are always reported by the wait.
    pub fn interest(&self) -> Readiness {
        Readiness::READABLE
    }

    pub fn on_ready(&mut self, observed: Readiness) -> Result<Option<SourceEvent>> {
        match self {
            Source::Socket(s) => s.on_ready(observed),
            Source::Notification(n) => n.on_ready(observed),
        }
    }
}

pub struct SourceSet {
    slots: [Source; SLOT_COUNT],
    scenario: Scenario,
}

impl SourceSet {
    /// Build the set for `scenario`.
    ///
    /// Every active slot must be supplied. A source supplied for a slot the
    /// scenario excludes is dropped and the slot stays `Unset`.
    pub fn new(
        scenario: Scenario,
        endpoint: Option<Box<dyn DatagramEndpoint>>,
        counter: Option<Arc<dyn Counter>>,
    ) -> Result<Self> {
        let socket = match (scenario.uses_socket(), endpoint) {
            (true, Some(ep)) => SocketSource::new(ep),
            (true, None) => {
                return Err(PollError::InvalidConfig(format!(
                    "scenario {} needs a connected socket",
                    scenario
                )))
            }
            (false, Some(_)) => {
                debug!("scenario {} excludes the socket; dropping it", scenario);
                SocketSource::unset()
            }
            (false, None) => SocketSource::unset(),
        };

        let notification = match (scenario.uses_notification(), counter) {
            (true, Some(c)) => NotificationSource::new(c),
            (true, None) => {
                return Err(PollError::InvalidConfig(format!(
                    "scenario {} needs a counter descriptor",
                    scenario
                )))
            }
            (false, _) => NotificationSource::unset(),
        };

        Ok(Self {
            slots: [Source::Socket(socket), Source::Notification(notification)],
            scenario,
        })
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    pub fn slot_mut(&mut self, index: usize) -> &mut Source {
        &mut self.slots[index]
    }

    pub fn socket_handle(&self) -> Handle {
        self.slots[SOCKET_SLOT].handle()
    }

    pub fn notification_handle(&self) -> Handle {
        self.slots[NOTIFICATION_SLOT].handle()
    }

    /// Fill `out` with one entry per active, set slot, in slot order.
    pub fn fill_entries(&self, out: &mut Vec<PollEntry>) {
        out.clear();
        for index in self.scenario.active_range() {
            let source = &self.slots[index];
            match source.handle() {
                Handle::Raw(h) => {
                    out.push(PollEntry::new(index, source.kind(), h, source.interest()))
                }
                Handle::Unset => {}
            }
        }
    }

    pub(crate) fn warn_if_socket_unset(&self) {
        if self.scenario.uses_socket() && !self.socket_handle().is_set() {
            warn!("socket slot is unset; it will not be polled again");
        }
    }
}
