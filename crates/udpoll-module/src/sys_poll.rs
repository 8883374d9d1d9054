//! `SysPoll`: default `Waiter` implementation over `poll(2)`.
//!
//! Translates `PollEntry` interest into `pollfd.events`, issues one
//! `poll`, and translates `revents` back into observed readiness.
//!
//! Some platforms refuse to poll a socket and a counter descriptor in the
//! same call and fail with EINVAL. Linux accepts it. `MixedKinds` makes
//! that legality a configuration decision: probe the running platform,
//! assume it is legal, or reject mixed sets the way a constrained
//! platform would.

use udpoll_core::readiness::Readiness;
use udpoll_core::source::{Counter, SourceKind};
use udpoll_core::waiter::{PollEntry, WaitTimeout, Waiter};
use udpoll_core::error::{PollError, Result};

use std::str::FromStr;

use crate::eventfd_counter::EventFdCounter;
use crate::last_errno;

/// Policy for waiting on a socket and a counter in the same call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixedKinds {
    /// Ask the platform once at construction.
    Probe,
    /// Always pass mixed sets to the platform.
    Allow,
    /// Fail mixed sets with EINVAL without calling the platform.
    Deny,
}

impl FromStr for MixedKinds {
    type Err = PollError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "probe" | "auto" => Ok(MixedKinds::Probe),
            "allow" => Ok(MixedKinds::Allow),
            "deny" => Ok(MixedKinds::Deny),
            other => Err(PollError::InvalidConfig(format!(
                "unknown mixed-kinds policy '{}'",
                other
            ))),
        }
    }
}

pub struct SysPoll {
    fds: Vec<libc::pollfd>,
    mixed_allowed: bool,
}

impl SysPoll {
    /// Build a poller for the given policy. `Probe` issues one
    /// zero-timeout poll over throwaway descriptors.
    pub fn new(policy: MixedKinds) -> Self {
        let mixed_allowed = match policy {
            MixedKinds::Allow => true,
            MixedKinds::Deny => false,
            MixedKinds::Probe => match Self::probe_mixed_kinds() {
                Ok(allowed) => allowed,
                Err(e) => {
                    log::warn!("mixed-kind probe failed ({}); assuming allowed", e);
                    true
                }
            },
        };
        Self {
            fds: Vec::with_capacity(udpoll_core::SLOT_COUNT),
            mixed_allowed,
        }
    }

    /// Whether this poller passes mixed socket + counter sets to the platform.
    pub fn mixed_allowed(&self) -> bool {
        self.mixed_allowed
    }

    /// Poll a fresh eventfd and a fresh UDP socket together, zero timeout.
    ///
    /// Returns `Ok(false)` only when the platform answers EINVAL.
    pub fn probe_mixed_kinds() -> Result<bool> {
        let counter = EventFdCounter::create()?;
        let sock = unsafe {
            libc::socket(libc::AF_INET, libc::SOCK_DGRAM | libc::SOCK_CLOEXEC, libc::IPPROTO_UDP)
        };
        if sock < 0 {
            return Err(PollError::SocketCreate(last_errno()));
        }

        let mut fds = [
            libc::pollfd { fd: sock, events: libc::POLLIN, revents: 0 },
            libc::pollfd { fd: counter.raw_handle(), events: libc::POLLIN, revents: 0 },
        ];
        let ret = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, 0) };
        let errno = if ret < 0 { last_errno() } else { 0 };
        let _ = nix::unistd::close(sock);

        match ret {
            r if r >= 0 => Ok(true),
            _ if errno == libc::EINVAL => Ok(false),
            _ => Err(PollError::Os(errno)),
        }
    }

    fn is_mixed(entries: &[PollEntry]) -> bool {
        let has = |kind: SourceKind| entries.iter().any(|e| e.kind == kind);
        has(SourceKind::Socket) && has(SourceKind::Notification)
    }
}

impl Waiter for SysPoll {
    fn wait(&mut self, entries: &mut [PollEntry], timeout: WaitTimeout) -> std::result::Result<usize, i32> {
        if !self.mixed_allowed && Self::is_mixed(entries) {
            return Err(libc::EINVAL);
        }

        self.fds.clear();
        self.fds.extend(entries.iter().map(|e| libc::pollfd {
            fd: e.handle,
            events: to_poll_events(e.interest),
            revents: 0,
        }));

        let ret = unsafe {
            libc::poll(
                self.fds.as_mut_ptr(),
                self.fds.len() as libc::nfds_t,
                timeout.as_poll_millis(),
            )
        };
        if ret < 0 {
            return Err(last_errno());
        }

        for (entry, pfd) in entries.iter_mut().zip(self.fds.iter()) {
            entry.observed = from_poll_revents(pfd.revents);
        }
        Ok(ret as usize)
    }

    fn name(&self) -> &'static str {
        "poll"
    }
}

fn to_poll_events(interest: Readiness) -> libc::c_short {
    let mut events = 0;
    if interest.contains(Readiness::READABLE) {
        events |= libc::POLLIN;
    }
    events
}

fn from_poll_revents(revents: libc::c_short) -> Readiness {
    let mut mask = Readiness::EMPTY;
    if revents & libc::POLLIN != 0 {
        mask |= Readiness::READABLE;
    }
    if revents & libc::POLLERR != 0 {
        mask |= Readiness::ERROR;
    }
    if revents & libc::POLLHUP != 0 {
        mask |= Readiness::HANGUP;
    }
    if revents & libc::POLLNVAL != 0 {
        mask |= Readiness::INVALID;
    }
    mask
}
