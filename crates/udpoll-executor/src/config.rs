//! Run configuration

use std::time::Duration;

use udpoll_core::env::parse_with;
use udpoll_core::error::{PollError, Result};
use udpoll_core::scenario::Scenario;
use udpoll_core::waiter::WaitTimeout;
use udpoll_module::MixedKinds;

/// Environment variable names.
pub mod keys {
    pub const REMOTE_IP: &str = "UDPOLL_REMOTE_IP";
    pub const PORT: &str = "UDPOLL_PORT";
    pub const SCENARIO: &str = "UDPOLL_SCENARIO";
    pub const POLL_TIMEOUT_MS: &str = "UDPOLL_POLL_TIMEOUT_MS";
    pub const TICK_MS: &str = "UDPOLL_TICK_MS";
    pub const BACKOFF_MS: &str = "UDPOLL_BACKOFF_MS";
    pub const CONNECT_DELAY_MS: &str = "UDPOLL_CONNECT_DELAY_MS";
    pub const GREETING: &str = "UDPOLL_GREETING";
    pub const MIXED_KINDS: &str = "UDPOLL_MIXED_KINDS";
}

/// Configuration for one run, fixed at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Remote IPv4 address, dotted quad
    pub remote_ip: String,

    /// Remote UDP port
    pub port: u16,

    /// Which slots are active
    pub scenario: Scenario,

    /// Timeout passed to every wait (default: forever)
    pub wait_timeout: WaitTimeout,

    /// Producer interval, also its initial delay (default: 7s)
    pub tick_interval: Duration,

    /// Sleep after a Timeout or Error outcome (default: 5s)
    pub backoff: Duration,

    /// Sleep before connecting (default: none)
    pub connect_delay: Duration,

    /// Sent once after connecting; empty sends nothing
    pub greeting: Vec<u8>,

    /// Whether socket and counter may share one wait
    pub mixed_kinds: MixedKinds,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            remote_ip: "192.168.1.165".into(),
            port: 5555,
            scenario: Scenario::SocketAndNotification,
            wait_timeout: WaitTimeout::Forever,
            tick_interval: Duration::from_secs(7),
            backoff: Duration::from_secs(5),
            connect_delay: Duration::ZERO,
            greeting: b"Hello!\n".to_vec(),
            mixed_kinds: MixedKinds::Probe,
        }
    }
}

impl PollConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key: &str| std::env::var(key).ok())
    }

    /// Load through `lookup`; unset keys take defaults, malformed values fail.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let millis = |key: &str, default: Duration| -> Result<Duration> {
            parse_with(&lookup, key, default.as_millis() as u64).map(Duration::from_millis)
        };

        let wait_timeout = match lookup(keys::POLL_TIMEOUT_MS) {
            Some(raw) => raw.parse()?,
            None => d.wait_timeout,
        };
        let greeting = match lookup(keys::GREETING) {
            Some(raw) => unescape(&raw),
            None => d.greeting.clone(),
        };

        Ok(Self {
            remote_ip: parse_with(&lookup, keys::REMOTE_IP, d.remote_ip.clone())?,
            port: parse_with(&lookup, keys::PORT, d.port)?,
            scenario: parse_with(&lookup, keys::SCENARIO, d.scenario)?,
            wait_timeout,
            tick_interval: millis(keys::TICK_MS, d.tick_interval)?,
            backoff: millis(keys::BACKOFF_MS, d.backoff)?,
            connect_delay: millis(keys::CONNECT_DELAY_MS, d.connect_delay)?,
            greeting,
            mixed_kinds: parse_with(&lookup, keys::MIXED_KINDS, d.mixed_kinds)?,
        })
    }

    pub fn remote_ip(mut self, ip: impl Into<String>) -> Self {
        self.remote_ip = ip.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.scenario = scenario;
        self
    }

    pub fn wait_timeout(mut self, timeout: WaitTimeout) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn tick_interval(mut self, d: Duration) -> Self {
        self.tick_interval = d;
        self
    }

    pub fn backoff(mut self, d: Duration) -> Self {
        self.backoff = d;
        self
    }

    pub fn connect_delay(mut self, d: Duration) -> Self {
        self.connect_delay = d;
        self
    }

    pub fn greeting(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.greeting = payload.into();
        self
    }

    pub fn mixed_kinds(mut self, policy: MixedKinds) -> Self {
        self.mixed_kinds = policy;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(PollError::InvalidConfig("port must be > 0".into()));
        }
        if self.tick_interval.is_zero() {
            return Err(PollError::InvalidConfig("tick interval must be > 0".into()));
        }
        if self.backoff.is_zero() {
            return Err(PollError::InvalidConfig("backoff must be > 0".into()));
        }
        Ok(())
    }
}

/// Expand `\n`, `\r`, `\t` and `\\` in a greeting taken from the environment.
fn unescape(raw: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => out.push(b'\n'),
            Some('r') => out.push(b'\r'),
            Some('t') => out.push(b'\t'),
            Some('\\') => out.push(b'\\'),
            Some(other) => {
                out.push(b'\\');
                let mut buf = [0u8; 4];
                out.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
            }
            None => out.push(b'\\'),
        }
    }
    out
}
