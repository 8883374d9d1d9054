//! Connection manager: bring-up delay, connect, optional greeting.

use std::time::Duration;

use log::{error, info, warn};

use udpoll_core::error::{PollError, Result};
use udpoll_core::source::DatagramEndpoint;
use udpoll_module::{errno_desc, UdpEndpoint};

use crate::config::PollConfig;

#[derive(Debug, Clone)]
pub struct ConnectionManager {
    remote_ip: String,
    port: u16,
    greeting: Vec<u8>,
    connect_delay: Duration,
}

impl ConnectionManager {
    pub fn new(remote_ip: impl Into<String>, port: u16) -> Self {
        Self {
            remote_ip: remote_ip.into(),
            port,
            greeting: Vec::new(),
            connect_delay: Duration::ZERO,
        }
    }

    pub fn from_config(config: &PollConfig) -> Self {
        Self::new(config.remote_ip.clone(), config.port)
            .greeting(config.greeting.clone())
            .connect_delay(config.connect_delay)
    }

    pub fn greeting(mut self, payload: Vec<u8>) -> Self {
        self.greeting = payload;
        self
    }

    pub fn connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    /// Produce a connected endpoint, or fail.
    ///
    /// A greeting that cannot be sent is logged and otherwise ignored.
    pub fn establish(&self) -> Result<UdpEndpoint> {
        if !self.connect_delay.is_zero() {
            info!(
                "Waiting {} ms for the network to come up",
                self.connect_delay.as_millis()
            );
            std::thread::sleep(self.connect_delay);
        }

        info!("Connecting to {}:{}", self.remote_ip, self.port);
        let endpoint = UdpEndpoint::connect(&self.remote_ip, self.port).map_err(|e| {
            match &e {
                PollError::Address(addr) => error!("Invalid remote address '{}'", addr),
                PollError::SocketCreate(code) => {
                    error!("Failed to create socket: {} ({})", code, errno_desc(*code))
                }
                PollError::Connect(code) => error!(
                    "Failed to set peer address {}:{}: {} ({})",
                    self.remote_ip,
                    self.port,
                    code,
                    errno_desc(*code)
                ),
                other => error!("Connect failed: {}", other),
            }
            e
        })?;
        info!("Socket fd: {}", endpoint.raw_handle());

        if !self.greeting.is_empty() {
            match endpoint.send(&self.greeting) {
                Ok(n) if n == self.greeting.len() => {}
                Ok(n) => warn!("Greeting truncated: sent {} of {} bytes", n, self.greeting.len()),
                Err(e) => warn!("Failed to send greeting ({}). Proceeding to poll anyway.", e),
            }
        }

        Ok(endpoint)
    }
}
