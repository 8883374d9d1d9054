//! Startup sequence and the assembled runtime.
//!
//! ```text
//! App::start(config)
//!   1. validate + banner
//!   2. connect socket            (if the scenario polls it)
//!   3. create counter, log fd    (if the scenario polls it)
//!   4. build waiter, report mixed-kind legality
//!   5. build source set
//!   6. start producer            (counter already exists)
//! App::run(observer, shutdown)   → poll loop until shutdown
//! App::stop()                    → producer stats
//! ```
//!
//! Any failure before step 6 is fatal: the loop never starts with a
//! source it could not bring up.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use log::{info, warn};

use udpoll_core::error::Result;
use udpoll_core::outcome::Observer;
use udpoll_core::scenario::Scenario;
use udpoll_core::source::{Counter, DatagramEndpoint};
use udpoll_module::{EventFdCounter, SysPoll};

use crate::config::PollConfig;
use crate::connection::ConnectionManager;
use crate::multiplexer::{LogObserver, Multiplexer};
use crate::poll_loop::{poll_loop, LoopStats};
use crate::producer::{spawn_producer, ProducerConfig, ProducerHandle, ProducerStats};
use crate::source_set::SourceSet;

pub struct App {
    config: PollConfig,
    set: SourceSet,
    mux: Multiplexer<SysPoll>,
    producer: Option<ProducerHandle>,
}

impl App {
    /// Bring every source of the configured scenario up.
    pub fn start(config: PollConfig) -> Result<Self> {
        config.validate()?;
        announce(&config);
        let scenario = config.scenario;

        let endpoint: Option<Box<dyn DatagramEndpoint>> = if scenario.uses_socket() {
            let ep = ConnectionManager::from_config(&config).establish()?;
            Some(Box::new(ep))
        } else {
            None
        };

        let counter: Option<Arc<dyn Counter>> = if scenario.uses_notification() {
            let c = EventFdCounter::create()?;
            info!("eventfd handle: {}", c.fd());
            Some(Arc::new(c))
        } else {
            None
        };

        let waiter = SysPoll::new(config.mixed_kinds);
        if scenario == Scenario::SocketAndNotification {
            if waiter.mixed_allowed() {
                info!("Actual: a socket and a counter can share one wait here");
            } else {
                warn!("Actual: a socket and a counter cannot share one wait here; every wait will fail with invalid argument");
            }
        }

        let set = SourceSet::new(scenario, endpoint, counter.clone())?;
        let mux = Multiplexer::new(waiter, config.wait_timeout);

        let producer = match counter {
            Some(c) => Some(spawn_producer(c, ProducerConfig::every(config.tick_interval))?),
            None => None,
        };

        Ok(Self {
            config,
            set,
            mux,
            producer,
        })
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn source_set(&self) -> &SourceSet {
        &self.set
    }

    pub fn mixed_allowed(&self) -> bool {
        self.mux.waiter().mixed_allowed()
    }

    /// Run the poll loop until `shutdown` is seen before a wait.
    pub fn run<O>(&mut self, observer: &mut O, shutdown: &AtomicBool) -> LoopStats
    where
        O: Observer + ?Sized,
    {
        poll_loop(&mut self.mux, &mut self.set, observer, self.config.backoff, shutdown)
    }

    /// Stop the producer, if one was started.
    pub fn stop(mut self) -> ProducerStats {
        match self.producer.take() {
            Some(p) => p.shutdown(),
            None => ProducerStats::default(),
        }
    }
}

/// Start, run with a logging observer until `shutdown`, stop.
pub fn run(config: PollConfig, shutdown: &AtomicBool) -> Result<(LoopStats, ProducerStats)> {
    let mut app = App::start(config)?;
    let stats = app.run(&mut LogObserver, shutdown);
    let producer = app.stop();
    info!(
        "Poll loop stopped: {} waits, {} ready, {} timeouts, {} errors; {} ticks",
        stats.waits, stats.ready, stats.timeouts, stats.errors, producer.ticks
    );
    Ok((stats, producer))
}

fn announce(config: &PollConfig) {
    info!("Scenario: {}", config.scenario);
    info!("Target: {}:{}", config.remote_ip, config.port);
    info!("Poll timeout: {}", config.wait_timeout);
    info!("Expectation: {}", config.scenario.expectation());
}
