//! Station-link supervision.
//!
//! ```text
//!                 ensure_connected()
//!  Disconnected ────────────────────▶ Connecting ──ok──▶ Connected
//!       ▲                                 │                  │
//!       └──────── retries exhausted ──────┘      link lost ──┘ (next call)
//! ```
//!
//! The retry loop is an explicit state machine: one connect sequence per
//! attempt, `interval_ms` of sleep between attempts, and an optional
//! attempt bound.  With no bound the call only returns once connected.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::config::NodeConfig;
use crate::error::LinkFault;

use super::ports::LinkPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

/// How long to wait between attempts and when to give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval_ms: u32,
    /// `None` retries until connected.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn unbounded(interval_ms: u32) -> Self {
        Self { interval_ms, max_attempts: None }
    }

    pub fn bounded(interval_ms: u32, max_attempts: u32) -> Self {
        Self { interval_ms, max_attempts: Some(max_attempts.max(1)) }
    }

    pub fn from_config(config: &NodeConfig) -> Self {
        Self {
            interval_ms: config.link_retry_interval_ms,
            max_attempts: config.link_max_attempts,
        }
    }

    fn allows(&self, attempts: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempts < max)
    }
}

pub struct ConnectivitySupervisor<L: LinkPort> {
    link: L,
    policy: RetryPolicy,
    state: LinkState,
    attempts: u32,
}

impl<L: LinkPort> ConnectivitySupervisor<L> {
    pub fn new(link: L, policy: RetryPolicy) -> Self {
        Self {
            link,
            policy,
            state: LinkState::Disconnected,
            attempts: 0,
        }
    }

    /// Make sure the link is up, retrying per the policy.
    ///
    /// Costs one `is_connected()` query when the link is already up.
    pub fn ensure_connected(&mut self, delay: &mut impl DelayNs) -> Result<(), LinkFault> {
        if self.state == LinkState::Connected {
            if self.link.is_connected() {
                return Ok(());
            }
            warn!("link: lost, reconnecting");
        }

        self.state = LinkState::Connecting;
        self.attempts = 0;

        loop {
            self.attempts += 1;
            match self.link.connect() {
                Ok(()) if self.link.is_connected() => {
                    self.state = LinkState::Connected;
                    info!("link: connected after {} attempt(s)", self.attempts);
                    return Ok(());
                }
                Ok(()) => warn!("link: connect returned but link is down"),
                Err(LinkFault::NoCredentials) => {
                    self.state = LinkState::Disconnected;
                    return Err(LinkFault::NoCredentials);
                }
                Err(e) => warn!("link: attempt {} failed: {}", self.attempts, e),
            }

            if !self.policy.allows(self.attempts) {
                self.state = LinkState::Disconnected;
                warn!("link: giving up after {} attempt(s)", self.attempts);
                return Err(LinkFault::RetriesExhausted);
            }
            delay.delay_ms(self.policy.interval_ms);
        }
    }

    pub fn link_state(&self) -> LinkState {
        self.state
    }

    /// Connect attempts made by the most recent reconnect.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }
}
