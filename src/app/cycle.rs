//! Main cycle: the periodic sample / display / notify loop.
//!
//! ```text
//!  ensure link ─▶ sample ─▶ display ─▶ publish telemetry ─▶ uplink? ─▶ sleep
//!       ▲                                                               │
//!       └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! No step is skipped because an earlier one failed: a dead sensor still
//! gets a display frame with the current speed, and a link that will not
//! come up under a bounded policy still lets the cycle sample and notify.

use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::config::NodeConfig;
use crate::error::{LinkFault, UplinkError};
use crate::sensors::SensorSampler;

use super::connectivity::{ConnectivitySupervisor, LinkState};
use super::ports::{AttributeServer, DisplayPort, EnvironmentSensor, LinkPort, PwmPort, TelemetryPostPort};
use super::surface::WirelessControlSurface;
use super::telemetry::{uplink_body, DisplayFrame, TelemetryReading};

/// What one pass of the cycle did.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub link: LinkState,
    pub link_fault: Option<LinkFault>,
    pub reading: TelemetryReading,
    pub displayed: bool,
    pub published: bool,
    /// `Some` when an uplink post was attempted.
    pub posted: Option<Result<u16, UplinkError>>,
}

/// Uplink target plus its schedule.
struct Uplink {
    port: Box<dyn TelemetryPostPort + Send>,
    url: heapless::String<128>,
    interval_ms: u64,
    /// Time accumulated since the last attempt.  Starts full so the first
    /// valid reading goes out immediately.
    elapsed_ms: u64,
}

pub struct MainCycle<L, S, D, A, P>
where
    L: LinkPort,
    S: EnvironmentSensor,
    D: DisplayPort,
    A: AttributeServer,
    P: PwmPort,
{
    supervisor: ConnectivitySupervisor<L>,
    sampler: SensorSampler<S>,
    display: D,
    surface: Arc<WirelessControlSurface<A, P>>,
    uplink: Option<Uplink>,
    period_ms: u32,
    cycles: u64,
}

impl<L, S, D, A, P> MainCycle<L, S, D, A, P>
where
    L: LinkPort,
    S: EnvironmentSensor,
    D: DisplayPort,
    A: AttributeServer,
    P: PwmPort,
{
    pub fn new(
        supervisor: ConnectivitySupervisor<L>,
        sampler: SensorSampler<S>,
        display: D,
        surface: Arc<WirelessControlSurface<A, P>>,
        config: &NodeConfig,
    ) -> Self {
        Self {
            supervisor,
            sampler,
            display,
            surface,
            uplink: None,
            period_ms: config.cycle_period_ms,
            cycles: 0,
        }
    }

    /// Attach the HTTP uplink if `config` names an endpoint.
    pub fn with_uplink(mut self, port: Box<dyn TelemetryPostPort + Send>, config: &NodeConfig) -> Self {
        match config.post_url.as_ref().filter(|_| config.uplink_enabled()) {
            Some(url) => {
                let interval_ms = u64::from(config.post_interval_secs) * 1000;
                info!("cycle: uplink to {} every {} s", url, config.post_interval_secs);
                self.uplink = Some(Uplink {
                    port,
                    url: url.clone(),
                    interval_ms,
                    elapsed_ms: interval_ms,
                });
            }
            None => info!("cycle: uplink disabled"),
        }
        self
    }

    /// One full pass.  Blocks inside `ensure_connected` while the link is down.
    pub fn run_once(&mut self, delay: &mut impl DelayNs) -> CycleReport {
        self.cycles += 1;

        // 1. Link
        let link_fault = self.supervisor.ensure_connected(delay).err();
        if let Some(e) = link_fault {
            warn!("cycle {}: link unavailable: {}", self.cycles, e);
        }
        let link = self.supervisor.link_state();

        // 2. Sample
        let reading = self.sampler.sample();

        // 3. Display
        let speed = self.surface.actuator().current_speed();
        let frame = DisplayFrame::for_cycle(&reading, speed);
        let displayed = match self.display.render(&frame) {
            Ok(()) => true,
            Err(e) => {
                warn!("cycle {}: {}", self.cycles, e);
                false
            }
        };

        // 4. Notify
        let published = self.surface.publish_telemetry(&reading);

        // 5. Uplink
        let posted = self.maybe_post(link, &reading);

        CycleReport { link, link_fault, reading, displayed, published, posted }
    }

    /// Cycle forever at the configured period.
    pub fn run(&mut self, delay: &mut impl DelayNs) -> ! {
        info!("cycle: running every {} ms", self.period_ms);
        loop {
            let _ = self.run_once(delay);
            delay.delay_ms(self.period_ms);
        }
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn supervisor(&self) -> &ConnectivitySupervisor<L> {
        &self.supervisor
    }

    pub fn supervisor_mut(&mut self) -> &mut ConnectivitySupervisor<L> {
        &mut self.supervisor
    }

    pub fn sampler_mut(&mut self) -> &mut SensorSampler<S> {
        &mut self.sampler
    }

    pub fn surface(&self) -> &Arc<WirelessControlSurface<A, P>> {
        &self.surface
    }

    fn maybe_post(&mut self, link: LinkState, reading: &TelemetryReading) -> Option<Result<u16, UplinkError>> {
        let period = u64::from(self.period_ms);
        let uplink = self.uplink.as_mut()?;
        // Runs after the cycle's own work; the sleep that follows counts
        // toward the next interval.
        let due = uplink.elapsed_ms >= uplink.interval_ms;
        if !due {
            uplink.elapsed_ms += period;
            return None;
        }
        if link != LinkState::Connected {
            return None;
        }
        let (t, h) = reading.values()?;

        let Some(body) = uplink_body(t, h) else {
            warn!("cycle: reading {} / {} does not fit the uplink body", t, h);
            return None;
        };
        let result = uplink.port.post(&uplink.url, &body);
        match result {
            Ok(status) => info!("cycle: uplink posted ({})", status),
            Err(e) => warn!("cycle: {}", e),
        }
        uplink.elapsed_ms = period;
        Some(result)
    }
}
