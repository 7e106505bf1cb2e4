//! Test rig: the whole node wired to simulation adapters.
//!
//! Every simulation adapter shares its state between clones, so the rig
//! keeps a "bench side" handle of each while the surface and the cycle
//! own the other.

use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use espfan::adapters::ble::SimGattServer;
use espfan::adapters::dht::SimDht;
use espfan::adapters::display::SimDisplay;
use espfan::adapters::pwm::SimPwm;
use espfan::adapters::uplink::SimUplink;
use espfan::adapters::wifi::WifiAdapter;
use espfan::app::connectivity::{ConnectivitySupervisor, RetryPolicy};
use espfan::app::cycle::MainCycle;
use espfan::app::events::{AttributeId, WirelessEvent};
use espfan::app::ports::LinkPort;
use espfan::app::surface::WirelessControlSurface;
use espfan::config::NodeConfig;
use espfan::control::{ActuatorState, DutyCycleMapper};
use espfan::error::LinkFault;
use espfan::sensors::SensorSampler;

pub type SimSurface = WirelessControlSurface<SimGattServer, SimPwm>;
pub type SimCycle<L = WifiAdapter> = MainCycle<L, SimDht, SimDisplay, SimGattServer, SimPwm>;

// ── Delay ─────────────────────────────────────────────────────

/// Records requested sleeps instead of sleeping.
#[derive(Debug, Default)]
pub struct CountingDelay {
    pub sleeps_ms: Vec<u32>,
}

#[allow(dead_code)]
impl CountingDelay {
    pub fn total_ms(&self) -> u64 {
        self.sleeps_ms.iter().map(|&ms| u64::from(ms)).sum()
    }
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.sleeps_ms.push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.sleeps_ms.push(ms);
    }
}

// ── Link that never comes up ──────────────────────────────────

#[derive(Debug, Default)]
pub struct DeadLink {
    pub attempts: u32,
}

impl LinkPort for DeadLink {
    fn connect(&mut self) -> Result<(), LinkFault> {
        self.attempts += 1;
        Err(LinkFault::ConnectFailed)
    }

    fn is_connected(&self) -> bool {
        false
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub struct Rig {
    pub config: NodeConfig,
    pub pwm: SimPwm,
    pub gatt: SimGattServer,
    pub display: SimDisplay,
    pub uplink: SimUplink,
    pub surface: Arc<SimSurface>,
}

#[allow(dead_code)]
impl Rig {
    /// Boot the actuator and the surface (advertising) under `config`.
    pub fn new(config: NodeConfig) -> Self {
        Self::on_server(config, SimGattServer::new())
    }

    /// Boot against a stack that is still registering its service.
    pub fn registering(config: NodeConfig) -> Self {
        Self::on_server(config, SimGattServer::registering())
    }

    fn on_server(config: NodeConfig, gatt: SimGattServer) -> Self {
        let pwm = SimPwm::new();
        let actuator = Arc::new(ActuatorState::new(
            pwm.clone(),
            DutyCycleMapper::from_config(&config),
            config.initial_duty,
        ));
        let surface = Arc::new(WirelessControlSurface::new(gatt.clone(), actuator));
        surface.start();
        Self {
            config,
            pwm,
            gatt,
            display: SimDisplay::new(),
            uplink: SimUplink::new(),
            surface,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(NodeConfig::default())
    }

    /// Main cycle on a simulated Wi-Fi station that accepts the first connect.
    pub fn cycle(&self, sensor: SimDht) -> SimCycle {
        self.cycle_with_link(WifiAdapter::new("bench-ap", "password123"), sensor)
    }

    pub fn cycle_with_link<L: LinkPort>(&self, link: L, sensor: SimDht) -> SimCycle<L> {
        let supervisor = ConnectivitySupervisor::new(link, RetryPolicy::from_config(&self.config));
        MainCycle::new(
            supervisor,
            SensorSampler::new(sensor),
            self.display.clone(),
            Arc::clone(&self.surface),
            &self.config,
        )
        .with_uplink(Box::new(self.uplink.clone()), &self.config)
    }

    /// Attach `client` and subscribe it to both attributes.
    pub fn connect_client(&self, client: u16) {
        assert!(self.gatt.connect(client), "client {client} could not connect");
        self.surface.dispatch(&WirelessEvent::Connected { conn_id: client });
        self.gatt.subscribe(client, AttributeId::Telemetry);
        self.gatt.subscribe(client, AttributeId::Speed);
    }

    pub fn disconnect_client(&self) {
        let client = self.gatt.disconnect().expect("no client attached");
        self.surface.dispatch(&WirelessEvent::Disconnected { conn_id: client });
    }

    /// Client write to the speed attribute, dispatched straight to the surface.
    pub fn write_speed(&self, text: &str) {
        let event = self.gatt.client_write(AttributeId::Speed, text.as_bytes());
        self.surface.dispatch(&event);
    }

    pub fn speed_attr(&self) -> String {
        self.gatt.value_text(AttributeId::Speed)
    }

    pub fn telemetry_attr(&self) -> String {
        self.gatt.value_text(AttributeId::Telemetry)
    }

    /// Notifications delivered for `id`, as text.
    pub fn notified(&self, id: AttributeId) -> Vec<String> {
        self.gatt
            .notifications()
            .into_iter()
            .filter(|(_, attr, _)| *attr == id)
            .map(|(_, _, value)| String::from_utf8_lossy(&value).into_owned())
            .collect()
    }
}
