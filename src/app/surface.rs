//! Wireless control surface, the GATT server role of the node.
//!
//! Two attributes: *telemetry* (temperature text, server-authoritative)
//! and *speed* (decimal fan speed, client-writable).  Writes to speed go
//! straight through [`ActuatorState`] to the PWM output on the event
//! thread; they never wait for the main cycle.
//!
//! ```text
//!         start()            on_connect()
//!  Idle ───────────▶ Advertising ───────────▶ Connected
//!                        ▲                        │
//!                        └──── on_disconnect() ───┘
//! ```
//!
//! Advertising is re-armed on every disconnect; there is no terminal state.

use core::num::IntErrorKind;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};

use crate::control::ActuatorState;
use crate::error::ParseError;

use super::events::{AttributeId, EventChannel, WirelessEvent};
use super::ports::{AttributeServer, PwmPort};
use super::telemetry::{speed_text, telemetry_text, TelemetryReading, TELEMETRY_PLACEHOLDER};

// ───────────────────────────────────────────────────────────────
// Surface state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SurfaceState {
    Idle = 0,
    Advertising = 1,
    Connected = 2,
}

impl SurfaceState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Advertising,
            2 => Self::Connected,
            _ => Self::Idle,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Handler capability
// ───────────────────────────────────────────────────────────────

/// Reactions to client-driven wireless stack events.
pub trait WirelessHandler {
    fn on_connect(&self, conn_id: u16);
    fn on_disconnect(&self, conn_id: u16);
    fn on_write(&self, id: AttributeId, payload: &[u8]) -> Result<(), ParseError>;
}

/// Parse a speed-control write: decimal integer, surrounding ASCII
/// whitespace and NUL padding ignored.
///
/// Integers outside `i64` saturate rather than fail, so an absurdly large
/// request still clamps to full speed downstream.
pub fn parse_speed(payload: &[u8]) -> Result<i64, ParseError> {
    let text = core::str::from_utf8(payload).map_err(|_| ParseError::NotUtf8)?;
    let text = text.trim_matches(|c: char| c.is_ascii_whitespace() || c == '\0');
    if text.is_empty() {
        return Err(ParseError::Empty);
    }
    text.parse::<i64>().or_else(|e| match e.kind() {
        IntErrorKind::PosOverflow => Ok(i64::MAX),
        IntErrorKind::NegOverflow => Ok(i64::MIN),
        _ => Err(ParseError::NotAnInteger),
    })
}

// ───────────────────────────────────────────────────────────────
// WirelessControlSurface
// ───────────────────────────────────────────────────────────────

pub struct WirelessControlSurface<A: AttributeServer, P: PwmPort> {
    server: Mutex<A>,
    actuator: Arc<ActuatorState<P>>,
    state: AtomicU8,
}

impl<A: AttributeServer, P: PwmPort> WirelessControlSurface<A, P> {
    pub fn new(server: A, actuator: Arc<ActuatorState<P>>) -> Self {
        Self {
            server: Mutex::new(server),
            actuator,
            state: AtomicU8::new(SurfaceState::Idle as u8),
        }
    }

    /// Seed both attributes and begin advertising.
    pub fn start(&self) {
        self.reset_attributes_and_advertise();
        info!("surface: advertising");
    }

    pub fn state(&self) -> SurfaceState {
        SurfaceState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn actuator(&self) -> &Arc<ActuatorState<P>> {
        &self.actuator
    }

    /// Push a valid reading to the telemetry attribute and notify.
    ///
    /// Invalid readings leave the attribute untouched.  Returns whether
    /// the attribute was updated.
    pub fn publish_telemetry(&self, reading: &TelemetryReading) -> bool {
        let Some((temperature, _)) = reading.values() else {
            debug!("surface: invalid reading, telemetry left unchanged");
            return false;
        };
        let Some(text) = telemetry_text(temperature) else {
            warn!("surface: temperature {} does not fit the attribute, left unchanged", temperature);
            return false;
        };
        let mut server = self.server();
        server.set_value(AttributeId::Telemetry, text.as_bytes());
        let notified = server.notify(AttributeId::Telemetry);
        debug!("surface: telemetry '{}' → {} subscriber(s)", text, notified);
        true
    }

    /// Route one stack event.  Parse and actuator failures stop here.
    pub fn dispatch(&self, event: &WirelessEvent) {
        match event {
            WirelessEvent::Connected { conn_id } => self.on_connect(*conn_id),
            WirelessEvent::Disconnected { conn_id } => self.on_disconnect(*conn_id),
            WirelessEvent::AttributeWritten { id, payload, truncated } => {
                let result = if *truncated {
                    self.reject_write(*id, ParseError::TooLong)
                } else {
                    self.on_write(*id, payload)
                };
                if let Err(e) = result {
                    warn!("surface: rejected {:?} write {:?}: {}", id, payload.as_slice(), e);
                }
            }
            WirelessEvent::Ready => {
                info!("surface: service registered, seeding attributes");
                self.reset_attributes_and_advertise();
            }
        }
    }

    /// Dispatch everything currently queued without blocking.
    /// Returns the number of events handled.
    pub fn drain_events(&self, channel: &EventChannel) -> usize {
        let mut handled = 0;
        while let Ok(event) = channel.try_receive() {
            self.dispatch(&event);
            handled += 1;
        }
        handled
    }

    /// Event thread body: block on the channel forever.
    pub fn run_event_loop(&self, channel: &EventChannel) -> ! {
        info!("surface: event loop running");
        loop {
            let event = futures_lite::future::block_on(channel.receive());
            self.dispatch(&event);
        }
    }

    // ── internals ────────────────────────────────────────────

    fn server(&self) -> MutexGuard<'_, A> {
        self.server.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: SurfaceState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn current_speed_text(&self) -> heapless::String<12> {
        speed_text(self.actuator.current_speed())
    }

    fn reset_attributes_and_advertise(&self) {
        let speed = self.current_speed_text();
        let mut server = self.server();
        server.set_value(AttributeId::Telemetry, TELEMETRY_PLACEHOLDER.as_bytes());
        server.set_value(AttributeId::Speed, speed.as_bytes());
        server.start_advertising();
        drop(server);
        self.set_state(SurfaceState::Advertising);
    }

    /// Drop a write without touching the actuator.  The stack already
    /// stored the raw bytes, so the speed attribute gets its real value back.
    fn reject_write(&self, id: AttributeId, reason: ParseError) -> Result<(), ParseError> {
        if id == AttributeId::Speed {
            let current = self.current_speed_text();
            self.server().set_value(AttributeId::Speed, current.as_bytes());
        }
        Err(reason)
    }

    fn write_speed(&self, payload: &[u8]) -> Result<(), ParseError> {
        let requested = match parse_speed(payload) {
            Ok(v) => v,
            Err(e) => return self.reject_write(AttributeId::Speed, e),
        };

        let committed = match self.actuator.set_speed(requested) {
            Ok(speed) => speed,
            Err(e) => {
                warn!("surface: speed {} not applied: {}", requested, e);
                self.actuator.current_speed()
            }
        };

        let text = speed_text(committed);
        let mut server = self.server();
        server.set_value(AttributeId::Speed, text.as_bytes());
        let notified = server.notify(AttributeId::Speed);
        drop(server);
        info!("surface: speed set to {} ({} subscriber(s))", committed, notified);
        Ok(())
    }
}

impl<A: AttributeServer, P: PwmPort> WirelessHandler for WirelessControlSurface<A, P> {
    fn on_connect(&self, conn_id: u16) {
        self.set_state(SurfaceState::Connected);
        info!("surface: client {} connected", conn_id);
    }

    fn on_disconnect(&self, conn_id: u16) {
        info!("surface: client {} disconnected, re-advertising", conn_id);
        self.reset_attributes_and_advertise();
    }

    fn on_write(&self, id: AttributeId, payload: &[u8]) -> Result<(), ParseError> {
        match id {
            AttributeId::Speed => self.write_speed(payload),
            AttributeId::Telemetry => {
                debug!("surface: ignoring client write to telemetry");
                Ok(())
            }
        }
    }
}
