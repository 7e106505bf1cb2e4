//! Wireless stack → control surface event channel.
//!
//! The BLE stack delivers callbacks on its own task.  Those callbacks do
//! nothing but translate the stack event into a [`WirelessEvent`] and
//! enqueue it; the event thread drains the channel and dispatches into
//! the [`WirelessControlSurface`](super::surface::WirelessControlSurface).
//!
//! ```text
//! ┌──────────────┐ WirelessEvent ┌──────────────┐      ┌───────────────┐
//! │  BLE stack   │──────────────▶│ EventChannel │─────▶│ event thread  │
//! │  callbacks   │   try_send    │  (bounded)   │ recv │ surface.dispatch
//! └──────────────┘               └──────────────┘      └───────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;
use log::warn;

/// Longest attribute write the stack hands over.  Matches the
/// characteristic `max_len`.
pub const MAX_PAYLOAD: usize = 32;

/// Channel depth for pending wireless events.
const EVENT_DEPTH: usize = 8;

/// The two attributes of the fan service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeId {
    /// Server-authoritative temperature text (`"23.4 °C"`).
    Telemetry,
    /// Client-writable fan speed, decimal text.
    Speed,
}

/// One discrete event from the wireless stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WirelessEvent {
    Connected { conn_id: u16 },
    Disconnected { conn_id: u16 },
    AttributeWritten {
        id: AttributeId,
        payload: Vec<u8, MAX_PAYLOAD>,
        /// The client sent more than [`MAX_PAYLOAD`] bytes; `payload` holds
        /// only the head and must not be acted on.
        truncated: bool,
    },
    /// Service registration finished; the attributes exist and can take values.
    Ready,
}

impl WirelessEvent {
    /// Build a write event.  Payloads longer than [`MAX_PAYLOAD`] keep
    /// their head and are flagged as truncated.
    pub fn written(id: AttributeId, data: &[u8]) -> Self {
        let len = data.len().min(MAX_PAYLOAD);
        let mut payload = Vec::new();
        // Cannot fail: len <= capacity.
        let _ = payload.extend_from_slice(&data[..len]);
        Self::AttributeWritten {
            id,
            payload,
            truncated: data.len() > MAX_PAYLOAD,
        }
    }
}

pub type EventChannel = Channel<CriticalSectionRawMutex, WirelessEvent, EVENT_DEPTH>;

/// Events from the BLE callbacks to the event thread.
pub static WIRELESS_EVENTS: EventChannel = Channel::new();

/// Enqueue without blocking (callable from the stack's callback task).
/// Returns `false` if the channel is full and the event was dropped.
pub fn push_event(channel: &EventChannel, event: WirelessEvent) -> bool {
    match channel.try_send(event) {
        Ok(()) => true,
        Err(embassy_sync::channel::TrySendError::Full(dropped)) => {
            warn!("events: channel full, dropping {:?}", dropped);
            false
        }
    }
}
