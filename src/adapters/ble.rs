//! BLE GATT attribute server adapter.
//!
//! Implements [`AttributeServer`], the boundary between the control
//! surface and the Bluetooth stack.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid GATT server via raw `esp_idf_svc::sys` calls.
//! - **all other targets**: [`SimGattServer`], an in-memory model of the
//!   stack used by the host binary and the tests.
//!
//! ## GATT Service Layout
//!
//! | Characteristic | UUID                                   | Props                          |
//! |----------------|----------------------------------------|--------------------------------|
//! | Telemetry      | `7b8d3c84-0efa-405d-9f9d-6d1b73fea6d6` | Read+Write+Notify+Indicate     |
//! | Speed          | `dedf926b-600b-4dad-815a-1364e9dd0422` | Read+Write+Notify+Indicate     |
//!
//! Service `f158a25a-f800-41af-9193-e80ef1a1d3e7`.  Each characteristic
//! carries a CCCD (0x2902) so clients can subscribe.  Writes are
//! auto-responded by the stack, which stores the raw bytes before the
//! surface sees them.

#[cfg(not(target_os = "espidf"))]
use std::sync::{Arc, Mutex, PoisonError};

use crate::app::events::{AttributeId, MAX_PAYLOAD};
#[cfg(not(target_os = "espidf"))]
use crate::app::events::WirelessEvent;
use crate::app::ports::AttributeServer;

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

pub const SERVICE_UUID: u128 = 0xf158a25a_f800_41af_9193_e80ef1a1d3e7;
pub const CHAR_TELEMETRY: u128 = 0x7b8d3c84_0efa_405d_9f9d_6d1b73fea6d6;
pub const CHAR_SPEED: u128 = 0xdedf926b_600b_4dad_815a_1364e9dd0422;

/// Client Characteristic Configuration descriptor.
pub const CCCD_UUID16: u16 = 0x2902;

fn attr_index(id: AttributeId) -> usize {
    match id {
        AttributeId::Telemetry => 0,
        AttributeId::Speed => 1,
    }
}

fn to_payload(data: &[u8]) -> heapless::Vec<u8, MAX_PAYLOAD> {
    let mut v = heapless::Vec::new();
    let _ = v.extend_from_slice(&data[..data.len().min(MAX_PAYLOAD)]);
    v
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF Bluedroid server
// ───────────────────────────────────────────────────────────────
//
// Bluedroid callbacks are C function pointers that cannot capture Rust
// closures.  These atomics hold the handles the callbacks learn during
// registration; everything else goes through the wireless event channel.

#[cfg(target_os = "espidf")]
mod esp {
    use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use esp_idf_svc::sys::*;
    use log::{error, info, warn};

    use super::{attr_index, to_payload, CCCD_UUID16, CHAR_SPEED, CHAR_TELEMETRY, SERVICE_UUID};
    use crate::app::events::{push_event, AttributeId, WirelessEvent, MAX_PAYLOAD, WIRELESS_EVENTS};
    use crate::app::ports::AttributeServer;
    use crate::app::telemetry::speed_text;
    use crate::error::Error;

    static GATTS_IF: AtomicU32 = AtomicU32::new(ESP_GATT_IF_NONE as u32);
    static CONN_ID: AtomicU32 = AtomicU32::new(0);
    static CONNECTED: AtomicBool = AtomicBool::new(false);
    static SVC_HANDLE: AtomicU32 = AtomicU32::new(0);
    static STEP: AtomicU32 = AtomicU32::new(0);
    static READY: AtomicBool = AtomicBool::new(false);
    /// Committed fan speed at boot; the speed characteristic starts with it.
    static SEED_SPEED: AtomicU32 = AtomicU32::new(0);

    /// Value handles, indexed by [`attr_index`].
    static CHAR_HANDLES: [AtomicU32; 2] = [AtomicU32::new(0), AtomicU32::new(0)];
    /// CCCD handles, indexed by [`attr_index`].
    static CCCD_HANDLES: [AtomicU32; 2] = [AtomicU32::new(0), AtomicU32::new(0)];
    /// Notification enabled per attribute (CCCD bit 0).
    static NOTIFY_ON: [AtomicBool; 2] = [AtomicBool::new(false), AtomicBool::new(false)];
    /// Indication enabled per attribute (CCCD bit 1).
    static INDICATE_ON: [AtomicBool; 2] = [AtomicBool::new(false), AtomicBool::new(false)];

    const ATTRS: [AttributeId; 2] = [AttributeId::Telemetry, AttributeId::Speed];

    fn uuid128_to_esp(uuid: u128) -> esp_bt_uuid_t {
        // SAFETY: esp_bt_uuid_t is a plain C struct/union; all-zero is valid.
        let mut t: esp_bt_uuid_t = unsafe { core::mem::zeroed() };
        t.len = ESP_UUID_LEN_128 as u16;
        t.uuid.uuid128 = uuid.to_le_bytes();
        t
    }

    fn uuid16_to_esp(uuid: u16) -> esp_bt_uuid_t {
        // SAFETY: as above.
        let mut t: esp_bt_uuid_t = unsafe { core::mem::zeroed() };
        t.len = ESP_UUID_LEN_16 as u16;
        t.uuid.uuid16 = uuid;
        t
    }

    fn adv_params() -> esp_ble_adv_params_t {
        esp_ble_adv_params_t {
            adv_int_min: 0x20,
            adv_int_max: 0x40,
            adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
            own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
            channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
            adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
            // SAFETY: remaining fields (peer address) are plain data.
            ..unsafe { core::mem::zeroed() }
        }
    }

    fn start_advertising_raw() {
        let mut params = adv_params();
        // SAFETY: params outlives the call; Bluedroid copies it.
        let ret = unsafe { esp_ble_gap_start_advertising(&mut params) };
        if ret != ESP_OK as i32 {
            warn!("BLE: start_advertising failed ({})", ret);
        }
    }

    unsafe fn add_char(svc_handle: u16, uuid: u128, initial: &[u8]) {
        let mut char_uuid = uuid128_to_esp(uuid);
        let mut buf = [0u8; MAX_PAYLOAD];
        let len = initial.len().min(MAX_PAYLOAD);
        buf[..len].copy_from_slice(&initial[..len]);
        let mut value = esp_attr_value_t {
            attr_max_len: MAX_PAYLOAD as u16,
            attr_len: len as u16,
            attr_value: buf.as_mut_ptr(),
        };
        let mut control = esp_attr_control_t { auto_rsp: ESP_GATT_AUTO_RSP as u8 };
        // SAFETY: all pointers reference locals that outlive the call;
        // Bluedroid copies the initial value.
        let ret = unsafe {
            esp_ble_gatts_add_char(
                svc_handle,
                &mut char_uuid,
                (ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE) as esp_gatt_perm_t,
                (ESP_GATT_CHAR_PROP_BIT_READ
                    | ESP_GATT_CHAR_PROP_BIT_WRITE
                    | ESP_GATT_CHAR_PROP_BIT_NOTIFY
                    | ESP_GATT_CHAR_PROP_BIT_INDICATE) as esp_gatt_char_prop_t,
                &mut value,
                &mut control,
            )
        };
        if ret != ESP_OK as i32 {
            error!("BLE GATTS: add_char failed ({})", ret);
        }
    }

    unsafe fn add_cccd(svc_handle: u16) {
        let mut uuid = uuid16_to_esp(CCCD_UUID16);
        let mut initial = [0u8; 2];
        let mut value = esp_attr_value_t {
            attr_max_len: 2,
            attr_len: 2,
            attr_value: initial.as_mut_ptr(),
        };
        let mut control = esp_attr_control_t { auto_rsp: ESP_GATT_AUTO_RSP as u8 };
        // SAFETY: see add_char.
        let ret = unsafe {
            esp_ble_gatts_add_char_descr(
                svc_handle,
                &mut uuid,
                (ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE) as esp_gatt_perm_t,
                &mut value,
                &mut control,
            )
        };
        if ret != ESP_OK as i32 {
            error!("BLE GATTS: add_char_descr failed ({})", ret);
        }
    }

    unsafe extern "C" fn gap_event_handler(
        event: esp_gap_ble_cb_event_t,
        _param: *mut esp_ble_gap_cb_param_t,
    ) {
        match event {
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
                info!("BLE GAP: advertising started");
            }
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_STOP_COMPLETE_EVT => {
                info!("BLE GAP: advertising stopped");
            }
            _ => {}
        }
    }

    unsafe extern "C" fn gatts_event_handler(
        event: esp_gatts_cb_event_t,
        gatts_if: esp_gatt_if_t,
        param: *mut esp_ble_gatts_cb_param_t,
    ) {
        match event {
            esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
                GATTS_IF.store(u32::from(gatts_if), Ordering::Relaxed);
                info!("BLE GATTS: app registered (if={})", gatts_if);

                let mut adv_data = esp_ble_adv_data_t {
                    set_scan_rsp: false,
                    include_name: true,
                    include_txpower: false,
                    flag: (ESP_BLE_ADV_FLAG_GEN_DISC | ESP_BLE_ADV_FLAG_BREDR_NOT_SPT) as u8,
                    // SAFETY: remaining fields are optional pointers/lengths.
                    ..unsafe { core::mem::zeroed() }
                };
                let mut svc_id = esp_gatt_srvc_id_t {
                    id: esp_gatt_id_t { uuid: uuid128_to_esp(SERVICE_UUID), inst_id: 0 },
                    is_primary: true,
                };
                // SAFETY: locals outlive the calls; Bluedroid copies them.
                unsafe {
                    esp_ble_gap_config_adv_data(&mut adv_data);
                    // service + 2 × (decl + value + CCCD)
                    esp_ble_gatts_create_service(gatts_if, &mut svc_id, 8);
                }
            }
            esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => {
                // SAFETY: param is valid for this event kind.
                let svc_handle = unsafe { (*param).create.service_handle };
                SVC_HANDLE.store(u32::from(svc_handle), Ordering::Relaxed);
                info!("BLE GATTS: service created (handle={})", svc_handle);
                STEP.store(1, Ordering::Relaxed);
                // SAFETY: svc_handle was just issued by the stack.
                unsafe {
                    esp_ble_gatts_start_service(svc_handle);
                    add_char(svc_handle, CHAR_TELEMETRY, crate::app::telemetry::TELEMETRY_PLACEHOLDER.as_bytes());
                }
            }
            esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => {
                // SAFETY: param is valid for this event kind.
                let handle = unsafe { (*param).add_char.attr_handle };
                let svc_handle = SVC_HANDLE.load(Ordering::Relaxed) as u16;
                match STEP.load(Ordering::Relaxed) {
                    1 => {
                        CHAR_HANDLES[0].store(u32::from(handle), Ordering::Relaxed);
                        info!("BLE GATTS: telemetry char (handle={})", handle);
                        STEP.store(2, Ordering::Relaxed);
                        // SAFETY: as above.
                        unsafe { add_cccd(svc_handle) };
                    }
                    3 => {
                        CHAR_HANDLES[1].store(u32::from(handle), Ordering::Relaxed);
                        info!("BLE GATTS: speed char (handle={})", handle);
                        STEP.store(4, Ordering::Relaxed);
                        // SAFETY: as above.
                        unsafe { add_cccd(svc_handle) };
                    }
                    step => warn!("BLE GATTS: unexpected ADD_CHAR at step {}", step),
                }
            }
            esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_DESCR_EVT => {
                // SAFETY: param is valid for this event kind.
                let handle = unsafe { (*param).add_char_descr.attr_handle };
                let svc_handle = SVC_HANDLE.load(Ordering::Relaxed) as u16;
                match STEP.load(Ordering::Relaxed) {
                    2 => {
                        CCCD_HANDLES[0].store(u32::from(handle), Ordering::Relaxed);
                        STEP.store(3, Ordering::Relaxed);
                        let seed = speed_text(SEED_SPEED.load(Ordering::Relaxed));
                        // SAFETY: as above.
                        unsafe { add_char(svc_handle, CHAR_SPEED, seed.as_bytes()) };
                    }
                    4 => {
                        CCCD_HANDLES[1].store(u32::from(handle), Ordering::Relaxed);
                        STEP.store(5, Ordering::Relaxed);
                        READY.store(true, Ordering::Release);
                        info!("BLE GATTS: all characteristics registered");
                        if !push_event(&WIRELESS_EVENTS, WirelessEvent::Ready) {
                            // Surface never hears about it; advertise the seeded values.
                            start_advertising_raw();
                        }
                    }
                    step => warn!("BLE GATTS: unexpected ADD_CHAR_DESCR at step {}", step),
                }
            }
            esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
                // SAFETY: param is valid for this event kind.
                let conn_id = unsafe { (*param).connect.conn_id };
                CONN_ID.store(u32::from(conn_id), Ordering::Relaxed);
                CONNECTED.store(true, Ordering::Release);
                push_event(&WIRELESS_EVENTS, WirelessEvent::Connected { conn_id });
            }
            esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
                // SAFETY: param is valid for this event kind.
                let conn_id = unsafe { (*param).disconnect.conn_id };
                CONNECTED.store(false, Ordering::Release);
                for i in 0..ATTRS.len() {
                    NOTIFY_ON[i].store(false, Ordering::Relaxed);
                    INDICATE_ON[i].store(false, Ordering::Relaxed);
                }
                if !push_event(&WIRELESS_EVENTS, WirelessEvent::Disconnected { conn_id }) {
                    // Surface never hears about it; re-arm here.
                    start_advertising_raw();
                }
            }
            esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => {
                // SAFETY: param is valid for this event kind; value/len
                // describe a buffer owned by the stack for the callback.
                let (handle, data) = unsafe {
                    let p = &(*param).write;
                    (u32::from(p.handle), core::slice::from_raw_parts(p.value, usize::from(p.len)))
                };
                for (i, id) in ATTRS.iter().enumerate() {
                    if handle == CHAR_HANDLES[i].load(Ordering::Relaxed) {
                        push_event(&WIRELESS_EVENTS, WirelessEvent::written(*id, data));
                        return;
                    }
                    if handle == CCCD_HANDLES[i].load(Ordering::Relaxed) && data.len() >= 2 {
                        let bits = u16::from_le_bytes([data[0], data[1]]);
                        NOTIFY_ON[i].store(bits & 0x0001 != 0, Ordering::Relaxed);
                        INDICATE_ON[i].store(bits & 0x0002 != 0, Ordering::Relaxed);
                        info!("BLE GATTS: {:?} subscription = 0x{:04x}", id, bits);
                        return;
                    }
                }
            }
            _ => {}
        }
    }

    /// Bluedroid-backed GATT server.  Exactly one per process.
    pub struct BluedroidServer {
        _private: (),
    }

    impl BluedroidServer {
        /// Bring up the controller and Bluedroid, register the service.
        ///
        /// Registration finishes asynchronously.  The speed characteristic
        /// is created holding `initial_speed`, and a [`WirelessEvent::Ready`]
        /// is queued once every attribute exists.
        pub fn start(device_name: &str, initial_speed: u32) -> Result<Self, Error> {
            SEED_SPEED.store(initial_speed, Ordering::Relaxed);
            let name = std::ffi::CString::new(device_name)
                .map_err(|_| Error::PeripheralInit("BLE device name"))?;
            // SAFETY: called once from main() before the event thread starts.
            unsafe {
                // BLE-only: release classic BT memory.
                esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

                let mut bt_cfg = esp_bt_controller_config_t::default();
                if esp_bt_controller_init(&mut bt_cfg) != ESP_OK as i32 {
                    return Err(Error::PeripheralInit("bt_controller_init"));
                }
                if esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE) != ESP_OK as i32 {
                    return Err(Error::PeripheralInit("bt_controller_enable"));
                }
                if esp_bluedroid_init() != ESP_OK as i32 {
                    return Err(Error::PeripheralInit("bluedroid_init"));
                }
                if esp_bluedroid_enable() != ESP_OK as i32 {
                    return Err(Error::PeripheralInit("bluedroid_enable"));
                }

                esp_ble_gap_register_callback(Some(gap_event_handler));
                esp_ble_gatts_register_callback(Some(gatts_event_handler));
                esp_ble_gap_set_device_name(name.as_ptr());
                if esp_ble_gatts_app_register(0) != ESP_OK as i32 {
                    return Err(Error::PeripheralInit("gatts_app_register"));
                }
            }
            info!("BLE(espidf): Bluedroid up, registering '{}'", device_name);
            Ok(Self { _private: () })
        }

        fn handle(id: AttributeId) -> u16 {
            CHAR_HANDLES[attr_index(id)].load(Ordering::Relaxed) as u16
        }
    }

    impl AttributeServer for BluedroidServer {
        fn set_value(&mut self, id: AttributeId, value: &[u8]) {
            let handle = Self::handle(id);
            if handle == 0 {
                warn!("BLE: {:?} not registered yet, value dropped", id);
                return;
            }
            let len = value.len().min(MAX_PAYLOAD);
            // SAFETY: the stack copies `len` bytes out of `value`.
            let ret = unsafe { esp_ble_gatts_set_attr_value(handle, len as u16, value.as_ptr()) };
            if ret != ESP_OK as i32 {
                warn!("BLE: set_attr_value({:?}) failed ({})", id, ret);
            }
        }

        fn value(&self, id: AttributeId) -> heapless::Vec<u8, MAX_PAYLOAD> {
            let handle = Self::handle(id);
            let mut len: u16 = 0;
            let mut ptr: *const u8 = core::ptr::null();
            // SAFETY: on success the stack points `ptr` at its own copy of
            // the value, valid until the next write to this handle.
            let status = unsafe { esp_ble_gatts_get_attr_value(handle, &mut len, &mut ptr) };
            if status != esp_gatt_status_t_ESP_GATT_OK || ptr.is_null() {
                return heapless::Vec::new();
            }
            // SAFETY: see above.
            to_payload(unsafe { core::slice::from_raw_parts(ptr, usize::from(len)) })
        }

        fn notify(&mut self, id: AttributeId) -> usize {
            let i = attr_index(id);
            if !CONNECTED.load(Ordering::Acquire) {
                return 0;
            }
            let notify = NOTIFY_ON[i].load(Ordering::Relaxed);
            let indicate = INDICATE_ON[i].load(Ordering::Relaxed);
            if !notify && !indicate {
                return 0;
            }
            let mut value = self.value(id);
            // SAFETY: value outlives the call; the stack copies it.
            let ret = unsafe {
                esp_ble_gatts_send_indicate(
                    GATTS_IF.load(Ordering::Relaxed) as esp_gatt_if_t,
                    CONN_ID.load(Ordering::Relaxed) as u16,
                    Self::handle(id),
                    value.len() as u16,
                    value.as_mut_ptr(),
                    indicate && !notify,
                )
            };
            if ret == ESP_OK as i32 { 1 } else { 0 }
        }

        fn start_advertising(&mut self) {
            if READY.load(Ordering::Acquire) {
                start_advertising_raw();
            }
        }
    }
}

#[cfg(target_os = "espidf")]
pub use esp::BluedroidServer;

// ───────────────────────────────────────────────────────────────
// Simulation server
// ───────────────────────────────────────────────────────────────

/// A notification as a client would receive it.
#[cfg(not(target_os = "espidf"))]
pub type SimNotification = (u16, AttributeId, Vec<u8>);

#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
struct SimState {
    values: [heapless::Vec<u8, MAX_PAYLOAD>; 2],
    subscribers: [Vec<u16>; 2],
    advertising: bool,
    advertise_count: u32,
    client: Option<u16>,
    notifications: Vec<SimNotification>,
    /// Service registration still in flight: values and advertising are dropped.
    registering: bool,
}

/// In-memory single-connection GATT peripheral.
///
/// Clones share state, so a test can keep one handle as the "client side"
/// while the surface owns the other.
#[cfg(not(target_os = "espidf"))]
#[derive(Clone, Default)]
pub struct SimGattServer {
    state: Arc<Mutex<SimState>>,
}

#[cfg(not(target_os = "espidf"))]
impl SimGattServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A server whose service registration has not completed yet, the way
    /// Bluedroid looks right after `start`.
    pub fn registering() -> Self {
        let server = Self::default();
        server.lock().registering = true;
        server
    }

    /// Registration completes.  The attributes come up with the stack's
    /// creation values and the stack reports [`WirelessEvent::Ready`].
    pub fn finish_registration(&self) -> WirelessEvent {
        let mut s = self.lock();
        s.registering = false;
        s.values[attr_index(AttributeId::Speed)] = to_payload(b"0");
        WirelessEvent::Ready
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Client connects.  Only succeeds while advertising; advertising
    /// stops once a client is attached.
    pub fn connect(&self, client: u16) -> bool {
        let mut s = self.lock();
        if !s.advertising || s.client.is_some() {
            return false;
        }
        s.advertising = false;
        s.client = Some(client);
        log::info!("BLE(sim): client {} connected", client);
        true
    }

    /// Current client drops.  Subscriptions are per-connection and go with it.
    pub fn disconnect(&self) -> Option<u16> {
        let mut s = self.lock();
        let client = s.client.take()?;
        for subs in &mut s.subscribers {
            subs.clear();
        }
        log::info!("BLE(sim): client {} disconnected", client);
        Some(client)
    }

    /// Client enables notifications on `id`.
    pub fn subscribe(&self, client: u16, id: AttributeId) {
        let mut s = self.lock();
        let subs = &mut s.subscribers[attr_index(id)];
        if !subs.contains(&client) {
            subs.push(client);
        }
    }

    /// Client writes `data` to `id`.  Like an auto-responding stack, the
    /// raw bytes are stored before the application sees them.  Returns
    /// the event the stack would deliver.
    pub fn client_write(&self, id: AttributeId, data: &[u8]) -> WirelessEvent {
        self.lock().values[attr_index(id)] = to_payload(data);
        WirelessEvent::written(id, data)
    }

    pub fn value_text(&self, id: AttributeId) -> String {
        String::from_utf8_lossy(&self.lock().values[attr_index(id)]).into_owned()
    }

    pub fn is_advertising(&self) -> bool {
        self.lock().advertising
    }

    /// How many times advertising was (re)armed.
    pub fn advertise_count(&self) -> u32 {
        self.lock().advertise_count
    }

    pub fn connected_client(&self) -> Option<u16> {
        self.lock().client
    }

    /// Every notification delivered so far, oldest first.
    pub fn notifications(&self) -> Vec<SimNotification> {
        self.lock().notifications.clone()
    }
}

#[cfg(not(target_os = "espidf"))]
impl AttributeServer for SimGattServer {
    fn set_value(&mut self, id: AttributeId, value: &[u8]) {
        let mut s = self.lock();
        if s.registering {
            log::warn!("BLE(sim): {:?} not registered yet, value dropped", id);
            return;
        }
        s.values[attr_index(id)] = to_payload(value);
    }

    fn value(&self, id: AttributeId) -> heapless::Vec<u8, MAX_PAYLOAD> {
        self.lock().values[attr_index(id)].clone()
    }

    fn notify(&mut self, id: AttributeId) -> usize {
        let mut s = self.lock();
        let i = attr_index(id);
        let value = s.values[i].to_vec();
        let targets = s.subscribers[i].clone();
        for client in &targets {
            s.notifications.push((*client, id, value.clone()));
        }
        targets.len()
    }

    fn start_advertising(&mut self) {
        let mut s = self.lock();
        if s.registering {
            return;
        }
        s.advertising = true;
        s.advertise_count += 1;
        log::info!("BLE(sim): advertising (service {:032x})", SERVICE_UUID);
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
