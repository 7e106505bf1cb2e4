//! WiFi station-mode adapter.
//!
//! Implements [`LinkPort`], the hexagonal boundary for network
//! connectivity.  Retry timing lives in the
//! [`ConnectivitySupervisor`](crate::app::connectivity::ConnectivitySupervisor);
//! this adapter runs exactly one connect sequence per call.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::BlockingWifi` (connect + wait for DHCP).
//! - **all other targets**: simulation with scriptable failures for host-side tests.

use log::{info, warn};

use crate::app::ports::LinkPort;
use crate::error::LinkFault;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// Check credentials before handing them to the driver.  An empty
/// password selects an open network.
pub fn validate_credentials(ssid: &str, password: &str) -> Result<(), LinkFault> {
    if ssid.is_empty() {
        return Err(LinkFault::NoCredentials);
    }
    if ssid.len() > 32 || !is_printable_ascii(ssid) {
        warn!("WiFi: SSID must be 1-32 printable ASCII bytes");
        return Err(LinkFault::ConnectFailed);
    }
    if !password.is_empty() && !(8..=64).contains(&password.len()) {
        warn!("WiFi: password must be 8-64 bytes for WPA2, or empty for open");
        return Err(LinkFault::ConnectFailed);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    ssid: heapless::String<32>,
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimLink,
}

/// Simulated access point behaviour.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
struct SimLink {
    up: bool,
    /// Upcoming connect attempts that will fail.
    failures_pending: u32,
    connect_calls: u32,
}

impl WifiAdapter {
    /// Wrap the driver, apply the station configuration and start the
    /// radio.  Does not connect.
    #[cfg(target_os = "espidf")]
    pub fn new(
        modem: esp_idf_svc::hal::modem::Modem,
        sysloop: esp_idf_svc::eventloop::EspSystemEventLoop,
        nvs: Option<esp_idf_svc::nvs::EspDefaultNvsPartition>,
        ssid: &str,
        password: &str,
    ) -> anyhow::Result<Self> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs)?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;

        let ssid_buf: heapless::String<32> = crate::config::bounded(ssid);
        let pass_buf: heapless::String<64> = crate::config::bounded(password);
        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };

        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: ssid_buf.clone(),
            password: pass_buf,
            auth_method,
            ..Default::default()
        }))?;
        wifi.start()?;
        info!("WiFi(espidf): station started");

        Ok(Self { ssid: ssid_buf, wifi })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(ssid: &str, _password: &str) -> Self {
        Self {
            ssid: crate::config::bounded(ssid),
            sim: SimLink::default(),
        }
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    // ── Simulation controls ──────────────────────────────────

    /// Make the next `n` connect attempts fail.
    #[cfg(not(target_os = "espidf"))]
    pub fn fail_next(&mut self, n: u32) {
        self.sim.failures_pending = n;
    }

    /// Simulate the access point dropping the station.
    #[cfg(not(target_os = "espidf"))]
    pub fn drop_link(&mut self) {
        if self.sim.up {
            info!("WiFi(sim): link dropped");
        }
        self.sim.up = false;
    }

    /// Total connect sequences run so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn connect_calls(&self) -> u32 {
        self.sim.connect_calls
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), LinkFault> {
        if let Err(e) = self.wifi.connect() {
            warn!("WiFi(espidf): connect failed: {:?}", e);
            return Err(LinkFault::ConnectFailed);
        }
        if let Err(e) = self.wifi.wait_netif_up() {
            warn!("WiFi(espidf): DHCP failed: {:?}", e);
            let _ = self.wifi.disconnect();
            return Err(LinkFault::ConnectFailed);
        }
        if let Ok(ip_info) = self.wifi.wifi().sta_netif().get_ip_info() {
            info!("WiFi(espidf): IP {}", ip_info.ip);
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), LinkFault> {
        self.sim.connect_calls += 1;
        if self.sim.failures_pending > 0 {
            self.sim.failures_pending -= 1;
            warn!("WiFi(sim): simulated connect failure (call {})", self.sim.connect_calls);
            return Err(LinkFault::ConnectFailed);
        }
        self.sim.up = true;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim.up
    }
}

// ───────────────────────────────────────────────────────────────
// LinkPort
// ───────────────────────────────────────────────────────────────

impl LinkPort for WifiAdapter {
    fn connect(&mut self) -> Result<(), LinkFault> {
        if self.ssid.is_empty() {
            return Err(LinkFault::NoCredentials);
        }
        info!("WiFi: connecting to '{}'", self.ssid);
        self.platform_connect()?;
        info!("WiFi: connected");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
