//! ESPFAN firmware entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  LedcFan      BluedroidServer   WifiAdapter   Dht22Sensor    │
//! │  (PwmPort)    (AttributeServer) (LinkPort)    (Environment)  │
//! │  OledDisplay  HttpUplink                                     │
//! │  (DisplayPort)(TelemetryPostPort)                            │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │   event thread: WirelessControlSurface ── ActuatorState      │
//! │   main thread:  MainCycle (link · sample · display · notify) │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! On any target other than ESP-IDF the same wiring runs against the
//! simulation adapters, with a scripted BLE client poking the surface.
#![deny(unused_must_use)]

use log::info;

use espfan::config::NodeConfig;

fn banner() {
    info!("╔══════════════════════════════════════╗");
    info!("║  ESPFAN v{:<28}║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");
}

fn load_config() -> NodeConfig {
    match NodeConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("{}, using defaults", e);
            NodeConfig::default()
        }
    }
}

// ── ESP-IDF ───────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use std::sync::Arc;

    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::hal::gpio::IOPin;
    use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::units::Hertz;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use log::warn;

    use espfan::adapters::ble::BluedroidServer;
    use espfan::adapters::dht::Dht22Sensor;
    use espfan::adapters::display::OledDisplay;
    use espfan::adapters::pwm::LedcFan;
    use espfan::adapters::uplink::HttpUplink;
    use espfan::adapters::wifi::{validate_credentials, WifiAdapter};
    use espfan::app::connectivity::{ConnectivitySupervisor, RetryPolicy};
    use espfan::app::cycle::MainCycle;
    use espfan::app::events::WIRELESS_EVENTS;
    use espfan::app::surface::WirelessControlSurface;
    use espfan::control::{ActuatorState, DutyCycleMapper};
    use espfan::pins;
    use espfan::sensors::SensorSampler;

    // ── 1. Bootstrap ──────────────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    banner();

    let config = load_config();
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    // Bluedroid keeps its bonding state in NVS, so this must precede BLE init.
    let nvs = EspDefaultNvsPartition::take()?;

    // ── 2. Fan output ─────────────────────────────────────────
    let fan = match LedcFan::new(config.pwm_frequency_hz, config.pwm_resolution_bits) {
        Ok(fan) => fan,
        Err(e) => {
            log::error!("LEDC init failed: {}, halting", e);
            #[allow(clippy::empty_loop)]
            loop {}
        }
    };
    let actuator = Arc::new(ActuatorState::new(
        fan,
        DutyCycleMapper::from_config(&config),
        config.initial_duty,
    ));

    // ── 3. Display ────────────────────────────────────────────
    info!("I2C: SDA GPIO{} SCL GPIO{}", pins::I2C_SDA_GPIO, pins::I2C_SCL_GPIO);
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_BAUD_HZ)),
    )?;
    let display = match OledDisplay::new(i2c) {
        Ok(display) => display,
        Err(e) => {
            log::error!("SSD1306 allocation failed: {}, halting", e);
            #[allow(clippy::empty_loop)]
            loop {}
        }
    };

    // ── 4. BLE surface + event thread ─────────────────────────
    let server = match BluedroidServer::start(&config.device_name, actuator.current_speed()) {
        Ok(server) => server,
        Err(e) => {
            log::error!("{}, halting", e);
            #[allow(clippy::empty_loop)]
            loop {}
        }
    };
    let surface = Arc::new(WirelessControlSurface::new(server, Arc::clone(&actuator)));
    surface.start();

    let events_surface = Arc::clone(&surface);
    std::thread::Builder::new()
        .name("ble-events".into())
        .stack_size(6 * 1024)
        .spawn(move || events_surface.run_event_loop(&WIRELESS_EVENTS))?;

    // ── 5. Wi-Fi station ──────────────────────────────────────
    if let Err(e) = validate_credentials(&config.wifi_ssid, &config.wifi_password) {
        warn!("WiFi credentials unusable ({}), node will stay offline", e);
    }
    let wifi = WifiAdapter::new(
        peripherals.modem,
        sysloop,
        Some(nvs),
        &config.wifi_ssid,
        &config.wifi_password,
    )?;
    let supervisor = ConnectivitySupervisor::new(wifi, RetryPolicy::from_config(&config));

    // ── 6. Sensor ─────────────────────────────────────────────
    let dht = Dht22Sensor::new(peripherals.pins.gpio23.downgrade())?;

    // ── 7. Main cycle (never returns) ─────────────────────────
    let mut cycle = MainCycle::new(supervisor, SensorSampler::new(dht), display, surface, &config)
        .with_uplink(Box::new(HttpUplink::new()), &config);
    info!("Boot complete, fan at {} RPM", actuator.current_speed());
    cycle.run(&mut FreeRtos)
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod host {
    use std::time::Duration;

    use embedded_hal::delay::DelayNs;

    /// Console subscriber for the simulation.  `RUST_LOG` overrides the
    /// default `info` filter; `log` records are bridged in.
    pub fn init_logging() -> anyhow::Result<()> {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow::anyhow!("logger: {e}"))
    }

    /// Thread-sleep delay standing in for FreeRTOS ticks.
    pub struct StdDelay;

    impl DelayNs for StdDelay {
        fn delay_ns(&mut self, ns: u32) {
            std::thread::sleep(Duration::from_nanos(u64::from(ns)));
        }

        fn delay_ms(&mut self, ms: u32) {
            std::thread::sleep(Duration::from_millis(u64::from(ms)));
        }
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    use std::sync::Arc;
    use std::time::Duration;

    use espfan::adapters::ble::SimGattServer;
    use espfan::adapters::dht::SimDht;
    use espfan::adapters::display::SimDisplay;
    use espfan::adapters::pwm::SimPwm;
    use espfan::adapters::uplink::SimUplink;
    use espfan::adapters::wifi::WifiAdapter;
    use espfan::app::connectivity::{ConnectivitySupervisor, RetryPolicy};
    use espfan::app::cycle::MainCycle;
    use espfan::app::events::{push_event, AttributeId, WirelessEvent, WIRELESS_EVENTS};
    use espfan::app::surface::WirelessControlSurface;
    use espfan::control::{ActuatorState, DutyCycleMapper};
    use espfan::sensors::SensorSampler;

    host::init_logging()?;
    banner();

    let config = load_config();
    let ssid = if config.wifi_ssid.is_empty() { "espfan-sim" } else { config.wifi_ssid.as_str() };

    let pwm = SimPwm::new();
    let actuator = Arc::new(ActuatorState::new(
        pwm.clone(),
        DutyCycleMapper::from_config(&config),
        config.initial_duty,
    ));

    let gatt = SimGattServer::new();
    let surface = Arc::new(WirelessControlSurface::new(gatt.clone(), Arc::clone(&actuator)));
    surface.start();

    let events_surface = Arc::clone(&surface);
    std::thread::Builder::new()
        .name("ble-events".into())
        .spawn(move || events_surface.run_event_loop(&WIRELESS_EVENTS))?;

    // Scripted client: connect, subscribe, then step the fan speed.
    let client = gatt;
    std::thread::Builder::new().name("sim-client".into()).spawn(move || {
        const CLIENT: u16 = 1;
        std::thread::sleep(Duration::from_secs(1));
        if !client.connect(CLIENT) {
            return;
        }
        push_event(&WIRELESS_EVENTS, WirelessEvent::Connected { conn_id: CLIENT });
        client.subscribe(CLIENT, AttributeId::Telemetry);
        client.subscribe(CLIENT, AttributeId::Speed);
        for speed in ["750", "1500", "0", "750"] {
            std::thread::sleep(Duration::from_secs(5));
            push_event(&WIRELESS_EVENTS, client.client_write(AttributeId::Speed, speed.as_bytes()));
        }
    })?;

    let supervisor = ConnectivitySupervisor::new(
        WifiAdapter::new(ssid, &config.wifi_password),
        RetryPolicy::from_config(&config),
    );
    let sensor = SimDht::new(22.5, 40.0);
    let mut cycle = MainCycle::new(supervisor, SensorSampler::new(sensor), SimDisplay::echoing(), surface, &config)
        .with_uplink(Box::new(SimUplink::new()), &config);
    info!("Simulation up, fan at {} RPM (duty {:?})", actuator.current_speed(), pwm.last_duty());
    cycle.run(&mut host::StdDelay)
}
