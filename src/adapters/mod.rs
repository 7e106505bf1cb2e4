//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter   | Implements          | Device (espidf)          | Host simulation  |
//! |-----------|---------------------|--------------------------|------------------|
//! | `ble`     | AttributeServer     | Bluedroid GATT server    | `SimGattServer`  |
//! | `dht`     | EnvironmentSensor   | DHT22 on GPIO23          | `SimDht`         |
//! | `display` | DisplayPort         | SSD1306 over I²C         | `SimDisplay`     |
//! | `pwm`     | PwmPort             | LEDC channel 0           | `SimPwm`         |
//! | `uplink`  | TelemetryPostPort   | ESP-IDF HTTP client      | `SimUplink`      |
//! | `wifi`    | LinkPort            | ESP-IDF WiFi STA         | scripted link    |

pub mod ble;
pub mod dht;
pub mod display;
pub mod pwm;
pub mod uplink;
pub mod wifi;
