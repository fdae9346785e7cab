//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements         | Connects to                 |
//! |-------------|--------------------|-----------------------------|
//! | `hardware`  | SensorPort         | ESP32 ADC1 oneshot          |
//! |             | RelayPort          | Relay GPIO                  |
//! | `log_sink`  | EventSink          | Serial log output           |
//! | `display`   | DisplayPort        | Dashboard (log-backed)      |
//! | `wifi`      | ConnectivityPort   | ESP-IDF WiFi STA            |
//! | `mqtt`      | UplinkPort         | MQTT broker over `wifi`     |
//! | `console`   | (command source)   | UART / USB-CDC stdin        |
//! | `time`      | uptime             | ESP32 system timer          |

pub mod console;
pub mod display;
pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod time;
pub mod utils;
pub mod wifi;
