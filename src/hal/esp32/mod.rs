//! M5Stack Core2 / Tough hardware abstraction layer.
//!
//! Concrete implementations of the [`crate::traits`] interfaces on top of
//! esp-idf-hal and esp-idf-svc.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-D0WDQ6-V3 (dual core 240MHz, 16MB Flash, 8MB PSRAM)
//! - **Power**: AXP192 PMIC on the internal I2C bus
//! - **Display**: ILI9342C 320x240 IPS (SPI)
//! - **Touch**: FT6336U capacitive controller (I2C)
//! - **Speaker**: driven from a PWM pin
//!
//! # Feature Gates
//!
//! | Feature | Adds |
//! |---------|------|
//! | `esp32` | Clock, delay, power, touch, speaker, display, NVS store, restart |
//! | `wifi` | Radio, mDNS, peer HTTP client, [`Esp32Platform`] |
//! | `esp32-http` | Config portal server |
//!
//! # Pin Assignments
//!
//! See the [`pins`] module.

mod clock;
mod display;
mod power;
mod speaker;
mod storage;
mod system;
mod touch;

pub use clock::{Esp32Clock, Esp32Delay};
pub use display::{init_display, Esp32Display, Panel};
pub use power::{init_display_power, AXP192_ADDR};
pub use speaker::Esp32Speaker;
pub use storage::Esp32Store;
pub use system::Esp32System;
pub use touch::{Esp32Touch, FT6336_ADDR};

#[cfg(feature = "wifi")]
mod mdns;
#[cfg(feature = "wifi")]
mod peer_client;
#[cfg(feature = "wifi")]
mod wifi;

#[cfg(feature = "wifi")]
pub use mdns::Esp32Mdns;
#[cfg(feature = "wifi")]
pub use peer_client::Esp32PeerClient;
#[cfg(feature = "wifi")]
pub use wifi::Esp32Wifi;

#[cfg(feature = "esp32-http")]
mod http;
#[cfg(feature = "esp32-http")]
pub use http::Esp32PortalServer;

/// Type bindings for the device build.
#[cfg(feature = "wifi")]
pub struct Esp32Platform;

#[cfg(feature = "wifi")]
impl crate::app::Platform for Esp32Platform {
    type Radio = Esp32Wifi;
    type Browser = Esp32Mdns;
    type Client = Esp32PeerClient;
    type Display = Esp32Display;
    type Store = Esp32Store;
    type Touch = Esp32Touch<esp_idf_hal::i2c::I2cDriver<'static>>;
    type Speaker = Esp32Speaker<'static>;
    type Dns = crate::services::UdpCaptiveDns;
    type Delay = Esp32Delay;
    type System = Esp32System;
}

/// Pin assignments for the M5Stack Core2.
///
/// Internal wiring, fixed by the board.
pub mod pins {
    // =========================================================================
    // Internal I2C (AXP192, FT6336U, RTC)
    // =========================================================================

    /// I2C data
    pub const I2C_SDA: i32 = 21;

    /// I2C clock
    pub const I2C_SCL: i32 = 22;

    // =========================================================================
    // SPI (LCD, SD card)
    // =========================================================================

    /// SPI clock
    pub const SPI_SCLK: i32 = 18;

    /// SPI MOSI
    pub const SPI_MOSI: i32 = 23;

    /// SPI MISO
    pub const SPI_MISO: i32 = 38;

    /// LCD chip select
    pub const LCD_CS: i32 = 5;

    /// LCD data/command select
    pub const LCD_DC: i32 = 15;

    // =========================================================================
    // Audio
    // =========================================================================

    /// Speaker PWM output
    pub const SPEAKER: i32 = 2;
}
