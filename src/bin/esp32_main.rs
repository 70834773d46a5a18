//! M5Stack Core2 / Tough SmartEVSE display.
//!
//! This is the main entry point for the physical display.
//! It joins Wi-Fi (or opens the onboarding access point) and then runs a
//! 20Hz loop that:
//! - Answers captive DNS queries and config portal requests
//! - Turns touch input into mode changes and device selection
//! - Mirrors the SmartEVSE LCD once per second
//! - Polls the SmartEVSE status and redraws the buttons and status bar
//!
//! # Build
//!
//! ```bash
//! cargo build --release --features esp32-net --bin esp32_main
//!
//! # Bake in credentials for a first boot without the portal
//! WIFI_SSID=Home WIFI_PASSWORD=secret cargo build --release --features esp32-net
//!
//! # Flash and monitor
//! espflash flash --monitor target/xtensa-esp32-espidf/release/esp32_main
//! ```

use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::log::EspLogger;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use evse_display::hal::esp32::{
    init_display, init_display_power, Esp32Clock, Esp32Delay, Esp32Mdns, Esp32PeerClient,
    Esp32Platform, Esp32PortalServer, Esp32Speaker, Esp32Store, Esp32System, Esp32Touch,
    Esp32Wifi,
};
use evse_display::services::{PortalHandler, PortalMailbox, UdpCaptiveDns};
use evse_display::traits::{Clock, StatusDisplay, WifiRadio};
use evse_display::{App, Config, Devices, NetworkMode, WifiConfig};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    EspLogger::initialize_default();

    println!();
    println!("================================");
    println!("  SmartEVSE Display");
    println!("================================");
    println!();

    // =========================================================================
    // Configuration
    // =========================================================================
    // Persisted NVS values win over these compile-time defaults
    let config = Config::default().with_wifi(
        WifiConfig::default()
            .with_ssid(option_env!("WIFI_SSID").unwrap_or(""))
            .with_password(option_env!("WIFI_PASSWORD").unwrap_or("")),
    );
    let tick_ms = config.ui.tick_ms;

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // =========================================================================
    // Power + Touch (internal I2C on GPIO21/22)
    // =========================================================================
    let mut i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21, // SDA
        peripherals.pins.gpio22, // SCL
        &I2cConfig::new().baudrate(400.kHz().into()),
    )?;
    init_display_power(&mut i2c)
        .map_err(|e| anyhow::anyhow!("AXP192 init failed: {:?}", e))?;
    println!("[OK] AXP192 rails up");

    // =========================================================================
    // Display (ILI9342C on SPI2)
    // =========================================================================
    let mut display = init_display(
        peripherals.spi2,
        peripherals.pins.gpio18,
        peripherals.pins.gpio23,
        AnyIOPin::from(peripherals.pins.gpio38),
        peripherals.pins.gpio5.into(),
        peripherals.pins.gpio15.into(),
    )?;
    let _ = display.show_message("SmartEVSE", Some("Starting..."));
    println!("[OK] Display initialized");

    let touch = Esp32Touch::new(i2c);
    let speaker = Esp32Speaker::new(
        peripherals.ledc.timer0,
        peripherals.ledc.channel0,
        peripherals.pins.gpio2,
    )?;
    println!("[OK] Touch + speaker initialized");

    // =========================================================================
    // Network + storage
    // =========================================================================
    let store = Esp32Store::new(nvs.clone())?;
    let radio = Esp32Wifi::new(peripherals.modem, sysloop, Some(nvs))?;

    let devices: Devices<Esp32Platform> = Devices {
        radio,
        browser: Esp32Mdns::new(),
        client: Esp32PeerClient::new(),
        display,
        store,
        touch,
        speaker,
        dns: UdpCaptiveDns::new(),
        delay: Esp32Delay,
        system: Esp32System,
    };

    let mailbox = Arc::new(PortalMailbox::new());
    let clock = Esp32Clock::new();
    let mut app = App::new(config, devices, Arc::clone(&mailbox));

    let mode = app.boot(clock.now_ms());
    match mode {
        NetworkMode::Station => println!(
            "[OK] WiFi connected: {:?}",
            app.devices().radio.ip_addr()
        ),
        NetworkMode::AccessPoint => println!(
            "[OK] Onboarding AP '{}' ready",
            app.config().access_point.ssid
        ),
        NetworkMode::Offline => println!("[WARN] Radio offline"),
    }

    // =========================================================================
    // Config portal (both modes)
    // =========================================================================
    let _server = if app.config().web.enabled {
        Some(Esp32PortalServer::new(
            &app.config().web,
            PortalHandler::new(Arc::clone(&mailbox)),
        )?)
    } else {
        println!("[SKIP] Config portal disabled");
        None
    };

    println!();
    println!("Starting display loop ({}ms tick)...", tick_ms);
    println!();

    // =========================================================================
    // Main Loop
    // =========================================================================
    loop {
        app.tick(clock.now_ms());
        thread::sleep(Duration::from_millis(u64::from(tick_ms)));
    }
}
