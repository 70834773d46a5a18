//! ILI9342C panel of the M5Stack Core2 / Tough.
//!
//! The panel shares the SPI bus with the SD slot and runs in landscape,
//! 320x240, RGB565. Rendering itself lives in
//! [`GraphicsDisplay`](crate::render::GraphicsDisplay); this module only
//! brings the panel up.
//!
//! The panel needs its rails from the AXP192, so call
//! [`init_display_power`](super::init_display_power) first.

use crate::render::GraphicsDisplay;
use anyhow::anyhow;
use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, Output, OutputPin, PinDriver};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;
use esp_idf_hal::spi::{self, SpiAnyPins, SpiDeviceDriver, SpiDriver, SpiDriverConfig};
use mipidsi::interface::SpiInterface;
use mipidsi::models::ILI9342CRgb565;
use mipidsi::options::{ColorInversion, ColorOrder};
use mipidsi::{Builder, NoResetPin};

/// Panel SPI clock.
const SPI_BAUDRATE_MHZ: u32 = 40;

/// Concrete mipidsi driver type.
pub type Panel = mipidsi::Display<
    SpiInterface<
        'static,
        SpiDeviceDriver<'static, SpiDriver<'static>>,
        PinDriver<'static, AnyOutputPin, Output>,
    >,
    ILI9342CRgb565,
    NoResetPin,
>;

/// The status screen drawn onto the Core2 panel.
pub type Esp32Display = GraphicsDisplay<Panel>;

/// Initialize the panel and wrap it in the status renderer.
///
/// # Errors
///
/// Returns an error if the SPI bus or the panel fails to initialize.
pub fn init_display<SPI: SpiAnyPins>(
    spi: impl Peripheral<P = SPI> + 'static,
    sclk: impl Peripheral<P = impl OutputPin> + 'static,
    mosi: impl Peripheral<P = impl OutputPin> + 'static,
    miso: AnyIOPin,
    cs: AnyOutputPin,
    dc: AnyOutputPin,
) -> anyhow::Result<Esp32Display> {
    let driver = SpiDriver::new(spi, sclk, mosi, Some(miso), &SpiDriverConfig::new())?;
    let device = SpiDeviceDriver::new(
        driver,
        Some(cs),
        &spi::config::Config::new().baudrate(SPI_BAUDRATE_MHZ.MHz().into()),
    )?;
    let dc = PinDriver::output(dc)?;

    // Lives as long as the panel, which is never dropped
    let buffer: &'static mut [u8] = Box::leak(Box::new([0u8; 512]));
    let interface = SpiInterface::new(device, dc, buffer);

    let panel = Builder::new(ILI9342CRgb565, interface)
        .display_size(320, 240)
        .color_order(ColorOrder::Bgr)
        .invert_colors(ColorInversion::Inverted)
        .init(&mut Ets)
        .map_err(|e| anyhow!("panel init failed: {:?}", e))?;

    log::info!("[UI] Display initialized");
    Ok(GraphicsDisplay::new(panel))
}
