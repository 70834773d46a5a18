//! Chip restart.

use crate::traits::System;

/// Restarts the ESP32 through ESP-IDF.
#[derive(Default)]
pub struct Esp32System;

impl System for Esp32System {
    fn restart(&mut self) {
        log::info!("[System] Restarting");
        esp_idf_hal::reset::restart();
    }
}
