//! Beeper using ESP32 LEDC PWM.
//!
//! A 50% duty square wave is driven at the requested frequency for the
//! requested time, then silenced.

use crate::traits::Speaker;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::OutputPin;
use esp_idf_hal::ledc::{
    config::TimerConfig, LedcChannel, LedcDriver, LedcTimer, LedcTimerDriver, Resolution, TIMER0,
};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;
use esp_idf_hal::sys::{self, EspError};

/// PWM beeper on LEDC timer 0.
pub struct Esp32Speaker<'d> {
    channel: LedcDriver<'d>,
}

impl<'d> Esp32Speaker<'d> {
    /// PWM resolution; 8 bits leaves room for audio-range frequencies
    const PWM_RESOLUTION: Resolution = Resolution::Bits8;

    /// Creates a silent beeper.
    ///
    /// # Errors
    ///
    /// Returns an error if LEDC initialization fails.
    pub fn new<T, C, CI, P, PI>(timer: T, channel: C, pin: P) -> Result<Self, EspError>
    where
        T: Peripheral<P = TIMER0> + 'd,
        CI: LedcChannel<SpeedMode = <TIMER0 as LedcTimer>::SpeedMode> + 'd,
        C: Peripheral<P = CI> + 'd,
        PI: OutputPin + 'd,
        P: Peripheral<P = PI> + 'd,
    {
        let timer_config = TimerConfig::default()
            .frequency(1.kHz().into())
            .resolution(Self::PWM_RESOLUTION);
        let timer_driver = LedcTimerDriver::new(timer, &timer_config)?;
        let mut channel = LedcDriver::new(channel, timer_driver, pin)?;
        channel.set_duty(0)?;
        Ok(Self { channel })
    }

    fn play(&mut self, frequency_hz: u32, duration_ms: u32) -> Result<(), EspError> {
        // The timer driver is owned by the channel, so retune it through ESP-IDF
        // Safe: timer 0 is configured above and owned by this struct
        sys::esp!(unsafe {
            sys::ledc_set_freq(
                sys::ledc_mode_t_LEDC_LOW_SPEED_MODE,
                sys::ledc_timer_t_LEDC_TIMER_0,
                frequency_hz,
            )
        })?;
        self.channel.set_duty(self.channel.get_max_duty() / 2)?;
        FreeRtos::delay_ms(duration_ms);
        self.channel.set_duty(0)
    }
}

impl Speaker for Esp32Speaker<'_> {
    fn tone(&mut self, frequency_hz: u32, duration_ms: u32) {
        if let Err(e) = self.play(frequency_hz, duration_ms) {
            log::debug!("[UI] Beep failed: {:?}", e);
        }
    }
}
