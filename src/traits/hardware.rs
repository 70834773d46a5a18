//! Hardware abstraction traits for time, touch input, sound and system control.
//!
//! This module defines the board-level interfaces that allow evse-display to
//! run on the M5Stack hardware and on desktop with mocks.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`Clock`] | Monotonic millisecond time source |
//! | [`Delay`] | Blocking delay used by retry loops |
//! | [`TouchInput`] | Capacitive touch panel |
//! | [`Speaker`] | Button feedback beep |
//! | [`System`] | Device restart |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For ESP32 hardware, use the
//! implementations from `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use evse_display::traits::{Clock, Delay};
//! use evse_display::hal::{MockClock, MockDelay};
//!
//! let clock = MockClock::new();
//! let mut delay = MockDelay::new();
//!
//! delay.delay_ms(500);
//! assert_eq!(delay.total_ms, 500);
//! assert_eq!(clock.now_ms(), 0);
//! ```

/// A single touch contact in screen coordinates.
///
/// The origin is the top-left corner of the 320x240 panel in landscape
/// orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TouchPoint {
    /// Horizontal position in pixels.
    pub x: i32,
    /// Vertical position in pixels.
    pub y: i32,
}

impl TouchPoint {
    /// Creates a touch point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Time source trait.
///
/// Provides monotonic time in milliseconds for cache ages, tick scheduling
/// and gesture timing. On desktop, this can wrap `std::time::Instant`. On
/// embedded, use a hardware timer.
///
/// # Example
///
/// ```rust
/// use evse_display::traits::Clock;
/// use evse_display::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}

/// Blocking delay.
///
/// All network work runs on the single cooperative main loop, so retry
/// loops (association polling, discovery rounds) simply block.
pub trait Delay {
    /// Block for the specified number of milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// Touch panel input.
///
/// Implementations report the first active contact, if any. Gesture
/// detection (tap, long press) is done by [`crate::reconciler::TouchTracker`].
pub trait TouchInput {
    /// Error type for touch reads.
    type Error;

    /// Returns the current contact, or `None` when the panel is not touched.
    fn read(&mut self) -> Result<Option<TouchPoint>, Self::Error>;
}

/// Speaker used for audible button feedback.
pub trait Speaker {
    /// Play a tone of `frequency_hz` for `duration_ms`.
    fn tone(&mut self, frequency_hz: u32, duration_ms: u32);

    /// The short click played on every accepted button press.
    fn beep(&mut self) {
        self.tone(1000, 50);
    }
}

/// System control.
pub trait System {
    /// Restart the device.
    ///
    /// Hardware implementations do not return.
    fn restart(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingSpeaker(Vec<(u32, u32)>);

    impl Speaker for RecordingSpeaker {
        fn tone(&mut self, frequency_hz: u32, duration_ms: u32) {
            self.0.push((frequency_hz, duration_ms));
        }
    }

    #[test]
    fn default_beep_is_short_1khz_tone() {
        let mut speaker = RecordingSpeaker(Vec::new());
        speaker.beep();
        assert_eq!(speaker.0, vec![(1000, 50)]);
    }

    #[test]
    fn touch_point_new() {
        let p = TouchPoint::new(10, 20);
        assert_eq!(p.x, 10);
        assert_eq!(p.y, 20);
    }
}
