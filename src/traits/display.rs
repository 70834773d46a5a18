//! Display abstraction for the companion status screen.
//!
//! This module defines the [`StatusDisplay`] trait. The main loop decides
//! *what* changed and calls only the matching draw method, so implementations
//! can redraw individual screen regions without tracking state themselves.
//!
//! # Screen Regions (320x240, landscape)
//!
//! | Region | Area | Drawn by |
//! |--------|------|----------|
//! | Mirrored LCD | x 32..288, y 0..128 | [`StatusDisplay::draw_lcd`] |
//! | Buttons | y 128..184 | [`StatusDisplay::draw_buttons`] |
//! | Status bar | y 204..240 | [`StatusDisplay::draw_status_bar`] |

use core::fmt::Debug;

use crate::bitmap::LcdFrame;
use crate::discovery::PeerHost;
use crate::onboarding::OnboardingScreen;
use crate::reconciler::{ButtonLayout, StatusBar};

/// Display trait for rendering the companion screen.
///
/// Implementors provide hardware-specific rendering (the ILI9342C panel via
/// embedded-graphics) or record calls for testing.
///
/// # Example
///
/// ```ignore
/// use evse_display::traits::StatusDisplay;
///
/// struct MyDisplay { /* ... */ }
///
/// impl StatusDisplay for MyDisplay {
///     type Error = ();
///
///     fn clear(&mut self) -> Result<(), ()> { Ok(()) }
///     fn draw_buttons(&mut self, layout: ButtonLayout) -> Result<(), ()> {
///         // Fill rounded rectangles, outline the active mode
///         Ok(())
///     }
///     // ...
/// }
/// ```
pub trait StatusDisplay {
    /// Error type for display operations.
    type Error: Debug;

    /// Clears the whole screen to black.
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Shows a simple centered message (e.g., "Connecting to WiFi...").
    fn show_message(&mut self, line1: &str, line2: Option<&str>) -> Result<(), Self::Error>;

    /// Renders the access-point onboarding screen with its join code.
    fn draw_onboarding(&mut self, screen: &OnboardingScreen) -> Result<(), Self::Error>;

    /// Redraws the button row for the given layout.
    fn draw_buttons(&mut self, layout: ButtonLayout) -> Result<(), Self::Error>;

    /// Redraws the status bar and error line.
    fn draw_status_bar(&mut self, status: &StatusBar) -> Result<(), Self::Error>;

    /// Blits a mirrored peer LCD frame, scaled 2x.
    fn draw_lcd(&mut self, frame: &LcdFrame) -> Result<(), Self::Error>;

    /// Draws the "No connection" placeholder in the LCD area.
    fn draw_lcd_placeholder(&mut self) -> Result<(), Self::Error>;

    /// Renders the device picker with one row per candidate.
    ///
    /// An empty slice renders a "No devices found" notice.
    fn draw_picker(&mut self, hosts: &[PeerHost]) -> Result<(), Self::Error>;
}
