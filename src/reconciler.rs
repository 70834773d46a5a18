//! Touch handling and button reconciliation for the main screen.
//!
//! [`reconcile`] is a pure function from the connection facts and the
//! latest gesture to the button layout and the side effects to run. The
//! main loop executes the commands and redraws only what changed.
//!
//! # Layout (320x240)
//!
//! ```text
//!  y=0    +--------- mirrored LCD 256x128 ---------+
//!  y=128  [  Solar  ]              [  Smart  ]       peer connected
//!         [          Select EVSE             ]       peer not connected
//!  y=204  WIFI o  EVSE o  Mode:Smart
//!  y=224  Error: None
//! ```
//!
//! # Gestures
//!
//! | Gesture | Where | Effect |
//! |---------|-------|--------|
//! | Tap | inactive mode button | Beep, change mode |
//! | Tap | Select EVSE | Beep, open device picker |
//! | Hold >= 2 s | upper two-thirds | Beep, open device picker |
//!
//! All touches are ignored while Wi-Fi is down.

use heapless::Vec as HVec;

use crate::state::{ChargeMode, ConnectionState, ErrorKind};
use crate::traits::TouchPoint;

// ============================================================================
// Geometry
// ============================================================================

/// Screen width in pixels.
pub const SCREEN_WIDTH: i32 = 320;
/// Screen height in pixels.
pub const SCREEN_HEIGHT: i32 = 240;

/// Axis-aligned rectangle in screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Rect {
    /// Creates a rectangle.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns true if `p` lies inside (right and bottom edges exclusive).
    pub fn contains(&self, p: TouchPoint) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }
}

/// Mirrored LCD area (128x64 at 2x).
pub const LCD_AREA: Rect = Rect::new(32, 0, 256, 128);
/// Solar mode button.
pub const SOLAR_BUTTON: Rect = Rect::new(16, 128, 128, 56);
/// Smart mode button.
pub const SMART_BUTTON: Rect = Rect::new(176, 128, 128, 56);
/// Full-width device selection button.
pub const SELECT_BUTTON: Rect = Rect::new(16, 128, SCREEN_WIDTH - 32, 56);
/// Status bar and error line.
pub const STATUS_AREA: Rect = Rect::new(0, 204, SCREEN_WIDTH, 36);
/// Long presses must start above this line.
pub const LONG_PRESS_MAX_Y: i32 = SCREEN_HEIGHT * 2 / 3;

// ============================================================================
// Touch Tracking
// ============================================================================

/// A completed touch gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gesture {
    /// Press followed by release; carries the press position.
    Tap(TouchPoint),
    /// Press held past the threshold; fires once, carries the press position.
    LongPress(TouchPoint),
}

#[derive(Clone, Copy, Debug)]
struct Press {
    at: TouchPoint,
    since_ms: u64,
    long_fired: bool,
}

/// Turns raw touch samples into gestures.
#[derive(Debug)]
pub struct TouchTracker {
    long_press_ms: u64,
    press: Option<Press>,
}

impl TouchTracker {
    /// Creates a tracker with the given hold threshold.
    pub fn new(long_press_ms: u64) -> Self {
        Self {
            long_press_ms,
            press: None,
        }
    }

    /// Feeds one sample; `None` means the panel is not touched.
    pub fn update(&mut self, touch: Option<TouchPoint>, now_ms: u64) -> Option<Gesture> {
        let Some(at) = touch else {
            let press = self.press.take()?;
            return (!press.long_fired).then_some(Gesture::Tap(press.at));
        };

        if let Some(press) = self.press.as_mut() {
            let held = now_ms.saturating_sub(press.since_ms);
            if !press.long_fired && held >= self.long_press_ms {
                press.long_fired = true;
                return Some(Gesture::LongPress(press.at));
            }
            return None;
        }

        self.press = Some(Press {
            at,
            since_ms: now_ms,
            long_fired: false,
        });
        None
    }

    /// Returns true while the panel is held.
    pub fn is_pressed(&self) -> bool {
        self.press.is_some()
    }

    /// Drops any press in progress (e.g., when the screen changes under it).
    pub fn reset(&mut self) {
        self.press = None;
    }
}

// ============================================================================
// Reconciliation
// ============================================================================

/// Which buttons are on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonLayout {
    /// Solar and Smart, with `active` outlined.
    ModePair {
        /// Currently active mode.
        active: ChargeMode,
    },
    /// A single "Select EVSE" button.
    SelectDevice,
}

/// Side effects requested by the reconciler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiCommand {
    /// Play the feedback tone.
    Beep,
    /// Ask the peer to switch mode.
    ChangeMode(ChargeMode),
    /// Run discovery and show the device picker.
    OpenDevicePicker,
}

/// Inputs of the reconciler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UiFacts {
    /// Station is associated.
    pub wifi_connected: bool,
    /// Peer reachable.
    pub peer_connected: bool,
    /// Current charge mode.
    pub charge_mode: ChargeMode,
}

impl UiFacts {
    /// Captures the UI-relevant part of `state`.
    pub fn of(state: &ConnectionState) -> Self {
        Self {
            wifi_connected: state.wifi_connected,
            peer_connected: state.peer_connected,
            charge_mode: state.charge_mode,
        }
    }
}

/// Result of one reconciliation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reconciliation {
    /// Buttons to show.
    pub layout: ButtonLayout,
    /// Commands to run, in order.
    pub commands: HVec<UiCommand, 2>,
}

/// The layout implied by the current facts.
pub fn layout_for(facts: UiFacts) -> ButtonLayout {
    if facts.peer_connected {
        ButtonLayout::ModePair {
            active: facts.charge_mode,
        }
    } else {
        ButtonLayout::SelectDevice
    }
}

/// Decides the layout and side effects for one tick.
pub fn reconcile(facts: UiFacts, gesture: Option<Gesture>) -> Reconciliation {
    let layout = layout_for(facts);
    let mut commands = HVec::new();

    let action = match gesture {
        _ if !facts.wifi_connected => None,
        Some(Gesture::LongPress(p)) if p.y < LONG_PRESS_MAX_Y => Some(UiCommand::OpenDevicePicker),
        Some(Gesture::Tap(p)) => tap_action(layout, p),
        _ => None,
    };

    if let Some(action) = action {
        let _ = commands.push(UiCommand::Beep);
        let _ = commands.push(action);
    }

    Reconciliation { layout, commands }
}

fn tap_action(layout: ButtonLayout, p: TouchPoint) -> Option<UiCommand> {
    match layout {
        ButtonLayout::ModePair { active } => {
            if active != ChargeMode::Solar && SOLAR_BUTTON.contains(p) {
                Some(UiCommand::ChangeMode(ChargeMode::Solar))
            } else if active != ChargeMode::Smart && SMART_BUTTON.contains(p) {
                Some(UiCommand::ChangeMode(ChargeMode::Smart))
            } else {
                None
            }
        }
        ButtonLayout::SelectDevice => {
            SELECT_BUTTON.contains(p).then_some(UiCommand::OpenDevicePicker)
        }
    }
}

// ============================================================================
// Status Bar
// ============================================================================

/// Contents of the status bar and error line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusBar {
    /// WIFI indicator.
    pub wifi_connected: bool,
    /// EVSE indicator.
    pub peer_connected: bool,
    /// Mode shown after "Mode:".
    pub mode: ChargeMode,
    /// Error shown in the error line.
    pub error: Option<ErrorKind>,
}

impl StatusBar {
    /// Builds the status bar for `state`.
    pub fn of(state: &ConnectionState) -> Self {
        Self {
            wifi_connected: state.wifi_connected,
            peer_connected: state.peer_connected,
            mode: state.charge_mode,
            error: state.last_error,
        }
    }

    /// "Mode:" label; shows `-` while the peer is unreachable.
    pub fn mode_text(&self) -> String {
        if self.peer_connected {
            format!("Mode:{}", self.mode)
        } else {
            "Mode:-".to_string()
        }
    }

    /// Error line text.
    pub fn error_text(&self) -> String {
        match self.error {
            Some(kind) => format!("Error: {}", kind),
            None => "Error: None".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(wifi: bool, peer: bool, mode: ChargeMode) -> UiFacts {
        UiFacts {
            wifi_connected: wifi,
            peer_connected: peer,
            charge_mode: mode,
        }
    }

    const SOLAR_CENTER: TouchPoint = TouchPoint::new(80, 156);
    const SMART_CENTER: TouchPoint = TouchPoint::new(240, 156);

    #[test]
    fn rect_edges() {
        let r = Rect::new(10, 10, 5, 5);
        assert!(r.contains(TouchPoint::new(10, 10)));
        assert!(r.contains(TouchPoint::new(14, 14)));
        assert!(!r.contains(TouchPoint::new(15, 10)));
        assert!(!r.contains(TouchPoint::new(9, 12)));
    }

    #[test]
    fn tracker_tap_on_release() {
        let mut t = TouchTracker::new(2000);
        let p = TouchPoint::new(50, 150);
        assert_eq!(t.update(Some(p), 0), None);
        assert!(t.is_pressed());
        assert_eq!(t.update(Some(TouchPoint::new(52, 151)), 100), None);
        assert_eq!(t.update(None, 150), Some(Gesture::Tap(p)));
        assert_eq!(t.update(None, 200), None);
    }

    #[test]
    fn tracker_long_press_fires_once_and_suppresses_tap() {
        let mut t = TouchTracker::new(2000);
        let p = TouchPoint::new(50, 50);
        t.update(Some(p), 0);
        assert_eq!(t.update(Some(p), 1999), None);
        assert_eq!(t.update(Some(p), 2000), Some(Gesture::LongPress(p)));
        assert_eq!(t.update(Some(p), 2500), None);
        assert_eq!(t.update(None, 2600), None);
    }

    #[test]
    fn layout_gated_by_peer_connection() {
        assert_eq!(
            layout_for(facts(true, false, ChargeMode::Solar)),
            ButtonLayout::SelectDevice
        );
        assert_eq!(
            layout_for(facts(true, true, ChargeMode::Solar)),
            ButtonLayout::ModePair {
                active: ChargeMode::Solar
            }
        );
    }

    #[test]
    fn tap_inactive_mode_changes_mode() {
        let r = reconcile(
            facts(true, true, ChargeMode::Solar),
            Some(Gesture::Tap(SMART_CENTER)),
        );
        assert_eq!(
            r.commands.as_slice(),
            &[UiCommand::Beep, UiCommand::ChangeMode(ChargeMode::Smart)]
        );
    }

    #[test]
    fn tap_active_mode_does_nothing() {
        let r = reconcile(
            facts(true, true, ChargeMode::Solar),
            Some(Gesture::Tap(SOLAR_CENTER)),
        );
        assert!(r.commands.is_empty());
    }

    #[test]
    fn tap_select_opens_picker() {
        let r = reconcile(
            facts(true, false, ChargeMode::Unknown),
            Some(Gesture::Tap(SOLAR_CENTER)),
        );
        assert_eq!(
            r.commands.as_slice(),
            &[UiCommand::Beep, UiCommand::OpenDevicePicker]
        );
    }

    #[test]
    fn long_press_region() {
        let upper = reconcile(
            facts(true, true, ChargeMode::Smart),
            Some(Gesture::LongPress(TouchPoint::new(100, 40))),
        );
        assert_eq!(upper.commands.last(), Some(&UiCommand::OpenDevicePicker));

        let lower = reconcile(
            facts(true, true, ChargeMode::Smart),
            Some(Gesture::LongPress(TouchPoint::new(100, 200))),
        );
        assert!(lower.commands.is_empty());
    }

    #[test]
    fn touches_ignored_without_wifi() {
        let r = reconcile(
            facts(false, false, ChargeMode::Unknown),
            Some(Gesture::Tap(SOLAR_CENTER)),
        );
        assert!(r.commands.is_empty());
        let r = reconcile(
            facts(false, false, ChargeMode::Unknown),
            Some(Gesture::LongPress(TouchPoint::new(10, 10))),
        );
        assert!(r.commands.is_empty());
    }

    #[test]
    fn status_bar_text() {
        let mut state = ConnectionState::default();
        state.charge_mode = ChargeMode::Smart;
        let bar = StatusBar::of(&state);
        assert_eq!(bar.mode_text(), "Mode:-");
        assert_eq!(bar.error_text(), "Error: None");

        state.peer_connected = true;
        state.set_error(ErrorKind::ModeChangeFailure);
        let bar = StatusBar::of(&state);
        assert_eq!(bar.mode_text(), "Mode:Smart");
        assert_eq!(bar.error_text(), "Error: Mode failed");
    }
}
