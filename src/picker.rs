//! Device picker modal.
//!
//! Shown after discovery when the user asks to select a SmartEVSE. Up to
//! four candidates are listed as full-width rows; tapping a row selects it.
//! A long press anywhere leaves the picker without changing the selection,
//! and with no candidates any tap does.

use crate::discovery::PeerHost;
use crate::reconciler::{Gesture, Rect, SCREEN_WIDTH};

/// Top of the first row.
pub const ROW_TOP: i32 = 48;
/// Vertical distance between rows.
pub const ROW_PITCH: i32 = 44;
/// Drawn height of a row.
pub const ROW_HEIGHT: i32 = 36;

/// Outcome of a picker gesture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PickerEvent {
    /// The user picked this host.
    Selected(PeerHost),
    /// The user left without picking.
    Dismissed,
}

/// Candidate list shown by the picker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DevicePicker {
    hosts: Vec<PeerHost>,
}

impl DevicePicker {
    /// Creates a picker over the first `max_rows` hosts.
    pub fn new(mut hosts: Vec<PeerHost>, max_rows: usize) -> Self {
        hosts.truncate(max_rows);
        Self { hosts }
    }

    /// Listed candidates.
    pub fn hosts(&self) -> &[PeerHost] {
        &self.hosts
    }

    /// Drawn area of row `index`.
    pub fn row_rect(index: usize) -> Rect {
        Rect::new(16, ROW_TOP + index as i32 * ROW_PITCH, SCREEN_WIDTH - 32, ROW_HEIGHT)
    }

    /// Maps a gesture to a picker outcome.
    pub fn handle(&self, gesture: Gesture) -> Option<PickerEvent> {
        match gesture {
            Gesture::LongPress(_) => Some(PickerEvent::Dismissed),
            Gesture::Tap(_) if self.hosts.is_empty() => Some(PickerEvent::Dismissed),
            Gesture::Tap(p) => {
                if p.y < ROW_TOP {
                    return None;
                }
                // Hit the whole pitch band so the gaps between rows count
                let index = ((p.y - ROW_TOP) / ROW_PITCH) as usize;
                self.hosts
                    .get(index)
                    .cloned()
                    .map(PickerEvent::Selected)
            }
        }
    }
}
