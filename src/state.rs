//! Connection state shared by the main loop.
//!
//! [`ConnectionState`] is the single source of truth the status screen is
//! rendered from. It is owned by [`crate::app::App`] and passed by reference
//! to the components that update it; nothing else writes it.

use core::fmt;

use serde::Serialize;

/// Charging mode reported by the SmartEVSE.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum ChargeMode {
    /// Charging disabled.
    Off,
    /// Fixed-current charging.
    Normal,
    /// Charge from surplus solar power only.
    Solar,
    /// Balance against the grid connection limit.
    Smart,
    /// Charging paused.
    Pause,
    /// No status received yet, or an unrecognized mode id.
    #[default]
    Unknown,
}

impl ChargeMode {
    /// Maps the peer's numeric `mode_id`; anything outside 0..=4 is `Unknown`.
    pub fn from_mode_id(id: i64) -> Self {
        match id {
            0 => Self::Off,
            1 => Self::Normal,
            2 => Self::Solar,
            3 => Self::Smart,
            4 => Self::Pause,
            _ => Self::Unknown,
        }
    }

    /// The numeric id used on the wire, if the mode has one.
    pub fn mode_id(self) -> Option<u8> {
        match self {
            Self::Off => Some(0),
            Self::Normal => Some(1),
            Self::Solar => Some(2),
            Self::Smart => Some(3),
            Self::Pause => Some(4),
            Self::Unknown => None,
        }
    }

    /// Short label for the status bar.
    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Normal => "Normal",
            Self::Solar => "Solar",
            Self::Smart => "Smart",
            Self::Pause => "Pause",
            Self::Unknown => "-",
        }
    }
}

impl fmt::Display for ChargeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Failure classes shown in the error line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Polling was skipped because no SmartEVSE is selected.
    NoPeerConfigured,
    /// The peer did not answer in time or answered with a non-2xx status.
    PeerTimeout,
    /// The peer answered but the body was not a valid status document.
    PeerParseFailure,
    /// The peer did not acknowledge a requested mode change.
    ModeChangeFailure,
    /// The mDNS responder could not be started.
    MdnsInitFailure,
    /// The station could not join the configured network.
    WifiConnectFailure,
}

impl ErrorKind {
    /// Peer-class errors are cleared by the next successful poll; the others
    /// stay until reboot.
    pub fn is_peer_class(self) -> bool {
        matches!(
            self,
            Self::NoPeerConfigured
                | Self::PeerTimeout
                | Self::PeerParseFailure
                | Self::ModeChangeFailure
        )
    }

    /// Short status string for the error line.
    pub fn message(self) -> &'static str {
        match self {
            Self::NoPeerConfigured => "No SmartEVSE set",
            Self::PeerTimeout => "SmartEVSE Timeout",
            Self::PeerParseFailure => "SmartEVSE Failed",
            Self::ModeChangeFailure => "Mode failed",
            Self::MdnsInitFailure => "Error starting mDNS",
            Self::WifiConnectFailure => "WiFi failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of the most recent status poll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum LinkStatus {
    /// Not polling: Wi-Fi is down or no peer is selected.
    #[default]
    Disconnected,
    /// The last poll succeeded.
    Connected,
    /// The last poll failed.
    Error,
}

/// Everything the screen shows about Wi-Fi and the SmartEVSE.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ConnectionState {
    /// Station is associated.
    pub wifi_connected: bool,
    /// The last status poll succeeded.
    pub peer_connected: bool,
    /// Persisted peer host; empty when none is selected.
    pub selected_peer_host: String,
    /// Charging mode from the last successful poll (or an optimistic update).
    pub charge_mode: ChargeMode,
    /// Current error shown in the error line.
    pub last_error: Option<ErrorKind>,
    /// Configured charge current in amps.
    pub charge_current_amps: f32,
    /// Sum of the phase currents at the grid connection in amps.
    pub total_grid_current_amps: f32,
    /// EVSE state label (e.g., "Charging").
    pub evse_state: String,
    /// Poller state machine position.
    pub link: LinkStatus,
}

impl ConnectionState {
    /// Creates a state with the given persisted peer host.
    pub fn with_selected_host(host: impl Into<String>) -> Self {
        Self {
            selected_peer_host: host.into(),
            ..Self::default()
        }
    }

    /// Returns true when a peer host is selected.
    pub fn has_peer(&self) -> bool {
        !self.selected_peer_host.is_empty()
    }

    /// Records an error, replacing any previous one.
    pub fn set_error(&mut self, kind: ErrorKind) {
        self.last_error = Some(kind);
    }

    /// Clears the current error if it is peer-class.
    pub fn clear_peer_error(&mut self) {
        if self.last_error.is_some_and(ErrorKind::is_peer_class) {
            self.last_error = None;
        }
    }

    /// Marks the peer unreachable without touching the error line.
    pub fn mark_disconnected(&mut self) {
        self.peer_connected = false;
        self.link = LinkStatus::Disconnected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_id_mapping() {
        assert_eq!(ChargeMode::from_mode_id(0), ChargeMode::Off);
        assert_eq!(ChargeMode::from_mode_id(1), ChargeMode::Normal);
        assert_eq!(ChargeMode::from_mode_id(2), ChargeMode::Solar);
        assert_eq!(ChargeMode::from_mode_id(3), ChargeMode::Smart);
        assert_eq!(ChargeMode::from_mode_id(4), ChargeMode::Pause);
        assert_eq!(ChargeMode::from_mode_id(5), ChargeMode::Unknown);
        assert_eq!(ChargeMode::from_mode_id(-1), ChargeMode::Unknown);
    }

    #[test]
    fn mode_id_inverse() {
        for id in 0..=4 {
            assert_eq!(ChargeMode::from_mode_id(id).mode_id(), Some(id as u8));
        }
        assert_eq!(ChargeMode::Unknown.mode_id(), None);
    }

    #[test]
    fn peer_class_errors() {
        assert!(ErrorKind::NoPeerConfigured.is_peer_class());
        assert!(ErrorKind::PeerTimeout.is_peer_class());
        assert!(ErrorKind::PeerParseFailure.is_peer_class());
        assert!(ErrorKind::ModeChangeFailure.is_peer_class());
        assert!(!ErrorKind::MdnsInitFailure.is_peer_class());
        assert!(!ErrorKind::WifiConnectFailure.is_peer_class());
    }

    #[test]
    fn clear_peer_error_keeps_sticky_errors() {
        let mut state = ConnectionState::default();
        state.set_error(ErrorKind::MdnsInitFailure);
        state.clear_peer_error();
        assert_eq!(state.last_error, Some(ErrorKind::MdnsInitFailure));

        state.set_error(ErrorKind::PeerTimeout);
        state.clear_peer_error();
        assert_eq!(state.last_error, None);
    }

    #[test]
    fn error_messages() {
        assert_eq!(ErrorKind::PeerTimeout.to_string(), "SmartEVSE Timeout");
        assert_eq!(ErrorKind::PeerParseFailure.to_string(), "SmartEVSE Failed");
        assert_eq!(ErrorKind::ModeChangeFailure.to_string(), "Mode failed");
    }

    #[test]
    fn selected_host() {
        assert!(!ConnectionState::default().has_peer());
        assert!(ConnectionState::with_selected_host("10.0.0.2").has_peer());
    }
}
