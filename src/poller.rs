//! SmartEVSE status polling and mode changes.
//!
//! The poller is a small state machine over [`LinkStatus`]:
//!
//! | Condition | Link | Error | Request sent |
//! |-----------|------|-------|--------------|
//! | Wi-Fi down | Disconnected | unchanged | no |
//! | No peer selected | Disconnected | `NoPeerConfigured` | no |
//! | 2xx, valid JSON | Connected | peer-class cleared | yes |
//! | 2xx, invalid JSON | Error | `PeerParseFailure` | yes |
//! | Non-2xx or transport failure | Error | `PeerTimeout` | yes |
//!
//! A failed poll is not retried; the next scheduled poll is the retry.
//!
//! # Status Document
//!
//! Only these fields are read; every one of them is optional:
//!
//! ```json
//! {
//!   "mode_id": 3,
//!   "settings": { "charge_current": 16.0 },
//!   "phase_currents": { "TOTAL": 21.5 },
//!   "evse": { "state": "Charging" }
//! }
//! ```

use serde::Deserialize;

use crate::config::PeerConfig;
use crate::state::{ChargeMode, ConnectionState, ErrorKind, LinkStatus};
use crate::traits::{HttpMethod, PeerClient};

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct SettingsDoc {
    #[serde(default)]
    charge_current: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct PhaseCurrentsDoc {
    #[serde(default, rename = "TOTAL")]
    total: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct EvseDoc {
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StatusDoc {
    #[serde(default)]
    settings: SettingsDoc,
    #[serde(default)]
    phase_currents: PhaseCurrentsDoc,
    #[serde(default)]
    evse: EvseDoc,
    #[serde(default)]
    mode_id: Option<i64>,
}

/// The fields of a status document the display uses.
#[derive(Clone, Debug, PartialEq)]
pub struct PeerStatus {
    /// Mapped charging mode; `Unknown` when `mode_id` is absent.
    pub charge_mode: ChargeMode,
    /// Charge current as reported.
    pub charge_current_amps: f32,
    /// Total grid current as reported.
    pub total_grid_current_amps: f32,
    /// EVSE state label.
    pub evse_state: String,
}

impl PeerStatus {
    /// Parses a status body.
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        let doc: StatusDoc = serde_json::from_slice(body)?;
        Ok(Self {
            charge_mode: doc
                .mode_id
                .map(ChargeMode::from_mode_id)
                .unwrap_or(ChargeMode::Unknown),
            charge_current_amps: doc.settings.charge_current.unwrap_or_default(),
            total_grid_current_amps: doc.phase_currents.total.unwrap_or_default(),
            evse_state: doc.evse.state.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ModeAck {
    mode: serde_json::Value,
}

/// Extracts the acknowledged mode id from a mode-change response.
///
/// The peer answers with either a string (`"2"`) or a number (`2`).
pub fn parse_mode_ack(body: &[u8]) -> Option<i64> {
    let ack: ModeAck = serde_json::from_slice(body).ok()?;
    match ack.mode {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ============================================================================
// Poll Outcome
// ============================================================================

/// The state that decides which buttons are shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonFacts {
    /// Peer reachable.
    pub peer_connected: bool,
    /// Current charge mode.
    pub charge_mode: ChargeMode,
}

impl ButtonFacts {
    /// Captures the button-relevant part of `state`.
    pub fn of(state: &ConnectionState) -> Self {
        Self {
            peer_connected: state.peer_connected,
            charge_mode: state.charge_mode,
        }
    }
}

/// What a poll changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollOutcome {
    /// Button facts before the poll.
    pub before: ButtonFacts,
    /// Button facts after the poll.
    pub after: ButtonFacts,
    /// Whether a request was sent.
    pub requested: bool,
}

impl PollOutcome {
    /// True on a connected/disconnected edge, or a mode change while connected.
    pub fn needs_button_redraw(&self) -> bool {
        self.before.peer_connected != self.after.peer_connected
            || (self.after.peer_connected && self.before.charge_mode != self.after.charge_mode)
    }
}

// ============================================================================
// Status Poller
// ============================================================================

/// Talks to the SmartEVSE REST API.
#[derive(Debug)]
pub struct StatusPoller {
    config: PeerConfig,
}

impl StatusPoller {
    /// Creates a poller with the given timeouts and schedule stamp.
    pub fn new(config: PeerConfig) -> Self {
        Self { config }
    }

    /// Polls `/settings` once and folds the result into `state`.
    pub fn poll<C: PeerClient>(&self, client: &mut C, state: &mut ConnectionState) -> PollOutcome {
        let before = ButtonFacts::of(state);
        let requested = self.poll_inner(client, state);
        PollOutcome {
            before,
            after: ButtonFacts::of(state),
            requested,
        }
    }

    fn poll_inner<C: PeerClient>(&self, client: &mut C, state: &mut ConnectionState) -> bool {
        if !state.wifi_connected {
            state.mark_disconnected();
            return false;
        }
        if !state.has_peer() {
            state.mark_disconnected();
            state.set_error(ErrorKind::NoPeerConfigured);
            return false;
        }

        let url = format!("http://{}/settings", state.selected_peer_host);
        match client.get(&url, self.config.request_timeout_ms) {
            Ok(resp) if resp.is_success() => match PeerStatus::parse(&resp.body) {
                Ok(status) => {
                    state.peer_connected = true;
                    state.link = LinkStatus::Connected;
                    state.charge_mode = status.charge_mode;
                    state.charge_current_amps = status.charge_current_amps;
                    state.total_grid_current_amps = status.total_grid_current_amps;
                    state.evse_state = status.evse_state;
                    state.clear_peer_error();
                }
                Err(e) => {
                    log::warn!("[Peer] Invalid status document: {}", e);
                    self.fail(state, ErrorKind::PeerParseFailure);
                }
            },
            Ok(resp) => {
                log::warn!("[Peer] Status request returned {}", resp.status);
                self.fail(state, ErrorKind::PeerTimeout);
            }
            Err(e) => {
                log::warn!("[Peer] Status request failed: {:?}", e);
                self.fail(state, ErrorKind::PeerTimeout);
            }
        }
        true
    }

    fn fail(&self, state: &mut ConnectionState, kind: ErrorKind) {
        state.peer_connected = false;
        state.link = LinkStatus::Error;
        state.set_error(kind);
    }

    /// URL of a mode-change request.
    pub fn mode_change_url(&self, host: &str, mode_id: u8) -> String {
        let stamp = self.config.schedule_stamp.as_str();
        format!(
            "http://{}/settings?mode={}&override_current=0&starttime={}&stoptime={}&repeat=0",
            host, mode_id, stamp, stamp
        )
    }

    /// Asks the peer to switch to `target`, optimistically updating `state`.
    ///
    /// Returns true if the peer acknowledged the new mode. Any other outcome
    /// restores the previous mode and records `ModeChangeFailure`.
    pub fn request_mode_change<C: PeerClient>(
        &self,
        client: &mut C,
        state: &mut ConnectionState,
        target: ChargeMode,
    ) -> bool {
        let Some(mode_id) = target.mode_id() else {
            return false;
        };
        if !state.wifi_connected || !state.has_peer() {
            return false;
        }

        let previous = state.charge_mode;
        state.charge_mode = target;

        let url = self.mode_change_url(&state.selected_peer_host, mode_id);
        log::info!("[Peer] Requesting mode {}", target);

        let acked = match client.request(HttpMethod::Post, &url, self.config.request_timeout_ms) {
            Ok(resp) if resp.is_success() => parse_mode_ack(&resp.body) == Some(i64::from(mode_id)),
            Ok(resp) => {
                log::warn!("[Peer] Mode change returned {}", resp.status);
                false
            }
            Err(e) => {
                log::warn!("[Peer] Mode change failed: {:?}", e);
                false
            }
        };

        if !acked {
            state.charge_mode = previous;
            state.set_error(ErrorKind::ModeChangeFailure);
        }
        acked
    }
}
