//! Mirroring of the SmartEVSE's own LCD.
//!
//! Once a second the display fetches `GET /lcd` and blits the frame into
//! the upper part of the screen. When the fetch or decode fails a
//! placeholder is drawn instead; the placeholder is drawn once per outage
//! rather than on every attempt.

use crate::bitmap::LcdFrame;
use crate::state::ConnectionState;
use crate::traits::{PeerClient, StatusDisplay};

/// What a refresh put on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LcdRefresh {
    /// Wi-Fi is down; nothing was fetched or drawn.
    Skipped,
    /// A fresh frame was drawn.
    Frame,
    /// The placeholder is showing.
    Placeholder,
}

/// Periodic LCD fetcher.
#[derive(Debug)]
pub struct LcdMirror {
    timeout_ms: u32,
    placeholder_shown: bool,
}

impl LcdMirror {
    /// Creates a mirror with the given fetch timeout.
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            timeout_ms,
            placeholder_shown: false,
        }
    }

    /// Fetches and draws one frame.
    pub fn refresh<C, S>(
        &mut self,
        client: &mut C,
        display: &mut S,
        state: &ConnectionState,
    ) -> LcdRefresh
    where
        C: PeerClient,
        S: StatusDisplay,
    {
        if !state.wifi_connected {
            return LcdRefresh::Skipped;
        }
        if !state.has_peer() {
            return self.show_placeholder(display);
        }

        let url = format!("http://{}/lcd", state.selected_peer_host);
        let frame = match client.get(&url, self.timeout_ms) {
            Ok(resp) if resp.is_success() => LcdFrame::decode(&resp.body).map_err(|e| {
                log::debug!("[Peer] LCD decode failed: {}", e);
            }),
            Ok(resp) => {
                log::debug!("[Peer] LCD request returned {}", resp.status);
                Err(())
            }
            Err(e) => {
                log::debug!("[Peer] LCD request failed: {:?}", e);
                Err(())
            }
        };

        match frame {
            Ok(frame) => {
                if let Err(e) = display.draw_lcd(&frame) {
                    log::warn!("[Peer] Could not draw LCD frame: {:?}", e);
                }
                self.placeholder_shown = false;
                LcdRefresh::Frame
            }
            Err(()) => self.show_placeholder(display),
        }
    }

    fn show_placeholder<S: StatusDisplay>(&mut self, display: &mut S) -> LcdRefresh {
        if !self.placeholder_shown {
            if let Err(e) = display.draw_lcd_placeholder() {
                log::warn!("[Peer] Could not draw LCD placeholder: {:?}", e);
            }
            self.placeholder_shown = true;
        }
        LcdRefresh::Placeholder
    }

    /// Forces the next failure to redraw the placeholder (e.g., after a full clear).
    pub fn invalidate(&mut self) {
        self.placeholder_shown = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockDisplay, MockPeerClient};
    use crate::traits::PeerResponse;

    fn connected() -> ConnectionState {
        let mut state = ConnectionState::with_selected_host("10.0.0.9");
        state.wifi_connected = true;
        state
    }

    #[test]
    fn skipped_without_wifi() {
        let mut client = MockPeerClient::new();
        let mut display = MockDisplay::new();
        let mut mirror = LcdMirror::new(750);

        let out = mirror.refresh(&mut client, &mut display, &ConnectionState::default());
        assert_eq!(out, LcdRefresh::Skipped);
        assert_eq!(client.request_count(), 0);
    }

    #[test]
    fn draws_decoded_frame() {
        let mut client = MockPeerClient::new();
        client.push_response(PeerResponse::new(200, vec![0u8; 1024]));
        let mut display = MockDisplay::new();
        let mut mirror = LcdMirror::new(750);

        let out = mirror.refresh(&mut client, &mut display, &connected());
        assert_eq!(out, LcdRefresh::Frame);
        assert_eq!(display.lcd_frames, 1);
        assert_eq!(client.requests[0].url, "http://10.0.0.9/lcd");
        assert_eq!(client.requests[0].timeout_ms, 750);
    }

    #[test]
    fn placeholder_drawn_once_per_outage() {
        let mut client = MockPeerClient::new();
        client.push_error();
        client.push_response(PeerResponse::new(500, ""));
        client.push_response(PeerResponse::new(200, vec![0u8; 1024]));
        client.push_error();
        let mut display = MockDisplay::new();
        let mut mirror = LcdMirror::new(750);
        let state = connected();

        assert_eq!(mirror.refresh(&mut client, &mut display, &state), LcdRefresh::Placeholder);
        assert_eq!(mirror.refresh(&mut client, &mut display, &state), LcdRefresh::Placeholder);
        assert_eq!(display.placeholder_draws, 1);

        assert_eq!(mirror.refresh(&mut client, &mut display, &state), LcdRefresh::Frame);
        assert_eq!(mirror.refresh(&mut client, &mut display, &state), LcdRefresh::Placeholder);
        assert_eq!(display.placeholder_draws, 2);
    }
}
