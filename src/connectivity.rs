//! Wi-Fi association and access-point fallback.
//!
//! # Boot Policy
//!
//! ```text
//! stored SSID? --no--------------------------------> AP fallback
//!      | yes
//!      v
//! connect() x boot_attempts (1 s apart) --fail-----> AP fallback
//!      | ok                                          (WifiConnectFailure)
//!      v
//!   Station
//! ```
//!
//! There is no background reconnect: once the boot budget is spent the
//! device stays in access-point mode until it is rebooted with new
//! credentials from the portal.

use crate::config::{AccessPointConfig, WifiConfig};
use crate::onboarding::OnboardingScreen;
use crate::state::{ConnectionState, ErrorKind};
use crate::traits::{CaptiveDns, Delay, StatusDisplay, WifiRadio};

/// Radio role after boot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NetworkMode {
    /// Nothing started yet.
    #[default]
    Offline,
    /// Joined the configured network.
    Station,
    /// Hosting the onboarding access point.
    AccessPoint,
}

/// Owns the association budget and the station/AP decision.
#[derive(Debug)]
pub struct ConnectivityManager {
    wifi: WifiConfig,
    ap: AccessPointConfig,
    mode: NetworkMode,
}

impl ConnectivityManager {
    /// Creates a manager for the given station and AP settings.
    pub fn new(wifi: WifiConfig, ap: AccessPointConfig) -> Self {
        Self {
            wifi,
            ap,
            mode: NetworkMode::Offline,
        }
    }

    /// Current radio role.
    pub fn mode(&self) -> NetworkMode {
        self.mode
    }

    /// Station credentials in use.
    pub fn wifi_config(&self) -> &WifiConfig {
        &self.wifi
    }

    /// Starts association and polls until connected or the budget runs out.
    ///
    /// Returns true iff the station is connected within
    /// `connect_polls * poll_interval_ms`.
    pub fn connect<R: WifiRadio, D: Delay>(
        &mut self,
        radio: &mut R,
        delay: &mut D,
        ssid: &str,
        password: &str,
    ) -> bool {
        if let Err(e) = radio.begin_connect(ssid, password) {
            log::warn!("[WiFi] Could not start association with '{}': {:?}", ssid, e);
            return false;
        }

        for _ in 0..self.wifi.connect_polls {
            if radio.is_connected() {
                break;
            }
            delay.delay_ms(self.wifi.poll_interval_ms);
        }

        let connected = radio.is_connected();
        if connected {
            self.mode = NetworkMode::Station;
            log::info!("[WiFi] Connected to '{}' ({:?})", ssid, radio.ip_addr());
        }
        connected
    }

    /// Switches to the onboarding access point.
    ///
    /// Starts the AP, the catch-all DNS responder and renders the onboarding
    /// screen. Failures are logged; the screen is shown regardless so the
    /// user can see what the device is trying to do.
    pub fn enter_fallback_mode<R, N, S>(&mut self, radio: &mut R, dns: &mut N, display: &mut S)
    where
        R: WifiRadio,
        N: CaptiveDns,
        S: StatusDisplay,
    {
        log::info!("[WiFi] Starting access point '{}'", self.ap.ssid);
        if let Err(e) = radio.start_access_point(&self.ap) {
            log::warn!("[WiFi] Access point failed: {:?}", e);
        }

        match dns.start(self.ap.ip) {
            Ok(()) => log::info!("[WiFi] Captive DNS answering with {}", self.ap.ip),
            Err(e) => log::warn!("[WiFi] Captive DNS failed: {:?}", e),
        }

        let screen = OnboardingScreen::for_access_point(&self.ap);
        if let Err(e) = display.draw_onboarding(&screen) {
            log::warn!("[WiFi] Could not draw onboarding screen: {:?}", e);
        }

        self.mode = NetworkMode::AccessPoint;
    }

    /// Runs the boot policy and records the outcome in `state`.
    pub fn boot<R, D, N, S>(
        &mut self,
        radio: &mut R,
        delay: &mut D,
        dns: &mut N,
        display: &mut S,
        state: &mut ConnectionState,
    ) -> NetworkMode
    where
        R: WifiRadio,
        D: Delay,
        N: CaptiveDns,
        S: StatusDisplay,
    {
        if self.wifi.is_configured() {
            let shown = display.show_message("Connecting to WiFi...", Some(self.wifi.ssid.as_str()));
            if let Err(e) = shown {
                log::warn!("[WiFi] Could not show connect message: {:?}", e);
            }
            let ssid = self.wifi.ssid.clone();
            let password = self.wifi.password.clone();

            for attempt in 0..self.wifi.boot_attempts {
                if attempt > 0 {
                    delay.delay_ms(self.wifi.boot_retry_delay_ms);
                }
                log::info!(
                    "[WiFi] Connect attempt {}/{}",
                    attempt + 1,
                    self.wifi.boot_attempts
                );
                if self.connect(radio, delay, ssid.as_str(), password.as_str()) {
                    state.wifi_connected = true;
                    return self.mode;
                }
            }

            log::warn!("[WiFi] Giving up on '{}'", ssid);
            state.set_error(ErrorKind::WifiConnectFailure);
        } else {
            log::info!("[WiFi] No stored credentials");
        }

        state.wifi_connected = false;
        self.enter_fallback_mode(radio, dns, display);
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockDelay, MockDisplay, MockDns, MockRadio};

    fn manager() -> ConnectivityManager {
        ConnectivityManager::new(
            WifiConfig::default().with_ssid("Home").with_password("pw"),
            AccessPointConfig::default(),
        )
    }

    #[test]
    fn connect_succeeds_within_budget() {
        let mut radio = MockRadio::new();
        radio.connect_after_polls = Some(3);
        let mut delay = MockDelay::new();
        let mut mgr = manager();

        assert!(mgr.connect(&mut radio, &mut delay, "Home", "pw"));
        assert_eq!(mgr.mode(), NetworkMode::Station);
        assert_eq!(radio.last_credentials, Some(("Home".into(), "pw".into())));
        assert!(delay.total_ms <= 5 * 500);
    }

    #[test]
    fn connect_gives_up_after_five_polls() {
        let mut radio = MockRadio::new();
        let mut delay = MockDelay::new();
        let mut mgr = manager();

        assert!(!mgr.connect(&mut radio, &mut delay, "Home", "pw"));
        assert_eq!(delay.total_ms, 2500);
        assert_eq!(mgr.mode(), NetworkMode::Offline);
    }

    #[test]
    fn fallback_starts_ap_dns_and_screen() {
        let mut radio = MockRadio::new();
        let mut dns = MockDns::new();
        let mut display = MockDisplay::new();
        let mut mgr = manager();

        mgr.enter_fallback_mode(&mut radio, &mut dns, &mut display);

        assert_eq!(mgr.mode(), NetworkMode::AccessPoint);
        assert_eq!(radio.ap_started.as_deref(), Some("SmartEVSE_Display"));
        assert!(dns.is_running());
        assert_eq!(display.onboarding_draws, 1);
    }

    #[test]
    fn boot_without_credentials_goes_straight_to_ap() {
        let mut radio = MockRadio::new();
        let mut delay = MockDelay::new();
        let mut dns = MockDns::new();
        let mut display = MockDisplay::new();
        let mut state = ConnectionState::default();
        let mut mgr = ConnectivityManager::new(WifiConfig::default(), AccessPointConfig::default());

        let mode = mgr.boot(&mut radio, &mut delay, &mut dns, &mut display, &mut state);

        assert_eq!(mode, NetworkMode::AccessPoint);
        assert_eq!(radio.connect_calls, 0);
        assert_eq!(state.last_error, None);
    }
}
