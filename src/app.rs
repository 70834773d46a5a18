//! The display's main state machine.
//!
//! [`App`] owns the [`ConnectionState`] and every device. One call to
//! [`App::tick`] runs, in order:
//!
//! 1. Drain the portal mailbox (save credentials, refresh scan/discovery
//!    snapshots, schedule a reboot)
//! 2. Restart if a scheduled reboot is due
//! 3. Answer one captive DNS request
//! 4. Sample the touch panel and act on the resulting gesture
//! 5. Refresh the mirrored SmartEVSE LCD (every `lcd_interval_ms`)
//! 6. Poll the SmartEVSE status and redraw what changed (every
//!    `poll_interval_ms`)
//!
//! Opening the device picker switches to [`Screen::Picker`] instead of
//! blocking; the next taps are routed to the picker until it closes.

use std::sync::Arc;

use crate::config::Config;
use crate::connectivity::{ConnectivityManager, NetworkMode};
use crate::discovery::{PeerDiscovery, PeerHost};
use crate::lcd::LcdMirror;
use crate::picker::{DevicePicker, PickerEvent};
use crate::poller::StatusPoller;
use crate::reconciler::{
    layout_for, reconcile, ButtonLayout, Gesture, StatusBar, TouchTracker, UiCommand, UiFacts,
};
use crate::scanner::NetworkScanner;
use crate::services::{Credentials, PortalMailbox};
use crate::state::{ConnectionState, ErrorKind};
use crate::traits::{
    CaptiveDns, Delay, KeyValueStore, PeerClient, ServiceBrowser, Speaker, StatusDisplay, System,
    TouchInput, WifiRadio, KEY_PASSWORD, KEY_PEER_HOST, KEY_SSID,
};

// ============================================================================
// Platform
// ============================================================================

/// The set of device drivers an [`App`] runs on.
pub trait Platform {
    /// Wi-Fi radio.
    type Radio: WifiRadio;
    /// mDNS responder and browser.
    type Browser: ServiceBrowser;
    /// HTTP client for the SmartEVSE.
    type Client: PeerClient;
    /// Screen.
    type Display: StatusDisplay;
    /// Persistent settings.
    type Store: KeyValueStore;
    /// Touch panel.
    type Touch: TouchInput;
    /// Beeper.
    type Speaker: Speaker;
    /// Captive DNS responder.
    type Dns: CaptiveDns;
    /// Blocking delay.
    type Delay: Delay;
    /// Restart control.
    type System: System;
}

/// Device instances for a [`Platform`].
pub struct Devices<P: Platform> {
    /// Wi-Fi radio.
    pub radio: P::Radio,
    /// mDNS responder and browser.
    pub browser: P::Browser,
    /// HTTP client for the SmartEVSE.
    pub client: P::Client,
    /// Screen.
    pub display: P::Display,
    /// Persistent settings.
    pub store: P::Store,
    /// Touch panel.
    pub touch: P::Touch,
    /// Beeper.
    pub speaker: P::Speaker,
    /// Captive DNS responder.
    pub dns: P::Dns,
    /// Blocking delay.
    pub delay: P::Delay,
    /// Restart control.
    pub system: P::System,
}

// ============================================================================
// App
// ============================================================================

/// What the screen is showing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    /// Access point instructions and join code.
    Onboarding,
    /// LCD mirror, buttons and status bar.
    Dashboard,
    /// Device picker overlay.
    Picker(DevicePicker),
}

/// Companion display application.
pub struct App<P: Platform> {
    config: Config,
    devices: Devices<P>,
    state: ConnectionState,
    mailbox: Arc<PortalMailbox>,
    connectivity: ConnectivityManager,
    scanner: NetworkScanner,
    discovery: PeerDiscovery,
    poller: StatusPoller,
    lcd: LcdMirror,
    touch: TouchTracker,
    screen: Screen,
    drawn_buttons: Option<ButtonLayout>,
    drawn_status: Option<StatusBar>,
    last_poll_ms: Option<u64>,
    last_lcd_ms: Option<u64>,
    reboot_at_ms: Option<u64>,
}

impl<P: Platform> App<P> {
    /// Creates the app, overlaying persisted settings onto `config`.
    pub fn new(config: Config, devices: Devices<P>, mailbox: Arc<PortalMailbox>) -> Self {
        let config = config.load_persisted(&devices.store);
        let state = ConnectionState::with_selected_host(config.peer.host.as_str());

        Self {
            connectivity: ConnectivityManager::new(
                config.wifi.clone(),
                config.access_point.clone(),
            ),
            scanner: NetworkScanner::new(config.wifi.scan_cache_ms),
            discovery: PeerDiscovery::new(config.discovery.clone()),
            poller: StatusPoller::new(config.peer.clone()),
            lcd: LcdMirror::new(config.peer.lcd_timeout_ms),
            touch: TouchTracker::new(config.ui.long_press_ms),
            config,
            devices,
            state,
            mailbox,
            screen: Screen::Onboarding,
            drawn_buttons: None,
            drawn_status: None,
            last_poll_ms: None,
            last_lcd_ms: None,
            reboot_at_ms: None,
        }
    }

    /// Joins Wi-Fi or falls back to the onboarding access point.
    pub fn boot(&mut self, now_ms: u64) -> NetworkMode {
        let d = &mut self.devices;
        let mode = self
            .connectivity
            .boot(&mut d.radio, &mut d.delay, &mut d.dns, &mut d.display, &mut self.state);

        // The portal lists networks right away, so scan once up front
        let networks = self.scanner.scan(&mut self.devices.radio, now_ms);
        self.mailbox.publish_networks(networks);

        if mode == NetworkMode::Station {
            self.advertise();
            self.show_dashboard();
        } else {
            self.screen = Screen::Onboarding;
        }
        mode
    }

    fn advertise(&mut self) {
        let hostname = self
            .config
            .device
            .hostname(self.devices.radio.mac_address());
        let attempts = self.config.discovery.advertise_attempts;

        for attempt in 1..=attempts {
            match self.devices.browser.advertise(&hostname, self.config.web.port) {
                Ok(()) => {
                    log::info!("[mDNS] Advertising {}.local", hostname);
                    return;
                }
                Err(e) => {
                    log::warn!("[mDNS] Start attempt {}/{} failed: {:?}", attempt, attempts, e);
                    if attempt < attempts {
                        self.devices
                            .delay
                            .delay_ms(self.config.discovery.advertise_retry_delay_ms);
                    }
                }
            }
        }
        self.state.set_error(ErrorKind::MdnsInitFailure);
    }

    /// Runs one iteration of the main loop.
    pub fn tick(&mut self, now_ms: u64) {
        self.drain_mailbox(now_ms);

        if self.reboot_at_ms.is_some_and(|at| now_ms >= at) {
            log::info!("[Portal] Restarting");
            self.reboot_at_ms = None;
            self.devices.system.restart();
            return;
        }

        if self.devices.dns.is_running() {
            self.devices.dns.process_next_request();
        }

        let sample = self.devices.touch.read().ok().flatten();
        if let Some(gesture) = self.touch.update(sample, now_ms) {
            self.on_gesture(gesture, now_ms);
        }

        if self.screen != Screen::Dashboard {
            return;
        }

        if due(self.last_lcd_ms, self.config.peer.lcd_interval_ms, now_ms) {
            self.last_lcd_ms = Some(now_ms);
            let d = &mut self.devices;
            self.lcd.refresh(&mut d.client, &mut d.display, &self.state);
        }

        if due(self.last_poll_ms, self.config.peer.poll_interval_ms, now_ms) {
            self.last_poll_ms = Some(now_ms);
            self.poll();
        }
    }

    fn drain_mailbox(&mut self, now_ms: u64) {
        let requests = self.mailbox.take_requests();
        if requests.is_empty() {
            return;
        }

        if let Some(credentials) = requests.credentials {
            self.save_credentials(&credentials);
        }
        if requests.scan {
            let networks = self.scanner.scan(&mut self.devices.radio, now_ms);
            self.mailbox.publish_networks(networks);
        }
        if requests.discovery && self.state.wifi_connected {
            let d = &mut self.devices;
            let peers = self.discovery.discover(&mut d.browser, &mut d.delay, now_ms, false);
            self.mailbox.publish_peers(peers);
        }
        if requests.reboot && self.reboot_at_ms.is_none() {
            self.reboot_at_ms = Some(now_ms + u64::from(self.config.device.reboot_delay_ms));
        }
    }

    fn save_credentials(&mut self, credentials: &Credentials) {
        let store = &mut self.devices.store;
        let result = store
            .set(KEY_SSID, &credentials.ssid)
            .and_then(|()| store.set(KEY_PASSWORD, &credentials.password));
        match result {
            Ok(()) => log::info!("[Portal] Saved credentials for '{}'", credentials.ssid),
            Err(e) => log::warn!("[Portal] Could not save credentials: {:?}", e),
        }
    }

    fn on_gesture(&mut self, gesture: Gesture, now_ms: u64) {
        match &self.screen {
            Screen::Onboarding => {}
            Screen::Picker(picker) => match picker.handle(gesture) {
                Some(PickerEvent::Selected(host)) => self.select_peer(&host),
                Some(PickerEvent::Dismissed) => {
                    log::info!("[mDNS] Device selection cancelled");
                    self.show_dashboard();
                }
                None => {}
            },
            Screen::Dashboard => {
                let outcome = reconcile(UiFacts::of(&self.state), Some(gesture));
                for command in outcome.commands {
                    self.run_command(command, now_ms);
                }
            }
        }
    }

    fn run_command(&mut self, command: UiCommand, now_ms: u64) {
        match command {
            UiCommand::Beep => self
                .devices
                .speaker
                .tone(self.config.ui.beep_hz, self.config.ui.beep_ms),
            UiCommand::ChangeMode(mode) => {
                self.poller
                    .request_mode_change(&mut self.devices.client, &mut self.state, mode);
                self.redraw_buttons();
                self.redraw_status();
            }
            UiCommand::OpenDevicePicker => self.open_picker(now_ms),
        }
    }

    fn open_picker(&mut self, now_ms: u64) {
        if let Err(e) = self
            .devices
            .display
            .show_message("Searching for SmartEVSE...", None)
        {
            log::warn!("[UI] Could not show search message: {:?}", e);
        }

        let d = &mut self.devices;
        let hosts = self.discovery.discover(&mut d.browser, &mut d.delay, now_ms, true);
        self.mailbox.publish_peers(hosts.clone());

        let picker = DevicePicker::new(hosts, self.config.discovery.max_candidates);
        if let Err(e) = self.devices.display.draw_picker(picker.hosts()) {
            log::warn!("[mDNS] Could not draw device picker: {:?}", e);
        }
        self.screen = Screen::Picker(picker);
    }

    fn select_peer(&mut self, host: &PeerHost) {
        let address = host.host();
        log::info!("[mDNS] Selected {}", host.label());

        if let Err(e) = self.devices.store.set(KEY_PEER_HOST, &address) {
            log::warn!("[mDNS] Could not persist selected host: {:?}", e);
        }
        self.state.selected_peer_host = address;
        self.state.mark_disconnected();
        self.state.clear_peer_error();

        self.show_dashboard();
        // Poll the new host on the next tick instead of waiting a full interval
        self.last_poll_ms = None;
        self.last_lcd_ms = None;
    }

    fn show_dashboard(&mut self) {
        self.screen = Screen::Dashboard;
        self.touch.reset();
        if let Err(e) = self.devices.display.clear() {
            log::warn!("[UI] Could not clear screen: {:?}", e);
        }
        self.drawn_buttons = None;
        self.drawn_status = None;
        self.lcd.invalidate();
        self.redraw_buttons();
        self.redraw_status();
    }

    fn poll(&mut self) {
        if self.connectivity.mode() == NetworkMode::Station {
            let connected = self.devices.radio.is_connected();
            if self.state.wifi_connected && !connected {
                log::warn!("[WiFi] Connection lost");
            }
            self.state.wifi_connected = connected;
        }

        let outcome = self.poller.poll(&mut self.devices.client, &mut self.state);
        if outcome.needs_button_redraw() {
            self.redraw_buttons();
        }
        self.redraw_status();
    }

    fn redraw_buttons(&mut self) {
        let layout = layout_for(UiFacts::of(&self.state));
        if self.drawn_buttons == Some(layout) {
            return;
        }
        match self.devices.display.draw_buttons(layout) {
            Ok(()) => self.drawn_buttons = Some(layout),
            Err(e) => log::warn!("[UI] Could not draw buttons: {:?}", e),
        }
    }

    fn redraw_status(&mut self) {
        let status = StatusBar::of(&self.state);
        if self.drawn_status.as_ref() == Some(&status) {
            return;
        }
        match self.devices.display.draw_status_bar(&status) {
            Ok(()) => self.drawn_status = Some(status),
            Err(e) => log::warn!("[UI] Could not draw status bar: {:?}", e),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current connection state.
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Current screen.
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Station or access point.
    pub fn network_mode(&self) -> NetworkMode {
        self.connectivity.mode()
    }

    /// Effective configuration (persisted values applied).
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The mailbox shared with the config portal.
    pub fn mailbox(&self) -> &Arc<PortalMailbox> {
        &self.mailbox
    }

    /// Devices, for inspection.
    pub fn devices(&self) -> &Devices<P> {
        &self.devices
    }

    /// Devices, for scripting input.
    pub fn devices_mut(&mut self) -> &mut Devices<P> {
        &mut self.devices
    }
}

fn due(last_ms: Option<u64>, interval_ms: u64, now_ms: u64) -> bool {
    last_ms.map_or(true, |last| now_ms.saturating_sub(last) >= interval_ms)
}
