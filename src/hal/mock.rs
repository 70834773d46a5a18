//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware and network traits,
//! enabling development and testing on desktop without an M5Stack or a
//! SmartEVSE on the network.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//! | [`MockDelay`] | [`Delay`] | Records requested delays |
//! | [`MockRadio`] | [`WifiRadio`] | Scripted scans and association |
//! | [`MockBrowser`] | [`ServiceBrowser`] | Scripted mDNS query rounds |
//! | [`MockPeerClient`] | [`PeerClient`] | Queued or routed HTTP responses |
//! | [`MockDisplay`] | [`StatusDisplay`] | Tracks render calls |
//! | [`MockStore`] | [`KeyValueStore`] | In-memory key/value store |
//! | [`MockTouch`] | [`TouchInput`] | Queued touch samples |
//! | [`MockSpeaker`] | [`Speaker`] | Records tones |
//! | [`MockDns`] | [`CaptiveDns`] | Counts processed requests |
//! | [`MockSystem`] | [`System`] | Counts restarts |
//!
//! [`MockPlatform`] bundles all of them for driving [`App`](crate::App).
//!
//! # Example
//!
//! ```rust
//! use evse_display::hal::{MockDelay, MockRadio};
//! use evse_display::{AccessPointConfig, ConnectivityManager, WifiConfig};
//!
//! let mut radio = MockRadio::new();
//! radio.connect_after_polls = Some(2);
//! let mut delay = MockDelay::new();
//!
//! let mut wifi = ConnectivityManager::new(WifiConfig::default(), AccessPointConfig::default());
//! assert!(wifi.connect(&mut radio, &mut delay, "Home", "secret"));
//! assert_eq!(delay.total_ms, 500);
//! ```
//!
//! [`Clock`]: crate::traits::Clock
//! [`Delay`]: crate::traits::Delay
//! [`WifiRadio`]: crate::traits::WifiRadio
//! [`ServiceBrowser`]: crate::traits::ServiceBrowser
//! [`PeerClient`]: crate::traits::PeerClient
//! [`StatusDisplay`]: crate::traits::StatusDisplay
//! [`KeyValueStore`]: crate::traits::KeyValueStore
//! [`TouchInput`]: crate::traits::TouchInput
//! [`Speaker`]: crate::traits::Speaker
//! [`CaptiveDns`]: crate::traits::CaptiveDns
//! [`System`]: crate::traits::System

use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;

use crate::app::{Devices, Platform};
use crate::bitmap::LcdFrame;
use crate::config::AccessPointConfig;
use crate::discovery::PeerHost;
use crate::onboarding::OnboardingScreen;
use crate::reconciler::{ButtonLayout, StatusBar};
use crate::scanner::WifiNetwork;
use crate::traits::{
    CaptiveDns, Clock, Delay, HttpMethod, KeyValueStore, PeerClient, PeerResponse,
    ServiceBrowser, ServiceRecord, Speaker, StatusDisplay, System, TouchInput, TouchPoint,
    WifiRadio,
};

// ============================================================================
// Time Mocks
// ============================================================================

/// Mock clock for testing time-dependent behavior.
///
/// # Example
///
/// ```rust
/// use evse_display::hal::MockClock;
/// use evse_display::traits::Clock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.set(1000);
/// assert_eq!(clock.now_ms(), 1000);
///
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_ms: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self { current_ms: 0 }
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u64) {
        self.current_ms = ms;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&mut self, ms: u64) {
        self.current_ms += ms;
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms
    }
}

/// Mock delay that returns immediately and records what was asked for.
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Sum of all requested delays.
    pub total_ms: u64,
    /// Number of `delay_ms` calls.
    pub calls: usize,
}

impl MockDelay {
    /// Creates a new mock delay.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Delay for MockDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += u64::from(ms);
        self.calls += 1;
    }
}

// ============================================================================
// Network Mocks
// ============================================================================

/// Mock Wi-Fi radio.
///
/// Association succeeds on the `n`th status check after `begin_connect`
/// when `connect_after_polls` is `Some(n)`, and never when it is `None`.
#[derive(Debug)]
pub struct MockRadio {
    /// Raw results returned by every scan.
    pub scan_results: Vec<WifiNetwork>,
    /// Number of scans performed.
    pub scan_calls: usize,
    /// Makes scans fail.
    pub fail_scan: bool,
    /// Status checks needed before association succeeds.
    pub connect_after_polls: Option<u32>,
    /// Credentials passed to the last `begin_connect`.
    pub last_credentials: Option<(String, String)>,
    /// Number of `begin_connect` calls.
    pub connect_calls: usize,
    /// SSID of the started access point.
    pub ap_started: Option<String>,
    /// Station address reported once associated.
    pub ip: Ipv4Addr,
    /// Station MAC address.
    pub mac: [u8; 6],
    polls: Cell<u32>,
}

impl Default for MockRadio {
    fn default() -> Self {
        Self {
            scan_results: Vec::new(),
            scan_calls: 0,
            fail_scan: false,
            connect_after_polls: None,
            last_credentials: None,
            connect_calls: 0,
            ap_started: None,
            ip: Ipv4Addr::new(192, 168, 1, 77),
            mac: [0x34, 0x12, 0xAB, 0xCD, 0xEF, 0x01],
            polls: Cell::new(0),
        }
    }
}

impl MockRadio {
    /// Creates a radio that never associates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a radio that associates on the first status check.
    pub fn connected() -> Self {
        Self {
            connect_after_polls: Some(1),
            ..Self::default()
        }
    }

    /// Drops the station link, as if the access point went away.
    pub fn drop_link(&mut self) {
        self.connect_after_polls = None;
    }

    fn associated(&self) -> bool {
        self.connect_after_polls
            .is_some_and(|n| self.connect_calls > 0 && self.polls.get() >= n)
    }
}

impl WifiRadio for MockRadio {
    type Error = ();

    fn scan(&mut self) -> Result<Vec<WifiNetwork>, ()> {
        self.scan_calls += 1;
        if self.fail_scan {
            return Err(());
        }
        Ok(self.scan_results.clone())
    }

    fn begin_connect(&mut self, ssid: &str, password: &str) -> Result<(), ()> {
        self.connect_calls += 1;
        self.polls.set(0);
        self.last_credentials = Some((ssid.to_string(), password.to_string()));
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.polls.set(self.polls.get().saturating_add(1));
        self.associated()
    }

    fn start_access_point(&mut self, config: &AccessPointConfig) -> Result<(), ()> {
        self.ap_started = Some(config.ssid.to_string());
        Ok(())
    }

    fn ip_addr(&self) -> Option<Ipv4Addr> {
        self.associated().then_some(self.ip)
    }

    fn mac_address(&self) -> [u8; 6] {
        self.mac
    }
}

/// Mock mDNS browser.
///
/// Queued rounds are answered first; once the queue is empty every query
/// returns `records`.
#[derive(Debug, Default)]
pub struct MockBrowser {
    /// Scripted per-round answers (`Err` simulates a failed query).
    pub rounds: VecDeque<Result<Vec<ServiceRecord>, ()>>,
    /// Answer once `rounds` is exhausted.
    pub records: Vec<ServiceRecord>,
    /// Number of queries issued.
    pub query_calls: usize,
    /// Number of advertisement attempts.
    pub advertise_calls: usize,
    /// Advertisement attempts that fail before one succeeds.
    pub advertise_failures: usize,
    /// Hostname and port advertised successfully.
    pub advertised: Option<(String, u16)>,
}

impl MockBrowser {
    /// Creates a browser that finds nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a browser that always answers with `records`.
    pub fn with_records(records: Vec<ServiceRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    /// Queues the answer for the next query round.
    pub fn push_round(&mut self, records: Vec<ServiceRecord>) {
        self.rounds.push_back(Ok(records));
    }

    /// Queues a failing query round.
    pub fn push_failure(&mut self) {
        self.rounds.push_back(Err(()));
    }
}

impl ServiceBrowser for MockBrowser {
    type Error = ();

    fn advertise(&mut self, hostname: &str, port: u16) -> Result<(), ()> {
        self.advertise_calls += 1;
        if self.advertise_calls <= self.advertise_failures {
            return Err(());
        }
        self.advertised = Some((hostname.to_string(), port));
        Ok(())
    }

    fn query(
        &mut self,
        _service: &str,
        _proto: &str,
        _timeout_ms: u32,
    ) -> Result<Vec<ServiceRecord>, ()> {
        self.query_calls += 1;
        match self.rounds.pop_front() {
            Some(round) => round,
            None => Ok(self.records.clone()),
        }
    }
}

/// A request captured by [`MockPeerClient`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Full URL.
    pub url: String,
    /// Requested timeout.
    pub timeout_ms: u32,
}

/// Mock HTTP client for talking to the SmartEVSE.
///
/// Queued responses are consumed first, in order. When the queue is empty
/// the response routed for the URL's path (query stripped) is returned;
/// anything else fails like a timeout.
#[derive(Debug, Default)]
pub struct MockPeerClient {
    /// Every request made, in order.
    pub requests: Vec<RecordedRequest>,
    queue: VecDeque<Result<PeerResponse, ()>>,
    routes: HashMap<String, PeerResponse>,
}

impl MockPeerClient {
    /// Creates a client with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response for the next request.
    pub fn push_response(&mut self, response: PeerResponse) {
        self.queue.push_back(Ok(response));
    }

    /// Queues a transport failure for the next request.
    pub fn push_error(&mut self) {
        self.queue.push_back(Err(()));
    }

    /// Answers every request for `path` with `response` once the queue is empty.
    pub fn route(&mut self, path: &str, response: PeerResponse) {
        self.routes.insert(path.to_string(), response);
    }

    /// Removes the route for `path`, so requests to it fail.
    pub fn unroute(&mut self, path: &str) {
        self.routes.remove(path);
    }

    /// Number of requests made.
    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    /// Number of requests whose path (query stripped) is `path`.
    pub fn requests_to(&self, path: &str) -> usize {
        self.requests.iter().filter(|r| url_path(&r.url) == path).count()
    }
}

fn url_path(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = rest.find('/').map_or("/", |i| &rest[i..]);
    path.split('?').next().unwrap_or(path)
}

impl PeerClient for MockPeerClient {
    type Error = ();

    fn request(
        &mut self,
        method: HttpMethod,
        url: &str,
        timeout_ms: u32,
    ) -> Result<PeerResponse, ()> {
        self.requests.push(RecordedRequest {
            method,
            url: url.to_string(),
            timeout_ms,
        });
        if let Some(next) = self.queue.pop_front() {
            return next;
        }
        self.routes.get(url_path(url)).cloned().ok_or(())
    }
}

/// Mock captive DNS responder.
#[derive(Debug, Default)]
pub struct MockDns {
    /// Address answered once started.
    pub ip: Option<Ipv4Addr>,
    /// Number of `process_next_request` calls while running.
    pub processed: usize,
}

impl MockDns {
    /// Creates a stopped responder.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CaptiveDns for MockDns {
    type Error = ();

    fn start(&mut self, ip: Ipv4Addr) -> Result<(), ()> {
        self.ip = Some(ip);
        Ok(())
    }

    fn process_next_request(&mut self) {
        if self.ip.is_some() {
            self.processed += 1;
        }
    }

    fn is_running(&self) -> bool {
        self.ip.is_some()
    }
}

// ============================================================================
// Display Mock
// ============================================================================

/// Mock display that tracks render calls.
///
/// # Example
///
/// ```rust
/// use evse_display::hal::MockDisplay;
/// use evse_display::traits::StatusDisplay;
/// use evse_display::ButtonLayout;
///
/// let mut display = MockDisplay::new();
/// display.draw_buttons(ButtonLayout::SelectDevice).unwrap();
/// assert_eq!(display.last_buttons(), Some(ButtonLayout::SelectDevice));
/// ```
#[derive(Debug, Default)]
pub struct MockDisplay {
    /// Number of full clears.
    pub clears: usize,
    /// Messages shown, first line only.
    pub messages: Vec<String>,
    /// Number of onboarding screens drawn.
    pub onboarding_draws: usize,
    /// Last onboarding screen drawn.
    pub last_onboarding: Option<OnboardingScreen>,
    /// Every button layout drawn, in order.
    pub button_draws: Vec<ButtonLayout>,
    /// Every status bar drawn, in order.
    pub status_draws: Vec<StatusBar>,
    /// Number of LCD frames drawn.
    pub lcd_frames: usize,
    /// Number of placeholder draws.
    pub placeholder_draws: usize,
    /// Host counts of every picker drawn.
    pub picker_draws: Vec<usize>,
    /// Makes `show_message` fail.
    pub fail_messages: bool,
}

impl MockDisplay {
    /// Creates a new mock display.
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently drawn button layout.
    pub fn last_buttons(&self) -> Option<ButtonLayout> {
        self.button_draws.last().copied()
    }

    /// The most recently drawn status bar.
    pub fn last_status(&self) -> Option<&StatusBar> {
        self.status_draws.last()
    }
}

impl StatusDisplay for MockDisplay {
    type Error = ();

    fn clear(&mut self) -> Result<(), ()> {
        self.clears += 1;
        Ok(())
    }

    fn show_message(&mut self, line1: &str, _line2: Option<&str>) -> Result<(), ()> {
        if self.fail_messages {
            return Err(());
        }
        self.messages.push(line1.to_string());
        Ok(())
    }

    fn draw_onboarding(&mut self, screen: &OnboardingScreen) -> Result<(), ()> {
        self.onboarding_draws += 1;
        self.last_onboarding = Some(screen.clone());
        Ok(())
    }

    fn draw_buttons(&mut self, layout: ButtonLayout) -> Result<(), ()> {
        self.button_draws.push(layout);
        Ok(())
    }

    fn draw_status_bar(&mut self, status: &StatusBar) -> Result<(), ()> {
        self.status_draws.push(status.clone());
        Ok(())
    }

    fn draw_lcd(&mut self, _frame: &LcdFrame) -> Result<(), ()> {
        self.lcd_frames += 1;
        Ok(())
    }

    fn draw_lcd_placeholder(&mut self) -> Result<(), ()> {
        self.placeholder_draws += 1;
        Ok(())
    }

    fn draw_picker(&mut self, hosts: &[PeerHost]) -> Result<(), ()> {
        self.picker_draws.push(hosts.len());
        Ok(())
    }
}

// ============================================================================
// Device Mocks
// ============================================================================

/// In-memory key/value store.
#[derive(Debug, Default)]
pub struct MockStore {
    /// Stored values.
    pub values: HashMap<String, String>,
    /// Number of writes.
    pub writes: usize,
}

impl MockStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MockStore {
    type Error = ();

    fn get(&self, key: &str) -> Result<Option<String>, ()> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ()> {
        self.writes += 1;
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Mock touch panel.
///
/// Each `read` pops one queued sample; an empty queue reads as "not touched".
#[derive(Debug, Default)]
pub struct MockTouch {
    /// Pending samples.
    pub samples: VecDeque<Option<TouchPoint>>,
}

impl MockTouch {
    /// Creates a panel with no pending samples.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `ticks` samples of the panel held at `point`.
    pub fn hold(&mut self, point: TouchPoint, ticks: usize) {
        self.samples.extend(std::iter::repeat(Some(point)).take(ticks));
    }

    /// Queues a release.
    pub fn release(&mut self) {
        self.samples.push_back(None);
    }

    /// Queues a one-sample tap at `point` followed by a release.
    pub fn tap(&mut self, point: TouchPoint) {
        self.hold(point, 1);
        self.release();
    }
}

impl TouchInput for MockTouch {
    type Error = ();

    fn read(&mut self) -> Result<Option<TouchPoint>, ()> {
        Ok(self.samples.pop_front().flatten())
    }
}

/// Mock speaker that records tones.
#[derive(Debug, Default)]
pub struct MockSpeaker {
    /// `(frequency_hz, duration_ms)` of every tone played.
    pub tones: Vec<(u32, u32)>,
}

impl MockSpeaker {
    /// Creates a silent speaker.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Speaker for MockSpeaker {
    fn tone(&mut self, frequency_hz: u32, duration_ms: u32) {
        self.tones.push((frequency_hz, duration_ms));
    }
}

/// Mock system control.
#[derive(Debug, Default)]
pub struct MockSystem {
    /// Number of restart requests.
    pub restarts: usize,
}

impl MockSystem {
    /// Creates a new mock.
    pub fn new() -> Self {
        Self::default()
    }
}

impl System for MockSystem {
    fn restart(&mut self) {
        self.restarts += 1;
    }
}

// ============================================================================
// Platform
// ============================================================================

/// Platform made of mocks.
#[derive(Debug)]
pub struct MockPlatform;

impl Platform for MockPlatform {
    type Radio = MockRadio;
    type Browser = MockBrowser;
    type Client = MockPeerClient;
    type Display = MockDisplay;
    type Store = MockStore;
    type Touch = MockTouch;
    type Speaker = MockSpeaker;
    type Dns = MockDns;
    type Delay = MockDelay;
    type System = MockSystem;
}

impl MockPlatform {
    /// Fresh mocks: a radio that never associates and an empty store.
    pub fn devices() -> Devices<MockPlatform> {
        Devices {
            radio: MockRadio::new(),
            browser: MockBrowser::new(),
            client: MockPeerClient::new(),
            display: MockDisplay::new(),
            store: MockStore::new(),
            touch: MockTouch::new(),
            speaker: MockSpeaker::new(),
            dns: MockDns::new(),
            delay: MockDelay::new(),
            system: MockSystem::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radio_associates_after_configured_polls() {
        let mut radio = MockRadio::new();
        radio.connect_after_polls = Some(3);
        assert!(!radio.is_connected());

        radio.begin_connect("Home", "pw").unwrap();
        assert!(!radio.is_connected());
        assert!(!radio.is_connected());
        assert!(radio.is_connected());
        assert!(radio.is_connected());
        assert_eq!(radio.ip_addr(), Some(Ipv4Addr::new(192, 168, 1, 77)));

        radio.drop_link();
        assert!(!radio.is_connected());
        assert_eq!(radio.ip_addr(), None);
    }

    #[test]
    fn browser_rounds_then_fallback() {
        let mut browser =
            MockBrowser::with_records(vec![ServiceRecord::new("SmartEVSE-1", None, 80)]);
        browser.push_failure();
        browser.push_round(Vec::new());

        assert!(browser.query("_http", "_tcp", 3000).is_err());
        assert!(browser.query("_http", "_tcp", 3000).unwrap().is_empty());
        assert_eq!(browser.query("_http", "_tcp", 3000).unwrap().len(), 1);
        assert_eq!(browser.query_calls, 3);
    }

    #[test]
    fn browser_advertise_failures() {
        let mut browser = MockBrowser::new();
        browser.advertise_failures = 2;
        assert!(browser.advertise("x", 80).is_err());
        assert!(browser.advertise("x", 80).is_err());
        assert!(browser.advertise("x", 80).is_ok());
        assert_eq!(browser.advertised, Some(("x".to_string(), 80)));
    }

    #[test]
    fn peer_client_queue_before_routes() {
        let mut client = MockPeerClient::new();
        client.route("/settings", PeerResponse::new(200, "{}"));
        client.push_response(PeerResponse::new(500, ""));

        let url = "http://10.0.0.9/settings?mode=3";
        assert_eq!(client.get(url, 100).unwrap().status, 500);
        assert_eq!(client.get(url, 100).unwrap().status, 200);
        assert!(client.get("http://10.0.0.9/lcd", 100).is_err());
        assert_eq!(client.requests_to("/settings"), 2);
        assert_eq!(client.requests_to("/lcd"), 1);
    }

    #[test]
    fn url_path_extraction() {
        assert_eq!(url_path("http://host/settings?x=1"), "/settings");
        assert_eq!(url_path("http://host"), "/");
        assert_eq!(url_path("/lcd"), "/lcd");
    }

    #[test]
    fn touch_queue() {
        let mut touch = MockTouch::new();
        touch.tap(TouchPoint::new(1, 2));
        assert_eq!(touch.read().unwrap(), Some(TouchPoint::new(1, 2)));
        assert_eq!(touch.read().unwrap(), None);
        assert_eq!(touch.read().unwrap(), None);
    }

    #[test]
    fn store_round_trip() {
        let mut store = MockStore::new();
        assert_eq!(store.get("ssid").unwrap(), None);
        store.set("ssid", "Home").unwrap();
        assert_eq!(store.get_or_empty("ssid"), "Home");
        assert_eq!(store.writes, 1);
    }
}
