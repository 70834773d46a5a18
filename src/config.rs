//! Shared configuration system for desktop and ESP32.
//!
//! Uses `heapless::String` for the short, bounded strings the device keeps
//! around (SSIDs, host names, passwords). Defaults match the behaviour of the
//! shipped firmware; persisted values are overlaid with
//! [`Config::load_persisted`].
//!
//! # Example
//!
//! ```rust
//! use evse_display::config::{Config, PeerConfig, WifiConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.access_point.ssid.as_str(), "SmartEVSE_Display");
//!
//! // Or customize
//! let config = Config::default()
//!     .with_wifi(WifiConfig::default().with_ssid("Home").with_password("secret"))
//!     .with_peer(PeerConfig::default().with_host("192.168.1.50"));
//! assert!(config.wifi.is_configured());
//! ```

use std::net::Ipv4Addr;

use heapless::String as HString;
use serde::{Deserialize, Serialize};

use crate::traits::{KeyValueStore, KEY_PASSWORD, KEY_PEER_HOST, KEY_SSID};

/// Maximum length for short config strings (SSIDs, passwords, hostnames)
pub const MAX_SHORT_STRING: usize = 64;

/// Maximum length for longer config strings (URLs)
pub const MAX_LONG_STRING: usize = 128;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Type alias for longer config strings
pub type LongString = HString<MAX_LONG_STRING>;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

fn utf8_prefix(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let _ = hs.push_str(utf8_prefix(s, MAX_SHORT_STRING));
    hs
}

/// Create a LongString from a &str, truncating if too long
pub fn long_string(s: &str) -> LongString {
    let mut hs = LongString::new();
    let _ = hs.push_str(utf8_prefix(s, MAX_LONG_STRING));
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Station credentials and association budget
    pub wifi: WifiConfig,
    /// Fallback access point
    pub access_point: AccessPointConfig,
    /// SmartEVSE peer connection
    pub peer: PeerConfig,
    /// mDNS discovery and advertisement
    pub discovery: DiscoveryConfig,
    /// Config portal web server
    pub web: WebConfig,
    /// Device identification
    pub device: DeviceConfig,
    /// Touch and screen timing
    pub ui: UiConfig,
}

impl Config {
    /// Set WiFi configuration
    pub fn with_wifi(mut self, wifi: WifiConfig) -> Self {
        self.wifi = wifi;
        self
    }

    /// Set access point configuration
    pub fn with_access_point(mut self, ap: AccessPointConfig) -> Self {
        self.access_point = ap;
        self
    }

    /// Set peer configuration
    pub fn with_peer(mut self, peer: PeerConfig) -> Self {
        self.peer = peer;
        self
    }

    /// Set discovery configuration
    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = discovery;
        self
    }

    /// Set web configuration
    pub fn with_web(mut self, web: WebConfig) -> Self {
        self.web = web;
        self
    }

    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }

    /// Set UI configuration
    pub fn with_ui(mut self, ui: UiConfig) -> Self {
        self.ui = ui;
        self
    }

    /// Overlay persisted credentials and the selected peer host.
    ///
    /// Missing keys and read errors leave the current values untouched.
    pub fn load_persisted<S: KeyValueStore>(mut self, store: &S) -> Self {
        if let Ok(Some(ssid)) = store.get(KEY_SSID) {
            self.wifi.ssid = short_string(&ssid);
        }
        if let Ok(Some(password)) = store.get(KEY_PASSWORD) {
            self.wifi.password = short_string(&password);
        }
        if let Ok(Some(host)) = store.get(KEY_PEER_HOST) {
            self.peer.host = short_string(&host);
        }
        self
    }
}

// ============================================================================
// WiFi Config
// ============================================================================

/// WiFi station configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WifiConfig {
    /// WiFi network SSID
    pub ssid: ShortString,
    /// WiFi password
    pub password: ShortString,
    /// Association polls per connect attempt
    pub connect_polls: u8,
    /// Delay between association polls in milliseconds
    pub poll_interval_ms: u32,
    /// Connect attempts at boot before falling back to AP mode
    pub boot_attempts: u8,
    /// Delay between boot connect attempts in milliseconds
    pub boot_retry_delay_ms: u32,
    /// How long a scan result stays fresh in milliseconds
    pub scan_cache_ms: u64,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: ShortString::new(),
            password: ShortString::new(),
            connect_polls: 5,
            poll_interval_ms: 500,
            boot_attempts: 3,
            boot_retry_delay_ms: 1000,
            scan_cache_ms: 30_000,
        }
    }
}

impl WifiConfig {
    /// Set the SSID
    pub fn with_ssid(mut self, ssid: &str) -> Self {
        self.ssid = short_string(ssid);
        self
    }

    /// Set the password
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = short_string(password);
        self
    }

    /// Set the association poll budget
    pub fn with_connect_polls(mut self, polls: u8) -> Self {
        self.connect_polls = polls;
        self
    }

    /// Set the number of boot connect attempts
    pub fn with_boot_attempts(mut self, attempts: u8) -> Self {
        self.boot_attempts = attempts;
        self
    }

    /// Check if WiFi credentials are configured
    pub fn is_configured(&self) -> bool {
        !self.ssid.is_empty()
    }
}

// ============================================================================
// Access Point Config
// ============================================================================

/// Fallback access point configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessPointConfig {
    /// Advertised network name
    pub ssid: ShortString,
    /// WPA2 passphrase
    pub password: ShortString,
    /// Gateway address of the AP subnet (the device itself)
    pub ip: Ipv4Addr,
    /// Subnet prefix length
    pub prefix_len: u8,
    /// Radio channel
    pub channel: u8,
}

impl Default for AccessPointConfig {
    fn default() -> Self {
        Self {
            ssid: short_string("SmartEVSE_Display"),
            password: short_string("12345678"),
            ip: Ipv4Addr::new(192, 168, 4, 1),
            prefix_len: 24,
            channel: 1,
        }
    }
}

impl AccessPointConfig {
    /// Set the AP credentials
    pub fn with_credentials(mut self, ssid: &str, password: &str) -> Self {
        self.ssid = short_string(ssid);
        self.password = short_string(password);
        self
    }

    /// Set the gateway address
    pub fn with_ip(mut self, ip: Ipv4Addr) -> Self {
        self.ip = ip;
        self
    }

    /// Portal URL shown on the onboarding screen
    pub fn portal_url(&self) -> LongString {
        let mut url = LongString::new();
        let _ = core::fmt::write(&mut url, format_args!("http://{}", self.ip));
        url
    }
}

// ============================================================================
// Peer Config
// ============================================================================

/// SmartEVSE connection configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PeerConfig {
    /// Selected peer host (IP or name); empty when none is selected
    pub host: ShortString,
    /// Status poll interval in milliseconds
    pub poll_interval_ms: u64,
    /// Timeout for status and mode requests in milliseconds
    pub request_timeout_ms: u32,
    /// LCD mirror refresh interval in milliseconds
    pub lcd_interval_ms: u64,
    /// Timeout for LCD fetches in milliseconds
    pub lcd_timeout_ms: u32,
    /// Timestamp sent as start/stop time with mode changes
    pub schedule_stamp: ShortString,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            host: ShortString::new(),
            poll_interval_ms: 3000,
            request_timeout_ms: 1500,
            lcd_interval_ms: 1000,
            lcd_timeout_ms: 750,
            schedule_stamp: short_string("2025-05-15T00:27"),
        }
    }
}

impl PeerConfig {
    /// Set the selected host
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = short_string(host);
        self
    }

    /// Set the poll interval
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout_ms(mut self, ms: u32) -> Self {
        self.request_timeout_ms = ms;
        self
    }

    /// Check if a peer host is selected
    pub fn has_host(&self) -> bool {
        !self.host.is_empty()
    }
}

// ============================================================================
// Discovery Config
// ============================================================================

/// mDNS discovery and advertisement configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Host name prefix identifying SmartEVSE controllers
    pub name_prefix: ShortString,
    /// Service type queried and advertised
    pub service: ShortString,
    /// Service protocol
    pub proto: ShortString,
    /// Query rounds per discovery pass
    pub rounds: u8,
    /// Delay after each query round in milliseconds
    pub round_delay_ms: u32,
    /// Timeout of a single query in milliseconds
    pub query_timeout_ms: u32,
    /// How long a discovery result stays fresh in milliseconds
    pub cache_ms: u64,
    /// Responder start attempts before giving up
    pub advertise_attempts: u8,
    /// Delay between responder start attempts in milliseconds
    pub advertise_retry_delay_ms: u32,
    /// Maximum candidates offered by the device picker
    pub max_candidates: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            name_prefix: short_string("SmartEVSE"),
            service: short_string("_http"),
            proto: short_string("_tcp"),
            rounds: 3,
            round_delay_ms: 1000,
            query_timeout_ms: 3000,
            cache_ms: 30_000,
            advertise_attempts: 5,
            advertise_retry_delay_ms: 1000,
            max_candidates: 4,
        }
    }
}

impl DiscoveryConfig {
    /// Set the host name prefix
    pub fn with_name_prefix(mut self, prefix: &str) -> Self {
        self.name_prefix = short_string(prefix);
        self
    }

    /// Set the number of query rounds
    pub fn with_rounds(mut self, rounds: u8) -> Self {
        self.rounds = rounds;
        self
    }

    /// Set the cache lifetime
    pub fn with_cache_ms(mut self, ms: u64) -> Self {
        self.cache_ms = ms;
        self
    }
}

// ============================================================================
// Web Config
// ============================================================================

/// Config portal web server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebConfig {
    /// Port to listen on
    pub port: u16,
    /// Whether to enable CORS for all origins on the JSON APIs
    pub cors_permissive: bool,
    /// Whether web server is enabled
    pub enabled: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 80,
            cors_permissive: true,
            enabled: true,
        }
    }
}

impl WebConfig {
    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set CORS mode
    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Enable or disable web server
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Prefix of the advertised mDNS host name
    pub hostname_prefix: ShortString,
    /// Delay between a reboot request and the restart in milliseconds
    pub reboot_delay_ms: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            hostname_prefix: short_string("smartevse-display"),
            reboot_delay_ms: 2000,
        }
    }
}

impl DeviceConfig {
    /// Set the host name prefix
    pub fn with_hostname_prefix(mut self, prefix: &str) -> Self {
        self.hostname_prefix = short_string(prefix);
        self
    }

    /// Build the advertised host name from the factory MAC.
    ///
    /// The suffix is the decimal value of the two lowest MAC bytes, so two
    /// displays on one network get distinct names.
    pub fn hostname(&self, mac: [u8; 6]) -> ShortString {
        let suffix = u16::from_le_bytes([mac[0], mac[1]]);
        let mut name = ShortString::new();
        let _ = core::fmt::write(
            &mut name,
            format_args!("{}-{}", self.hostname_prefix, suffix),
        );
        name
    }
}

// ============================================================================
// UI Config
// ============================================================================

/// Touch and screen timing configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UiConfig {
    /// Main loop period in milliseconds
    pub tick_ms: u32,
    /// Hold duration that opens the device picker in milliseconds
    pub long_press_ms: u64,
    /// Feedback tone frequency
    pub beep_hz: u32,
    /// Feedback tone duration in milliseconds
    pub beep_ms: u32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            long_press_ms: 2000,
            beep_hz: 1000,
            beep_ms: 50,
        }
    }
}

impl UiConfig {
    /// Set the long-press threshold
    pub fn with_long_press_ms(mut self, ms: u64) -> Self {
        self.long_press_ms = ms;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockStore;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.web.port, 80);
        assert_eq!(config.peer.poll_interval_ms, 3000);
        assert_eq!(config.peer.request_timeout_ms, 1500);
        assert_eq!(config.discovery.rounds, 3);
        assert_eq!(config.access_point.ip, Ipv4Addr::new(192, 168, 4, 1));
        assert!(!config.wifi.is_configured());
        assert!(!config.peer.has_host());
    }

    #[test]
    fn short_string_truncation() {
        let long_input = "a".repeat(100);
        let s = short_string(&long_input);
        assert_eq!(s.len(), MAX_SHORT_STRING);
    }

    #[test]
    fn string_helpers_utf8_boundary() {
        // 4-byte chars, 64 is a boundary but 63 is not
        let input = "\u{1F50C}".repeat(20);
        let s = short_string(&input);
        assert!(s.len() <= MAX_SHORT_STRING);
        assert_eq!(s.len() % 4, 0);

        let odd = format!("a{}", "\u{1F50C}".repeat(40));
        let s = long_string(&odd);
        assert!(s.len() <= MAX_LONG_STRING);
        assert!(core::str::from_utf8(s.as_bytes()).is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = Config::default()
            .with_wifi(WifiConfig::default().with_ssid("Home").with_connect_polls(2))
            .with_peer(PeerConfig::default().with_host("10.0.0.7"))
            .with_web(WebConfig::default().with_port(8080))
            .with_ui(UiConfig::default().with_long_press_ms(1500));

        assert_eq!(config.wifi.ssid.as_str(), "Home");
        assert_eq!(config.wifi.connect_polls, 2);
        assert_eq!(config.peer.host.as_str(), "10.0.0.7");
        assert_eq!(config.web.port, 8080);
        assert_eq!(config.ui.long_press_ms, 1500);
    }

    #[test]
    fn portal_url_uses_ap_address() {
        let ap = AccessPointConfig::default();
        assert_eq!(ap.portal_url().as_str(), "http://192.168.4.1");
    }

    #[test]
    fn hostname_from_mac_low_bytes() {
        let device = DeviceConfig::default();
        let name = device.hostname([0x34, 0x12, 0xaa, 0xbb, 0xcc, 0xdd]);
        assert_eq!(name.as_str(), "smartevse-display-4660");
    }

    #[test]
    fn load_persisted_overlays_store_values() {
        let mut store = MockStore::new();
        store.set(KEY_SSID, "Home").unwrap();
        store.set(KEY_PEER_HOST, "192.168.1.50").unwrap();

        let config = Config::default().load_persisted(&store);
        assert_eq!(config.wifi.ssid.as_str(), "Home");
        assert!(config.wifi.password.is_empty());
        assert_eq!(config.peer.host.as_str(), "192.168.1.50");
    }

    #[test]
    fn load_persisted_keeps_defaults_when_empty() {
        let store = MockStore::new();
        let config = Config::default()
            .with_wifi(WifiConfig::default().with_ssid("Preset"))
            .load_persisted(&store);
        assert_eq!(config.wifi.ssid.as_str(), "Preset");
    }
}
