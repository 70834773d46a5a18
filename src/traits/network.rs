//! Network abstraction traits for Wi-Fi, service discovery and HTTP.
//!
//! This module defines the interfaces the reconciliation loop uses to talk to
//! the network stack, so the loop can be exercised on desktop with mocks.
//!
//! # Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`WifiRadio`] | Scan, station association, access-point mode |
//! | [`ServiceBrowser`] | mDNS advertisement and `_http._tcp` queries |
//! | [`PeerClient`] | Bounded-timeout HTTP requests to the SmartEVSE |
//! | [`CaptiveDns`] | Catch-all DNS responder while in AP mode |
//!
//! # Peer HTTP API
//!
//! ```text
//! GET  /settings                 - Status JSON (mode_id, currents, evse state)
//! POST /settings?mode=<2|3>&...  - Mode change, answers {"mode": ...}
//! GET  /lcd                      - 128x64 monochrome BMP of the peer LCD
//! ```
//!
//! # Config Portal API
//!
//! ```text
//! GET  /api/wifi  - Scanned networks [{"ssid","rssi","open"}]
//! GET  /api/mdns  - Discovered peers [{"host"}]
//! GET  /*         - Packaged web UI assets
//! POST /          - Save credentials {"ssid","password"}
//! ```

use core::fmt::Debug;
use std::net::Ipv4Addr;

use crate::config::AccessPointConfig;
use crate::scanner::WifiNetwork;

// ============================================================================
// Wi-Fi Radio
// ============================================================================

/// Wi-Fi radio trait.
///
/// Association is split into [`begin_connect`](Self::begin_connect) and
/// [`is_connected`](Self::is_connected) so the connectivity manager owns the
/// polling budget and backoff.
///
/// # Implementation Notes
///
/// - `scan` blocks until the scan completes
/// - `begin_connect` must not block waiting for the association
/// - `start_access_point` configures the fixed AP subnet from the config
pub trait WifiRadio {
    /// Error type for radio operations.
    type Error: Debug;

    /// Run a blocking scan and return every access point seen.
    ///
    /// Results may contain duplicate network names.
    fn scan(&mut self) -> Result<Vec<WifiNetwork>, Self::Error>;

    /// Start associating with a network in station mode.
    fn begin_connect(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error>;

    /// Check whether the station is associated and has an address.
    fn is_connected(&self) -> bool;

    /// Switch the radio to access-point role.
    fn start_access_point(&mut self, config: &AccessPointConfig) -> Result<(), Self::Error>;

    /// The device's own address on the active interface, if any.
    fn ip_addr(&self) -> Option<Ipv4Addr>;

    /// Station MAC address, used to derive the advertised hostname.
    fn mac_address(&self) -> [u8; 6];
}

// ============================================================================
// Service Discovery
// ============================================================================

/// One answer of an mDNS service query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceRecord {
    /// Advertised host name (e.g., `SmartEVSE-12345`).
    pub hostname: String,
    /// Resolved IPv4 address, if the responder included one.
    pub address: Option<Ipv4Addr>,
    /// Service port.
    pub port: u16,
}

impl ServiceRecord {
    /// Create a new service record.
    pub fn new(hostname: impl Into<String>, address: Option<Ipv4Addr>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            address,
            port,
        }
    }
}

/// mDNS service browser.
///
/// Used both to find SmartEVSE peers and to announce the display itself.
pub trait ServiceBrowser {
    /// Error type for mDNS operations.
    type Error: Debug;

    /// Start the responder and announce `hostname` with an HTTP service.
    fn advertise(&mut self, hostname: &str, port: u16) -> Result<(), Self::Error>;

    /// Run one blocking query for `service`/`proto` (e.g., `_http`/`_tcp`).
    fn query(
        &mut self,
        service: &str,
        proto: &str,
        timeout_ms: u32,
    ) -> Result<Vec<ServiceRecord>, Self::Error>;
}

// ============================================================================
// Peer HTTP Client
// ============================================================================

/// HTTP request methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    /// HTTP GET request.
    Get,
    /// HTTP POST request.
    Post,
}

/// A response received from the peer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl PeerResponse {
    /// Create a response with the given status and body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the body as a UTF-8 string, if valid.
    pub fn body_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.body).ok()
    }
}

/// HTTP client used to reach the SmartEVSE.
///
/// Every request carries its own timeout; there is no cancellation.
/// Implementations that keep a connection open across calls must drop it
/// after a failed request so the next call starts from a fresh session.
pub trait PeerClient {
    /// Error type for transport failures (timeouts, refused connections).
    type Error: Debug;

    /// Perform a request with an empty body and read the whole response.
    fn request(
        &mut self,
        method: HttpMethod,
        url: &str,
        timeout_ms: u32,
    ) -> Result<PeerResponse, Self::Error>;

    /// Convenience GET.
    fn get(&mut self, url: &str, timeout_ms: u32) -> Result<PeerResponse, Self::Error> {
        self.request(HttpMethod::Get, url, timeout_ms)
    }
}

// ============================================================================
// Captive DNS
// ============================================================================

/// Catch-all DNS responder for the captive portal.
///
/// While running, every A query is answered with the device's own address so
/// that phones open the config portal after joining the access point.
pub trait CaptiveDns {
    /// Error type for socket setup.
    type Error: Debug;

    /// Start answering queries with `ip`.
    fn start(&mut self, ip: Ipv4Addr) -> Result<(), Self::Error>;

    /// Answer at most one pending query without blocking.
    ///
    /// Must be called frequently from the main loop.
    fn process_next_request(&mut self);

    /// Returns true once [`start`](Self::start) succeeded.
    fn is_running(&self) -> bool;
}

// ============================================================================
// Config Portal HTTP Types
// ============================================================================

/// An HTTP response produced by the config portal.
///
/// Helper methods are provided for common response types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code (e.g., 200, 404, 500).
    pub status: u16,
    /// Content-Type header value.
    pub content_type: &'static str,
    /// Response body as bytes.
    pub body: Vec<u8>,
    /// `Last-Modified` header value for static assets.
    pub last_modified: Option<String>,
    /// Whether to send `Access-Control-Allow-Origin: *`.
    pub cors: bool,
}

impl HttpResponse {
    /// Creates a response with the given status, content type and body.
    pub fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
            last_modified: None,
            cors: false,
        }
    }

    /// Creates a 200 OK response with JSON content and a permissive CORS header.
    pub fn ok_json(body: &str) -> Self {
        Self {
            cors: true,
            ..Self::new(200, "application/json", body.as_bytes())
        }
    }

    /// Creates a plain-text response.
    pub fn text(status: u16, body: &str) -> Self {
        Self::new(status, "text/plain", body.as_bytes())
    }

    /// Creates a 404 Not Found response.
    pub fn not_found() -> Self {
        Self::text(404, "Not found 404")
    }

    /// Creates a 400 Bad Request response.
    pub fn bad_request() -> Self {
        Self::text(400, "Error")
    }

    /// Sets the `Last-Modified` header value.
    pub fn with_last_modified(mut self, value: impl Into<String>) -> Self {
        self.last_modified = Some(value.into());
        self
    }

    /// Returns the body as a UTF-8 string, if valid.
    pub fn body_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.body).ok()
    }
}
