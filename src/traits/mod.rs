//! Trait definitions for hardware, networking, display and storage.
//!
//! This module defines the core abstractions that allow evse-display to:
//! - Run on the M5Stack hardware and on desktop with mocks
//! - Swap the Wi-Fi, mDNS and HTTP stacks without touching the main loop
//! - Test the reconciliation loop deterministically
//!
//! # Submodules
//!
//! - `hardware`: Clock, delay, touch input, speaker, restart
//! - `network`: Wi-Fi radio, mDNS browser, peer HTTP client, captive DNS
//! - `display`: Status screen rendering
//! - `storage`: Persisted credentials and selected peer
//!
//! # Network Abstraction
//!
//! The key network traits are:
//!
//! - [`WifiRadio`]: Scan, associate, host an access point
//! - [`ServiceBrowser`]: Find `SmartEVSE*` hosts over mDNS
//! - [`PeerClient`]: Talk to the SmartEVSE REST API with bounded timeouts
//! - [`CaptiveDns`]: Redirect every name to the portal in AP mode

pub mod display;
pub mod hardware;
pub mod network;
pub mod storage;

pub use display::*;
pub use hardware::*;
pub use network::*;
pub use storage::*;
