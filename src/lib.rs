//! # evse-display
//!
//! A touchscreen companion display and remote for SmartEVSE charging
//! controllers, built for the M5Stack Core2 / Tough.
//!
//! ## Features
//!
//! - **Onboarding**: Falls back to an access point with a captive config
//!   portal and a Wi-Fi QR join code when no network is reachable
//! - **Peer discovery**: Finds `SmartEVSE*` hosts over mDNS with a short-lived cache
//! - **Status polling**: Reads the charge mode from the SmartEVSE REST API and
//!   switches between Solar and Smart on touch
//! - **LCD mirror**: Shows the SmartEVSE's own 128x64 LCD
//! - **Hardware abstraction**: Every device sits behind a trait so the whole
//!   loop runs on desktop with mocks
//!
//! ## Architecture
//!
//! - `traits` - Hardware and network abstractions
//! - `connectivity` - Boot-time station join with access-point fallback
//! - `scanner` / `discovery` - Wi-Fi scan and mDNS peer lookup, both cached
//! - `poller` / `lcd` - Periodic SmartEVSE requests
//! - `reconciler` - Pure touch-to-command and layout decisions
//! - `app` - The main loop tying everything together
//! - `services` - Config portal (handlers, web assets, captive DNS)
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use evse_display::{
//!     reconcile, ButtonLayout, ChargeMode, Gesture, TouchPoint, UiCommand, UiFacts,
//! };
//!
//! let facts = UiFacts {
//!     wifi_connected: true,
//!     peer_connected: true,
//!     charge_mode: ChargeMode::Smart,
//! };
//!
//! // Tapping the Solar button while in Smart mode
//! let result = reconcile(facts, Some(Gesture::Tap(TouchPoint::new(60, 150))));
//! assert_eq!(result.layout, ButtonLayout::ModePair { active: ChargeMode::Smart });
//! assert_eq!(
//!     result.commands.as_slice(),
//!     &[UiCommand::Beep, UiCommand::ChangeMode(ChargeMode::Solar)]
//! );
//! ```

#![warn(missing_docs)]

/// Main loop and device bundle.
pub mod app;
/// Monochrome BMP decoding for the mirrored LCD.
pub mod bitmap;
/// Time-bounded value cache.
pub mod cache;
/// Shared configuration system for desktop and ESP32.
pub mod config;
/// Station join with access-point fallback.
pub mod connectivity;
/// mDNS discovery of SmartEVSE hosts.
pub mod discovery;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Periodic LCD bitmap fetcher.
pub mod lcd;
/// Access-point onboarding screen and Wi-Fi QR code.
pub mod onboarding;
/// Device picker shown after discovery.
pub mod picker;
/// SmartEVSE status polling and mode changes.
pub mod poller;
/// Touch gestures, button layout and status bar.
pub mod reconciler;
/// Wi-Fi scan with deduplication and caching.
pub mod scanner;
/// Config portal: handlers, web assets, captive DNS.
pub mod services;
/// Shared connection state.
pub mod state;
/// Core traits for hardware and network abstraction.
pub mod traits;

/// embedded-graphics renderer for the status screen.
#[cfg(feature = "display")]
pub mod render;

// Re-exports for convenience
pub use app::{App, Devices, Platform, Screen};
pub use bitmap::{BitmapError, LcdFrame};
pub use config::{
    AccessPointConfig, Config, DeviceConfig, DiscoveryConfig, PeerConfig, UiConfig, WebConfig,
    WifiConfig,
};
pub use connectivity::{ConnectivityManager, NetworkMode};
pub use discovery::{PeerDiscovery, PeerHost};
pub use lcd::{LcdMirror, LcdRefresh};
pub use onboarding::{OnboardingScreen, QrMatrix};
pub use picker::{DevicePicker, PickerEvent};
pub use poller::{PeerStatus, PollOutcome, StatusPoller};
pub use reconciler::{
    layout_for, reconcile, ButtonLayout, Gesture, Rect, Reconciliation, StatusBar, TouchTracker,
    UiCommand, UiFacts,
};
pub use scanner::{NetworkScanner, WifiNetwork};
pub use state::{ChargeMode, ConnectionState, ErrorKind, LinkStatus};
pub use traits::{
    // Hardware
    Clock,
    Delay,
    Speaker,
    System,
    TouchInput,
    TouchPoint,
    // Network
    CaptiveDns,
    HttpMethod,
    HttpResponse,
    PeerClient,
    PeerResponse,
    ServiceBrowser,
    ServiceRecord,
    WifiRadio,
    // Display / storage
    KeyValueStore,
    StatusDisplay,
};
