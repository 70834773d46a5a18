//! Config portal services.
//!
//! The portal lets a phone or laptop joined to the onboarding access point
//! pick a Wi-Fi network and submit its passphrase:
//! - `portal`: platform-agnostic request handling
//! - `mailbox`: snapshots and requests exchanged with the main loop
//! - `assets`: the packaged web UI
//! - `captive_dns`: catch-all DNS so phones open the portal automatically
//! - `web` feature: axum router for running the portal on desktop
//!
//! # Mailbox Pattern
//!
//! Handlers never touch the radio or the store. They share one
//! `PortalMailbox` with the main loop through `Arc`:
//!
//! ```ignore
//! use std::sync::Arc;
//! use evse_display::services::{PortalHandler, PortalMailbox};
//!
//! let mailbox = Arc::new(PortalMailbox::new());
//! let handler = PortalHandler::new(Arc::clone(&mailbox));
//!
//! // HTTP server task
//! let resp = handler.handle_get("/api/wifi");
//!
//! // Main loop
//! let requests = mailbox.take_requests();
//! ```

pub mod assets;
pub mod captive_dns;
pub mod mailbox;
pub mod portal;

#[cfg(feature = "web")]
pub mod web;

// Re-exports
pub use captive_dns::UdpCaptiveDns;
pub use mailbox::*;
pub use portal::*;

#[cfg(feature = "web")]
pub use web::*;
