//! Mailbox between the config portal and the main loop.
//!
//! HTTP handlers run on the server's own task and must not touch the radio,
//! the mDNS browser or the store. Instead they read the snapshots the main
//! loop last published and leave requests that the loop drains at the start
//! of each tick, so the loop stays the only writer of device state.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use evse_display::services::PortalMailbox;
//! use evse_display::scanner::WifiNetwork;
//!
//! let mailbox = Arc::new(PortalMailbox::new());
//!
//! // Handler side: read the snapshot, which also asks for a rescan
//! assert!(mailbox.networks().is_empty());
//!
//! // Loop side: drain requests, do the work, publish
//! let requests = mailbox.take_requests();
//! assert!(requests.scan);
//! mailbox.publish_networks(vec![WifiNetwork::new("Home", -50, false)]);
//! assert_eq!(mailbox.networks().len(), 1);
//! ```

use core::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::discovery::PeerHost;
use crate::scanner::WifiNetwork;

/// Station credentials submitted through the portal.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Network name.
    pub ssid: String,
    /// Passphrase, possibly empty.
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Work the portal asked the main loop to do.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PortalRequests {
    /// A fresh Wi-Fi scan snapshot is wanted.
    pub scan: bool,
    /// A fresh discovery snapshot is wanted.
    pub discovery: bool,
    /// Credentials to persist; the latest submission wins.
    pub credentials: Option<Credentials>,
    /// Restart after the grace delay.
    pub reboot: bool,
}

impl PortalRequests {
    /// Returns true when nothing is pending.
    pub fn is_empty(&self) -> bool {
        !self.scan && !self.discovery && self.credentials.is_none() && !self.reboot
    }
}

#[derive(Debug, Default)]
struct Inner {
    networks: Vec<WifiNetwork>,
    peers: Vec<PeerHost>,
    requests: PortalRequests,
}

/// Thread-safe exchange between portal handlers and the main loop.
///
/// Share it with `Arc`. A poisoned lock is recovered rather than
/// propagated; the data is plain snapshots with no cross-field invariant.
#[derive(Debug, Default)]
pub struct PortalMailbox {
    inner: Mutex<Inner>,
}

impl PortalMailbox {
    /// Creates an empty mailbox.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------------
    // Handler side
    // ------------------------------------------------------------------------

    /// Last published scan result; also requests a refresh.
    pub fn networks(&self) -> Vec<WifiNetwork> {
        let mut inner = self.lock();
        inner.requests.scan = true;
        inner.networks.clone()
    }

    /// Last published discovery result; also requests a refresh.
    pub fn peers(&self) -> Vec<PeerHost> {
        let mut inner = self.lock();
        inner.requests.discovery = true;
        inner.peers.clone()
    }

    /// Queues credentials for the loop to persist.
    pub fn submit_credentials(&self, credentials: Credentials) {
        self.lock().requests.credentials = Some(credentials);
    }

    /// Queues a restart.
    pub fn request_reboot(&self) {
        self.lock().requests.reboot = true;
    }

    // ------------------------------------------------------------------------
    // Loop side
    // ------------------------------------------------------------------------

    /// Takes all pending requests, leaving none behind.
    pub fn take_requests(&self) -> PortalRequests {
        core::mem::take(&mut self.lock().requests)
    }

    /// Publishes a scan result.
    pub fn publish_networks(&self, networks: Vec<WifiNetwork>) {
        self.lock().networks = networks;
    }

    /// Publishes a discovery result.
    pub fn publish_peers(&self, peers: Vec<PeerHost>) {
        self.lock().peers = peers;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn reads_request_refresh() {
        let mailbox = PortalMailbox::new();
        assert!(mailbox.take_requests().is_empty());

        mailbox.peers();
        let requests = mailbox.take_requests();
        assert!(requests.discovery);
        assert!(!requests.scan);
        assert!(mailbox.take_requests().is_empty());
    }

    #[test]
    fn latest_credentials_win() {
        let mailbox = PortalMailbox::new();
        mailbox.submit_credentials(Credentials {
            ssid: "First".into(),
            password: "a".into(),
        });
        mailbox.submit_credentials(Credentials {
            ssid: "Second".into(),
            password: "b".into(),
        });
        let creds = mailbox.take_requests().credentials.unwrap();
        assert_eq!(creds.ssid, "Second");
    }

    #[test]
    fn debug_redacts_password() {
        let creds = Credentials {
            ssid: "Home".into(),
            password: "hunter2".into(),
        };
        let text = format!("{:?}", creds);
        assert!(text.contains("Home"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn survives_poisoned_lock() {
        let mailbox = Arc::new(PortalMailbox::new());
        let clone = Arc::clone(&mailbox);
        let _ = std::thread::spawn(move || {
            let _guard = clone.inner.lock().unwrap();
            panic!("poison");
        })
        .join();

        mailbox.request_reboot();
        assert!(mailbox.take_requests().reboot);
    }
}
