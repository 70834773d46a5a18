//! Cached Wi-Fi network scan.
//!
//! Platform scans are slow and block the radio, so results are kept for
//! [`WifiConfig::scan_cache_ms`](crate::config::WifiConfig) and shared by
//! the config portal's `/api/wifi` endpoint.
//!
//! # Example
//!
//! ```rust
//! use evse_display::hal::MockRadio;
//! use evse_display::scanner::{NetworkScanner, WifiNetwork};
//!
//! let mut radio = MockRadio::new();
//! radio.scan_results = vec![
//!     WifiNetwork::new("Home", -70, false),
//!     WifiNetwork::new("Home", -40, false),
//!     WifiNetwork::new("Cafe", -55, true),
//! ];
//!
//! let mut scanner = NetworkScanner::new(30_000);
//! let networks = scanner.scan(&mut radio, 1_000);
//!
//! assert_eq!(networks.len(), 2);
//! assert_eq!(networks[0], WifiNetwork::new("Home", -40, false));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cache::TimedCache;
use crate::traits::WifiRadio;

/// One visible network, as served by `/api/wifi`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiNetwork {
    /// Network name.
    pub ssid: String,
    /// Signal strength in dBm, higher is better.
    pub rssi: i32,
    /// No passphrase required.
    pub open: bool,
}

impl WifiNetwork {
    /// Creates a network entry.
    pub fn new(ssid: impl Into<String>, rssi: i32, open: bool) -> Self {
        Self {
            ssid: ssid.into(),
            rssi,
            open,
        }
    }
}

/// Wi-Fi scanner with a time-boxed result cache.
#[derive(Debug)]
pub struct NetworkScanner {
    cache: TimedCache<WifiNetwork>,
}

impl NetworkScanner {
    /// Creates a scanner whose results stay fresh for `max_age_ms`.
    pub fn new(max_age_ms: u64) -> Self {
        Self {
            cache: TimedCache::new(max_age_ms),
        }
    }

    /// Returns the visible networks, strongest first, one entry per name.
    ///
    /// Serves the cache while it is fresh. A failed platform scan is logged
    /// and cached as an empty list so a broken radio is not rescanned on
    /// every request.
    pub fn scan<R: WifiRadio>(&mut self, radio: &mut R, now_ms: u64) -> Vec<WifiNetwork> {
        if self.cache.is_fresh(now_ms) {
            return self.cache.snapshot();
        }

        let raw = match radio.scan() {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("[WiFi] Scan failed: {:?}", e);
                Vec::new()
            }
        };
        let networks = dedup_strongest(raw);
        log::info!("[WiFi] Scan found {} networks", networks.len());

        self.cache.mark_refreshed(now_ms);
        self.cache.replace(networks);
        self.cache.snapshot()
    }

    /// The last scan result without triggering a scan.
    pub fn cached(&self) -> &[WifiNetwork] {
        self.cache.results()
    }
}

/// Keeps the strongest entry per name and sorts by signal, descending.
///
/// On equal strength the entry seen first stays. Ties in the final order keep
/// the order in which the names were first seen.
pub fn dedup_strongest(raw: Vec<WifiNetwork>) -> Vec<WifiNetwork> {
    let mut best: BTreeMap<String, (usize, WifiNetwork)> = BTreeMap::new();
    for (seen, network) in raw.into_iter().enumerate() {
        match best.get_mut(&network.ssid) {
            Some((_, kept)) => {
                if network.rssi > kept.rssi {
                    *kept = network;
                }
            }
            None => {
                best.insert(network.ssid.clone(), (seen, network));
            }
        }
    }

    let mut ordered: Vec<(usize, WifiNetwork)> = best.into_values().collect();
    ordered.sort_by(|(a_seen, a), (b_seen, b)| b.rssi.cmp(&a.rssi).then(a_seen.cmp(b_seen)));
    ordered.into_iter().map(|(_, network)| network).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockRadio;

    fn net(ssid: &str, rssi: i32) -> WifiNetwork {
        WifiNetwork::new(ssid, rssi, false)
    }

    #[test]
    fn dedup_keeps_stronger_signal() {
        let out = dedup_strongest(vec![net("A", -80), net("B", -60), net("A", -50)]);
        assert_eq!(out, vec![net("A", -50), net("B", -60)]);
    }

    #[test]
    fn dedup_equal_strength_first_wins() {
        let first = WifiNetwork::new("A", -60, true);
        let second = WifiNetwork::new("A", -60, false);
        let out = dedup_strongest(vec![first.clone(), second]);
        assert_eq!(out, vec![first]);
    }

    #[test]
    fn output_sorted_non_increasing() {
        let out = dedup_strongest(vec![
            net("a", -90),
            net("b", -30),
            net("c", -60),
            net("d", -60),
            net("e", -75),
        ]);
        assert!(out.windows(2).all(|w| w[0].rssi >= w[1].rssi));
        // Equal strength keeps first-seen order
        assert_eq!(out[1].ssid, "c");
        assert_eq!(out[2].ssid, "d");
    }

    #[test]
    fn cached_within_window() {
        let mut radio = MockRadio::new();
        radio.scan_results = vec![net("Home", -50)];
        let mut scanner = NetworkScanner::new(30_000);

        let first = scanner.scan(&mut radio, 0);
        radio.scan_results = vec![net("Other", -40)];
        let second = scanner.scan(&mut radio, 29_999);

        assert_eq!(first, second);
        assert_eq!(radio.scan_calls, 1);

        let third = scanner.scan(&mut radio, 30_000);
        assert_eq!(third, vec![net("Other", -40)]);
        assert_eq!(radio.scan_calls, 2);
    }

    #[test]
    fn failed_scan_yields_empty_list() {
        let mut radio = MockRadio::new();
        radio.fail_scan = true;
        let mut scanner = NetworkScanner::new(30_000);

        assert!(scanner.scan(&mut radio, 0).is_empty());
        assert!(scanner.cached().is_empty());
    }
}
