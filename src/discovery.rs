//! SmartEVSE discovery over mDNS.
//!
//! SmartEVSE controllers announce an `_http._tcp` service under a host name
//! starting with `SmartEVSE`, followed by their serial number. Responders on
//! a busy network answer unreliably, so one discovery pass runs several query
//! rounds and merges their answers.
//!
//! # Caching
//!
//! | Situation | Result |
//! |-----------|--------|
//! | Cache fresh, not forced | Cached list, no query |
//! | Pass finds hosts | New list, cache replaced |
//! | Pass finds nothing | Previous (possibly stale) cache |
//!
//! The refresh timestamp is taken when a pass *starts*, so an empty pass
//! still holds off the next unforced query for the full cache window.

use std::net::Ipv4Addr;

use serde::Serialize;

use crate::cache::TimedCache;
use crate::config::DiscoveryConfig;
use crate::traits::{Delay, ServiceBrowser, ServiceRecord};

/// A SmartEVSE found on the network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PeerHost {
    /// Advertised mDNS host name (e.g., `SmartEVSE-12345`).
    pub advertised_name: String,
    /// Serial number parsed from the advertised name; may be empty.
    pub serial_suffix: String,
    /// Resolved address, if the responder included one.
    pub address: Option<Ipv4Addr>,
    /// Service port.
    pub port: u16,
}

impl PeerHost {
    /// Builds a peer from a service record, splitting off the serial suffix.
    pub fn from_record(record: ServiceRecord, prefix: &str) -> Self {
        let serial_suffix = record
            .hostname
            .strip_prefix(prefix)
            .map(|rest| rest.trim_start_matches('-').to_string())
            .unwrap_or_default();
        Self {
            advertised_name: record.hostname,
            serial_suffix,
            address: record.address,
            port: record.port,
        }
    }

    /// The host to persist and poll: the address when known, else `<name>.local`.
    pub fn host(&self) -> String {
        match self.address {
            Some(ip) => ip.to_string(),
            None => format!("{}.local", self.advertised_name),
        }
    }

    /// Picker row label.
    pub fn label(&self) -> String {
        format!("{} ({})", self.advertised_name, self.host())
    }
}

/// mDNS discovery with multi-round queries and a time-boxed cache.
#[derive(Debug)]
pub struct PeerDiscovery {
    config: DiscoveryConfig,
    cache: TimedCache<PeerHost>,
}

impl PeerDiscovery {
    /// Creates a discovery instance with an empty cache.
    pub fn new(config: DiscoveryConfig) -> Self {
        let cache = TimedCache::new(config.cache_ms);
        Self { config, cache }
    }

    /// Returns SmartEVSE hosts on the network, first occurrence per name.
    ///
    /// Blocks for `rounds * round_delay_ms` plus query time when a pass runs.
    pub fn discover<B, D>(
        &mut self,
        browser: &mut B,
        delay: &mut D,
        now_ms: u64,
        force_fresh: bool,
    ) -> Vec<PeerHost>
    where
        B: ServiceBrowser,
        D: Delay,
    {
        if !force_fresh && self.cache.is_fresh(now_ms) {
            return self.cache.snapshot();
        }
        self.cache.mark_refreshed(now_ms);

        let prefix = self.config.name_prefix.as_str();
        let mut hosts: Vec<PeerHost> = Vec::new();

        for round in 0..self.config.rounds {
            match browser.query(
                self.config.service.as_str(),
                self.config.proto.as_str(),
                self.config.query_timeout_ms,
            ) {
                Ok(records) => {
                    for record in records {
                        if !record.hostname.starts_with(prefix) {
                            continue;
                        }
                        if hosts.iter().any(|h| h.advertised_name == record.hostname) {
                            continue;
                        }
                        hosts.push(PeerHost::from_record(record, prefix));
                    }
                }
                Err(e) => log::warn!("[mDNS] Query round {} failed: {:?}", round + 1, e),
            }
            delay.delay_ms(self.config.round_delay_ms);
        }

        log::info!("[mDNS] Discovery found {} SmartEVSE hosts", hosts.len());

        if hosts.is_empty() {
            return self.cache.snapshot();
        }
        self.cache.replace(hosts.clone());
        hosts
    }

    /// The last non-empty discovery result without querying.
    pub fn cached(&self) -> &[PeerHost] {
        self.cache.results()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, last_octet: u8) -> ServiceRecord {
        ServiceRecord::new(name, Some(Ipv4Addr::new(192, 168, 1, last_octet)), 80)
    }

    #[test]
    fn serial_suffix_parsing() {
        let peer = PeerHost::from_record(record("SmartEVSE-12345", 9), "SmartEVSE");
        assert_eq!(peer.serial_suffix, "12345");

        let bare = PeerHost::from_record(record("SmartEVSE", 9), "SmartEVSE");
        assert_eq!(bare.serial_suffix, "");
    }

    #[test]
    fn host_prefers_address() {
        let peer = PeerHost::from_record(record("SmartEVSE-1", 20), "SmartEVSE");
        assert_eq!(peer.host(), "192.168.1.20");

        let unresolved =
            PeerHost::from_record(ServiceRecord::new("SmartEVSE-2", None, 80), "SmartEVSE");
        assert_eq!(unresolved.host(), "SmartEVSE-2.local");
    }

    #[test]
    fn label_includes_host() {
        let peer = PeerHost::from_record(record("SmartEVSE-7", 7), "SmartEVSE");
        assert_eq!(peer.label(), "SmartEVSE-7 (192.168.1.7)");
    }
}
