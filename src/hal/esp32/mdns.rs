//! mDNS responder and browser over the ESP-IDF `mdns` component.

use crate::traits::{ServiceBrowser, ServiceRecord};
use esp_idf_svc::mdns::{EspMdns, QueryResult};
use esp_idf_svc::sys::EspError;
use std::net::IpAddr;
use std::time::Duration;

/// Upper bound on answers collected per query.
const MAX_RESULTS: usize = 16;

/// mDNS service, started lazily on first use.
#[derive(Default)]
pub struct Esp32Mdns {
    mdns: Option<EspMdns>,
}

impl Esp32Mdns {
    /// Creates a browser; the responder is taken on first advertise or query.
    pub fn new() -> Self {
        Self::default()
    }

    fn responder(&mut self) -> Result<&mut EspMdns, EspError> {
        let mdns = match self.mdns.take() {
            Some(mdns) => mdns,
            None => EspMdns::take()?,
        };
        Ok(self.mdns.insert(mdns))
    }
}

impl ServiceBrowser for Esp32Mdns {
    type Error = EspError;

    fn advertise(&mut self, hostname: &str, port: u16) -> Result<(), Self::Error> {
        let mdns = self.responder()?;
        mdns.set_hostname(hostname)?;
        mdns.set_instance_name(hostname)?;
        mdns.add_service(None, "_http", "_tcp", port, &[])?;
        log::info!("[mDNS] Advertising {}.local:{}", hostname, port);
        Ok(())
    }

    fn query(
        &mut self,
        service: &str,
        proto: &str,
        timeout_ms: u32,
    ) -> Result<Vec<ServiceRecord>, Self::Error> {
        let mdns = self.responder()?;
        let mut results: [QueryResult; MAX_RESULTS] = Default::default();
        let count = mdns.query_ptr(
            service,
            proto,
            Duration::from_millis(u64::from(timeout_ms)),
            MAX_RESULTS,
            &mut results,
        )?;

        Ok(results
            .into_iter()
            .take(count)
            .filter_map(|r| {
                let hostname = r.hostname.or(r.instance_name)?;
                let address = r.addr.iter().find_map(|a| match a {
                    IpAddr::V4(v4) => Some(*v4),
                    IpAddr::V6(_) => None,
                });
                Some(ServiceRecord::new(hostname, address, r.port))
            })
            .collect())
    }
}
