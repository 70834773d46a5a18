//! Wi-Fi radio for ESP32.
//!
//! Wraps `EspWifi` in `BlockingWifi` for scans and AP bring-up, while station
//! association is started without waiting so the connectivity manager owns
//! the polling budget.
//!
//! # Example
//!
//! ```ignore
//! use evse_display::hal::esp32::Esp32Wifi;
//! use evse_display::traits::WifiRadio;
//!
//! let mut wifi = Esp32Wifi::new(modem, sysloop, Some(nvs))?;
//! let networks = wifi.scan()?;
//! wifi.begin_connect("MyNetwork", "secret123")?;
//! ```

use crate::config::AccessPointConfig;
use crate::scanner::WifiNetwork;
use crate::traits::WifiRadio;
use anyhow::{anyhow, Context};
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::ipv4::{
    Configuration as IpConfiguration, Mask, RouterConfiguration, Subnet,
};
use esp_idf_svc::netif::{EspNetif, NetifConfiguration};
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, BlockingWifi, ClientConfiguration, Configuration,
    EspWifi,
};
use std::net::Ipv4Addr;

/// Wi-Fi radio owning the ESP32 modem.
pub struct Esp32Wifi {
    wifi: BlockingWifi<EspWifi<'static>>,
    ap_active: bool,
}

impl Esp32Wifi {
    /// Initialize the driver and start it in station role with no network.
    ///
    /// # Errors
    ///
    /// Returns an error if the Wi-Fi driver cannot be created or started.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> anyhow::Result<Self> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs)?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;

        wifi.set_configuration(&Configuration::Client(ClientConfiguration::default()))?;
        log::info!("[WiFi] Starting...");
        wifi.start()?;

        Ok(Self {
            wifi,
            ap_active: false,
        })
    }

    fn client_configuration(ssid: &str, password: &str) -> anyhow::Result<ClientConfiguration> {
        Ok(ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| anyhow!("SSID too long"))?,
            password: password
                .try_into()
                .map_err(|_| anyhow!("password too long"))?,
            auth_method: if password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        })
    }

    fn access_point_configuration(
        config: &AccessPointConfig,
    ) -> anyhow::Result<AccessPointConfiguration> {
        Ok(AccessPointConfiguration {
            ssid: config
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("AP SSID too long"))?,
            password: config
                .password
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("AP password too long"))?,
            auth_method: if config.password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            channel: config.channel,
            ..Default::default()
        })
    }

    /// Replace the AP interface so it serves the configured subnet.
    fn apply_ap_subnet(&mut self, config: &AccessPointConfig) -> anyhow::Result<()> {
        let mut conf = NetifConfiguration::wifi_default_router();
        conf.ip_configuration = Some(IpConfiguration::Router(RouterConfiguration {
            subnet: Subnet {
                gateway: config.ip,
                mask: Mask(config.prefix_len),
            },
            dhcp_enabled: true,
            dns: Some(config.ip),
            secondary_dns: None,
        }));
        let netif = EspNetif::new_with_conf(&conf).context("failed to create AP netif")?;
        self.wifi.wifi_mut().swap_netif_ap(netif)?;
        Ok(())
    }
}

impl WifiRadio for Esp32Wifi {
    type Error = anyhow::Error;

    fn scan(&mut self) -> Result<Vec<WifiNetwork>, Self::Error> {
        let found = self.wifi.scan()?;
        Ok(found
            .into_iter()
            .map(|ap| {
                let open = matches!(ap.auth_method, None | Some(AuthMethod::None));
                WifiNetwork::new(ap.ssid.as_str(), i32::from(ap.signal_strength), open)
            })
            .collect())
    }

    fn begin_connect(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error> {
        let client = Self::client_configuration(ssid, password)?;
        let configuration = match self.wifi.get_configuration()? {
            Configuration::Mixed(_, ap) | Configuration::AccessPoint(ap) if self.ap_active => {
                Configuration::Mixed(client, ap)
            }
            _ => Configuration::Client(client),
        };
        self.wifi.set_configuration(&configuration)?;

        log::info!("[WiFi] Connecting to '{}'...", ssid);
        // Non-blocking: the driver reports completion through is_up()
        self.wifi.wifi_mut().connect()?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }

    fn start_access_point(&mut self, config: &AccessPointConfig) -> Result<(), Self::Error> {
        let _ = self.wifi.disconnect();
        self.wifi.stop()?;

        self.apply_ap_subnet(config)?;
        let ap = Self::access_point_configuration(config)?;
        self.wifi
            .set_configuration(&Configuration::Mixed(ClientConfiguration::default(), ap))?;

        self.wifi.start()?;
        self.ap_active = true;
        log::info!(
            "[WiFi] Access point '{}' up at {}",
            config.ssid.as_str(),
            config.ip
        );
        Ok(())
    }

    fn ip_addr(&self) -> Option<Ipv4Addr> {
        let driver = self.wifi.wifi();
        if self.is_connected() {
            if let Ok(info) = driver.sta_netif().get_ip_info() {
                return Some(info.ip);
            }
        }
        if self.ap_active {
            return driver.ap_netif().get_ip_info().ok().map(|info| info.ip);
        }
        None
    }

    fn mac_address(&self) -> [u8; 6] {
        self.wifi.wifi().sta_netif().get_mac().unwrap_or([0; 6])
    }
}
