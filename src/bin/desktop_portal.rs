//! Desktop config portal for developing the web UI without hardware.
//!
//! Runs the portal router on localhost and drives an [`App`] built from
//! mocks in a background thread, so the UI sees live scan results, peer
//! discovery and the credential/reboot flow.
//!
//! # Usage
//!
//! ```sh
//! # Onboarding: no stored network, portal lists simulated networks
//! cargo run --bin desktop_portal --features web
//!
//! # Station: simulated SmartEVSE answering on 192.168.1.50
//! cargo run --bin desktop_portal --features web -- --station
//! ```
//!
//! Then open http://127.0.0.1:8080/.

use evse_display::hal::{MockBrowser, MockPlatform, MockRadio};
use evse_display::services::{run_server, PortalHandler, PortalMailbox, WebServerConfig};
use evse_display::{
    App, Config, NetworkMode, PeerConfig, PeerResponse, ServiceRecord, WifiConfig, WifiNetwork,
};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Port used instead of 80 so the demo runs unprivileged.
const DESKTOP_PORT: u16 = 8080;

fn simulated_app(station: bool, mailbox: Arc<PortalMailbox>) -> App<MockPlatform> {
    let mut devices = MockPlatform::devices();
    devices.radio = if station {
        MockRadio::connected()
    } else {
        MockRadio::new()
    };
    devices.radio.scan_results = vec![
        WifiNetwork::new("Home", -48, false),
        WifiNetwork::new("Home", -71, false),
        WifiNetwork::new("Garage", -63, false),
        WifiNetwork::new("Guest", -80, true),
    ];
    devices.browser = MockBrowser::with_records(vec![
        ServiceRecord::new("SmartEVSE-31337", Some(Ipv4Addr::new(192, 168, 1, 50)), 80),
        ServiceRecord::new("printer", Some(Ipv4Addr::new(192, 168, 1, 9)), 80),
    ]);
    devices.client.route(
        "/settings",
        PeerResponse::new(
            200,
            r#"{"mode_id":3,"settings":{"charge_current":16.0},"phase_currents":{"TOTAL":12.4},"evse":{"state":"Charging"}}"#,
        ),
    );
    devices.client.route("/lcd", PeerResponse::new(200, vec![0xAA; 1024]));

    let config = if station {
        Config::default()
            .with_wifi(WifiConfig::default().with_ssid("Home").with_password("demo"))
            .with_peer(PeerConfig::default().with_host("192.168.1.50"))
    } else {
        Config::default()
    };
    App::new(config, devices, mailbox)
}

fn spawn_app_loop(mut app: App<MockPlatform>) {
    thread::spawn(move || {
        let start = Instant::now();
        let tick = Duration::from_millis(u64::from(app.config().ui.tick_ms));
        let mut restarts = 0;

        let mode = app.boot(0);
        println!("[Sim] Booted in {:?} mode", mode);

        loop {
            app.tick(start.elapsed().as_millis() as u64);

            let now_restarts = app.devices().system.restarts;
            if now_restarts != restarts {
                restarts = now_restarts;
                println!(
                    "[Sim] Device restarted; stored SSID: {:?}",
                    app.devices().store.values.get(evse_display::traits::KEY_SSID)
                );
            }
            thread::sleep(tick);
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let station = std::env::args().any(|a| a == "--station");

    println!("=================================");
    println!("  SmartEVSE Display Desktop Portal");
    println!("=================================");
    println!();

    let mailbox = Arc::new(PortalMailbox::new());
    let app = simulated_app(station, Arc::clone(&mailbox));
    let expected = if station {
        NetworkMode::Station
    } else {
        NetworkMode::AccessPoint
    };
    println!("Simulating {:?} mode", expected);
    spawn_app_loop(app);

    let web_config = WebServerConfig::new(([127, 0, 0, 1], DESKTOP_PORT));
    println!("Starting web server...");
    println!("  Web UI: http://{}/", web_config.addr);
    println!("  API:    http://{}/api/wifi", web_config.addr);
    println!("          http://{}/api/mdns", web_config.addr);
    println!();
    println!("Press Ctrl+C to stop.");
    println!();

    run_server(PortalHandler::new(mailbox), web_config).await?;
    Ok(())
}
