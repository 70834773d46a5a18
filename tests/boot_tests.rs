//! Integration tests for the boot policy: station join or onboarding AP.

use std::net::Ipv4Addr;
use std::sync::Arc;

use evse_display::hal::{MockPlatform, MockRadio};
use evse_display::services::PortalMailbox;
use evse_display::traits::{KEY_PASSWORD, KEY_PEER_HOST, KEY_SSID};
use evse_display::{App, Config, ErrorKind, NetworkMode, Screen, WifiNetwork};

#[test]
fn stored_network_unreachable_falls_back_to_access_point() {
    let mut devices = MockPlatform::devices();
    devices.store.values.insert(KEY_SSID.into(), "Home".into());
    devices.store.values.insert(KEY_PASSWORD.into(), "secret".into());
    devices.radio.scan_results = vec![
        WifiNetwork::new("Neighbour", -70, false),
        WifiNetwork::new("Neighbour", -60, false),
    ];
    let mailbox = Arc::new(PortalMailbox::new());
    let mut app = App::new(Config::default(), devices, Arc::clone(&mailbox));

    assert_eq!(app.boot(0), NetworkMode::AccessPoint);

    let d = app.devices();
    assert_eq!(d.radio.connect_calls, 3);
    assert_eq!(
        d.radio.last_credentials,
        Some(("Home".to_string(), "secret".to_string()))
    );
    // 3 attempts x 5 polls x 500 ms, plus 2 pauses between attempts
    assert_eq!(d.delay.total_ms, 3 * 5 * 500 + 2 * 1000);
    assert_eq!(d.radio.ap_started.as_deref(), Some("SmartEVSE_Display"));
    assert_eq!(d.dns.ip, Some(Ipv4Addr::new(192, 168, 4, 1)));
    assert_eq!(d.display.onboarding_draws, 1);

    let screen = d.display.last_onboarding.as_ref();
    assert_eq!(screen.map(|s| s.portal_url.as_str()), Some("http://192.168.4.1"));
    assert!(screen.is_some_and(|s| s.join_code.is_some()));

    assert_eq!(app.state().last_error, Some(ErrorKind::WifiConnectFailure));
    assert!(!app.state().wifi_connected);
    assert_eq!(app.screen(), &Screen::Onboarding);

    // The portal already has a deduplicated scan
    let networks = mailbox.networks();
    assert_eq!(networks.len(), 1);
    assert_eq!(networks[0].rssi, -60);
}

#[test]
fn no_credentials_skips_association() {
    let mut app = App::new(
        Config::default(),
        MockPlatform::devices(),
        Arc::new(PortalMailbox::new()),
    );

    assert_eq!(app.boot(0), NetworkMode::AccessPoint);
    assert_eq!(app.devices().radio.connect_calls, 0);
    assert_eq!(app.devices().delay.total_ms, 0);
    assert_eq!(app.state().last_error, None);
    assert!(app.devices().dns.ip.is_some());
}

#[test]
fn stored_network_joins_and_restores_peer() {
    let mut devices = MockPlatform::devices();
    devices.store.values.insert(KEY_SSID.into(), "Home".into());
    devices.store.values.insert(KEY_PEER_HOST.into(), "192.168.1.50".into());
    devices.radio = MockRadio::new();
    devices.radio.connect_after_polls = Some(3);
    let mut app = App::new(Config::default(), devices, Arc::new(PortalMailbox::new()));

    assert_eq!(app.boot(0), NetworkMode::Station);
    assert_eq!(app.devices().radio.connect_calls, 1);
    assert_eq!(app.devices().delay.total_ms, 2 * 500);
    assert!(app.state().wifi_connected);
    assert_eq!(app.state().selected_peer_host, "192.168.1.50");
    assert_eq!(app.screen(), &Screen::Dashboard);
    assert!(app.devices().radio.ap_started.is_none());
    assert!(app.devices().dns.ip.is_none());
}
