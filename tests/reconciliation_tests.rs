//! Integration tests for the poll / redraw / touch loop.

use std::sync::Arc;

use evse_display::hal::{MockPlatform, MockRadio};
use evse_display::services::PortalMailbox;
use evse_display::{
    reconcile, App, ButtonLayout, ChargeMode, Config, ErrorKind, Gesture, PeerConfig,
    PeerResponse, Screen, TouchPoint, UiCommand, UiFacts, WifiConfig,
};

const STATUS_SOLAR: &str = r#"{"mode_id":2,"settings":{"charge_current":6},"phase_currents":{"TOTAL":-3.5},"evse":{"state":"Charging"}}"#;

fn station_app() -> App<MockPlatform> {
    let mut devices = MockPlatform::devices();
    devices.radio = MockRadio::connected();
    devices
        .client
        .route("/settings", PeerResponse::new(200, STATUS_SOLAR));
    devices.client.route("/lcd", PeerResponse::new(200, vec![0u8; 1024]));
    let config = Config::default()
        .with_wifi(WifiConfig::default().with_ssid("Home").with_password("pw"))
        .with_peer(PeerConfig::default().with_host("192.168.1.50"));
    let mut app = App::new(config, devices, Arc::new(PortalMailbox::new()));
    app.boot(0);
    app
}

// ============================================================================
// Pure Reconciler
// ============================================================================

#[test]
fn touches_ignored_without_wifi() {
    let facts = UiFacts {
        wifi_connected: false,
        peer_connected: true,
        charge_mode: ChargeMode::Smart,
    };
    let tap = reconcile(facts, Some(Gesture::Tap(TouchPoint::new(60, 150))));
    assert!(tap.commands.is_empty());
    let hold = reconcile(facts, Some(Gesture::LongPress(TouchPoint::new(60, 50))));
    assert!(hold.commands.is_empty());
}

#[test]
fn tapping_active_mode_does_nothing() {
    let facts = UiFacts {
        wifi_connected: true,
        peer_connected: true,
        charge_mode: ChargeMode::Solar,
    };
    let result = reconcile(facts, Some(Gesture::Tap(TouchPoint::new(60, 150))));
    assert!(result.commands.is_empty());
}

#[test]
fn long_press_on_lower_third_ignored() {
    let facts = UiFacts {
        wifi_connected: true,
        peer_connected: false,
        charge_mode: ChargeMode::Unknown,
    };
    let low = reconcile(facts, Some(Gesture::LongPress(TouchPoint::new(100, 200))));
    assert!(low.commands.is_empty());

    let high = reconcile(facts, Some(Gesture::LongPress(TouchPoint::new(100, 20))));
    assert_eq!(
        high.commands.as_slice(),
        &[UiCommand::Beep, UiCommand::OpenDevicePicker]
    );
}

#[test]
fn select_button_opens_picker_when_peer_down() {
    let facts = UiFacts {
        wifi_connected: true,
        peer_connected: false,
        charge_mode: ChargeMode::Unknown,
    };
    let result = reconcile(facts, Some(Gesture::Tap(TouchPoint::new(160, 150))));
    assert_eq!(result.layout, ButtonLayout::SelectDevice);
    assert_eq!(
        result.commands.as_slice(),
        &[UiCommand::Beep, UiCommand::OpenDevicePicker]
    );
}

// ============================================================================
// Full Loop
// ============================================================================

#[test]
fn server_error_flips_to_select_button() {
    let mut app = station_app();
    app.tick(0);
    assert_eq!(
        app.devices().display.last_buttons(),
        Some(ButtonLayout::ModePair { active: ChargeMode::Solar })
    );

    app.devices_mut()
        .client
        .route("/settings", PeerResponse::new(500, "oops"));
    app.tick(3000);

    assert!(!app.state().peer_connected);
    assert_eq!(app.state().last_error, Some(ErrorKind::PeerTimeout));
    assert_eq!(
        app.devices().display.last_buttons(),
        Some(ButtonLayout::SelectDevice)
    );
    let status = app.devices().display.last_status().cloned();
    assert!(status.is_some_and(|s| !s.peer_connected));
}

#[test]
fn recovery_clears_error_and_restores_mode_pair() {
    let mut app = station_app();
    app.devices_mut()
        .client
        .route("/settings", PeerResponse::new(200, "not json"));
    app.tick(0);
    assert_eq!(app.state().last_error, Some(ErrorKind::PeerParseFailure));

    app.devices_mut()
        .client
        .route("/settings", PeerResponse::new(200, STATUS_SOLAR));
    app.tick(3000);

    assert_eq!(app.state().last_error, None);
    assert!(app.state().peer_connected);
    assert_eq!(
        app.devices().display.last_buttons(),
        Some(ButtonLayout::ModePair { active: ChargeMode::Solar })
    );
}

#[test]
fn rejected_mode_change_keeps_previous_mode() {
    let mut app = station_app();
    app.tick(0);

    app.devices_mut()
        .client
        .push_response(PeerResponse::new(200, r#"{"mode":"2"}"#));
    app.devices_mut().touch.tap(TouchPoint::new(240, 150));
    app.tick(50);
    app.tick(100);

    assert_eq!(app.state().charge_mode, ChargeMode::Solar);
    assert_eq!(app.state().last_error, Some(ErrorKind::ModeChangeFailure));
    assert_eq!(app.devices().speaker.tones.len(), 1);
}

#[test]
fn lost_wifi_stops_requests() {
    let mut app = station_app();
    app.tick(0);
    let sent = app.devices().client.request_count();

    app.devices_mut().radio.drop_link();
    app.tick(3000);
    assert!(!app.state().wifi_connected);

    app.tick(6000);
    // The LCD refresh at 3 s runs before the poll notices the lost link
    assert_eq!(app.devices().client.request_count(), sent + 1);
    assert_eq!(app.screen(), &Screen::Dashboard);
}
