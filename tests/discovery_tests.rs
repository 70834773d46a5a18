//! Integration tests for SmartEVSE discovery and its cache.

use std::net::Ipv4Addr;

use evse_display::hal::{MockBrowser, MockDelay};
use evse_display::{DiscoveryConfig, PeerDiscovery, ServiceRecord};

fn evse(name: &str, last_octet: u8) -> ServiceRecord {
    ServiceRecord::new(name, Some(Ipv4Addr::new(192, 168, 1, last_octet)), 80)
}

fn names(hosts: &[evse_display::PeerHost]) -> Vec<&str> {
    hosts.iter().map(|h| h.advertised_name.as_str()).collect()
}

// ============================================================================
// Query Rounds
// ============================================================================

#[test]
fn rounds_are_merged_and_filtered() {
    let mut browser = MockBrowser::new();
    browser.push_round(vec![evse("SmartEVSE-1", 10), evse("Printer", 20)]);
    browser.push_failure();
    browser.push_round(vec![evse("SmartEVSE-1", 10), evse("SmartEVSE-2", 11)]);
    let mut delay = MockDelay::new();
    let mut discovery = PeerDiscovery::new(DiscoveryConfig::default());

    let hosts = discovery.discover(&mut browser, &mut delay, 0, false);

    assert_eq!(names(&hosts), vec!["SmartEVSE-1", "SmartEVSE-2"]);
    assert_eq!(hosts[1].serial_suffix, "2");
    assert_eq!(browser.query_calls, 3);
    assert_eq!(delay.total_ms, 3 * 1000);
}

#[test]
fn first_answer_per_name_wins() {
    let mut browser = MockBrowser::new();
    browser.push_round(vec![evse("SmartEVSE-7", 70)]);
    browser.push_round(vec![evse("SmartEVSE-7", 99)]);
    let mut delay = MockDelay::new();
    let mut discovery = PeerDiscovery::new(DiscoveryConfig::default());

    let hosts = discovery.discover(&mut browser, &mut delay, 0, false);

    assert_eq!(hosts.len(), 1);
    assert_eq!(hosts[0].host(), "192.168.1.70");
}

#[test]
fn custom_prefix() {
    let mut browser = MockBrowser::with_records(vec![evse("SmartEVSE-1", 1), evse("Lab-EVSE", 2)]);
    let mut delay = MockDelay::new();
    let mut discovery =
        PeerDiscovery::new(DiscoveryConfig::default().with_name_prefix("Lab").with_rounds(1));

    let hosts = discovery.discover(&mut browser, &mut delay, 0, false);

    assert_eq!(names(&hosts), vec!["Lab-EVSE"]);
    assert_eq!(hosts[0].serial_suffix, "EVSE");
}

// ============================================================================
// Cache
// ============================================================================

#[test]
fn fresh_cache_skips_query() {
    let mut browser = MockBrowser::with_records(vec![evse("SmartEVSE-1", 10)]);
    let mut delay = MockDelay::new();
    let mut discovery = PeerDiscovery::new(DiscoveryConfig::default());

    discovery.discover(&mut browser, &mut delay, 0, false);
    let calls = browser.query_calls;

    browser.records.push(evse("SmartEVSE-2", 11));
    let hosts = discovery.discover(&mut browser, &mut delay, 29_999, false);

    assert_eq!(browser.query_calls, calls);
    assert_eq!(names(&hosts), vec!["SmartEVSE-1"]);

    let hosts = discovery.discover(&mut browser, &mut delay, 30_000, false);
    assert!(browser.query_calls > calls);
    assert_eq!(names(&hosts), vec!["SmartEVSE-1", "SmartEVSE-2"]);
}

#[test]
fn forced_pass_ignores_fresh_cache() {
    let mut browser = MockBrowser::with_records(vec![evse("SmartEVSE-1", 10)]);
    let mut delay = MockDelay::new();
    let mut discovery = PeerDiscovery::new(DiscoveryConfig::default());

    discovery.discover(&mut browser, &mut delay, 0, false);
    browser.records = vec![evse("SmartEVSE-3", 12)];

    let hosts = discovery.discover(&mut browser, &mut delay, 1_000, true);
    assert_eq!(names(&hosts), vec!["SmartEVSE-3"]);
    assert_eq!(names(discovery.cached()), vec!["SmartEVSE-3"]);
}

#[test]
fn empty_pass_keeps_previous_hosts() {
    let mut browser = MockBrowser::with_records(vec![evse("SmartEVSE-1", 10)]);
    let mut delay = MockDelay::new();
    let mut discovery = PeerDiscovery::new(DiscoveryConfig::default());

    discovery.discover(&mut browser, &mut delay, 0, false);
    browser.records.clear();

    let hosts = discovery.discover(&mut browser, &mut delay, 5_000, true);
    assert_eq!(names(&hosts), vec!["SmartEVSE-1"]);
}

#[test]
fn empty_pass_still_holds_off_next_query() {
    let mut browser = MockBrowser::new();
    let mut delay = MockDelay::new();
    let mut discovery = PeerDiscovery::new(DiscoveryConfig::default().with_cache_ms(10_000));

    assert!(discovery.discover(&mut browser, &mut delay, 0, false).is_empty());
    let calls = browser.query_calls;

    browser.records = vec![evse("SmartEVSE-1", 10)];
    assert!(discovery.discover(&mut browser, &mut delay, 9_000, false).is_empty());
    assert_eq!(browser.query_calls, calls);

    assert_eq!(discovery.discover(&mut browser, &mut delay, 10_000, false).len(), 1);
}
