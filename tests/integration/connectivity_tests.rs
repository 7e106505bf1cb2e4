//! Wi-Fi station supervision against the simulated station.

use espfan::adapters::dht::SimDht;
use espfan::adapters::wifi::WifiAdapter;
use espfan::app::connectivity::{ConnectivitySupervisor, LinkState, RetryPolicy};
use espfan::config::NodeConfig;
use espfan::error::LinkFault;

use crate::mock_hw::{CountingDelay, Rig};

#[test]
fn flaky_access_point_connects_after_retries() {
    let mut wifi = WifiAdapter::new("bench-ap", "password123");
    wifi.fail_next(4);
    let mut sup = ConnectivitySupervisor::new(wifi, RetryPolicy::unbounded(500));
    let mut delay = CountingDelay::default();

    assert_eq!(sup.ensure_connected(&mut delay), Ok(()));
    assert_eq!(sup.link_state(), LinkState::Connected);
    assert_eq!(sup.link().connect_calls(), 5);
    assert_eq!(delay.total_ms(), 4 * 500);
}

#[test]
fn dropped_link_reconnects_on_next_cycle() {
    let rig = Rig::with_defaults();
    let mut cycle = rig.cycle(SimDht::new(22.5, 40.0));
    let mut delay = CountingDelay::default();

    let _ = cycle.run_once(&mut delay);
    assert_eq!(cycle.supervisor().link().connect_calls(), 1);

    // Steady state: no reconnect while the link stays up.
    let _ = cycle.run_once(&mut delay);
    assert_eq!(cycle.supervisor().link().connect_calls(), 1);

    cycle.supervisor_mut().link_mut().drop_link();
    cycle.supervisor_mut().link_mut().fail_next(2);
    let report = cycle.run_once(&mut delay);

    assert_eq!(report.link, LinkState::Connected);
    assert_eq!(cycle.supervisor().link().connect_calls(), 4);
    assert_eq!(cycle.supervisor().attempts(), 3);
}

#[test]
fn empty_ssid_fails_fast_without_sleeping() {
    let mut sup = ConnectivitySupervisor::new(WifiAdapter::new("", ""), RetryPolicy::unbounded(500));
    let mut delay = CountingDelay::default();

    assert_eq!(sup.ensure_connected(&mut delay), Err(LinkFault::NoCredentials));
    assert!(delay.sleeps_ms.is_empty());
    assert_eq!(sup.link().connect_calls(), 0);
}

#[test]
fn policy_follows_config() {
    let config = NodeConfig {
        link_retry_interval_ms: 250,
        link_max_attempts: Some(2),
        ..NodeConfig::default()
    };
    let mut wifi = WifiAdapter::new("bench-ap", "password123");
    wifi.fail_next(5);
    let mut sup = ConnectivitySupervisor::new(wifi, RetryPolicy::from_config(&config));
    let mut delay = CountingDelay::default();

    assert_eq!(sup.ensure_connected(&mut delay), Err(LinkFault::RetriesExhausted));
    assert_eq!(delay.sleeps_ms, vec![250]);

    // The budget resets on the next call; remaining failures drain.
    assert_eq!(sup.ensure_connected(&mut delay), Err(LinkFault::RetriesExhausted));
    assert_eq!(sup.ensure_connected(&mut delay), Ok(()));
    assert_eq!(sup.link().connect_calls(), 6);
}
