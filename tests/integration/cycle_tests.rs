//! Main cycle end to end: sample, display, notify and the optional uplink.

use espfan::adapters::dht::SimDht;
use espfan::app::connectivity::LinkState;
use espfan::app::events::AttributeId;
use espfan::config::{bounded, NodeConfig};
use espfan::error::{LinkFault, SensorFault, UplinkError};

use crate::mock_hw::{CountingDelay, DeadLink, Rig};

fn uplink_config(interval_secs: u32, period_ms: u32) -> NodeConfig {
    NodeConfig {
        post_url: Some(bounded("http://10.0.0.2/espfan")),
        post_interval_secs: interval_secs,
        cycle_period_ms: period_ms,
        ..NodeConfig::default()
    }
}

#[test]
fn valid_reading_is_displayed_and_notified() {
    let rig = Rig::with_defaults();
    rig.connect_client(1);
    let mut cycle = rig.cycle(SimDht::new(22.5, 40.0));
    let mut delay = CountingDelay::default();

    let report = cycle.run_once(&mut delay);

    assert_eq!(report.link, LinkState::Connected);
    assert!(report.reading.valid);
    assert!(report.displayed);
    assert!(report.published);
    assert_eq!(report.posted, None, "uplink is off by default");
    assert_eq!(rig.telemetry_attr(), "22.5 °C");
    assert_eq!(rig.notified(AttributeId::Telemetry), vec!["22.5 °C".to_owned()]);

    let frame = rig.display.last_frame().expect("frame drawn");
    let lines: Vec<&str> = frame.lines().collect();
    assert_eq!(lines, ["Humidity: 40.0%", "Temp: 22.5 C", "588 RPM"]);
}

#[test]
fn sensor_failure_shows_message_and_keeps_attribute() {
    let rig = Rig::with_defaults();
    rig.connect_client(1);
    let mut sensor = SimDht::new(21.0, 50.0);
    sensor.push(Err(SensorFault::Timeout));
    let mut cycle = rig.cycle(sensor);
    let mut delay = CountingDelay::default();

    let report = cycle.run_once(&mut delay);

    assert!(!report.reading.valid);
    assert_eq!(report.reading.fault, Some(SensorFault::Timeout));
    assert!(!report.published);
    assert_eq!(rig.telemetry_attr(), "Temperature");
    assert!(rig.notified(AttributeId::Telemetry).is_empty());
    let frame = rig.display.last_frame().expect("frame drawn");
    let lines: Vec<&str> = frame.lines().collect();
    assert_eq!(lines, ["Failed to read from DHT sensor!", "588 RPM"]);

    // Next cycle recovers without carrying anything over.
    let report = cycle.run_once(&mut delay);
    assert!(report.published);
    assert_eq!(rig.telemetry_attr(), "21.0 °C");
}

#[test]
fn nan_channel_counts_as_failure() {
    let rig = Rig::with_defaults();
    let mut sensor = SimDht::new(21.0, 50.0);
    sensor.push(Ok((f32::NAN, 50.0)));
    let mut cycle = rig.cycle(sensor);

    let report = cycle.run_once(&mut CountingDelay::default());

    assert_eq!(report.reading.fault, Some(SensorFault::NotANumber));
    assert_eq!(report.reading.temperature_c, None);
    assert_eq!(rig.telemetry_attr(), "Temperature");
}

#[test]
fn sensor_dropping_out_mid_run_keeps_last_telemetry() {
    let rig = Rig::with_defaults();
    rig.connect_client(1);
    let mut cycle = rig.cycle(SimDht::new(23.0, 41.0));
    let mut delay = CountingDelay::default();

    assert!(cycle.run_once(&mut delay).published);
    cycle.sampler_mut().sensor_mut().set_steady(Err(SensorFault::Timeout));
    for _ in 0..3 {
        assert!(!cycle.run_once(&mut delay).published);
    }

    assert_eq!(cycle.sampler_mut().consecutive_faults(), 3);
    assert_eq!(cycle.sampler_mut().sensor().reads(), 4);
    assert_eq!(rig.telemetry_attr(), "23.0 °C");
    assert_eq!(rig.notified(AttributeId::Telemetry), vec!["23.0 °C".to_owned()]);
    assert_eq!(cycle.surface().actuator().current_speed(), 588);
}

#[test]
fn empty_post_url_leaves_uplink_off() {
    let config = NodeConfig {
        post_url: Some(bounded("")),
        ..uplink_config(1, 1000)
    };
    let rig = Rig::new(config);
    let mut cycle = rig.cycle(SimDht::new(22.5, 40.0));

    assert_eq!(cycle.run_once(&mut CountingDelay::default()).posted, None);
    assert!(rig.uplink.posts().is_empty());
}

#[test]
fn display_failure_does_not_stop_notification() {
    let rig = Rig::with_defaults();
    rig.connect_client(1);
    rig.display.set_failing(true);
    let mut cycle = rig.cycle(SimDht::new(19.3, 33.0));

    let report = cycle.run_once(&mut CountingDelay::default());

    assert!(!report.displayed);
    assert!(report.published);
    assert_eq!(rig.telemetry_attr(), "19.3 °C");
}

#[test]
fn display_follows_speed_written_between_cycles() {
    let rig = Rig::with_defaults();
    rig.connect_client(1);
    let mut cycle = rig.cycle(SimDht::new(22.5, 40.0));
    let mut delay = CountingDelay::default();

    let _ = cycle.run_once(&mut delay);
    rig.write_speed("750");
    let _ = cycle.run_once(&mut delay);

    let frame = rig.display.last_frame().expect("frame drawn");
    assert_eq!(frame.lines().last(), Some("750 RPM"));
    assert_eq!(cycle.cycles(), 2);
}

#[test]
fn telemetry_without_subscribers_still_updates_attribute() {
    let rig = Rig::with_defaults();
    let mut cycle = rig.cycle(SimDht::new(24.0, 45.0));

    let report = cycle.run_once(&mut CountingDelay::default());

    assert!(report.published);
    assert_eq!(rig.telemetry_attr(), "24.0 °C");
    assert!(rig.gatt.notifications().is_empty());
}

#[test]
fn bounded_link_failure_lets_cycle_continue() {
    let config = NodeConfig {
        link_max_attempts: Some(3),
        ..NodeConfig::default()
    };
    let rig = Rig::new(config);
    rig.connect_client(1);
    let mut cycle = rig.cycle_with_link(DeadLink::default(), SimDht::new(22.5, 40.0));
    let mut delay = CountingDelay::default();

    let report = cycle.run_once(&mut delay);

    assert_eq!(report.link, LinkState::Disconnected);
    assert_eq!(report.link_fault, Some(LinkFault::RetriesExhausted));
    assert_eq!(cycle.supervisor().link().attempts, 3);
    assert_eq!(delay.sleeps_ms, vec![500, 500]);
    assert!(report.displayed);
    assert!(report.published);
    assert_eq!(rig.telemetry_attr(), "22.5 °C");
}

#[test]
fn uplink_posts_first_valid_reading_then_waits_interval() {
    // 2 s interval on a 1 s cycle: post, skip, post.
    let rig = Rig::new(uplink_config(2, 1000));
    let mut cycle = rig.cycle(SimDht::new(22.5, 40.0));
    let mut delay = CountingDelay::default();

    let first = cycle.run_once(&mut delay);
    let second = cycle.run_once(&mut delay);
    let third = cycle.run_once(&mut delay);

    assert_eq!(first.posted, Some(Ok(200)));
    assert_eq!(second.posted, None);
    assert_eq!(third.posted, Some(Ok(200)));
    let posts = rig.uplink.posts();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].0, "http://10.0.0.2/espfan");
    assert_eq!(posts[0].1, "temperature=22.50&humidity=40.00");
}

#[test]
fn uplink_waits_for_valid_reading() {
    let rig = Rig::new(uplink_config(60, 2000));
    let mut sensor = SimDht::new(20.0, 55.5);
    sensor.push(Err(SensorFault::Checksum));
    let mut cycle = rig.cycle(sensor);
    let mut delay = CountingDelay::default();

    let failed = cycle.run_once(&mut delay);
    let recovered = cycle.run_once(&mut delay);

    assert_eq!(failed.posted, None);
    assert_eq!(recovered.posted, Some(Ok(200)));
    assert_eq!(rig.uplink.posts()[0].1, "temperature=20.00&humidity=55.50");
}

#[test]
fn uplink_skipped_while_offline() {
    let config = NodeConfig {
        link_max_attempts: Some(1),
        ..uplink_config(60, 2000)
    };
    let rig = Rig::new(config);
    let mut cycle = rig.cycle_with_link(DeadLink::default(), SimDht::new(22.5, 40.0));

    let report = cycle.run_once(&mut CountingDelay::default());

    assert_eq!(report.posted, None);
    assert!(rig.uplink.posts().is_empty());
}

#[test]
fn uplink_error_is_reported_and_cycle_goes_on() {
    let rig = Rig::new(uplink_config(2, 1000));
    rig.uplink.respond_with(503);
    let mut cycle = rig.cycle(SimDht::new(22.5, 40.0));
    let mut delay = CountingDelay::default();

    let report = cycle.run_once(&mut delay);

    assert_eq!(report.posted, Some(Err(UplinkError::Status(503))));
    assert!(report.published);
    // A failed post still restarts the interval.
    assert_eq!(cycle.run_once(&mut delay).posted, None);
}
