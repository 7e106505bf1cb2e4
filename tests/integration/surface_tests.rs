//! Wireless control surface end to end: client writes through the
//! actuator to the PWM output, advertising lifecycle, event channel.

use espfan::app::events::{push_event, AttributeId, EventChannel, WirelessEvent};
use espfan::app::surface::SurfaceState;
use espfan::config::NodeConfig;

use crate::mock_hw::Rig;

#[test]
fn boot_drives_initial_duty_and_seeds_attributes() {
    let rig = Rig::with_defaults();

    assert_eq!(rig.pwm.writes(), vec![100]);
    assert_eq!(rig.speed_attr(), "588");
    assert_eq!(rig.telemetry_attr(), "Temperature");
    assert!(rig.gatt.is_advertising());
    assert_eq!(rig.surface.state(), SurfaceState::Advertising);
}

#[test]
fn speed_write_sets_duty_and_reads_back() {
    let rig = Rig::with_defaults();
    rig.connect_client(1);
    assert_eq!(rig.surface.state(), SurfaceState::Connected);

    rig.write_speed("750");

    assert_eq!(rig.pwm.last_duty(), Some(128));
    assert_eq!(rig.speed_attr(), "750");
    assert_eq!(rig.surface.actuator().current_speed(), 750);
    assert_eq!(rig.notified(AttributeId::Speed), vec!["750".to_owned()]);
}

#[test]
fn out_of_range_speeds_clamp() {
    let rig = Rig::with_defaults();
    rig.connect_client(1);

    rig.write_speed("5000");
    assert_eq!(rig.pwm.last_duty(), Some(255));
    assert_eq!(rig.speed_attr(), "1500");

    rig.write_speed("-20");
    assert_eq!(rig.pwm.last_duty(), Some(0));
    assert_eq!(rig.speed_attr(), "0");
}

#[test]
fn unparsable_write_changes_nothing() {
    let rig = Rig::with_defaults();
    rig.connect_client(1);
    rig.write_speed("750");
    let writes_before = rig.pwm.writes().len();

    rig.write_speed("abc");
    rig.write_speed("");
    rig.write_speed("12.5");

    assert_eq!(rig.pwm.writes().len(), writes_before);
    assert_eq!(rig.pwm.last_duty(), Some(128));
    assert_eq!(rig.speed_attr(), "750", "attribute restored after a rejected write");
    assert_eq!(rig.surface.state(), SurfaceState::Connected);
}

#[test]
fn padded_write_is_accepted() {
    let rig = Rig::with_defaults();
    rig.connect_client(1);

    rig.write_speed(" 300\n");

    assert_eq!(rig.speed_attr(), "300");
    assert_eq!(rig.pwm.last_duty(), Some(51));
}

#[test]
fn huge_integers_clamp_to_the_speed_range() {
    let rig = Rig::with_defaults();
    rig.connect_client(1);

    rig.write_speed("99999999999999999999");
    assert_eq!(rig.pwm.last_duty(), Some(255));
    assert_eq!(rig.speed_attr(), "1500");

    rig.write_speed("-99999999999999999999");
    assert_eq!(rig.pwm.last_duty(), Some(0));
    assert_eq!(rig.speed_attr(), "0");
}

#[test]
fn overlong_write_is_rejected_not_truncated() {
    let rig = Rig::with_defaults();
    rig.connect_client(1);
    rig.write_speed("750");
    let writes_before = rig.pwm.writes();

    // The first 32 bytes alone would parse as a valid speed of 15.
    let payload = format!("{}1500", " ".repeat(30));
    rig.write_speed(&payload);

    assert_eq!(rig.pwm.writes(), writes_before);
    assert_eq!(rig.surface.actuator().current_speed(), 750);
    assert_eq!(rig.speed_attr(), "750");
}

#[test]
fn late_registration_seeds_current_speed() {
    let rig = Rig::registering(NodeConfig::default());
    assert!(!rig.gatt.is_advertising());

    let ready = rig.gatt.finish_registration();
    assert_eq!(rig.speed_attr(), "0");
    rig.surface.dispatch(&ready);

    assert_eq!(rig.speed_attr(), "588");
    assert_eq!(rig.telemetry_attr(), "Temperature");
    assert!(rig.gatt.is_advertising());
    assert_eq!(rig.surface.state(), SurfaceState::Advertising);

    rig.connect_client(1);
    rig.write_speed("750");
    assert_eq!(rig.speed_attr(), "750");
}

#[test]
fn pwm_failure_keeps_previous_speed() {
    let rig = Rig::with_defaults();
    rig.connect_client(1);
    rig.pwm.set_failing(true);

    rig.write_speed("750");

    assert_eq!(rig.surface.actuator().current_speed(), 588);
    assert_eq!(rig.speed_attr(), "588");

    rig.pwm.set_failing(false);
    rig.write_speed("750");
    assert_eq!(rig.speed_attr(), "750");
}

#[test]
fn client_write_to_telemetry_is_ignored() {
    let rig = Rig::with_defaults();
    rig.connect_client(1);
    let event = rig.gatt.client_write(AttributeId::Telemetry, b"999");

    rig.surface.dispatch(&event);

    assert_eq!(rig.surface.actuator().current_speed(), 588);
    assert_eq!(rig.pwm.writes(), vec![100]);
}

#[test]
fn disconnect_readvertises_and_next_client_connects() {
    let rig = Rig::with_defaults();
    rig.connect_client(1);
    rig.write_speed("300");
    assert!(!rig.gatt.is_advertising());

    rig.disconnect_client();

    assert!(rig.gatt.is_advertising());
    assert_eq!(rig.gatt.advertise_count(), 2);
    assert_eq!(rig.surface.state(), SurfaceState::Advertising);
    // Fan keeps running at the last commanded speed.
    assert_eq!(rig.speed_attr(), "300");
    assert_eq!(rig.pwm.last_duty(), Some(51));

    rig.connect_client(2);
    assert_eq!(rig.gatt.connected_client(), Some(2));
    rig.write_speed("1500");
    assert_eq!(rig.pwm.last_duty(), Some(255));
}

#[test]
fn second_client_is_refused_while_one_is_attached() {
    let rig = Rig::with_defaults();
    rig.connect_client(1);

    assert!(!rig.gatt.connect(2));
    assert_eq!(rig.gatt.connected_client(), Some(1));
}

#[test]
fn queued_events_apply_in_order() {
    let rig = Rig::with_defaults();
    let channel = EventChannel::new();
    assert!(rig.gatt.connect(7));

    assert!(push_event(&channel, WirelessEvent::Connected { conn_id: 7 }));
    assert!(push_event(&channel, rig.gatt.client_write(AttributeId::Speed, b"100")));
    assert!(push_event(&channel, rig.gatt.client_write(AttributeId::Speed, b"200")));

    assert_eq!(rig.surface.drain_events(&channel), 3);
    assert_eq!(rig.speed_attr(), "200");
    assert_eq!(rig.pwm.writes(), vec![100, 17, 34]);
    assert_eq!(rig.surface.drain_events(&channel), 0);
}

#[test]
fn full_channel_drops_new_events() {
    let rig = Rig::with_defaults();
    let channel = EventChannel::new();

    let mut accepted = 0;
    for _ in 0..20 {
        if push_event(&channel, WirelessEvent::written(AttributeId::Speed, b"10")) {
            accepted += 1;
        }
    }

    assert!(accepted < 20);
    assert_eq!(rig.surface.drain_events(&channel), accepted);
}

#[test]
fn twelve_bit_resolution_maps_full_scale() {
    let config = NodeConfig {
        pwm_resolution_bits: 12,
        initial_duty: 0,
        ..NodeConfig::default()
    };
    let rig = Rig::new(config);
    rig.connect_client(1);

    rig.write_speed("1500");

    assert_eq!(rig.pwm.last_duty(), Some(4095));
}
