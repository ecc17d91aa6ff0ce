//! Property tests: controller invariants under arbitrary input streams.
//!
//! The controller must hold its safety invariants no matter what order
//! buttons, sliders, and timer firings arrive in. Each test drives a
//! fresh controller through a random event sequence with an advancing
//! fake clock and checks the invariants after every step.

use cespod::config::DeviceConfig;
use cespod::controller::DeviceController;
use cespod::controller::events::{ArrowDirection, EventSink, InputEvent, Notification};
use cespod::controller::state::DeviceState;
use cespod::therapy::OwnerName;
use proptest::prelude::*;

// ── Arbitrary input streams ───────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Event(InputEvent),
    Advance(u64),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Event(InputEvent::PowerPressed)),
        Just(Op::Event(InputEvent::PowerReleased)),
        Just(Op::Event(InputEvent::Arrow(ArrowDirection::Up))),
        Just(Op::Event(InputEvent::Arrow(ArrowDirection::Down))),
        Just(Op::Event(InputEvent::StartSession)),
        (0u8..=110u8).prop_map(|v| Op::Event(InputEvent::SetBatteryLevel(v))),
        Just(Op::Event(InputEvent::ResetBattery)),
        (0u8..=3u8).prop_map(|v| Op::Event(InputEvent::SetConnectionStatus(v))),
        Just(Op::Event(InputEvent::UsernameEntered(
            OwnerName::try_from("prop").unwrap()
        ))),
        Just(Op::Event(InputEvent::RecordClicked)),
        Just(Op::Event(InputEvent::ReplayClicked)),
        (0u64..=6000u64).prop_map(Op::Advance),
    ]
}

struct CountingSink {
    state_changes: usize,
}

impl EventSink for CountingSink {
    fn emit(&mut self, event: &Notification) {
        if matches!(event, Notification::StateChanged) {
            self.state_changes += 1;
        }
    }
}

proptest! {
    /// Battery level stays within [0, 100] under any input stream.
    #[test]
    fn battery_always_in_range(ops in proptest::collection::vec(arb_op(), 1..=80)) {
        let mut dev = DeviceController::new(DeviceConfig::default());
        let mut sink = CountingSink { state_changes: 0 };
        let mut now = 0u64;

        for op in ops {
            match op {
                Op::Event(event) => dev.handle(event, now, &mut sink),
                Op::Advance(ms) => {
                    now += ms;
                    dev.tick(now, &mut sink);
                }
            }
            prop_assert!(dev.battery_level() >= 0.0);
            prop_assert!(dev.battery_level() <= 100.0);
        }
    }

    /// An in-session intensity never leaves the configured interval, and
    /// a powered-off device always reads intensity 0.
    #[test]
    fn intensity_respects_state(ops in proptest::collection::vec(arb_op(), 1..=80)) {
        let config = DeviceConfig::default();
        let (min, max) = (config.intensity_min, config.intensity_max);
        let mut dev = DeviceController::new(config);
        let mut sink = CountingSink { state_changes: 0 };
        let mut now = 0u64;

        for op in ops {
            match op {
                Op::Event(event) => dev.handle(event, now, &mut sink),
                Op::Advance(ms) => {
                    now += ms;
                    dev.tick(now, &mut sink);
                }
            }
            match dev.state() {
                DeviceState::InSession => {
                    prop_assert!(dev.intensity() >= min && dev.intensity() <= max);
                }
                DeviceState::Off => prop_assert_eq!(dev.intensity(), 0),
                _ => prop_assert!(dev.intensity() <= max),
            }
        }
    }

    /// The therapy log never holds two identical records, whatever gets
    /// clicked in whatever order.
    #[test]
    fn log_records_stay_unique(ops in proptest::collection::vec(arb_op(), 1..=80)) {
        let mut dev = DeviceController::new(DeviceConfig::default());
        let mut sink = CountingSink { state_changes: 0 };
        let mut now = 0u64;

        for op in ops {
            match op {
                Op::Event(event) => dev.handle(event, now, &mut sink),
                Op::Advance(ms) => {
                    now += ms;
                    dev.tick(now, &mut sink);
                }
            }
        }

        let records = dev.therapy_log().records();
        for i in 0..records.len() {
            for j in (i + 1)..records.len() {
                prop_assert!(
                    records[i] != records[j],
                    "duplicate records at {} and {}",
                    i,
                    j
                );
            }
        }
    }

    /// Each input event yields at most one state-changed notification.
    #[test]
    fn at_most_one_state_change_per_event(
        ops in proptest::collection::vec(arb_op(), 1..=80),
    ) {
        let mut dev = DeviceController::new(DeviceConfig::default());
        let mut sink = CountingSink { state_changes: 0 };
        let mut now = 0u64;

        for op in ops {
            match op {
                Op::Event(event) => {
                    let before = sink.state_changes;
                    dev.handle(event, now, &mut sink);
                    prop_assert!(sink.state_changes - before <= 1);
                }
                Op::Advance(ms) => {
                    now += ms;
                    dev.tick(now, &mut sink);
                }
            }
        }
    }

    /// The paused snapshot never exceeds the longest catalogue session,
    /// and a paused device holds it unchanged while time passes.
    #[test]
    fn pause_snapshot_is_stable(ops in proptest::collection::vec(arb_op(), 1..=60)) {
        let mut dev = DeviceController::new(DeviceConfig::default());
        let mut sink = CountingSink { state_changes: 0 };
        let mut now = 0u64;
        let longest_ms = 45 * 1000u64; // "45 Min" group

        for op in ops {
            match op {
                Op::Event(event) => dev.handle(event, now, &mut sink),
                Op::Advance(ms) => {
                    now += ms;
                    dev.tick(now, &mut sink);
                }
            }
            if let DeviceState::Paused { remaining_ms: Some(remaining) } = dev.state() {
                prop_assert!(remaining <= longest_ms);
                let before = remaining;
                now += 3000;
                dev.tick(now, &mut sink);
                if let DeviceState::Paused { remaining_ms: Some(after) } = dev.state() {
                    prop_assert_eq!(after, before);
                }
            }
        }
    }
}
