//! cespod — controller core for a battery-powered cranial electrotherapy
//! stimulation (CES) pod.
//!
//! The crate is the device's brain, presentation-agnostic and strictly
//! single-threaded: a host shell (simulator UI, firmware main loop) feeds
//! input events and clock readings in, and observes notifications out.
//!
//! - [`controller`] — the event-driven state machine that arbitrates
//!   power, sessions, pause/resume, battery, and connectivity
//! - [`timers`] — token-keyed software timers driven by a caller clock
//! - [`catalog`] — the preset session groups and types
//! - [`therapy`] — the append-only recorded-therapy log
//! - [`config`] — every tunable interval, threshold, and drain rate
//!
//! ```no_run
//! use cespod::config::DeviceConfig;
//! use cespod::controller::events::{InputEvent, NullSink};
//! use cespod::controller::DeviceController;
//!
//! let mut dev = DeviceController::new(DeviceConfig::default());
//! let mut sink = NullSink;
//! dev.handle(InputEvent::PowerPressed, 0, &mut sink);
//! dev.tick(1000, &mut sink); // hold detector fires, device powers on
//! ```

#![deny(unused_must_use)]

pub mod catalog;
pub mod config;
pub mod controller;
pub mod therapy;
pub mod timers;
