//! Inbound input events and outbound notifications.
//!
//! The presentation layer (or a test harness) feeds [`InputEvent`]s into
//! the controller and implements [`EventSink`] to observe what happened.
//! `StateChanged` carries no payload — observers re-read the full state
//! surface through the controller's query methods. The remaining variants
//! exist only to drive purely visual animations.

use crate::therapy::OwnerName;

/// Direction of the intensity/selection arrow buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowDirection {
    Up,
    Down,
}

/// External inputs delivered to the controller, one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Power button pressed down (arms the hold detector).
    PowerPressed,
    /// Power button released (short click if the detector has not fired).
    PowerReleased,
    /// Intensity / selection arrow clicked.
    Arrow(ArrowDirection),
    /// Start-session button clicked.
    StartSession,
    /// Simulated recharge / discharge to an absolute level (0–100).
    SetBatteryLevel(u8),
    /// Simulated full recharge.
    ResetBattery,
    /// Connection-strength slider moved (0 = none, 1 = okay, 2 = excellent).
    SetConnectionStatus(u8),
    /// Owner-name text box edited.
    UsernameEntered(OwnerName),
    /// Record-therapy button clicked.
    RecordClicked,
    /// Replay-therapy button clicked.
    ReplayClicked,
}

/// Notifications emitted by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// Something observable mutated; re-read the controller state.
    /// At most one of these is emitted per input event or timer firing.
    StateChanged,
    /// Connectivity test window started (`true`) or ended (`false`).
    ConnectionTest(bool),
    /// Safe-voltage ramp-down started (`true`) or completed (`false`).
    SafeVoltageRamp(bool),
    /// Battery freshly dropped into the Low tier (one-shot animation).
    BatteryLow,
    /// Battery freshly dropped into the Critical tier (one-shot animation).
    BatteryCritical,
}

/// Observer port for controller notifications.
///
/// The presentation layer implements this; tests use a recording sink.
pub trait EventSink {
    fn emit(&mut self, event: &Notification);
}

/// Sink that discards everything — for callers that only care about the
/// queryable state surface.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &Notification) {}
}
