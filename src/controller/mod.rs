//! Device controller — the event-driven core.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Input Sources                           │
//! │                                                              │
//! │  ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌────────────┐    │
//! │  │ Buttons  │  │ Sliders  │  │ Text box │  │  TimerSet  │    │
//! │  └────┬─────┘  └────┬─────┘  └────┬─────┘  └─────┬──────┘    │
//! │       ▼             ▼             ▼              ▼           │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │              DeviceController                          │  │
//! │  │   state · battery · connection · selections · log      │  │
//! │  └───────────────────────┬────────────────────────────────┘  │
//! │                          ▼                                   │
//! │                EventSink (presentation layer)                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Strictly single-threaded: inputs arrive through [`handle`], timer
//! firings are delivered by [`tick`], and each is processed to completion
//! against the one mutable aggregate before the next. The controller
//! emits at most one [`Notification::StateChanged`] per input event or
//! timer firing; the narrow animation notifications are emitted inline.
//!
//! Temporal hazards this module is responsible for:
//! - power release racing the hold detector (`power_released`)
//! - a connectivity-confirm firing after the state left `TestingConnection`
//! - a session completing while a critical-battery pause triggers
//! - safe-voltage ramp timers rebound per disconnect, never stacked
//!
//! [`handle`]: DeviceController::handle
//! [`tick`]: DeviceController::tick

pub mod events;
pub mod state;

use log::{debug, info, warn};

use crate::catalog::{SessionCatalog, Wavelength};
use crate::config::DeviceConfig;
use crate::therapy::{OwnerName, TherapyLog, TherapyRecord};
use crate::timers::{TimerId, TimerSet};

use events::{ArrowDirection, EventSink, InputEvent, Notification};
use state::{BatteryTier, ConnectionStatus, DeviceState};

/// The controller: owns every timer and collection, arbitrates every
/// transition. One instance per device, alive for the whole run.
pub struct DeviceController {
    config: DeviceConfig,
    catalog: SessionCatalog,
    therapy_log: TherapyLog,
    timers: TimerSet,

    state: DeviceState,
    battery_level: f32,
    connection: ConnectionStatus,
    /// Sticky: set when the connection drops to `No`, cleared only by the
    /// explicit reconnection paths.
    disconnected: bool,
    /// True only while the 20-second post-disconnect ramp runs.
    returning_to_safe_voltage: bool,
    intensity: u8,
    active_wavelength: Wavelength,

    selected_group: usize,
    selected_type: usize,
    selected_user_session: usize,
    selected_recorded: usize,

    /// Animation latches: once a tier animation has played, it replays
    /// only after an explicit battery set/reset clears these.
    low_battery_triggered: bool,
    critical_battery_triggered: bool,

    owner_name: OwnerName,

    /// Timestamp of the most recently delivered event or firing.
    now_ms: u64,
}

impl DeviceController {
    /// Controller with the factory catalogue and demo therapy log.
    pub fn new(config: DeviceConfig) -> Self {
        let catalog = SessionCatalog::factory();
        let therapy_log = TherapyLog::seeded(&catalog);
        Self::with_catalog(config, catalog, therapy_log)
    }

    /// Controller over an explicit catalogue and log (tests, provisioning).
    pub fn with_catalog(
        config: DeviceConfig,
        catalog: SessionCatalog,
        therapy_log: TherapyLog,
    ) -> Self {
        let battery_level = config.initial_battery_level.clamp(0.0, 100.0);
        Self {
            config,
            catalog,
            therapy_log,
            timers: TimerSet::new(),
            state: DeviceState::Off,
            battery_level,
            connection: ConnectionStatus::Excellent,
            disconnected: false,
            returning_to_safe_voltage: false,
            intensity: 0,
            active_wavelength: Wavelength::None,
            selected_group: 0,
            selected_type: 0,
            selected_user_session: 0,
            selected_recorded: 0,
            low_battery_triggered: false,
            critical_battery_triggered: false,
            owner_name: OwnerName::new(),
            now_ms: 0,
        }
    }

    // ── Event delivery ────────────────────────────────────────

    /// Deliver one input event at monotonic time `now_ms`.
    ///
    /// Invalid inputs are dropped whole: no state change, no notification.
    pub fn handle(&mut self, event: InputEvent, now_ms: u64, sink: &mut impl EventSink) {
        self.now_ms = now_ms;
        let changed = match event {
            InputEvent::PowerPressed => {
                debug!("power pressed, arming hold detector");
                self.timers
                    .arm_oneshot(TimerId::PowerHold, now_ms, self.config.power_hold_ms);
                false
            }
            InputEvent::PowerReleased => self.power_released(sink),
            InputEvent::Arrow(direction) => self.arrow_clicked(direction),
            InputEvent::StartSession => self.start_session_clicked(sink),
            InputEvent::SetBatteryLevel(level) => self.set_battery(level, sink),
            InputEvent::ResetBattery => self.set_battery(100, sink),
            InputEvent::SetConnectionStatus(raw) => self.set_connection(raw, sink),
            InputEvent::UsernameEntered(name) => {
                self.owner_name = name;
                true
            }
            InputEvent::RecordClicked => self.record_clicked(),
            InputEvent::ReplayClicked => self.replay_clicked(),
        };
        if changed {
            sink.emit(&Notification::StateChanged);
        }
    }

    /// Deliver every timer firing due at `now_ms`, in deadline order.
    /// Each firing yields at most one `StateChanged`.
    pub fn tick(&mut self, now_ms: u64, sink: &mut impl EventSink) {
        self.now_ms = now_ms;
        while let Some(id) = self.timers.pop_due(now_ms) {
            let changed = match id {
                TimerId::PowerHold => self.power_held(sink),
                TimerId::Session => self.session_complete(),
                TimerId::BatteryDrain => self.deplete_battery(sink),
                TimerId::ConnectionTest => self.confirm_connection(sink),
                TimerId::SoftOffRamp => self.soft_off_tick(sink),
                TimerId::SafeVoltageDelay => self.begin_safe_voltage_ramp(sink),
                TimerId::SafeVoltageRamp => self.finish_safe_voltage_ramp(sink),
            };
            if changed {
                sink.emit(&Notification::StateChanged);
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn battery_level(&self) -> f32 {
        self.battery_level
    }

    pub fn battery_tier(&self) -> BatteryTier {
        BatteryTier::classify(
            self.battery_level,
            self.config.low_battery_threshold,
            self.config.critical_battery_threshold,
        )
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection
    }

    pub fn disconnected(&self) -> bool {
        self.disconnected
    }

    pub fn returning_to_safe_voltage(&self) -> bool {
        self.returning_to_safe_voltage
    }

    pub fn intensity(&self) -> u8 {
        self.intensity
    }

    pub fn active_wavelength(&self) -> Wavelength {
        self.active_wavelength
    }

    pub fn selected_group(&self) -> usize {
        self.selected_group
    }

    pub fn selected_type(&self) -> usize {
        self.selected_type
    }

    pub fn selected_user_session(&self) -> usize {
        self.selected_user_session
    }

    pub fn selected_recorded_therapy(&self) -> usize {
        self.selected_recorded
    }

    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    /// Recording is allowed whenever an owner name has been entered.
    pub fn recording_allowed(&self) -> bool {
        !self.owner_name.is_empty()
    }

    pub fn therapy_log(&self) -> &TherapyLog {
        &self.therapy_log
    }

    pub fn catalog(&self) -> &SessionCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Remaining session time: the pause snapshot while paused, the live
    /// timer while in session (relative to the last delivered event),
    /// `None` otherwise.
    pub fn remaining_session_ms(&self) -> Option<u64> {
        match self.state {
            DeviceState::Paused { remaining_ms } => remaining_ms,
            DeviceState::InSession => self
                .timers
                .remaining_ms(TimerId::Session, self.now_ms)
                .map(|r| r.max(0) as u64),
            _ => None,
        }
    }

    // ── Power button arbitration ──────────────────────────────

    /// Short-click path. If the hold detector's deadline has already
    /// passed, the hold action owns this press — the release must do
    /// nothing, or a held-and-released button would apply both actions.
    fn power_released(&mut self, _sink: &mut impl EventSink) -> bool {
        match self.timers.remaining_ms(TimerId::PowerHold, self.now_ms) {
            None => return false, // stray release, never pressed
            Some(remaining) if remaining <= 0 => {
                debug!("release after hold deadline, deferring to hold action");
                return false;
            }
            Some(_) => {}
        }
        self.timers.cancel(TimerId::PowerHold);

        match self.state {
            DeviceState::InSession => self.begin_soft_off(),
            DeviceState::ChoosingSession => {
                self.selected_group = (self.selected_group + 1) % self.catalog.groups().len();
                self.refresh_wavelength();
                debug!("selected group -> {}", self.selected_group);
                true
            }
            _ => false,
        }
    }

    /// Hold detector fired: power on from Off (given charge), else off.
    fn power_held(&mut self, sink: &mut impl EventSink) -> bool {
        if self.state.is_off() && self.battery_level > 0.0 {
            self.power_on()
        } else {
            self.power_off(sink)
        }
    }

    fn power_on(&mut self) -> bool {
        info!("powering on");
        self.state = DeviceState::ChoosingSession;
        self.timers.arm_periodic(
            TimerId::BatteryDrain,
            self.now_ms,
            self.config.battery_drain_interval_ms,
        );
        self.refresh_wavelength();
        true
    }

    /// Full power-down: every timer cancelled, transient fields back to
    /// their startup defaults. Battery, connection, and the log persist.
    fn power_off(&mut self, sink: &mut impl EventSink) -> bool {
        info!("powering off");
        if self.returning_to_safe_voltage {
            self.returning_to_safe_voltage = false;
            sink.emit(&Notification::SafeVoltageRamp(false));
        }
        self.timers.cancel_all();
        self.state = DeviceState::Off;
        self.intensity = 0;
        self.low_battery_triggered = false;
        self.critical_battery_triggered = false;
        self.selected_group = 0;
        self.selected_type = 0;
        self.selected_user_session = 0;
        self.selected_recorded = 0;
        self.owner_name.clear();
        self.active_wavelength = Wavelength::None;
        self.disconnected = !self.connection.is_connected();
        true
    }

    // ── Soft-off ramp ─────────────────────────────────────────

    fn begin_soft_off(&mut self) -> bool {
        info!("soft off initiated at intensity {}", self.intensity);
        self.timers.cancel(TimerId::Session);
        self.state = DeviceState::SoftOff;
        self.timers.arm_periodic(
            TimerId::SoftOffRamp,
            self.now_ms,
            self.config.soft_off_tick_ms,
        );
        true
    }

    /// One ramp step. The boundary check runs before the decrement, so
    /// the ramp completes at the minimum intensity and never shows 0.
    fn soft_off_tick(&mut self, sink: &mut impl EventSink) -> bool {
        if !matches!(self.state, DeviceState::SoftOff) {
            return false;
        }
        if self.intensity <= self.config.intensity_min {
            self.timers.cancel(TimerId::SoftOffRamp);
            return self.power_off(sink);
        }
        self.intensity -= 1;
        true
    }

    fn session_complete(&mut self) -> bool {
        if !matches!(self.state, DeviceState::InSession) {
            return false; // stale: superseded by a pause or power-off
        }
        info!("session complete");
        self.begin_soft_off()
    }

    // ── Selection navigation ──────────────────────────────────

    fn arrow_clicked(&mut self, direction: ArrowDirection) -> bool {
        match self.state {
            DeviceState::InSession => {
                let delta = match direction {
                    ArrowDirection::Up => 1,
                    ArrowDirection::Down => -1,
                };
                self.adjust_intensity(delta)
            }
            DeviceState::ChoosingRecordedTherapy => {
                // The log renders top-down, so Up moves towards index 0.
                let delta = match direction {
                    ArrowDirection::Up => -1,
                    ArrowDirection::Down => 1,
                };
                if !self.adjust_selected_recorded(delta) {
                    return false;
                }
                if let Some(record) = self.therapy_log.get(self.selected_recorded) {
                    self.active_wavelength = record.session_type.class.into();
                }
                true
            }
            DeviceState::ChoosingSession => {
                let up = matches!(direction, ArrowDirection::Up);
                if self.selected_group == self.catalog.user_designed_index() {
                    let len = self.catalog.user_sessions().len();
                    if len == 0 {
                        return false;
                    }
                    self.selected_user_session = cycle(self.selected_user_session, len, up);
                } else {
                    let len = self.catalog.types().len();
                    self.selected_type = cycle(self.selected_type, len, up);
                }
                self.refresh_wavelength();
                true
            }
            _ => false,
        }
    }

    /// Deltas that would leave the in-session interval are dropped whole.
    fn adjust_intensity(&mut self, delta: i32) -> bool {
        let next = i32::from(self.intensity) + delta;
        if next < i32::from(self.config.intensity_min)
            || next > i32::from(self.config.intensity_max)
        {
            return false;
        }
        self.intensity = next as u8;
        debug!("intensity -> {}", self.intensity);
        true
    }

    fn adjust_selected_recorded(&mut self, delta: i32) -> bool {
        let next = self.selected_recorded as i32 + delta;
        if next < 0 || next >= self.therapy_log.len() as i32 {
            return false;
        }
        self.selected_recorded = next as usize;
        true
    }

    /// Recompute the wavelength indicator from the live selection:
    /// the union rule for user-designed sessions, the type's own class
    /// otherwise.
    fn refresh_wavelength(&mut self) {
        if self.selected_group == self.catalog.user_designed_index() {
            self.active_wavelength = self
                .catalog
                .user_session_wavelength(self.selected_user_session);
        } else if let Some(session_type) = self.catalog.session_type(self.selected_type) {
            self.active_wavelength = session_type.class.into();
        }
    }

    // ── Session lifecycle ─────────────────────────────────────

    fn start_session_clicked(&mut self, sink: &mut impl EventSink) -> bool {
        if !matches!(
            self.state,
            DeviceState::ChoosingSession | DeviceState::ChoosingRecordedTherapy
        ) {
            return false;
        }
        if self.battery_tier() == BatteryTier::Critical {
            info!("session refused: battery critical");
            return false;
        }

        if matches!(self.state, DeviceState::ChoosingRecordedTherapy) {
            let Some(record) = self.therapy_log.get(self.selected_recorded) else {
                return false;
            };
            let (group_name, type_name, intensity) = (
                record.group.name,
                record.session_type.name,
                record.intensity,
            );
            if let Some(group_index) = self.catalog.find_group(group_name) {
                self.selected_group = group_index;
            }
            if let Some(type_index) = self.catalog.find_type(type_name) {
                self.selected_type = type_index;
            }
            self.intensity = intensity;
            info!("replaying therapy: {} / {} @ {}", group_name, type_name, intensity);
        }

        self.enter_test_mode(sink);
        true
    }

    /// Begin the connectivity test window that precedes every session.
    fn enter_test_mode(&mut self, sink: &mut impl EventSink) {
        info!("testing connection");
        self.state = DeviceState::TestingConnection;
        sink.emit(&Notification::ConnectionTest(true));
        self.timers.arm_oneshot(
            TimerId::ConnectionTest,
            self.now_ms,
            self.config.connection_test_ms,
        );
    }

    /// Test window elapsed (or a reconnect retried a stalled test):
    /// start the session if a connection exists, else keep waiting.
    fn confirm_connection(&mut self, sink: &mut impl EventSink) -> bool {
        if !matches!(self.state, DeviceState::TestingConnection) {
            debug!("stale connection-test firing ignored");
            return false;
        }
        if !self.connection.is_connected() {
            info!("no connection, waiting to start session");
            return false;
        }
        self.disconnected = false;
        sink.emit(&Notification::ConnectionTest(false));
        info!("connection confirmed, starting session");
        self.start_session();
        true
    }

    /// Arm the session timer and enter `InSession`. Refuses on critical
    /// battery or an invalid selection, leaving the state untouched.
    fn start_session(&mut self) -> bool {
        if self.battery_tier() == BatteryTier::Critical {
            info!("session refused: battery critical");
            return false;
        }
        if self.catalog.session_type(self.selected_type).is_none() {
            return false;
        }

        let duration_mins = if self.selected_group == self.catalog.user_designed_index() {
            match self.catalog.user_session(self.selected_user_session) {
                Some(user_session) => user_session.duration_mins,
                None => return false,
            }
        } else {
            match self.catalog.group(self.selected_group) {
                Some(group) => group.duration_mins,
                None => return false,
            }
        };

        let duration_ms = u64::from(duration_mins) * self.config.session_minute_ms;
        self.timers
            .arm_oneshot(TimerId::Session, self.now_ms, duration_ms);
        if self.intensity < self.config.intensity_min {
            self.intensity = self.config.intensity_min;
        }
        self.state = DeviceState::InSession;
        info!("session started, {} ms", duration_ms);
        true
    }

    // ── Pause / resume ────────────────────────────────────────

    /// Suspend whatever is running. In a session, the timer's remaining
    /// time is snapshotted into the `Paused` variant; from a selection or
    /// test screen there is nothing to snapshot. A soft-off ramp is never
    /// paused — it is already on its way to power-off.
    fn pause_session(&mut self) -> bool {
        match self.state {
            DeviceState::InSession => {
                let remaining = self
                    .timers
                    .remaining_ms(TimerId::Session, self.now_ms)
                    .map(|r| r.max(0) as u64);
                self.timers.cancel(TimerId::Session);
                self.state = DeviceState::Paused {
                    remaining_ms: remaining,
                };
                info!("session paused, {:?} ms remaining", remaining);
                true
            }
            DeviceState::ChoosingSession
            | DeviceState::ChoosingRecordedTherapy
            | DeviceState::TestingConnection => {
                self.state = DeviceState::Paused { remaining_ms: None };
                true
            }
            _ => false,
        }
    }

    /// Resume from `Paused`. Refuses on critical battery. Any pending
    /// safe-voltage timers are cancelled here — a resumed session must
    /// not inherit a ramp armed by an earlier disconnect.
    fn resume_session(&mut self, sink: &mut impl EventSink) -> bool {
        if self.battery_tier() == BatteryTier::Critical {
            info!("resume refused: battery critical");
            return false;
        }
        let DeviceState::Paused { remaining_ms } = self.state else {
            return false;
        };

        self.timers.cancel(TimerId::SafeVoltageDelay);
        if self.returning_to_safe_voltage {
            self.returning_to_safe_voltage = false;
            self.timers.cancel(TimerId::SafeVoltageRamp);
            sink.emit(&Notification::SafeVoltageRamp(false));
        }

        match remaining_ms {
            Some(ms) => {
                self.timers.arm_oneshot(TimerId::Session, self.now_ms, ms);
                if self.intensity < self.config.intensity_min {
                    self.intensity = self.config.intensity_min;
                }
                self.state = DeviceState::InSession;
                info!("session resumed, {} ms remaining", ms);
            }
            None => {
                self.state = DeviceState::ChoosingSession;
            }
        }
        true
    }

    // ── Battery ───────────────────────────────────────────────

    /// One depletion tick. Drain depends on state; a fresh tier crossing
    /// plays its one-shot animation; sub-percent changes stay silent.
    fn deplete_battery(&mut self, sink: &mut impl EventSink) -> bool {
        if self.state.is_off() {
            return false;
        }
        let prev_whole = self.battery_level as i32;

        let drain = match self.state {
            DeviceState::InSession => {
                self.config.drain_in_session_base
                    + self.config.drain_per_intensity * f32::from(self.intensity)
                    + self.config.drain_connection_penalty * self.connection.drain_penalty()
            }
            DeviceState::Paused { .. } => self.config.drain_paused,
            _ => self.config.drain_idle,
        };
        self.battery_level = (self.battery_level - drain).max(0.0);

        // Hardware cutoff: empty battery overrides everything.
        if self.battery_level <= 0.0 {
            warn!("battery depleted, forcing power off");
            return self.power_off(sink);
        }

        match self.battery_tier() {
            BatteryTier::Critical if !self.critical_battery_triggered => {
                self.critical_battery_triggered = true;
                warn!("battery critical at {:.1}%", self.battery_level);
                sink.emit(&Notification::BatteryCritical);
                let _ = self.pause_session();
                true
            }
            BatteryTier::Low if !self.low_battery_triggered => {
                self.low_battery_triggered = true;
                info!("battery low at {:.1}%", self.battery_level);
                sink.emit(&Notification::BatteryLow);
                true
            }
            _ => prev_whole - self.battery_level as i32 >= 1,
        }
    }

    /// Absolute battery override (simulated recharge). Re-arms the tier
    /// animation latches; no depletion tick runs here. Resumes a paused
    /// session when the link is up.
    fn set_battery(&mut self, level: u8, sink: &mut impl EventSink) -> bool {
        if level > 100 {
            return false;
        }
        info!("battery set to {}%", level);
        self.battery_level = f32::from(level);
        self.low_battery_triggered = false;
        self.critical_battery_triggered = false;

        if self.state.is_paused() && !self.disconnected {
            let _ = self.resume_session(sink);
        }
        true
    }

    // ── Connectivity ──────────────────────────────────────────

    /// Connection slider moved. Exactly one of three reactions applies:
    /// retry a stalled connectivity test, pause a running session, or
    /// resume a paused one.
    fn set_connection(&mut self, raw: u8, sink: &mut impl EventSink) -> bool {
        let status = ConnectionStatus::from_raw(raw);
        let previous = self.connection;
        self.connection = status;
        if !status.is_connected() {
            self.disconnected = true;
        }
        debug!("connection {:?} -> {:?}", previous, status);

        match self.state {
            DeviceState::TestingConnection => {
                // Retry only on a reconnect edge after the window elapsed;
                // an open window's pending firing handles the rest.
                let window_elapsed = !matches!(
                    self.timers.remaining_ms(TimerId::ConnectionTest, self.now_ms),
                    Some(remaining) if remaining > 0
                );
                if previous == ConnectionStatus::No && window_elapsed {
                    let _ = self.confirm_connection(sink);
                }
            }
            DeviceState::InSession if !status.is_connected() => {
                let _ = self.pause_session();
                if !self.timers.is_armed(TimerId::SafeVoltageDelay) {
                    self.timers.arm_oneshot(
                        TimerId::SafeVoltageDelay,
                        self.now_ms,
                        self.config.safe_voltage_delay_ms,
                    );
                }
            }
            DeviceState::Paused { .. } if status.is_connected() && self.disconnected => {
                self.disconnected = false;
                let _ = self.resume_session(sink);
            }
            _ => {}
        }
        true
    }

    // ── Safe-voltage ramp ─────────────────────────────────────

    /// Disconnect delay elapsed. If the link is still down, begin the
    /// timed ramp; a reconnect in the meantime means no ramp at all.
    fn begin_safe_voltage_ramp(&mut self, sink: &mut impl EventSink) -> bool {
        if !self.disconnected {
            debug!("reconnected before safe-voltage delay elapsed, no ramp");
            return false;
        }
        info!("returning to safe voltage");
        self.returning_to_safe_voltage = true;
        sink.emit(&Notification::SafeVoltageRamp(true));
        self.timers.arm_oneshot(
            TimerId::SafeVoltageRamp,
            self.now_ms,
            self.config.safe_voltage_ramp_ms,
        );
        // Flag-only change; the ramp-started notification is the signal.
        false
    }

    fn finish_safe_voltage_ramp(&mut self, sink: &mut impl EventSink) -> bool {
        if !self.returning_to_safe_voltage {
            return false;
        }
        info!("safe voltage reached");
        self.returning_to_safe_voltage = false;
        self.intensity = 0;
        sink.emit(&Notification::SafeVoltageRamp(false));
        true
    }

    // ── Recording / replay ────────────────────────────────────

    /// Record the live group/type/intensity under the entered owner name.
    /// Duplicates are suppressed by the log; an exact repeat is a no-op.
    fn record_clicked(&mut self) -> bool {
        if !self.recording_allowed() {
            return false;
        }
        if self.intensity < self.config.intensity_min {
            return false; // nothing therapeutic to record yet
        }
        let (Some(group), Some(session_type)) = (
            self.catalog.group(self.selected_group),
            self.catalog.session_type(self.selected_type),
        ) else {
            return false;
        };
        let record = TherapyRecord {
            group: *group,
            session_type: *session_type,
            intensity: self.intensity,
            owner: self.owner_name.clone(),
        };
        self.therapy_log.record(record)
    }

    /// Switch to browsing the recorded-therapy log.
    fn replay_clicked(&mut self) -> bool {
        if !matches!(self.state, DeviceState::ChoosingSession) {
            return false;
        }
        self.state = DeviceState::ChoosingRecordedTherapy;
        if let Some(record) = self.therapy_log.get(self.selected_recorded) {
            self.active_wavelength = record.session_type.class.into();
        }
        true
    }
}

/// Wrap-around index step in either direction.
fn cycle(index: usize, len: usize, up: bool) -> usize {
    debug_assert!(len > 0);
    if up {
        (index + 1) % len
    } else if index == 0 {
        len - 1
    } else {
        index - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingSink {
        events: Vec<Notification>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self { events: Vec::new() }
        }
    }

    impl EventSink for RecordingSink {
        fn emit(&mut self, event: &Notification) {
            self.events.push(*event);
        }
    }

    fn powered_on() -> (DeviceController, RecordingSink, u64) {
        let mut dev = DeviceController::new(DeviceConfig::default());
        let mut sink = RecordingSink::new();
        dev.handle(InputEvent::PowerPressed, 0, &mut sink);
        dev.tick(1000, &mut sink);
        (dev, sink, 1000)
    }

    #[test]
    fn hold_from_off_powers_on() {
        let (dev, _, _) = powered_on();
        assert_eq!(dev.state(), DeviceState::ChoosingSession);
        assert_eq!(dev.battery_tier(), BatteryTier::High);
        assert_eq!(dev.active_wavelength(), Wavelength::Small); // MET
    }

    #[test]
    fn release_before_hold_deadline_is_a_click() {
        let mut dev = DeviceController::new(DeviceConfig::default());
        let mut sink = RecordingSink::new();
        dev.handle(InputEvent::PowerPressed, 0, &mut sink);
        dev.handle(InputEvent::PowerReleased, 400, &mut sink);
        dev.tick(2000, &mut sink);
        // Click while Off is a no-op; crucially the hold never fires.
        assert_eq!(dev.state(), DeviceState::Off);
    }

    #[test]
    fn release_after_hold_deadline_defers_to_hold() {
        let mut dev = DeviceController::new(DeviceConfig::default());
        let mut sink = RecordingSink::new();
        dev.handle(InputEvent::PowerPressed, 0, &mut sink);
        // Deadline passed but the firing not yet delivered.
        dev.handle(InputEvent::PowerReleased, 1500, &mut sink);
        assert_eq!(dev.state(), DeviceState::Off);
        dev.tick(1500, &mut sink);
        // Only the hold action applied.
        assert_eq!(dev.state(), DeviceState::ChoosingSession);
    }

    #[test]
    fn short_click_cycles_session_group() {
        let (mut dev, mut sink, now) = powered_on();
        assert_eq!(dev.selected_group(), 0);
        dev.handle(InputEvent::PowerPressed, now + 100, &mut sink);
        dev.handle(InputEvent::PowerReleased, now + 200, &mut sink);
        assert_eq!(dev.selected_group(), 1);
    }

    #[test]
    fn soft_off_ramp_stops_at_minimum_intensity() {
        let (mut dev, mut sink, now) = powered_on();
        dev.handle(InputEvent::StartSession, now, &mut sink);
        dev.tick(now + 5000, &mut sink); // connection test passes
        assert_eq!(dev.state(), DeviceState::InSession);
        for _ in 0..4 {
            dev.handle(InputEvent::Arrow(ArrowDirection::Up), now + 5000, &mut sink);
        }
        assert_eq!(dev.intensity(), 5);

        // Short click ends the session early.
        dev.handle(InputEvent::PowerPressed, now + 6000, &mut sink);
        dev.handle(InputEvent::PowerReleased, now + 6100, &mut sink);
        assert_eq!(dev.state(), DeviceState::SoftOff);

        // Four ramp ticks: 5 -> 4 -> 3 -> 2 -> 1, fifth powers off.
        let mut t = now + 6100;
        for expected in [4, 3, 2, 1] {
            t += 1000;
            dev.tick(t, &mut sink);
            assert_eq!(dev.intensity(), expected);
        }
        t += 1000;
        dev.tick(t, &mut sink);
        assert_eq!(dev.state(), DeviceState::Off);
        assert_eq!(dev.intensity(), 0);
    }

    #[test]
    fn intensity_step_beyond_range_is_dropped() {
        let (mut dev, mut sink, now) = powered_on();
        dev.handle(InputEvent::StartSession, now, &mut sink);
        dev.tick(now + 5000, &mut sink);
        for _ in 0..10 {
            dev.handle(InputEvent::Arrow(ArrowDirection::Up), now + 5000, &mut sink);
        }
        assert_eq!(dev.intensity(), 8);
        let before = sink.events.len();
        dev.handle(InputEvent::Arrow(ArrowDirection::Up), now + 5000, &mut sink);
        assert_eq!(dev.intensity(), 8);
        assert_eq!(sink.events.len(), before, "dropped delta must not notify");
    }

    #[test]
    fn power_off_preserves_battery_and_log() {
        let (mut dev, mut sink, now) = powered_on();
        let battery = dev.battery_level();
        let log_len = dev.therapy_log().len();
        dev.handle(InputEvent::PowerPressed, now, &mut sink);
        dev.tick(now + 1000, &mut sink);
        assert_eq!(dev.state(), DeviceState::Off);
        assert!((dev.battery_level() - battery).abs() < f32::EPSILON);
        assert_eq!(dev.therapy_log().len(), log_len);
        assert_eq!(dev.intensity(), 0);
        assert_eq!(dev.selected_group(), 0);
    }

    #[test]
    fn stale_connection_test_after_power_off_is_ignored() {
        let (mut dev, mut sink, now) = powered_on();
        dev.handle(InputEvent::StartSession, now, &mut sink);
        assert_eq!(dev.state(), DeviceState::TestingConnection);
        // Hold to power off mid-test; the pending test firing dies with it.
        dev.handle(InputEvent::PowerPressed, now + 1000, &mut sink);
        dev.tick(now + 2000, &mut sink);
        assert_eq!(dev.state(), DeviceState::Off);
        dev.tick(now + 10_000, &mut sink);
        assert_eq!(dev.state(), DeviceState::Off);
    }
}
