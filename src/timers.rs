//! Timer set — token-keyed one-shot and periodic timers.
//!
//! The controller owns one slot per logical timer purpose ([`TimerId`]).
//! Nothing here blocks or reads a clock: callers supply a monotonic
//! `now_ms` on every call, so a fake clock drives the whole set in tests.
//!
//! ```text
//!  ┌─────────────────────────────────────────────────────────┐
//!  │ TimerSet                                                │
//!  │  ┌──────────────────┬──────────┬──────────┐             │
//!  │  │ TimerId           │ deadline │ period   │             │
//!  │  ├──────────────────┼──────────┼──────────┤             │
//!  │  │ PowerHold         │ t+1000   │ —        │  one-shot   │
//!  │  │ BatteryDrain      │ t+2000   │ 2000     │  periodic   │
//!  │  │ …                 │          │          │             │
//!  │  └──────────────────┴──────────┴──────────┘             │
//!  └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Arming an already-armed token **rebinds** its slot — a fresh deadline
//! replaces the pending one, never stacking duplicate callbacks. That is
//! the contract the disconnect/reconnect paths rely on.

use log::debug;

/// Identity of each logical timer the controller schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TimerId {
    /// Power-button hold detector (one-shot).
    PowerHold = 0,
    /// Session duration (one-shot).
    Session = 1,
    /// Battery depletion tick (periodic).
    BatteryDrain = 2,
    /// Connectivity test window at session start (one-shot).
    ConnectionTest = 3,
    /// Soft-off intensity ramp tick (periodic).
    SoftOffRamp = 4,
    /// Delay between disconnect and safe-voltage ramp (one-shot).
    SafeVoltageDelay = 5,
    /// Safe-voltage ramp duration (one-shot).
    SafeVoltageRamp = 6,
}

impl TimerId {
    /// Total number of timer slots.
    pub const COUNT: usize = 7;

    /// All timer identities, in slot order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::PowerHold,
        Self::Session,
        Self::BatteryDrain,
        Self::ConnectionTest,
        Self::SoftOffRamp,
        Self::SafeVoltageDelay,
        Self::SafeVoltageRamp,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Internal bookkeeping for one armed timer.
#[derive(Debug, Clone, Copy)]
struct TimerSlot {
    /// Absolute firing time (milliseconds, caller's timebase).
    deadline_ms: u64,
    /// Re-arm interval for periodic timers; `None` for one-shots.
    period_ms: Option<u64>,
}

/// Fixed set of independently schedulable timers.
pub struct TimerSet {
    slots: [Option<TimerSlot>; TimerId::COUNT],
}

impl TimerSet {
    pub fn new() -> Self {
        Self {
            slots: [None; TimerId::COUNT],
        }
    }

    /// Arm `id` to fire once, `delay_ms` after `now_ms`.
    /// Replaces any pending deadline for the same token.
    pub fn arm_oneshot(&mut self, id: TimerId, now_ms: u64, delay_ms: u64) {
        debug!("TimerSet: {:?} one-shot in {}ms", id, delay_ms);
        self.slots[id.index()] = Some(TimerSlot {
            deadline_ms: now_ms.saturating_add(delay_ms),
            period_ms: None,
        });
    }

    /// Arm `id` to fire every `interval_ms`, first firing one interval
    /// after `now_ms`. Replaces any pending deadline for the same token.
    pub fn arm_periodic(&mut self, id: TimerId, now_ms: u64, interval_ms: u64) {
        debug!("TimerSet: {:?} periodic every {}ms", id, interval_ms);
        self.slots[id.index()] = Some(TimerSlot {
            deadline_ms: now_ms.saturating_add(interval_ms),
            period_ms: Some(interval_ms.max(1)),
        });
    }

    /// Disarm `id`. Harmless if it was not armed.
    pub fn cancel(&mut self, id: TimerId) {
        if self.slots[id.index()].take().is_some() {
            debug!("TimerSet: {:?} cancelled", id);
        }
    }

    /// Disarm every timer (power-off path).
    pub fn cancel_all(&mut self) {
        self.slots = [None; TimerId::COUNT];
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.slots[id.index()].is_some()
    }

    /// Milliseconds until `id` fires: `None` if unarmed, negative if the
    /// deadline has already passed but the firing has not been delivered.
    /// The power-release race check hinges on the negative case.
    pub fn remaining_ms(&self, id: TimerId, now_ms: u64) -> Option<i64> {
        self.slots[id.index()]
            .map(|slot| slot.deadline_ms as i64 - now_ms as i64)
    }

    /// Pop the next due firing at `now_ms`, earliest deadline first
    /// (ties broken by slot order). One-shots disarm on firing; periodic
    /// timers re-arm one interval past their previous deadline. Returns
    /// `None` when nothing is due.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<TimerId> {
        let mut best: Option<(u64, TimerId)> = None;
        for id in TimerId::ALL {
            if let Some(slot) = self.slots[id.index()] {
                if slot.deadline_ms <= now_ms
                    && best.is_none_or(|(deadline, _)| slot.deadline_ms < deadline)
                {
                    best = Some((slot.deadline_ms, id));
                }
            }
        }

        let (deadline, id) = best?;
        match self.slots[id.index()].and_then(|slot| slot.period_ms) {
            Some(period) => {
                self.slots[id.index()] = Some(TimerSlot {
                    deadline_ms: deadline.saturating_add(period),
                    period_ms: Some(period),
                });
            }
            None => self.slots[id.index()] = None,
        }
        Some(id)
    }
}

impl Default for TimerSet {
    fn default() -> Self {
        Self::new()
    }
}
