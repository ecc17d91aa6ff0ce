//! Controller state vocabulary.
//!
//! [`DeviceState`] is a tagged union: each variant carries only the data
//! that exists in that state, so combinations like "powered off but still
//! holding a pause snapshot" cannot be expressed at all.

/// Top-level device state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Powered down. Battery level, connection status, and the therapy
    /// log persist; everything else resets.
    Off,
    /// Powered on, browsing session groups/types/user sessions.
    ChoosingSession,
    /// Browsing the recorded-therapy log for replay.
    ChoosingRecordedTherapy,
    /// Five-second connectivity check before a session starts.
    TestingConnection,
    /// Therapy running; the session timer is armed.
    InSession,
    /// Session suspended. `remaining_ms` is the session timer snapshot
    /// taken at the moment of pausing; `None` means no session was in
    /// flight (e.g. a critical-battery pause from a selection screen).
    Paused { remaining_ms: Option<u64> },
    /// Gradual intensity ramp-down preceding power-off.
    SoftOff,
}

impl DeviceState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::ChoosingSession => "ChoosingSession",
            Self::ChoosingRecordedTherapy => "ChoosingRecordedTherapy",
            Self::TestingConnection => "TestingConnection",
            Self::InSession => "InSession",
            Self::Paused { .. } => "Paused",
            Self::SoftOff => "SoftOff",
        }
    }

    pub fn is_off(&self) -> bool {
        matches!(self, Self::Off)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused { .. })
    }
}

/// Coarse battery tier derived from the battery level; gates session
/// start/resume and drives the low-battery animations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryTier {
    High,
    Low,
    Critical,
}

impl BatteryTier {
    /// Classify a battery level against the configured thresholds.
    pub fn classify(level: f32, low_threshold: f32, critical_threshold: f32) -> Self {
        if level <= critical_threshold {
            Self::Critical
        } else if level <= low_threshold {
            Self::Low
        } else {
            Self::High
        }
    }
}

/// Simulated wireless connection quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    No,
    Okay,
    Excellent,
}

impl ConnectionStatus {
    /// Map the raw slider value (0 | 1 | 2) into a status.
    /// Out-of-range values clamp to `Excellent`.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::No,
            1 => Self::Okay,
            _ => Self::Excellent,
        }
    }

    pub fn is_connected(self) -> bool {
        self != Self::No
    }

    /// Battery drain penalty weight — a worse link drains faster.
    pub fn drain_penalty(self) -> f32 {
        match self {
            Self::Excellent => 1.0,
            Self::Okay => 2.0,
            Self::No => 3.0,
        }
    }
}
