//! Recorded therapy log.
//!
//! An append-only, duplicate-suppressing collection of therapy records.
//! Records are owned values in a fixed-capacity vector; nothing is ever
//! mutated or deleted after insertion, and the log survives power cycles
//! of the controller (it lives for the controller's lifetime).

use heapless::{String, Vec};
use log::{debug, info};
use serde::Serialize;

use crate::catalog::{SessionCatalog, SessionGroup, SessionType};

/// Maximum recorded therapies the device can hold.
pub const MAX_RECORDS: usize = 32;
/// Maximum owner-name length in bytes.
pub const MAX_OWNER_LEN: usize = 24;

/// Owner name as stored on-device.
pub type OwnerName = String<MAX_OWNER_LEN>;

/// One recorded therapy: group, type, intensity, and who recorded it.
/// Created only by [`TherapyLog::record`]; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TherapyRecord {
    pub group: SessionGroup,
    pub session_type: SessionType,
    pub intensity: u8,
    pub owner: OwnerName,
}

impl TherapyRecord {
    /// Equality across all four identifying fields — the log's
    /// uniqueness criterion.
    fn duplicates(&self, other: &Self) -> bool {
        self.owner == other.owner
            && self.group.name == other.group.name
            && self.session_type.name == other.session_type.name
            && self.intensity == other.intensity
    }
}

/// Append-only log of recorded therapies.
#[derive(Debug, Default, Serialize)]
pub struct TherapyLog {
    records: Vec<TherapyRecord, MAX_RECORDS>,
}

impl TherapyLog {
    /// An empty log.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// The demo log the device ships with: three factory records built
    /// against the given catalogue.
    pub fn seeded(catalog: &SessionCatalog) -> Self {
        let mut log = Self::new();
        let presets: [(usize, usize, u8, &str); 3] =
            [(0, 0, 2, "User1"), (1, 1, 5, "User2"), (0, 3, 8, "User3")];
        for (group_index, type_index, intensity, owner) in presets {
            if let (Some(group), Some(session_type)) =
                (catalog.group(group_index), catalog.session_type(type_index))
            {
                let _ = log.record(TherapyRecord {
                    group: *group,
                    session_type: *session_type,
                    intensity,
                    owner: OwnerName::try_from(owner).unwrap_or_default(),
                });
            }
        }
        log
    }

    /// Append a record unless an identical one (owner, group, type,
    /// intensity) already exists. Returns `true` if the record was added.
    pub fn record(&mut self, record: TherapyRecord) -> bool {
        if self.records.iter().any(|r| r.duplicates(&record)) {
            debug!(
                "TherapyLog: duplicate record for '{}' suppressed",
                record.owner
            );
            return false;
        }
        info!(
            "TherapyLog: recorded {} / {} at intensity {} for '{}'",
            record.group.name, record.session_type.name, record.intensity, record.owner
        );
        self.records.push(record).is_ok()
    }

    pub fn get(&self, index: usize) -> Option<&TherapyRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[TherapyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
