//! Session catalogue — the static therapy menu.
//!
//! Groups are duration presets; types are named wavelength classes;
//! user-designed sessions pair a fixed duration with an ordered list of
//! types. All entries are value types held in fixed-capacity vectors for
//! the lifetime of the controller — no per-entry allocation, no deletion.
//!
//! By convention the **last** group is the user-designed placeholder: it
//! carries no duration of its own and tells the controller to derive the
//! session duration (and wavelength) from the selected user session.

use heapless::Vec;
use serde::Serialize;

/// Capacity bounds for the fixed catalogue tables.
pub const MAX_GROUPS: usize = 4;
pub const MAX_TYPES: usize = 8;
pub const MAX_USER_SESSIONS: usize = 4;
/// Maximum types referenced by one user-designed session.
pub const MAX_TYPES_PER_DESIGN: usize = 8;

// ───────────────────────────────────────────────────────────────
// Wavelengths
// ───────────────────────────────────────────────────────────────

/// Wavelength class carried by a session type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WavelengthClass {
    Small,
    Big,
}

/// Wavelength indicator shown while selecting or running a session.
/// `Both` arises only from user-designed sessions that mix classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Wavelength {
    None,
    Small,
    Big,
    Both,
}

impl From<WavelengthClass> for Wavelength {
    fn from(class: WavelengthClass) -> Self {
        match class {
            WavelengthClass::Small => Self::Small,
            WavelengthClass::Big => Self::Big,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Catalogue entries
// ───────────────────────────────────────────────────────────────

/// A duration preset selectable before starting a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionGroup {
    pub name: &'static str,
    /// Session duration in catalogue minutes. Zero for the user-designed
    /// placeholder, whose duration comes from the selected user session.
    pub duration_mins: u16,
}

/// A named wavelength class usable during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionType {
    pub name: &'static str,
    pub class: WavelengthClass,
}

/// A user-designed session: fixed duration plus an ordered, non-empty
/// sequence of session types (stored as indices into the type table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDesignedSession {
    pub name: &'static str,
    pub duration_mins: u16,
    pub type_indices: Vec<usize, MAX_TYPES_PER_DESIGN>,
}

// ───────────────────────────────────────────────────────────────
// SessionCatalog
// ───────────────────────────────────────────────────────────────

/// Read-only catalogue of groups, types, and user-designed sessions.
pub struct SessionCatalog {
    groups: Vec<SessionGroup, MAX_GROUPS>,
    types: Vec<SessionType, MAX_TYPES>,
    user_sessions: Vec<UserDesignedSession, MAX_USER_SESSIONS>,
}

impl SessionCatalog {
    /// Build a catalogue from explicit tables (used by tests and future
    /// provisioning). The last group must be the user-designed placeholder.
    pub fn new(
        groups: Vec<SessionGroup, MAX_GROUPS>,
        types: Vec<SessionType, MAX_TYPES>,
        user_sessions: Vec<UserDesignedSession, MAX_USER_SESSIONS>,
    ) -> Self {
        debug_assert!(!groups.is_empty());
        debug_assert!(!types.is_empty());
        Self {
            groups,
            types,
            user_sessions,
        }
    }

    /// The factory catalogue the device ships with.
    pub fn factory() -> Self {
        let mut groups: Vec<SessionGroup, MAX_GROUPS> = Vec::new();
        let _ = groups.push(SessionGroup {
            name: "20 Min",
            duration_mins: 20,
        });
        let _ = groups.push(SessionGroup {
            name: "45 Min",
            duration_mins: 45,
        });
        let _ = groups.push(SessionGroup {
            name: "User Designed",
            duration_mins: 0,
        });

        let mut types: Vec<SessionType, MAX_TYPES> = Vec::new();
        let _ = types.push(SessionType {
            name: "MET",
            class: WavelengthClass::Small,
        });
        let _ = types.push(SessionType {
            name: "Sub-Delta",
            class: WavelengthClass::Big,
        });
        let _ = types.push(SessionType {
            name: "Delta",
            class: WavelengthClass::Small,
        });
        let _ = types.push(SessionType {
            name: "Theta",
            class: WavelengthClass::Small,
        });

        let mut user_sessions: Vec<UserDesignedSession, MAX_USER_SESSIONS> = Vec::new();
        let mut test1 = UserDesignedSession {
            name: "Test1",
            duration_mins: 20,
            type_indices: Vec::new(),
        };
        let _ = test1.type_indices.push(0); // MET
        let _ = user_sessions.push(test1);

        let mut test2 = UserDesignedSession {
            name: "Test2",
            duration_mins: 10,
            type_indices: Vec::new(),
        };
        let _ = test2.type_indices.push(1); // Sub-Delta
        let _ = test2.type_indices.push(2); // Delta
        let _ = user_sessions.push(test2);

        Self::new(groups, types, user_sessions)
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn groups(&self) -> &[SessionGroup] {
        &self.groups
    }

    pub fn types(&self) -> &[SessionType] {
        &self.types
    }

    pub fn user_sessions(&self) -> &[UserDesignedSession] {
        &self.user_sessions
    }

    pub fn group(&self, index: usize) -> Option<&SessionGroup> {
        self.groups.get(index)
    }

    pub fn session_type(&self, index: usize) -> Option<&SessionType> {
        self.types.get(index)
    }

    pub fn user_session(&self, index: usize) -> Option<&UserDesignedSession> {
        self.user_sessions.get(index)
    }

    /// Index of the user-designed placeholder group (by convention, last).
    pub fn user_designed_index(&self) -> usize {
        self.groups.len() - 1
    }

    pub fn find_group(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.name == name)
    }

    pub fn find_type(&self, name: &str) -> Option<usize> {
        self.types.iter().position(|t| t.name == name)
    }

    /// Wavelength of a user-designed session: the union of the classes in
    /// its type sequence (`Small` + `Big` = `Both`).
    pub fn user_session_wavelength(&self, index: usize) -> Wavelength {
        let Some(session) = self.user_sessions.get(index) else {
            return Wavelength::None;
        };

        let mut small = false;
        let mut big = false;
        for &type_index in &session.type_indices {
            match self.types.get(type_index).map(|t| t.class) {
                Some(WavelengthClass::Small) => small = true,
                Some(WavelengthClass::Big) => big = true,
                None => {}
            }
        }

        match (small, big) {
            (true, true) => Wavelength::Both,
            (true, false) => Wavelength::Small,
            (false, true) => Wavelength::Big,
            (false, false) => Wavelength::None,
        }
    }
}

impl Default for SessionCatalog {
    fn default() -> Self {
        Self::factory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_catalogue_shape() {
        let cat = SessionCatalog::factory();
        assert_eq!(cat.groups().len(), 3);
        assert_eq!(cat.types().len(), 4);
        assert_eq!(cat.user_sessions().len(), 2);
        assert_eq!(cat.user_designed_index(), 2);
        assert_eq!(cat.groups()[cat.user_designed_index()].name, "User Designed");
    }

    #[test]
    fn find_by_name() {
        let cat = SessionCatalog::factory();
        assert_eq!(cat.find_group("45 Min"), Some(1));
        assert_eq!(cat.find_type("Theta"), Some(3));
        assert_eq!(cat.find_group("90 Min"), None);
        assert_eq!(cat.find_type("Gamma"), None);
    }

    #[test]
    fn single_class_user_session_wavelength() {
        let cat = SessionCatalog::factory();
        // Test1 references MET only (small).
        assert_eq!(cat.user_session_wavelength(0), Wavelength::Small);
    }

    #[test]
    fn mixed_class_user_session_is_both() {
        let cat = SessionCatalog::factory();
        // Test2 mixes Sub-Delta (big) and Delta (small).
        assert_eq!(cat.user_session_wavelength(1), Wavelength::Both);
    }

    #[test]
    fn out_of_range_user_session_has_no_wavelength() {
        let cat = SessionCatalog::factory();
        assert_eq!(cat.user_session_wavelength(99), Wavelength::None);
    }

    #[test]
    fn wavelength_from_class() {
        assert_eq!(Wavelength::from(WavelengthClass::Small), Wavelength::Small);
        assert_eq!(Wavelength::from(WavelengthClass::Big), Wavelength::Big);
    }
}
