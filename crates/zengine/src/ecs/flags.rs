//! Lifecycle gating flags shared by entities and components

bitflags::bitflags! {
    /// Which lifecycle hooks fire for an entity or component
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u8 {
        /// Participates in the frame at all
        const ENABLED = 1;
        /// Receives fixed/update/late-update hooks
        const UPDATE = 1 << 1;
        /// Keeps updating while the simulation is paused
        const PAUSE = 1 << 2;
        /// Entities only: lets attached components receive update hooks
        const COMPONENT_UPDATE = 1 << 3;
    }
}

impl Flags {
    /// Defaults for a freshly spawned entity
    pub const ENTITY_DEFAULT: Self = Self::ENABLED.union(Self::UPDATE).union(Self::COMPONENT_UPDATE);

    /// Defaults for a freshly attached component
    pub const COMPONENT_DEFAULT: Self = Self::ENABLED.union(Self::UPDATE);

    /// Whether update-style hooks should run under the given pause state
    pub fn runs_updates(self, paused: bool) -> bool {
        self.contains(Self::ENABLED | Self::UPDATE) && (!paused || self.contains(Self::PAUSE))
    }
}
