//! Graph lifecycle management

use std::time::Instant;

/// Graph lifecycle state machine
///
/// A graph is created, populated with stages and static links, activated,
/// drained until a terminal message and torn down. Teardown is final and
/// happens once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Graph object exists, no stages yet
    Created,

    /// Stages added and static links established
    Populated,

    /// Running state requested
    Active {
        /// When activation was requested
        activated_at: Instant,
    },

    /// Event loop observing the graph
    Draining,

    /// Deactivated and released
    TornDown,
}

impl Lifecycle {
    /// Check if this state transition is valid
    pub fn can_transition_to(&self, target: &Lifecycle) -> bool {
        use Lifecycle::*;

        match (self, target) {
            (Created, Populated) => true,
            (Created, TornDown) => true, // construction failed

            (Populated, Active { .. }) => true,
            (Populated, TornDown) => true, // link or state change failed

            (Active { .. }, Draining) => true,
            (Active { .. }, TornDown) => true,

            (Draining, TornDown) => true,

            // Teardown happens once
            (TornDown, _) => false,

            (a, b) if a == b => true,

            _ => false,
        }
    }

    /// Get a human-readable description of this state
    pub fn description(&self) -> &'static str {
        match self {
            Lifecycle::Created => "Created",
            Lifecycle::Populated => "Populated",
            Lifecycle::Active { .. } => "Active",
            Lifecycle::Draining => "Draining",
            Lifecycle::TornDown => "TornDown",
        }
    }

    /// Check if the framework was asked to run the graph
    pub fn is_active(&self) -> bool {
        matches!(self, Lifecycle::Active { .. } | Lifecycle::Draining)
    }

    pub fn is_torn_down(&self) -> bool {
        matches!(self, Lifecycle::TornDown)
    }
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}
