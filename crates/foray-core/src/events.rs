//! Outbound notifications — queued during a tick, drained by the scheduler.
//!
//! Events are the only push channel out of the engine; everything else is
//! pull accessors. They are emitted after the transition they describe,
//! never during it.

use serde::{Deserialize, Serialize};

use crate::collab::TeamIndex;
use crate::engine::GatherPhase;

/// Payload of an [`GatheringEvent::ItemGathered`] notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatherReport {
    pub item_id: String,
    /// Whole units that landed in team packs this tick.
    pub quantity: u32,
}

/// Notifications consumed by scheduler/UI collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GatheringEvent {
    /// A team entered a new phase (including Inactive on stop).
    PhaseChanged { team: TeamIndex, phase: GatherPhase },
    /// Whole units were gathered and distributed into team packs.
    ItemGathered { team: TeamIndex, report: GatherReport },
    /// Travel progress after a movement tick, in [0, 1].
    MovementProgress { team: TeamIndex, progress: f32 },
    /// The team could not stow everything it gathered.
    InventoryFull { team: TeamIndex },
    /// Auto-unload at base finished (whether or not anything was carried).
    UnloadCompleted { team: TeamIndex },
}

impl GatheringEvent {
    /// The team this event concerns.
    pub fn team(&self) -> TeamIndex {
        match self {
            GatheringEvent::PhaseChanged { team, .. }
            | GatheringEvent::ItemGathered { team, .. }
            | GatheringEvent::MovementProgress { team, .. }
            | GatheringEvent::InventoryFull { team }
            | GatheringEvent::UnloadCompleted { team } => *team,
        }
    }
}
