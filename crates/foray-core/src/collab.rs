//! Collaborator seams — the world services the engine consults each tick.
//!
//! The engine holds no references of its own; callers assemble a
//! [`Collaborators`] bundle of borrows for each call. Rosters are read
//! live every tick (stat changes take effect on the next tick, never
//! cached), inventories and task boards are written through exclusively.

use serde::{Deserialize, Serialize};

/// Integer index addressing one team.
pub type TeamIndex = u32;

/// Opaque handle to one inventory (a member's pack or the base storage).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct InventoryHandle(pub u64);

/// One gatherable item at a location, with its yield coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatherableItem {
    pub item_id: String,
    /// Multiplier on team gathering power for this item.
    pub coefficient: f32,
}

/// Location record served by the directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub name: String,
    pub gatherable_items: Vec<GatherableItem>,
    /// Travel distance from the base camp.
    pub distance: f32,
    /// Whether teams can walk there at all.
    pub walkable: bool,
}

impl LocationRecord {
    pub fn has_gatherable_items(&self) -> bool {
        !self.gatherable_items.is_empty()
    }
}

/// Item classification; only `Resource` items are auto-unloaded at base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemCategory {
    Resource,
    Equipment,
    Quest,
    Unknown,
}

/// Per-member snapshot taken fresh from the roster each tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub member_id: u64,
    /// Gathering stat: contribution to team gathering power.
    pub gathering: f32,
    /// Carrying-capacity stat: used for carrier classification.
    pub carry: f32,
    /// Effective movement speed (distance units per second).
    pub speed: f32,
    pub inventory: InventoryHandle,
}

/// Read-only lookup of location records. Unknown ids return `None`, which
/// the engine treats as "cannot start gathering here."
pub trait LocationDirectory {
    fn location(&self, location_id: &str) -> Option<LocationRecord>;
}

/// Read-only item classification.
pub trait ItemDirectory {
    fn category(&self, item_id: &str) -> ItemCategory;
}

/// Live view of team rosters.
pub trait RosterProvider {
    fn team_exists(&self, team: TeamIndex) -> bool;

    /// Ordered member snapshots for a team; empty for unknown teams.
    fn members(&self, team: TeamIndex) -> Vec<MemberProfile>;
}

/// Capacity queries and item movement for member packs and base storage.
pub trait InventoryService {
    /// Free units of carrying capacity for this inventory.
    fn free_capacity(&self, handle: InventoryHandle) -> u32;

    /// Store up to `quantity` units; returns the amount actually committed.
    fn deposit(&mut self, handle: InventoryHandle, item_id: &str, quantity: u32) -> u32;

    /// Current contents as (item, quantity) pairs.
    fn carried(&self, handle: InventoryHandle) -> Vec<(String, u32)>;

    /// Remove up to `quantity` units; returns the amount actually removed.
    fn withdraw(&mut self, handle: InventoryHandle, item_id: &str, quantity: u32) -> u32;

    /// Handle of the shared base storage.
    fn base_storage(&self) -> InventoryHandle;
}

/// Outstanding "gather N of item X" objectives.
///
/// Objectives for the same item are independent counters; the engine only
/// stops teams for an item once *no* unsatisfied objective for it remains.
pub trait TaskBoard {
    /// Record `quantity` units delivered toward objectives for `item_id`.
    /// Remaining quantities clamp at zero, never go negative.
    fn report_progress(&mut self, item_id: &str, quantity: u32);

    /// True when at least one objective exists for the item and every one
    /// of them is satisfied or cancelled.
    fn is_satisfied(&self, item_id: &str) -> bool;

    /// True while any unsatisfied objective for the item remains.
    fn outstanding(&self, item_id: &str) -> bool;
}

/// Borrowed bundle of world services handed to each engine call.
pub struct Collaborators<'a> {
    pub locations: &'a dyn LocationDirectory,
    pub items: &'a dyn ItemDirectory,
    pub roster: &'a dyn RosterProvider,
    pub inventory: &'a mut dyn InventoryService,
    pub tasks: &'a mut dyn TaskBoard,
}
