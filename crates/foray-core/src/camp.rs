//! In-memory world services — a reference base camp backing the
//! collaborator traits for harnesses and tests.
//!
//! Members live as entities in a `hecs` world; packs and base storage are
//! plain ledgers; locations and items are serde-loadable tables. Real
//! games supply their own implementations of the [`crate::collab`] traits;
//! this module is the batteries-included one the sim harness runs on.

use std::collections::BTreeMap;

use hecs::{Entity, World};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::collab::{
    Collaborators, InventoryHandle, InventoryService, ItemCategory, ItemDirectory,
    LocationDirectory, LocationRecord, MemberProfile, RosterProvider, TaskBoard, TeamIndex,
};

/// Handle of the shared base storage.
pub const BASE_STORAGE: InventoryHandle = InventoryHandle(0);

/// Gathering-relevant stats carried by a member entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemberStats {
    pub gathering: f32,
    pub carry_capacity: f32,
    /// Movement speed in distance units per second.
    pub speed: f32,
}

impl Default for MemberStats {
    fn default() -> Self {
        Self {
            gathering: 10.0,
            carry_capacity: 50.0,
            speed: 30.0,
        }
    }
}

impl MemberStats {
    /// Roll a random member, mildly specialized one way or the other.
    pub fn random(rng: &mut impl Rng) -> Self {
        Self {
            gathering: rng.gen_range(5.0..30.0),
            carry_capacity: rng.gen_range(30.0..80.0),
            speed: rng.gen_range(20.0..40.0),
        }
    }
}

/// Stable member identifier, also the member's inventory handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct MemberId(u64);

/// Whole-unit item ledger. One unit weighs one capacity point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pack {
    contents: BTreeMap<String, u32>,
}

impl Pack {
    pub fn total(&self) -> u32 {
        self.contents.values().sum()
    }

    pub fn count(&self, item_id: &str) -> u32 {
        self.contents.get(item_id).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn add(&mut self, item_id: &str, quantity: u32) {
        if quantity == 0 {
            return;
        }
        *self.contents.entry(item_id.to_string()).or_default() += quantity;
    }

    /// Remove up to `quantity` units, returning the amount removed.
    pub fn remove(&mut self, item_id: &str, quantity: u32) -> u32 {
        match self.contents.get_mut(item_id) {
            Some(held) => {
                let taken = quantity.min(*held);
                *held -= taken;
                if *held == 0 {
                    self.contents.remove(item_id);
                }
                taken
            }
            None => 0,
        }
    }

    pub fn items(&self) -> impl Iterator<Item = (&str, u32)> {
        self.contents.iter().map(|(id, qty)| (id.as_str(), *qty))
    }
}

// === Roster ===

/// Team rosters over a `hecs` world of member entities.
pub struct CampRoster {
    world: World,
    teams: Vec<Vec<Entity>>,
    members: BTreeMap<u64, Entity>,
    next_member: u64,
}

impl Default for CampRoster {
    fn default() -> Self {
        Self::new()
    }
}

impl CampRoster {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            teams: Vec::new(),
            members: BTreeMap::new(),
            next_member: 0,
        }
    }

    pub fn create_team(&mut self) -> TeamIndex {
        self.teams.push(Vec::new());
        (self.teams.len() - 1) as TeamIndex
    }

    /// Spawn a member entity into a team; `None` for unknown teams.
    pub fn add_member(&mut self, team: TeamIndex, stats: MemberStats) -> Option<u64> {
        let roster = self.teams.get_mut(team as usize)?;
        self.next_member += 1;
        let id = self.next_member;
        let entity = self.world.spawn((MemberId(id), stats));
        roster.push(entity);
        self.members.insert(id, entity);
        Some(id)
    }

    /// Overwrite a member's stats (equipment change, status effect); the
    /// engine picks the new values up on its next tick.
    pub fn set_stats(&mut self, member_id: u64, stats: MemberStats) -> bool {
        let Some(&entity) = self.members.get(&member_id) else {
            return false;
        };
        match self.world.get::<&mut MemberStats>(entity) {
            Ok(mut current) => {
                *current = stats;
                true
            }
            Err(_) => false,
        }
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }
}

impl RosterProvider for CampRoster {
    fn team_exists(&self, team: TeamIndex) -> bool {
        (team as usize) < self.teams.len()
    }

    fn members(&self, team: TeamIndex) -> Vec<MemberProfile> {
        let Some(roster) = self.teams.get(team as usize) else {
            return Vec::new();
        };
        roster
            .iter()
            .filter_map(|&entity| {
                let id = self.world.get::<&MemberId>(entity).ok()?.0;
                let stats = *self.world.get::<&MemberStats>(entity).ok()?;
                Some(MemberProfile {
                    member_id: id,
                    gathering: stats.gathering,
                    carry: stats.carry_capacity,
                    speed: stats.speed,
                    inventory: InventoryHandle(id),
                })
            })
            .collect()
    }
}

// === Inventories ===

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MemberStore {
    capacity: u32,
    pack: Pack,
}

/// Member packs plus the unbounded base storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampStores {
    packs: BTreeMap<u64, MemberStore>,
    base: Pack,
}

impl CampStores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a member's pack with its capacity in whole units.
    pub fn register(&mut self, member_id: u64, capacity: u32) {
        self.packs.insert(
            member_id,
            MemberStore {
                capacity,
                pack: Pack::default(),
            },
        );
    }

    pub fn base(&self) -> &Pack {
        &self.base
    }

    pub fn pack(&self, member_id: u64) -> Option<&Pack> {
        self.packs.get(&member_id).map(|store| &store.pack)
    }
}

impl InventoryService for CampStores {
    fn free_capacity(&self, handle: InventoryHandle) -> u32 {
        if handle == BASE_STORAGE {
            return u32::MAX;
        }
        self.packs
            .get(&handle.0)
            .map(|store| store.capacity.saturating_sub(store.pack.total()))
            .unwrap_or(0)
    }

    fn deposit(&mut self, handle: InventoryHandle, item_id: &str, quantity: u32) -> u32 {
        if handle == BASE_STORAGE {
            self.base.add(item_id, quantity);
            return quantity;
        }
        let Some(store) = self.packs.get_mut(&handle.0) else {
            return 0;
        };
        let committed = quantity.min(store.capacity.saturating_sub(store.pack.total()));
        store.pack.add(item_id, committed);
        committed
    }

    fn carried(&self, handle: InventoryHandle) -> Vec<(String, u32)> {
        let pack = if handle == BASE_STORAGE {
            &self.base
        } else {
            match self.packs.get(&handle.0) {
                Some(store) => &store.pack,
                None => return Vec::new(),
            }
        };
        pack.items().map(|(id, qty)| (id.to_string(), qty)).collect()
    }

    fn withdraw(&mut self, handle: InventoryHandle, item_id: &str, quantity: u32) -> u32 {
        if handle == BASE_STORAGE {
            return self.base.remove(item_id, quantity);
        }
        match self.packs.get_mut(&handle.0) {
            Some(store) => store.pack.remove(item_id, quantity),
            None => 0,
        }
    }

    fn base_storage(&self) -> InventoryHandle {
        BASE_STORAGE
    }
}

// === Directory ===

/// Location and item tables, loadable from a JSON manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampDirectory {
    locations: BTreeMap<String, LocationRecord>,
    items: BTreeMap<String, ItemCategory>,
}

impl CampDirectory {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn insert_location(&mut self, location_id: &str, record: LocationRecord) {
        self.locations.insert(location_id.to_string(), record);
    }

    pub fn insert_item(&mut self, item_id: &str, category: ItemCategory) {
        self.items.insert(item_id.to_string(), category);
    }

    pub fn location_ids(&self) -> impl Iterator<Item = &str> {
        self.locations.keys().map(String::as_str)
    }
}

impl LocationDirectory for CampDirectory {
    fn location(&self, location_id: &str) -> Option<LocationRecord> {
        self.locations.get(location_id).cloned()
    }
}

impl ItemDirectory for CampDirectory {
    fn category(&self, item_id: &str) -> ItemCategory {
        self.items
            .get(item_id)
            .copied()
            .unwrap_or(ItemCategory::Unknown)
    }
}

// === Task board ===

/// How an objective's quantity is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveKind {
    /// Gather exactly N; satisfied once N units are delivered.
    Specified,
    /// Keep gathering until stopped or cancelled; the target is ignored.
    Unlimited,
}

/// One "gather N of item X" goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Objective {
    pub item_id: String,
    pub kind: ObjectiveKind,
    pub target: u32,
    pub delivered: u32,
    pub cancelled: bool,
}

impl Objective {
    pub fn satisfied(&self) -> bool {
        self.cancelled
            || (self.kind == ObjectiveKind::Specified && self.delivered >= self.target)
    }

    /// Units still needed; clamps at zero, and Unlimited goals never
    /// report a deficit of their own.
    pub fn remaining(&self) -> u32 {
        match self.kind {
            ObjectiveKind::Specified if !self.cancelled => {
                self.target.saturating_sub(self.delivered)
            }
            _ => 0,
        }
    }
}

/// Objective counters, each independent; deliveries fill them in insertion
/// order and clamp at their targets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampTaskBoard {
    objectives: Vec<Objective>,
}

impl CampTaskBoard {
    pub fn add(&mut self, item_id: &str, kind: ObjectiveKind, target: u32) {
        self.objectives.push(Objective {
            item_id: item_id.to_string(),
            kind,
            target,
            delivered: 0,
            cancelled: false,
        });
    }

    /// Cancel every objective for an item.
    pub fn cancel(&mut self, item_id: &str) {
        for objective in self.objectives.iter_mut().filter(|o| o.item_id == item_id) {
            objective.cancelled = true;
        }
    }

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    /// Total units still needed for an item across all its objectives.
    pub fn remaining(&self, item_id: &str) -> u32 {
        self.objectives
            .iter()
            .filter(|o| o.item_id == item_id)
            .map(Objective::remaining)
            .sum()
    }
}

impl TaskBoard for CampTaskBoard {
    fn report_progress(&mut self, item_id: &str, quantity: u32) {
        let mut left = quantity;
        for objective in self.objectives.iter_mut().filter(|o| o.item_id == item_id) {
            match objective.kind {
                ObjectiveKind::Specified => {
                    if objective.satisfied() {
                        continue;
                    }
                    let take = left.min(objective.target.saturating_sub(objective.delivered));
                    objective.delivered += take;
                    left -= take;
                }
                ObjectiveKind::Unlimited => {
                    // Unlimited goals only keep score; they never consume
                    // the delivery and never complete.
                    objective.delivered = objective.delivered.saturating_add(quantity);
                }
            }
        }
    }

    fn is_satisfied(&self, item_id: &str) -> bool {
        let mut any = false;
        for objective in self.objectives.iter().filter(|o| o.item_id == item_id) {
            any = true;
            if !objective.satisfied() {
                return false;
            }
        }
        any
    }

    fn outstanding(&self, item_id: &str) -> bool {
        self.objectives
            .iter()
            .any(|o| o.item_id == item_id && !o.satisfied())
    }
}

// === The camp ===

/// Roster and stores under one roof, with a helper to assemble the
/// engine's collaborator bundle.
#[derive(Default)]
pub struct BaseCamp {
    pub roster: CampRoster,
    pub stores: CampStores,
}

impl BaseCamp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_team(&mut self) -> TeamIndex {
        self.roster.create_team()
    }

    /// Add a member and register a pack sized to its carry stat.
    pub fn add_member(&mut self, team: TeamIndex, stats: MemberStats) -> Option<u64> {
        let id = self.roster.add_member(team, stats)?;
        self.stores.register(id, stats.carry_capacity.max(0.0) as u32);
        Some(id)
    }

    pub fn add_random_member(&mut self, team: TeamIndex, rng: &mut impl Rng) -> Option<u64> {
        self.add_member(team, MemberStats::random(rng))
    }

    /// Put items straight into a member's pack (clamped to capacity).
    pub fn give_member(&mut self, member_id: u64, item_id: &str, quantity: u32) -> u32 {
        self.stores
            .deposit(InventoryHandle(member_id), item_id, quantity)
    }

    pub fn member_count(&self, member_id: u64, item_id: &str) -> u32 {
        self.stores
            .pack(member_id)
            .map(|pack| pack.count(item_id))
            .unwrap_or(0)
    }

    pub fn base_count(&self, item_id: &str) -> u32 {
        self.stores.base().count(item_id)
    }

    /// Assemble the borrow bundle for one engine call.
    pub fn collaborators<'a>(
        &'a mut self,
        directory: &'a CampDirectory,
        tasks: &'a mut CampTaskBoard,
    ) -> Collaborators<'a> {
        Collaborators {
            locations: directory,
            items: directory,
            roster: &self.roster,
            inventory: &mut self.stores,
            tasks,
        }
    }
}
