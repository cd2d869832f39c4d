//! Gathering engine — per-team expedition state machines advanced one tick
//! at a time.
//!
//! One owned [`TeamState`] record exists per active team in an explicit
//! registry; a team with no entry is Inactive. The single advancement call
//! [`GatheringEngine::update`] dispatches every active team to its
//! movement, gathering, or unloading handler in ascending team-index
//! order, so ties for a shrinking objective or for base storage always
//! resolve the same way. Notifications are queued and drained by the
//! scheduler after the tick, never delivered mid-transition.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use foray_logic::config::GatheringConfig;
use foray_logic::distribution::{self, MemberCapacity};
use foray_logic::movement;
use foray_logic::throughput::{self, YieldAccumulator};

use crate::collab::{Collaborators, GatherableItem, ItemCategory, TeamIndex};
use crate::events::{GatherReport, GatheringEvent};

/// Where a team currently is in its expedition cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GatherPhase {
    Inactive,
    MovingToSite,
    Gathering,
    MovingToBase,
    Unloading,
}

/// Owned state for one active team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamState {
    pub phase: GatherPhase,
    /// Travel progress in [0, 1]; meaningful only while moving.
    pub progress: f32,
    /// Destination (and gathering site) for the current expedition.
    pub location_id: String,
    /// When set, gathering is constrained to this single item.
    pub target_item: Option<String>,
    /// Fractional yields banked between ticks.
    yields: YieldAccumulator,
}

/// The per-team gathering state machine and its tick dispatcher.
pub struct GatheringEngine {
    config: GatheringConfig,
    teams: BTreeMap<TeamIndex, TeamState>,
    events: VecDeque<GatheringEvent>,
    in_tick: Arc<AtomicBool>,
}

/// Clears the in-tick flag when the tick scope ends, even on early return.
struct TickGuard(Arc<AtomicBool>);

impl Drop for TickGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl GatheringEngine {
    pub fn new() -> Self {
        Self::with_config(GatheringConfig::default())
    }

    pub fn with_config(config: GatheringConfig) -> Self {
        Self {
            config,
            teams: BTreeMap::new(),
            events: VecDeque::new(),
            in_tick: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &GatheringConfig {
        &self.config
    }

    // === Expedition control ===

    /// Send a team out to gather everything a location offers.
    ///
    /// Fails (false + log, state untouched) for unknown teams, empty
    /// rosters, and locations that are unknown, unwalkable, or bare.
    /// Starting while already en route aborts the previous motion.
    pub fn start_gathering(
        &mut self,
        collab: &mut Collaborators<'_>,
        team: TeamIndex,
        location_id: &str,
    ) -> bool {
        self.start_with_target(collab, team, location_id, None)
    }

    /// Send a team out for a single item, as when a task objective is
    /// being completed. The item must be gatherable at the location.
    pub fn start_gathering_for_item(
        &mut self,
        collab: &mut Collaborators<'_>,
        team: TeamIndex,
        location_id: &str,
        item_id: &str,
    ) -> bool {
        self.start_with_target(collab, team, location_id, Some(item_id.to_string()))
    }

    fn start_with_target(
        &mut self,
        collab: &mut Collaborators<'_>,
        team: TeamIndex,
        location_id: &str,
        target_item: Option<String>,
    ) -> bool {
        if !collab.roster.team_exists(team) {
            log::warn!("start_gathering: unknown team {team}");
            return false;
        }
        if collab.roster.members(team).is_empty() {
            log::warn!("start_gathering: team {team} has no members");
            return false;
        }
        let record = match collab.locations.location(location_id) {
            Some(record) => record,
            None => {
                log::warn!("start_gathering: unknown location '{location_id}'");
                return false;
            }
        };
        if !record.walkable {
            log::warn!("start_gathering: '{location_id}' is not walkable");
            return false;
        }
        if !record.has_gatherable_items() {
            log::warn!("start_gathering: nothing to gather at '{location_id}'");
            return false;
        }
        if let Some(item) = &target_item {
            if !record.gatherable_items.iter().any(|g| g.item_id == *item) {
                log::warn!("start_gathering: '{location_id}' does not yield {item}");
                return false;
            }
        }

        // A location at the camp's doorstep needs no travel leg.
        let phase = if record.distance <= 0.0 {
            GatherPhase::Gathering
        } else {
            GatherPhase::MovingToSite
        };
        self.teams.insert(
            team,
            TeamState {
                phase,
                progress: 0.0,
                location_id: location_id.to_string(),
                target_item,
                yields: YieldAccumulator::new(),
            },
        );
        self.events
            .push_back(GatheringEvent::PhaseChanged { team, phase });
        log::info!("team {team} set out for '{location_id}'");
        true
    }

    /// Stop a team and clear its state immediately. Returns false (and
    /// emits nothing) if the team was already inactive.
    pub fn stop_gathering(&mut self, team: TeamIndex) -> bool {
        if self.teams.remove(&team).is_none() {
            return false;
        }
        self.events.push_back(GatheringEvent::PhaseChanged {
            team,
            phase: GatherPhase::Inactive,
        });
        log::info!("team {team} stopped gathering");
        true
    }

    /// Current phase; Inactive for teams without state.
    pub fn state(&self, team: TeamIndex) -> GatherPhase {
        self.teams
            .get(&team)
            .map(|s| s.phase)
            .unwrap_or(GatherPhase::Inactive)
    }

    /// Travel progress in [0, 1]; 0 for teams without state.
    pub fn movement_progress(&self, team: TeamIndex) -> f32 {
        self.teams.get(&team).map(|s| s.progress).unwrap_or(0.0)
    }

    /// Indices of all non-inactive teams, ascending.
    pub fn active_teams(&self) -> impl Iterator<Item = TeamIndex> + '_ {
        self.teams.keys().copied()
    }

    /// Take all notifications queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<GatheringEvent> {
        self.events.drain(..).collect()
    }

    // === Tick advancement ===

    /// Advance every active team by one tick.
    ///
    /// Reentrant calls are a silent no-op: the in-tick flag is checked and
    /// set at entry and cleared by a drop guard on exit, so an overlapping
    /// call from a nested callback cannot corrupt the registry
    /// mid-iteration.
    pub fn update(&mut self, collab: &mut Collaborators<'_>) {
        if self.in_tick.swap(true, Ordering::AcqRel) {
            log::warn!("update re-entered while a tick is in progress; ignoring");
            return;
        }
        let _guard = TickGuard(Arc::clone(&self.in_tick));

        let active: Vec<TeamIndex> = self.teams.keys().copied().collect();
        log::debug!("tick: {} active team(s)", active.len());
        for team in active {
            // A team stopped earlier in this same tick no longer exists.
            let phase = match self.teams.get(&team) {
                Some(state) => state.phase,
                None => continue,
            };
            match phase {
                GatherPhase::MovingToSite | GatherPhase::MovingToBase => {
                    self.process_movement(collab, team)
                }
                GatherPhase::Gathering => self.process_gathering(collab, team),
                GatherPhase::Unloading => self.process_unloading(collab, team),
                GatherPhase::Inactive => {}
            }
        }
    }

    // === Movement ===

    fn process_movement(&mut self, collab: &mut Collaborators<'_>, team: TeamIndex) {
        let (phase, progress, location_id) = match self.teams.get(&team) {
            Some(state) => (state.phase, state.progress, state.location_id.clone()),
            None => return,
        };
        let record = match collab.locations.location(&location_id) {
            Some(record) => record,
            None => {
                log::warn!("team {team} is bound for unknown location '{location_id}'; skipping");
                return;
            }
        };

        let speeds: Vec<f32> = collab
            .roster
            .members(team)
            .iter()
            .map(|m| m.speed)
            .collect();
        let pace = movement::team_speed(&speeds);
        if pace <= 0.0 && record.distance > 0.0 {
            log::warn!("team {team} has no pace and is stuck en route to '{location_id}'");
        }

        let next = movement::advance_progress(
            progress,
            pace,
            self.config.tick_interval_secs,
            record.distance,
        );
        if let Some(state) = self.teams.get_mut(&team) {
            state.progress = next;
        }
        self.events.push_back(GatheringEvent::MovementProgress {
            team,
            progress: next,
        });

        // Arrival fires in the same tick the boundary is reached.
        if next >= 1.0 {
            match phase {
                GatherPhase::MovingToSite => {
                    if let Some(state) = self.teams.get_mut(&team) {
                        state.yields.clear();
                    }
                    log::info!("team {team} arrived at '{location_id}'");
                    self.set_phase(team, GatherPhase::Gathering);
                }
                GatherPhase::MovingToBase => {
                    log::info!("team {team} returned to base");
                    self.set_phase(team, GatherPhase::Unloading);
                }
                _ => {}
            }
        }
    }

    // === Gathering ===

    fn process_gathering(&mut self, collab: &mut Collaborators<'_>, team: TeamIndex) {
        let (location_id, target_item) = match self.teams.get(&team) {
            Some(state) => (state.location_id.clone(), state.target_item.clone()),
            None => return,
        };
        let record = match collab.locations.location(&location_id) {
            Some(record) => record,
            None => {
                log::warn!("team {team} is gathering at unknown location '{location_id}'; skipping");
                return;
            }
        };

        // An objective settled elsewhere (another team delivered, or it was
        // cancelled) ends the trip for everyone working that item.
        if let Some(item) = &target_item {
            if collab.tasks.is_satisfied(item) {
                log::info!("objective for {item} is settled; recalling team {team}");
                self.begin_return(team);
                self.interrupt_gatherers_of(collab, item);
                return;
            }
        }

        let eligible: Vec<GatherableItem> = match &target_item {
            Some(item) => record
                .gatherable_items
                .iter()
                .filter(|g| g.item_id == *item)
                .cloned()
                .collect(),
            None => record.gatherable_items.clone(),
        };
        if eligible.is_empty() {
            log::warn!("nothing left to gather at '{location_id}'; team {team} heading home");
            self.begin_return(team);
            return;
        }

        // Power is derived from live stats every tick, never cached.
        let stats: Vec<f32> = collab
            .roster
            .members(team)
            .iter()
            .map(|m| m.gathering)
            .collect();
        let power = throughput::team_gathering_power(&stats);

        for gatherable in eligible {
            let amount = throughput::tick_yield(
                power,
                gatherable.coefficient,
                self.config.tick_interval_secs,
                self.config.efficiency_multiplier,
            );
            let whole = match self.teams.get_mut(&team) {
                Some(state) => state.yields.accrue(&gatherable.item_id, amount),
                None => return,
            };
            if whole == 0 {
                continue;
            }

            let (assigned, overflow) =
                self.commit_distribution(collab, team, &gatherable.item_id, whole);
            if assigned > 0 {
                self.events.push_back(GatheringEvent::ItemGathered {
                    team,
                    report: GatherReport {
                        item_id: gatherable.item_id.clone(),
                        quantity: assigned,
                    },
                });
            }
            if overflow > 0 {
                log::info!("team {team} packs are full; returning to base");
                self.events.push_back(GatheringEvent::InventoryFull { team });
                self.begin_return(team);
                break;
            }
        }
    }

    /// Point the team back at base; the return leg starts from zero.
    fn begin_return(&mut self, team: TeamIndex) {
        if let Some(state) = self.teams.get_mut(&team) {
            state.progress = 0.0;
        }
        self.set_phase(team, GatherPhase::MovingToBase);
    }

    /// Recall every team still gathering `item_id` (targeted on it, or
    /// untargeted at a location that lists it). Recalled teams carry their
    /// cargo home rather than going Inactive.
    fn interrupt_gatherers_of(&mut self, collab: &Collaborators<'_>, item_id: &str) {
        let affected: Vec<TeamIndex> = self
            .teams
            .iter()
            .filter(|(_, state)| state.phase == GatherPhase::Gathering)
            .filter(|(_, state)| match &state.target_item {
                Some(target) => target == item_id,
                None => collab
                    .locations
                    .location(&state.location_id)
                    .map(|r| r.gatherable_items.iter().any(|g| g.item_id == item_id))
                    .unwrap_or(false),
            })
            .map(|(team, _)| *team)
            .collect();
        for team in affected {
            log::info!("objective for {item_id} settled; recalling team {team}");
            self.begin_return(team);
        }
    }

    // === Item distribution ===

    /// Allocate `quantity` units of one item across team members, carriers
    /// first, then roster order. On overflow the assignable portion is
    /// still committed, the excess is dropped with an inventory-full
    /// notification, and the call returns false.
    pub fn distribute_item_to_team(
        &mut self,
        collab: &mut Collaborators<'_>,
        team: TeamIndex,
        item_id: &str,
        quantity: u32,
    ) -> bool {
        if !collab.roster.team_exists(team) {
            log::warn!("distribute: unknown team {team}");
            return false;
        }
        if quantity == 0 {
            return true;
        }
        let (_, overflow) = self.commit_distribution(collab, team, item_id, quantity);
        if overflow > 0 {
            log::warn!("team {team} dropped {overflow} {item_id}: packs full");
            self.events.push_back(GatheringEvent::InventoryFull { team });
            return false;
        }
        true
    }

    /// Plan and commit an allocation; returns (assigned, overflow).
    fn commit_distribution(
        &mut self,
        collab: &mut Collaborators<'_>,
        team: TeamIndex,
        item_id: &str,
        quantity: u32,
    ) -> (u32, u32) {
        let profiles = collab.roster.members(team);
        let capacities: Vec<MemberCapacity> = profiles
            .iter()
            .map(|m| MemberCapacity {
                free: collab.inventory.free_capacity(m.inventory),
                carrier: distribution::is_carrier(m.gathering, m.carry, &self.config.carrier),
            })
            .collect();
        let plan = distribution::plan_distribution(&capacities, quantity);

        let mut assigned = 0u32;
        for (profile, share) in profiles.iter().zip(&plan.assignments) {
            if *share == 0 {
                continue;
            }
            assigned += collab.inventory.deposit(profile.inventory, item_id, *share);
        }
        // The service may commit less than planned; the shortfall is
        // overflow like any other.
        (assigned, quantity - assigned)
    }

    /// Sum of free carrying capacity across a team; 0 for empty or fully
    /// loaded teams.
    pub fn team_available_capacity(&self, collab: &Collaborators<'_>, team: TeamIndex) -> u32 {
        collab
            .roster
            .members(team)
            .iter()
            .map(|m| collab.inventory.free_capacity(m.inventory))
            .sum()
    }

    // === Auto-unload ===

    fn process_unloading(&mut self, collab: &mut Collaborators<'_>, team: TeamIndex) {
        let (location_id, target_item) = match self.teams.get(&team) {
            Some(state) => (state.location_id.clone(), state.target_item.clone()),
            None => return,
        };

        let profiles = collab.roster.members(team);
        let base = collab.inventory.base_storage();
        let mut deposited: BTreeMap<String, u32> = BTreeMap::new();

        // Every Resource-category item moves to base storage; equipment
        // and quest items stay with their owners.
        for profile in &profiles {
            for (item_id, quantity) in collab.inventory.carried(profile.inventory) {
                if collab.items.category(&item_id) != ItemCategory::Resource {
                    continue;
                }
                let taken = collab.inventory.withdraw(profile.inventory, &item_id, quantity);
                if taken == 0 {
                    continue;
                }
                let stored = collab.inventory.deposit(base, &item_id, taken);
                if stored < taken {
                    log::warn!("base storage refused {} {item_id}", taken - stored);
                }
                *deposited.entry(item_id).or_default() += stored;
            }
        }

        for (item_id, quantity) in &deposited {
            log::info!("team {team} unloaded {quantity} {item_id} into base storage");
            collab.tasks.report_progress(item_id, *quantity);
        }

        // Deliveries that settled an objective recall everyone else still
        // working that item.
        let settled: Vec<String> = deposited
            .keys()
            .filter(|item| collab.tasks.is_satisfied(item))
            .cloned()
            .collect();
        for item_id in &settled {
            self.interrupt_gatherers_of(collab, item_id);
        }

        // Head out again while anything at this site is still wanted.
        let keep_going = match &target_item {
            Some(item) => collab.tasks.outstanding(item),
            None => collab
                .locations
                .location(&location_id)
                .map(|record| {
                    record
                        .gatherable_items
                        .iter()
                        .any(|g| collab.tasks.outstanding(&g.item_id))
                })
                .unwrap_or(false),
        };

        if keep_going {
            let distance = collab
                .locations
                .location(&location_id)
                .map(|record| record.distance)
                .unwrap_or(0.0);
            if let Some(state) = self.teams.get_mut(&team) {
                state.progress = 0.0;
                state.yields.clear();
            }
            log::info!("team {team} heading back out to '{location_id}'");
            if distance <= 0.0 {
                self.set_phase(team, GatherPhase::Gathering);
            } else {
                self.set_phase(team, GatherPhase::MovingToSite);
            }
        } else {
            self.stop_gathering(team);
        }
        self.events
            .push_back(GatheringEvent::UnloadCompleted { team });
    }

    // === Internal helpers ===

    fn set_phase(&mut self, team: TeamIndex, phase: GatherPhase) {
        let changed = match self.teams.get_mut(&team) {
            Some(state) if state.phase != phase => {
                state.phase = phase;
                true
            }
            _ => false,
        };
        if changed {
            self.events
                .push_back(GatheringEvent::PhaseChanged { team, phase });
        }
    }
}

impl Default for GatheringEngine {
    fn default() -> Self {
        Self::new()
    }
}
