//! Foray Core - Team Gathering Engine
//!
//! A tick-driven simulation of autonomous gathering teams: each team walks
//! to a resource site, fills its packs, walks home, and unloads into base
//! storage, with task objectives deciding when the loop ends.
//!
//! # Architecture
//!
//! The engine owns nothing but per-team state. Rosters, inventories,
//! location data, and task objectives live behind the traits in [`collab`]
//! and are borrowed for the duration of each call; [`camp`] provides
//! in-memory reference implementations for harnesses and tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use foray_core::prelude::*;
//! use foray_core::camp::{BaseCamp, CampDirectory, CampTaskBoard, MemberStats};
//!
//! let mut engine = GatheringEngine::new();
//! let mut camp = BaseCamp::new();
//! let directory = CampDirectory::default();
//! let mut tasks = CampTaskBoard::default();
//!
//! let team = camp.create_team();
//! camp.add_member(team, MemberStats::default());
//!
//! let mut collab = camp.collaborators(&directory, &mut tasks);
//! engine.start_gathering(&mut collab, team, "plains");
//!
//! loop {
//!     let mut collab = camp.collaborators(&directory, &mut tasks);
//!     engine.update(&mut collab);
//!     for event in engine.drain_events() {
//!         println!("{:?}", event);
//!     }
//! }
//! ```

pub mod camp;
pub mod collab;
pub mod engine;
pub mod events;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::collab::{Collaborators, TeamIndex};
    pub use crate::engine::{GatherPhase, GatheringEngine};
    pub use crate::events::GatheringEvent;
}
