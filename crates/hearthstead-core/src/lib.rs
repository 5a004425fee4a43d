//! Hearthstead Core - Idle RPG Progression Engine
//!
//! Simulates a roster of hero characters that advance skills and recipes
//! by repeatedly performing timed actions, even while the player is away.
//! Characters live in an ECS world via `hecs`:
//! - **Entities**: one per recruited character
//! - **Components**: pure data (Identity, Stamina, Loadout, SkillBook, ActionState)
//! - **Systems**: the progression step and the offline catch-up replayer
//!
//! The engine is wall-clock driven but owns no timer. Hosts call
//! [`engine::Engine::tick`] with the current time; elapsed gaps larger than
//! the live loop are detected and replayed in bounded coarse steps.
//!
//! # Example
//!
//! ```rust,no_run
//! use hearthstead_core::prelude::*;
//! use hearthstead_core::definitions::DefinitionSet;
//! use hearthstead_core::scheduler::SystemClock;
//!
//! # fn run(definitions_json: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let defs = DefinitionSet::from_json(definitions_json)?;
//! let mut engine = Engine::new(defs, EngineConfig::default());
//! let clock = SystemClock;
//!
//! let hero = engine.add_character("Rowan")?;
//! engine.select_recipe(hero, "forestry", Some("pine"))?;
//! engine.select_action(hero, Some("forestry"))?;
//!
//! loop {
//!     engine.pump(&clock);
//! }
//! # }
//! ```

pub mod components;
pub mod definitions;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod persistence;
pub mod scheduler;
pub mod snapshot;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::{Engine, EngineConfig};
    pub use crate::error::CommandError;
}
