//! The surface the engine needs from its host simulation.
//!
//! The engine never owns entities. It asks the host to spawn, tag, query
//! and poke them through [`SiegeWorld`], and reads connected players through
//! [`PlayerRoster`]. Implement both for the real game; the
//! [`crate::sandbox`] module has in-memory versions for tests and tooling.

use crate::components::{Area, EntityId, Health, PlayerState};
use crate::error::Result;
use crate::math::{Fixed, Vec2Fixed};

/// World-mutation and query primitives provided by the host.
///
/// Every fallible call may fail transiently (unloaded region, saturated
/// entity budget). Callers inside the engine treat those failures as noise.
pub trait SiegeWorld {
    /// Spawn one unit of `entity_type` at `position`.
    fn spawn_unit(&mut self, entity_type: &str, position: Vec2Fixed) -> Result<EntityId>;

    /// Attach `tag` to an entity.
    fn add_tag(&mut self, entity: EntityId, tag: &str) -> Result<()>;

    /// List entities carrying `tag`, optionally restricted to `area`.
    fn query_tagged(&self, tag: &str, area: Option<Area>) -> Result<Vec<EntityId>>;

    /// Whether the handle still refers to a live, loaded entity.
    fn is_valid(&self, entity: EntityId) -> bool;

    /// Read an entity's health component, if it has one.
    fn health(&self, entity: EntityId) -> Option<Health>;

    /// Fire a named event on an entity.
    fn trigger_event(&mut self, entity: EntityId, event: &str) -> Result<()>;
}

/// Read access to the connected players.
pub trait PlayerRoster {
    /// Every currently connected player, valid or not.
    fn players(&self) -> Vec<PlayerState>;

    /// Players whose handles are usable right now.
    fn valid_players(&self) -> Vec<PlayerState> {
        self.players().into_iter().filter(|p| p.valid).collect()
    }
}

/// Difficulty collaborator: returns the current enemy count multiplier.
pub type EnemyMultiplierFn = Box<dyn Fn() -> Fixed>;

/// Default difficulty: no scaling.
#[must_use]
pub fn default_enemy_multiplier() -> EnemyMultiplierFn {
    Box::new(|| Fixed::ONE)
}
