//! In-memory host for tests, benchmarks and the headless runner.
//!
//! [`SandboxWorld`] stores entities in a map keyed by [`EntityId`] and hands
//! out ids sequentially, so two sandboxes fed the same calls end up with
//! identical contents and identical [`SandboxWorld::state_hash`] values.
//! Failure injection lets callers exercise the engine's swallow-and-continue
//! paths.
//!
//! # Example
//!
//! ```
//! use siege_core::host::SiegeWorld;
//! use siege_core::math::Vec2Fixed;
//! use siege_core::sandbox::SandboxWorld;
//!
//! let mut world = SandboxWorld::new();
//! let id = world.spawn_unit("siege_grunt", Vec2Fixed::ZERO).unwrap();
//! world.add_tag(id, "siege_mob").unwrap();
//!
//! let death = world.kill(id).unwrap();
//! assert!(death.has_tag("siege_mob"));
//! assert!(!world.is_valid(id));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::components::{Area, DeathEvent, EntityId, Health, PlayerId, PlayerState};
use crate::error::{Result, SiegeError};
use crate::host::{PlayerRoster, SiegeWorld};
use crate::math::Vec2Fixed;

/// Health given to entity types without an explicit entry.
pub const DEFAULT_UNIT_HEALTH: i32 = 100;

/// An entity stored in the sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxEntity {
    /// Unique identifier for this entity.
    pub id: EntityId,
    /// Host entity type.
    pub entity_type: String,
    /// World position.
    pub position: Vec2Fixed,
    /// Health component.
    pub health: Health,
    /// Tags in the order they were added.
    pub tags: Vec<String>,
}

impl SandboxEntity {
    /// Check if the entity carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// In-memory [`SiegeWorld`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandboxWorld {
    entities: HashMap<EntityId, SandboxEntity>,
    next_id: EntityId,
    unit_health: HashMap<String, i32>,
    triggered: Vec<(EntityId, String)>,
    blocked_area: Option<Area>,
    fail_spawns: bool,
    fail_tags: bool,
    fail_queries: bool,
}

impl SandboxWorld {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Set the max health new units of `entity_type` spawn with.
    pub fn set_unit_health(&mut self, entity_type: impl Into<String>, max: i32) {
        self.unit_health.insert(entity_type.into(), max);
    }

    /// Make every spawn fail until cleared.
    pub fn set_fail_spawns(&mut self, fail: bool) {
        self.fail_spawns = fail;
    }

    /// Make every tag request fail until cleared.
    pub fn set_fail_tags(&mut self, fail: bool) {
        self.fail_tags = fail;
    }

    /// Make every query fail until cleared.
    pub fn set_fail_queries(&mut self, fail: bool) {
        self.fail_queries = fail;
    }

    /// Reject spawns whose position falls inside `area`.
    pub fn set_blocked_area(&mut self, area: Option<Area>) {
        self.blocked_area = area;
    }

    /// Get an entity by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&SandboxEntity> {
        self.entities.get(&id)
    }

    /// Get the number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the world is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Get sorted entity IDs for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Sorted IDs of entities carrying `tag`.
    #[must_use]
    pub fn tagged_ids(&self, tag: &str) -> Vec<EntityId> {
        self.sorted_ids()
            .into_iter()
            .filter(|id| self.entities[id].has_tag(tag))
            .collect()
    }

    /// Count entities of a given type.
    #[must_use]
    pub fn count_of_type(&self, entity_type: &str) -> usize {
        self.entities
            .values()
            .filter(|e| e.entity_type == entity_type)
            .count()
    }

    /// Events fired through [`SiegeWorld::trigger_event`], oldest first.
    #[must_use]
    pub fn triggered_events(&self) -> &[(EntityId, String)] {
        &self.triggered
    }

    /// Remove an entity as a death, returning the event the host would raise.
    pub fn kill(&mut self, id: EntityId) -> Option<DeathEvent> {
        self.entities
            .remove(&id)
            .map(|entity| DeathEvent::new(entity.id, entity.tags))
    }

    /// Kill up to `limit` entities carrying `tag`, lowest IDs first.
    pub fn kill_tagged(&mut self, tag: &str, limit: usize) -> Vec<DeathEvent> {
        self.tagged_ids(tag)
            .into_iter()
            .take(limit)
            .filter_map(|id| self.kill(id))
            .collect()
    }

    /// Remove an entity without raising a death event (distance despawn).
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not exist.
    pub fn despawn(&mut self, id: EntityId) -> Result<()> {
        self.entities
            .remove(&id)
            .map(|_| ())
            .ok_or(SiegeError::EntityNotFound(id))
    }

    /// Overwrite an entity's health.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not exist.
    pub fn set_health(&mut self, id: EntityId, health: Health) -> Result<()> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(SiegeError::EntityNotFound(id))?;
        entity.health = health;
        Ok(())
    }

    /// Apply damage, killing the entity when its health reaches zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not exist.
    pub fn damage(&mut self, id: EntityId, amount: i32) -> Result<Option<DeathEvent>> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(SiegeError::EntityNotFound(id))?;
        entity.health.current = entity.health.current.saturating_sub(amount);
        if entity.health.current <= 0 {
            return Ok(self.kill(id));
        }
        Ok(None)
    }

    /// Compute a deterministic hash of the world contents.
    ///
    /// Entities are visited in ID order so the hash does not depend on map
    /// iteration order.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.next_id.hash(&mut hasher);
        for id in self.sorted_ids() {
            let entity = &self.entities[&id];
            entity.id.hash(&mut hasher);
            entity.entity_type.hash(&mut hasher);
            entity.position.hash(&mut hasher);
            entity.health.current.hash(&mut hasher);
            entity.health.max.hash(&mut hasher);
            entity.tags.hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Serialize the world for snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| SiegeError::Serialization(format!("Failed to serialize world: {e}")))
    }

    /// Deserialize a world snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| SiegeError::Serialization(format!("Failed to deserialize world: {e}")))
    }
}

impl SiegeWorld for SandboxWorld {
    fn spawn_unit(&mut self, entity_type: &str, position: Vec2Fixed) -> Result<EntityId> {
        if self.fail_spawns {
            return Err(SiegeError::SpawnFailed {
                entity_type: entity_type.to_string(),
                reason: "spawning disabled".to_string(),
            });
        }
        if self.blocked_area.is_some_and(|area| area.contains(position)) {
            return Err(SiegeError::SpawnFailed {
                entity_type: entity_type.to_string(),
                reason: "region unreachable".to_string(),
            });
        }

        let id = self.next_id;
        self.next_id += 1;
        let max = self
            .unit_health
            .get(entity_type)
            .copied()
            .unwrap_or(DEFAULT_UNIT_HEALTH);
        self.entities.insert(
            id,
            SandboxEntity {
                id,
                entity_type: entity_type.to_string(),
                position,
                health: Health::new(max),
                tags: Vec::new(),
            },
        );
        Ok(id)
    }

    fn add_tag(&mut self, entity: EntityId, tag: &str) -> Result<()> {
        if self.fail_tags {
            return Err(SiegeError::TagFailed {
                entity,
                tag: tag.to_string(),
                reason: "tagging disabled".to_string(),
            });
        }
        let stored = self
            .entities
            .get_mut(&entity)
            .ok_or(SiegeError::EntityNotFound(entity))?;
        if !stored.has_tag(tag) {
            stored.tags.push(tag.to_string());
        }
        Ok(())
    }

    fn query_tagged(&self, tag: &str, area: Option<Area>) -> Result<Vec<EntityId>> {
        if self.fail_queries {
            return Err(SiegeError::QueryFailed {
                tag: tag.to_string(),
                reason: "queries disabled".to_string(),
            });
        }
        Ok(self
            .tagged_ids(tag)
            .into_iter()
            .filter(|id| area.map_or(true, |a| a.contains(self.entities[id].position)))
            .collect())
    }

    fn is_valid(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    fn health(&self, entity: EntityId) -> Option<Health> {
        self.entities.get(&entity).map(|e| e.health)
    }

    fn trigger_event(&mut self, entity: EntityId, event: &str) -> Result<()> {
        if !self.entities.contains_key(&entity) {
            return Err(SiegeError::EntityNotFound(entity));
        }
        self.triggered.push((entity, event.to_string()));
        Ok(())
    }
}

/// In-memory [`PlayerRoster`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandboxRoster {
    players: Vec<PlayerState>,
}

impl SandboxRoster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `count` living players spaced along the x axis.
    #[must_use]
    pub fn with_players(count: u32) -> Self {
        let players = (0..count)
            .map(|i| PlayerState::new(PlayerId(i + 1), Vec2Fixed::from_ints(i as i32 * 200, 0)))
            .collect();
        Self { players }
    }

    /// Add or replace a player.
    pub fn upsert(&mut self, player: PlayerState) {
        match self.players.iter_mut().find(|p| p.id == player.id) {
            Some(existing) => *existing = player,
            None => self.players.push(player),
        }
    }

    /// Disconnect a player entirely.
    pub fn remove(&mut self, id: PlayerId) {
        self.players.retain(|p| p.id != id);
    }

    /// Mark a player alive or incapacitated.
    pub fn set_alive(&mut self, id: PlayerId, alive: bool) {
        if let Some(player) = self.players.iter_mut().find(|p| p.id == id) {
            player.alive = alive;
        }
    }

    /// Mark a player's handle valid or stale.
    pub fn set_valid(&mut self, id: PlayerId, valid: bool) {
        if let Some(player) = self.players.iter_mut().find(|p| p.id == id) {
            player.valid = valid;
        }
    }

    /// Mark every player alive or incapacitated.
    pub fn set_all_alive(&mut self, alive: bool) {
        for player in &mut self.players {
            player.alive = alive;
        }
    }
}

impl PlayerRoster for SandboxRoster {
    fn players(&self) -> Vec<PlayerState> {
        self.players.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Fixed;

    #[test]
    fn test_spawn_assigns_sequential_ids() {
        let mut world = SandboxWorld::new();
        let a = world.spawn_unit("siege_grunt", Vec2Fixed::ZERO).unwrap();
        let b = world.spawn_unit("siege_grunt", Vec2Fixed::ZERO).unwrap();
        assert_eq!((a, b), (1, 2));
        assert_eq!(world.health(a), Some(Health::new(DEFAULT_UNIT_HEALTH)));
    }

    #[test]
    fn test_unit_health_override() {
        let mut world = SandboxWorld::new();
        world.set_unit_health("siege_warlord", 2000);
        let boss = world.spawn_unit("siege_warlord", Vec2Fixed::ZERO).unwrap();
        assert_eq!(world.health(boss).unwrap().max, 2000);
    }

    #[test]
    fn test_blocked_area_rejects_spawn() {
        let mut world = SandboxWorld::new();
        world.set_blocked_area(Some(Area::new(Vec2Fixed::ZERO, Fixed::from_num(5))));
        assert!(world.spawn_unit("siege_grunt", Vec2Fixed::from_ints(1, 1)).is_err());
        assert!(world.spawn_unit("siege_grunt", Vec2Fixed::from_ints(10, 0)).is_ok());
    }

    #[test]
    fn test_query_scoped_to_area() {
        let mut world = SandboxWorld::new();
        let near = world.spawn_unit("siege_grunt", Vec2Fixed::from_ints(2, 0)).unwrap();
        let far = world.spawn_unit("siege_grunt", Vec2Fixed::from_ints(50, 0)).unwrap();
        world.add_tag(near, "siege_mob").unwrap();
        world.add_tag(far, "siege_mob").unwrap();

        let area = Area::new(Vec2Fixed::ZERO, Fixed::from_num(10));
        assert_eq!(world.query_tagged("siege_mob", Some(area)).unwrap(), vec![near]);
        assert_eq!(world.query_tagged("siege_mob", None).unwrap(), vec![near, far]);
    }

    #[test]
    fn test_despawn_raises_no_event_and_errors_twice() {
        let mut world = SandboxWorld::new();
        let id = world.spawn_unit("siege_grunt", Vec2Fixed::ZERO).unwrap();
        assert!(world.despawn(id).is_ok());
        assert!(world.despawn(id).is_err());
    }

    #[test]
    fn test_damage_kills_at_zero() {
        let mut world = SandboxWorld::new();
        let id = world.spawn_unit("siege_grunt", Vec2Fixed::ZERO).unwrap();
        assert!(world.damage(id, 40).unwrap().is_none());
        assert_eq!(world.health(id).unwrap().current, 60);
        let death = world.damage(id, 60).unwrap();
        assert_eq!(death.map(|d| d.entity), Some(id));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut world = SandboxWorld::new();
        let id = world.spawn_unit("siege_grunt", Vec2Fixed::from_ints(3, 4)).unwrap();
        world.add_tag(id, "siege_mob").unwrap();

        let bytes = world.serialize().unwrap();
        let restored = SandboxWorld::deserialize(&bytes).unwrap();
        assert_eq!(restored.state_hash(), world.state_hash());
    }

    #[test]
    fn test_roster_flags() {
        let mut roster = SandboxRoster::with_players(3);
        roster.set_valid(PlayerId(2), false);
        roster.set_alive(PlayerId(3), false);
        assert_eq!(roster.players().len(), 3);
        assert_eq!(roster.valid_players().len(), 2);
        roster.remove(PlayerId(1));
        assert_eq!(roster.players().len(), 2);
    }
}
