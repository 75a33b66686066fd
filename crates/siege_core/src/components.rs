//! Plain data shared between the engine and its host.
//!
//! These types carry no behavior beyond small accessors. The host world
//! owns the real entities; the engine only ever sees handles and snapshots.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Unique identifier for entities in the host world.
pub type EntityId = u64;

/// Unique identifier for a connected player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// Health component as reported by the host.
///
/// `max` may be zero or negative for malformed entities; readers must
/// guard against it before dividing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: i32,
    /// Maximum health points.
    pub max: i32,
}

impl Health {
    /// Create a health component at full health.
    #[must_use]
    pub const fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    /// Whether `current / max` is at or below `pct` percent.
    ///
    /// Returns `false` when `max <= 0`.
    #[must_use]
    pub fn ratio_at_most(&self, pct: u32) -> bool {
        if self.max <= 0 {
            return false;
        }
        i64::from(self.current) * 100 <= i64::from(self.max) * i64::from(pct)
    }
}

/// One player as seen through the roster at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Player identifier.
    pub id: PlayerId,
    /// Current world position.
    pub position: Vec2Fixed,
    /// Whether the player handle can still be used (connected, loaded).
    pub valid: bool,
    /// Whether the player is alive (not incapacitated).
    pub alive: bool,
}

impl PlayerState {
    /// Create a valid, living player at `position`.
    #[must_use]
    pub const fn new(id: PlayerId, position: Vec2Fixed) -> Self {
        Self {
            id,
            position,
            valid: true,
            alive: true,
        }
    }
}

/// Circular region used to scope world queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    /// Center of the region.
    pub center: Vec2Fixed,
    /// Radius in world units.
    #[serde(with = "fixed_serde")]
    pub radius: Fixed,
}

impl Area {
    /// Create a new circular area.
    #[must_use]
    pub const fn new(center: Vec2Fixed, radius: Fixed) -> Self {
        Self { center, radius }
    }

    /// Check if a point lies inside the area.
    #[must_use]
    pub fn contains(&self, point: Vec2Fixed) -> bool {
        self.center.within(point, self.radius)
    }
}

/// A unit death reported by the host's death feed.
///
/// Tags are captured at the moment of death because the entity is
/// usually gone by the time the engine sees the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathEvent {
    /// Entity that died.
    pub entity: EntityId,
    /// Tags the entity carried when it died.
    pub tags: Vec<String>,
}

impl DeathEvent {
    /// Create a death event.
    #[must_use]
    pub fn new(entity: EntityId, tags: Vec<String>) -> Self {
        Self { entity, tags }
    }

    /// Check whether the dead entity carried `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
