//! Live siege-unit budget.
//!
//! An eventually-consistent counter: spawns increment it, death events
//! decrement it, and a periodic [`BudgetTracker::resync`] overwrites it with
//! the result of an authoritative world query. The resync catches units that
//! vanish without a death event (distance despawn, unloaded chunks).
//!
//! The count is never negative. Decrements clamp at zero, and a failed
//! resync query keeps the previous value.

use serde::{Deserialize, Serialize};

use crate::components::DeathEvent;
use crate::host::SiegeWorld;

/// Running count of live siege units against a ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetTracker {
    live: u32,
    ceiling: u32,
}

impl BudgetTracker {
    /// Create an empty tracker with the given ceiling.
    #[must_use]
    pub const fn new(ceiling: u32) -> Self {
        Self { live: 0, ceiling }
    }

    /// Current live count.
    #[must_use]
    pub const fn live(&self) -> u32 {
        self.live
    }

    /// Configured ceiling.
    #[must_use]
    pub const fn ceiling(&self) -> u32 {
        self.ceiling
    }

    /// Whether another unit fits under the ceiling.
    #[must_use]
    pub const fn has_headroom(&self) -> bool {
        self.live < self.ceiling
    }

    /// Record a successful spawn.
    pub fn increment(&mut self) {
        self.live = self.live.saturating_add(1);
    }

    /// Record a death if the unit belonged to the siege.
    ///
    /// Returns `true` if the event was counted.
    pub fn decrement_on_death(&mut self, event: &DeathEvent, mob_tag: &str) -> bool {
        if !event.has_tag(mob_tag) {
            return false;
        }
        self.live = self.live.saturating_sub(1);
        true
    }

    /// Replace the count with the number of `mob_tag` entities in the world.
    ///
    /// Returns the new count, or `None` if the query failed and the previous
    /// count was kept.
    pub fn resync(&mut self, world: &dyn SiegeWorld, mob_tag: &str) -> Option<u32> {
        match world.query_tagged(mob_tag, None) {
            Ok(units) => {
                let count = u32::try_from(units.len()).unwrap_or(u32::MAX);
                if count != self.live {
                    tracing::debug!(previous = self.live, actual = count, "Budget resynced");
                }
                self.live = count;
                Some(count)
            }
            Err(e) => {
                tracing::debug!("Budget resync skipped: {e}");
                None
            }
        }
    }

    /// Zero the count (new session).
    pub fn reset(&mut self) {
        self.live = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2Fixed;
    use crate::sandbox::SandboxWorld;

    const TAG: &str = "siege_mob";

    fn mob_death(entity: u64) -> DeathEvent {
        DeathEvent::new(entity, vec![TAG.to_string()])
    }

    #[test]
    fn test_increment_and_headroom() {
        let mut budget = BudgetTracker::new(2);
        assert!(budget.has_headroom());
        budget.increment();
        budget.increment();
        assert_eq!(budget.live(), 2);
        assert!(!budget.has_headroom());
    }

    #[test]
    fn test_decrement_clamps_at_zero() {
        let mut budget = BudgetTracker::new(10);
        budget.increment();
        assert!(budget.decrement_on_death(&mob_death(1), TAG));
        assert!(budget.decrement_on_death(&mob_death(2), TAG));
        assert_eq!(budget.live(), 0);
    }

    #[test]
    fn test_decrement_ignores_untagged() {
        let mut budget = BudgetTracker::new(10);
        budget.increment();
        let event = DeathEvent::new(1, vec!["camp_mob".to_string()]);
        assert!(!budget.decrement_on_death(&event, TAG));
        assert_eq!(budget.live(), 1);
    }

    #[test]
    fn test_resync_overwrites_count() {
        let mut world = SandboxWorld::new();
        for _ in 0..3 {
            let id = world.spawn_unit("siege_grunt", Vec2Fixed::ZERO).unwrap();
            world.add_tag(id, TAG).unwrap();
        }
        world.spawn_unit("villager", Vec2Fixed::ZERO).unwrap();

        let mut budget = BudgetTracker::new(10);
        for _ in 0..7 {
            budget.increment();
        }
        assert_eq!(budget.resync(&world, TAG), Some(3));
        assert_eq!(budget.live(), 3);
    }

    #[test]
    fn test_failed_resync_keeps_count() {
        let mut world = SandboxWorld::new();
        world.set_fail_queries(true);

        let mut budget = BudgetTracker::new(10);
        budget.increment();
        budget.increment();
        assert_eq!(budget.resync(&world, TAG), None);
        assert_eq!(budget.live(), 2);
    }
}
