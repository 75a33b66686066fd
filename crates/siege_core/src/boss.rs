//! Boss phase escalation.
//!
//! Phases only move forward within a session. The tightest threshold is
//! checked first, so a boss that drops from full health to a sliver in one
//! tick goes straight to [`BossPhase::Desperate`] and only that phase's
//! event fires.

use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::config::SiegeConfig;
use crate::host::SiegeWorld;

/// Escalation state of the tracked boss.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum BossPhase {
    /// Opening phase.
    #[default]
    Normal,
    /// Second phase, entered at the phase-two threshold.
    Enraged,
    /// Final phase, entered at the phase-three threshold.
    Desperate,
}

impl BossPhase {
    /// Zero-based phase number (0, 1 or 2).
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Enraged => 1,
            Self::Desperate => 2,
        }
    }
}

/// A phase transition that fired this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossPhaseChange {
    /// The boss entity.
    pub boss: EntityId,
    /// Phase entered.
    pub phase: BossPhase,
}

/// Tracks the boss handle and its phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossPhaseController {
    boss: Option<EntityId>,
    phase: BossPhase,
}

impl BossPhaseController {
    /// Create a controller with no boss.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            boss: None,
            phase: BossPhase::Normal,
        }
    }

    /// Currently tracked boss, if any.
    #[must_use]
    pub const fn boss(&self) -> Option<EntityId> {
        self.boss
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> BossPhase {
        self.phase
    }

    /// Start tracking a freshly spawned boss.
    pub fn track(&mut self, boss: EntityId) {
        self.boss = Some(boss);
    }

    /// Forget the boss and return to the opening phase (session end).
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Read the boss's health and advance the phase if a threshold was crossed.
    ///
    /// Clears the boss reference if the handle went stale. Skips bosses with
    /// no health component or a non-positive maximum.
    pub fn evaluate(
        &mut self,
        world: &mut dyn SiegeWorld,
        config: &SiegeConfig,
    ) -> Option<BossPhaseChange> {
        let boss = self.boss?;
        if !world.is_valid(boss) {
            tracing::debug!(boss, "Boss reference went stale");
            self.boss = None;
            return None;
        }

        let health = world.health(boss)?;
        if health.max <= 0 {
            return None;
        }

        let (next, event) = if health.ratio_at_most(config.phase_three_threshold_pct)
            && self.phase < BossPhase::Desperate
        {
            (BossPhase::Desperate, &config.phase_three_event)
        } else if health.ratio_at_most(config.phase_two_threshold_pct)
            && self.phase < BossPhase::Enraged
        {
            (BossPhase::Enraged, &config.phase_two_event)
        } else {
            return None;
        };

        self.phase = next;
        tracing::info!(boss, phase = next.index(), "Boss phase advanced");
        if let Err(e) = world.trigger_event(boss, event) {
            tracing::debug!("Boss phase event '{event}' not delivered: {e}");
        }
        Some(BossPhaseChange { boss, phase: next })
    }
}
