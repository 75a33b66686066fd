//! Tunables for a siege director.
//!
//! Every timer is expressed in simulation ticks. At the host's default
//! rate of [`TICK_RATE`] ticks per second, the default recount interval is
//! thirty seconds.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SiegeError};

/// Ticks per second the host is expected to drive the director at.
pub const TICK_RATE: u32 = 20;

/// Siege tunables, loadable from RON.
///
/// Missing fields fall back to [`SiegeConfig::default`].
///
/// # Example RON
///
/// ```ron
/// SiegeConfig(
///     max_live_mobs: 40,
///     max_spawns_per_player: 24,
///     boss_entity_type: "siege_warlord",
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiegeConfig {
    /// Ceiling on concurrently alive siege units.
    pub max_live_mobs: u32,
    /// Per-player, per-wave cap on queued spawns.
    pub max_spawns_per_player: u32,
    /// Spawn attempts a job makes before yielding.
    pub batch_size: u32,
    /// A job refreshes its player map every this many yields.
    pub roster_refresh_yields: u32,
    /// A job checks the budget ceiling every this many yields.
    pub budget_check_yields: u32,
    /// Ticks between victory checks.
    pub victory_check_interval: u32,
    /// Ticks between authoritative recounts of live siege units.
    pub recount_interval: u32,
    /// Ticks between a normal-mode victory and endless mode unlocking.
    pub endless_unlock_delay: u32,
    /// Tag applied to every unit the siege spawns.
    pub mob_tag: String,
    /// Extra tag applied to the boss unit.
    pub boss_tag: String,
    /// Entity type that is treated as the siege boss.
    pub boss_entity_type: String,
    /// Event triggered on the boss when it drops to the second phase threshold.
    pub phase_two_event: String,
    /// Event triggered on the boss when it drops to the third phase threshold.
    pub phase_three_event: String,
    /// Health percentage at or below which the boss enters its second phase.
    pub phase_two_threshold_pct: u32,
    /// Health percentage at or below which the boss enters its third phase.
    pub phase_three_threshold_pct: u32,
    /// Minimum distance (per axis) between a player and a spawned unit.
    pub spawn_radius_min: i32,
    /// Maximum distance (per axis) between a player and a spawned unit.
    pub spawn_radius_max: i32,
    /// First day on which endless sieges are offered.
    pub endless_base_day: u32,
    /// Days spent on each endless wave-set before escalating.
    pub endless_days_per_set: u32,
    /// Seed for spawn-offset randomness.
    pub seed: u64,
}

impl Default for SiegeConfig {
    fn default() -> Self {
        Self {
            max_live_mobs: 40,
            max_spawns_per_player: 24,
            batch_size: 1,
            roster_refresh_yields: 5,
            budget_check_yields: 5,
            victory_check_interval: 2 * TICK_RATE,
            recount_interval: 30 * TICK_RATE,
            endless_unlock_delay: 5 * TICK_RATE,
            mob_tag: "siege_mob".to_string(),
            boss_tag: "siege_boss".to_string(),
            boss_entity_type: "siege_warlord".to_string(),
            phase_two_event: "siege:boss_phase_2".to_string(),
            phase_three_event: "siege:boss_phase_3".to_string(),
            phase_two_threshold_pct: 66,
            phase_three_threshold_pct: 33,
            spawn_radius_min: 12,
            spawn_radius_max: 24,
            endless_base_day: 100,
            endless_days_per_set: 40,
            seed: 0x5eed_5e1e,
        }
    }
}

impl SiegeConfig {
    /// Parse a config from a RON string and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the RON is malformed or a value is out of range.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source).map_err(|e| SiegeError::DataParseError {
            source_name: "siege config".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the values are usable by a director.
    ///
    /// # Errors
    ///
    /// Returns [`SiegeError::DataParseError`] describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| {
            Err(SiegeError::DataParseError {
                source_name: "siege config".to_string(),
                message: message.to_string(),
            })
        };

        if self.batch_size == 0 {
            return invalid("batch_size must be at least 1");
        }
        if self.roster_refresh_yields == 0 || self.budget_check_yields == 0 {
            return invalid("yield intervals must be at least 1");
        }
        if self.victory_check_interval == 0 || self.recount_interval == 0 {
            return invalid("timer intervals must be at least 1 tick");
        }
        if self.spawn_radius_min < 0 || self.spawn_radius_min > self.spawn_radius_max {
            return invalid("spawn radius must satisfy 0 <= min <= max");
        }
        if self.phase_three_threshold_pct > self.phase_two_threshold_pct {
            return invalid("phase three threshold must not exceed phase two threshold");
        }
        if self.endless_days_per_set == 0 {
            return invalid("endless_days_per_set must be at least 1");
        }
        Ok(())
    }
}
