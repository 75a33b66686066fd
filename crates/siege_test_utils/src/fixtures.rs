//! Test fixtures and helpers.
//!
//! Small catalogs, tuned configs and a [`SiegeHarness`] that wires a
//! director to the sandbox world so tests can drive whole sieges.

use fixed::types::I32F32;
use serde::Serialize;

use siege_core::config::SiegeConfig;
use siege_core::director::{SiegeDirector, TickEvents};
use siege_core::math::Fixed;
use siege_core::sandbox::{SandboxRoster, SandboxWorld};
use siege_core::session::SiegeOutcome;
use siege_core::waves::{EndlessCatalog, SpawnRequest, WaveCatalog, WaveDefinition};

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Default config with victory checked every tick and a one-tick unlock.
#[must_use]
pub fn fast_config() -> SiegeConfig {
    SiegeConfig {
        victory_check_interval: 1,
        endless_unlock_delay: 1,
        ..SiegeConfig::default()
    }
}

/// One wave of `base_count` units of `entity_type`.
///
/// # Panics
///
/// Panics if `base_count` is zero.
#[must_use]
pub fn single_wave_catalog(entity_type: &str, base_count: u32) -> WaveCatalog {
    WaveCatalog::new(vec![WaveDefinition::new(
        1,
        0,
        vec![SpawnRequest::new(entity_type, base_count)],
    )])
    .expect("single wave catalog is valid")
}

/// `waves` short waves of grunts, `delay` ticks apart, with the boss joining
/// the last one.
///
/// # Panics
///
/// Panics if `waves` is zero.
#[must_use]
pub fn boss_catalog(waves: u32, delay: u32) -> WaveCatalog {
    let defs = (1..=waves)
        .map(|n| {
            let mut spawns = vec![SpawnRequest::new("siege_grunt", n + 1)];
            if n == waves {
                spawns.push(SpawnRequest::new("siege_warlord", 1));
            }
            WaveDefinition::new(n, if n == 1 { 0 } else { delay }, spawns)
        })
        .collect();
    WaveCatalog::new(defs).expect("boss catalog is valid")
}

/// Serialize a value to pretty RON, for writing fixture files.
///
/// # Panics
///
/// Panics if the value cannot be represented in RON.
#[must_use]
pub fn to_ron<T: Serialize>(value: &T) -> String {
    ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
        .expect("fixture serializes to RON")
}

/// A director wired to a sandbox world and roster.
#[derive(Debug)]
pub struct SiegeHarness {
    /// Host world.
    pub world: SandboxWorld,
    /// Connected players.
    pub roster: SandboxRoster,
    /// Director under test, with its death listener set up.
    pub director: SiegeDirector,
}

impl SiegeHarness {
    /// Harness with `players` players and the given config and catalog.
    #[must_use]
    pub fn new(players: u32, config: SiegeConfig, catalog: WaveCatalog) -> Self {
        let mut director = SiegeDirector::new(config, catalog, EndlessCatalog::standard());
        director.setup_death_listener();
        Self {
            world: SandboxWorld::new(),
            roster: SandboxRoster::with_players(players),
            director,
        }
    }

    /// Harness over the shipped catalogs and default config.
    #[must_use]
    pub fn standard(players: u32) -> Self {
        Self::new(players, SiegeConfig::default(), WaveCatalog::standard())
    }

    /// Start a normal siege.
    pub fn start(&mut self) -> bool {
        self.director.start_siege(&self.roster)
    }

    /// Start an endless siege for `day`.
    pub fn start_endless(&mut self, day: u32) -> bool {
        self.director.start_endless_siege(day, &self.roster)
    }

    /// Advance one tick.
    pub fn tick(&mut self) -> TickEvents {
        self.director.tick(&mut self.world, &self.roster)
    }

    /// Kill up to `limit` siege units and feed the deaths to the director.
    pub fn kill_mobs(&mut self, limit: usize) -> usize {
        let tag = self.director.config().mob_tag.clone();
        let deaths = self.world.kill_tagged(&tag, limit);
        for death in &deaths {
            self.director.notify_death(death);
        }
        deaths.len()
    }

    /// Tick until the session ends, killing `kills_per_tick` units after
    /// every tick. Gives up after `max_ticks`.
    pub fn run_until_outcome(&mut self, max_ticks: u64, kills_per_tick: usize) -> Option<SiegeOutcome> {
        for _ in 0..max_ticks {
            let events = self.tick();
            if let Some(outcome) = events.outcome() {
                tracing::debug!(?outcome, "Harness siege ended");
                return Some(outcome);
            }
            self.kill_mobs(kills_per_tick);
        }
        None
    }

    /// Hash of the world plus the session counters.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let status = self.director.status();
        crate::determinism::compute_hash(&(
            self.world.state_hash(),
            self.director.current_tick(),
            status.waves_launched,
            status.live_mobs,
            status.in_flight_jobs,
            status.boss_phase,
        ))
    }

    /// Enemy multiplier shortcut.
    pub fn set_multiplier(&mut self, multiplier: Fixed) {
        self.director.set_enemy_multiplier_getter(move || multiplier);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siege_core::session::SiegeResult;

    #[test]
    fn test_boss_catalog_shape() {
        let catalog = boss_catalog(5, 10);
        assert_eq!(catalog.len(), 5);
        assert!(catalog.get(4).unwrap().contains("siege_warlord"));
        assert!(!catalog.get(3).unwrap().contains("siege_warlord"));
    }

    #[test]
    fn test_harness_runs_to_victory() {
        let mut harness = SiegeHarness::new(1, fast_config(), single_wave_catalog("siege_grunt", 3));
        assert!(harness.start());
        let outcome = harness.run_until_outcome(100, usize::MAX).unwrap();
        assert_eq!(outcome.result, SiegeResult::Victory);
    }

    #[test]
    fn test_to_ron_parses_back() {
        let catalog = boss_catalog(2, 5);
        let text = to_ron(&catalog);
        assert_eq!(WaveCatalog::from_ron_str(&text).unwrap(), catalog);
    }
}
