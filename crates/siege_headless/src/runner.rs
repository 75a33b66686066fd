//! Scripted siege runs against the sandbox world.

use siege_core::config::SiegeConfig;
use siege_core::director::SiegeDirector;
use siege_core::math::percent;
use siege_core::sandbox::{SandboxRoster, SandboxWorld};
use siege_core::session::SiegeMode;
use siege_core::waves::SiegeCatalogs;

use crate::metrics::RunMetrics;
use crate::scenario::{Scenario, ScenarioMode};

/// Plays scenarios with a fixed config and catalog set.
#[derive(Debug, Clone, Default)]
pub struct SiegeRunner {
    config: SiegeConfig,
    catalogs: SiegeCatalogs,
}

impl SiegeRunner {
    /// Create a runner.
    #[must_use]
    pub fn new(config: SiegeConfig, catalogs: SiegeCatalogs) -> Self {
        Self { config, catalogs }
    }

    /// Config used for every run (the seed is replaced per run).
    #[must_use]
    pub fn config(&self) -> &SiegeConfig {
        &self.config
    }

    /// Play one scenario to its end or its tick limit.
    pub fn run(&self, scenario: &Scenario, seed: u64) -> RunMetrics {
        let config = SiegeConfig {
            seed,
            ..self.config.clone()
        };
        let mut director = SiegeDirector::new(
            config,
            self.catalogs.waves.clone(),
            self.catalogs.endless.clone(),
        );
        director.setup_death_listener();
        let multiplier = percent(scenario.enemy_multiplier_pct);
        director.set_enemy_multiplier_getter(move || multiplier);

        let mut world = SandboxWorld::new();
        let mut roster = SandboxRoster::with_players(scenario.players);

        let (mode, started) = match scenario.mode {
            ScenarioMode::Normal => (SiegeMode::Normal, director.start_siege(&roster)),
            ScenarioMode::Endless { day } => (
                SiegeMode::Endless,
                director.start_endless_siege(day, &roster),
            ),
        };
        let mut metrics = RunMetrics::new(&scenario.name, seed, mode);
        if !started {
            tracing::warn!(scenario = %scenario.name, "Siege did not start");
            return metrics;
        }

        let mut ticks = 0;
        while ticks < scenario.max_ticks {
            ticks += 1;
            if scenario.all_down_at == Some(ticks) {
                roster.set_all_alive(false);
            }

            let events = director.tick(&mut world, &roster);
            metrics.record_tick(&events, director.session().live_mob_count());
            if metrics.result.is_some() {
                break;
            }

            if ticks > scenario.kill_delay_ticks {
                let tag = &director.config().mob_tag;
                let deaths = world.kill_tagged(tag, scenario.kills_per_tick as usize);
                for death in &deaths {
                    director.notify_death(death);
                }
                metrics.units_killed += deaths.len() as u64;
            }
        }

        if metrics.result.is_none() {
            metrics.duration_ticks = ticks;
            metrics.waves_launched = director.status().waves_launched;
            tracing::debug!(scenario = %scenario.name, seed, ticks, "Siege timed out");
        }
        metrics.final_state_hash = world.state_hash();

        tracing::debug!(
            scenario = %scenario.name,
            seed,
            result = ?metrics.result,
            duration = metrics.duration_ticks,
            spawned = metrics.units_spawned,
            "Run complete"
        );
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siege_core::session::SiegeResult;

    fn fast_runner() -> SiegeRunner {
        SiegeRunner::new(
            SiegeConfig {
                victory_check_interval: 1,
                ..SiegeConfig::default()
            },
            SiegeCatalogs::default(),
        )
    }

    #[test]
    fn test_standard_siege_won_with_fast_kills() {
        let metrics = fast_runner().run(&Scenario::standard(1).with_kills(50), 1);
        assert_eq!(metrics.result, Some(SiegeResult::Victory));
        assert_eq!(metrics.waves_launched, 10);
        assert!(metrics.boss_spawned);
        assert_eq!(metrics.units_spawned, metrics.units_queued);
        assert_eq!(metrics.units_killed, metrics.units_spawned);
    }

    #[test]
    fn test_no_kills_times_out() {
        let scenario = Scenario {
            max_ticks: 500,
            ..Scenario::standard(2).with_kills(0)
        };
        let metrics = fast_runner().run(&scenario, 1);
        assert_eq!(metrics.result, None);
        assert_eq!(metrics.duration_ticks, 500);
        assert!(metrics.peak_live > 0);
    }

    #[test]
    fn test_players_down_is_defeat() {
        let scenario = Scenario {
            all_down_at: Some(30),
            ..Scenario::standard(2)
        };
        let metrics = fast_runner().run(&scenario, 1);
        assert_eq!(metrics.result, Some(SiegeResult::Defeat));
    }

    #[test]
    fn test_endless_scenario() {
        let metrics = fast_runner().run(&Scenario::endless(1, 300).with_kills(50), 9);
        assert_eq!(metrics.mode, SiegeMode::Endless);
        assert_eq!(metrics.result, Some(SiegeResult::Victory));
        assert_eq!(metrics.waves_launched, 1);
        assert!(metrics.boss_spawned);
    }

    #[test]
    fn test_same_seed_same_hash() {
        let runner = fast_runner();
        let scenario = Scenario::standard(3).with_kills(2);
        assert_eq!(runner.run(&scenario, 5), runner.run(&scenario, 5));
    }
}
