//! Siege metrics collection.
//!
//! One [`RunMetrics`] per scripted siege, folded into a [`BatchSummary`]
//! for balance work.

use serde::{Deserialize, Serialize};

use siege_core::director::{SiegeEvent, TickEvents};
use siege_core::session::{SiegeMode, SiegeResult};

/// Metrics for a single siege run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Scenario name.
    pub scenario: String,
    /// Seed used.
    pub seed: u64,
    /// Siege mode.
    pub mode: SiegeMode,
    /// How the siege ended (None = timed out).
    pub result: Option<SiegeResult>,
    /// Ticks from start to finish (or to the tick limit).
    pub duration_ticks: u64,
    /// Waves launched.
    pub waves_launched: usize,
    /// Units queued across all launches.
    pub units_queued: u64,
    /// Units that spawned.
    pub units_spawned: u64,
    /// Units the defenders killed.
    pub units_killed: u64,
    /// Highest live count seen.
    pub peak_live: u32,
    /// Whether the boss appeared.
    pub boss_spawned: bool,
    /// Highest boss phase reached (0-2).
    pub boss_phase_reached: u8,
    /// Authoritative recounts performed.
    pub resyncs: u32,
    /// Final world state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl RunMetrics {
    /// Create metrics for a run.
    #[must_use]
    pub fn new(scenario: impl Into<String>, seed: u64, mode: SiegeMode) -> Self {
        Self {
            scenario: scenario.into(),
            seed,
            mode,
            ..Default::default()
        }
    }

    /// Fold one tick's events in.
    pub fn record_tick(&mut self, events: &TickEvents, live: u32) {
        self.units_spawned += events.spawned.len() as u64;
        self.peak_live = self.peak_live.max(live);
        for event in &events.events {
            match event {
                SiegeEvent::WaveLaunched { queued, .. } => self.units_queued += *queued as u64,
                SiegeEvent::BossSpawned { .. } => self.boss_spawned = true,
                SiegeEvent::BossPhaseChanged(change) => {
                    self.boss_phase_reached = self.boss_phase_reached.max(change.phase.index());
                }
                SiegeEvent::Resynced { .. } => self.resyncs += 1,
                SiegeEvent::Victory(outcome) | SiegeEvent::Defeat(outcome) => {
                    self.result = Some(outcome.result);
                    self.duration_ticks = outcome.duration_ticks;
                    self.waves_launched = outcome.waves_launched;
                }
                _ => {}
            }
        }
    }

    /// Whether the siege ended in victory.
    #[must_use]
    pub fn is_victory(&self) -> bool {
        self.result == Some(SiegeResult::Victory)
    }
}

/// Aggregate over many runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Runs played.
    pub total_runs: u32,
    /// Runs won.
    pub victories: u32,
    /// Runs lost.
    pub defeats: u32,
    /// Runs that hit the tick limit.
    pub timeouts: u32,
    /// Victories / runs.
    pub victory_rate: f64,
    /// Average run length in ticks.
    pub avg_duration_ticks: f64,
    /// Shortest run.
    pub min_duration_ticks: u64,
    /// Longest run.
    pub max_duration_ticks: u64,
    /// Average highest live count.
    pub avg_peak_live: f64,
    /// Average units spawned.
    pub avg_units_spawned: f64,
    /// Runs where the boss reached its final phase.
    pub boss_final_phase_runs: u32,
}

impl BatchSummary {
    /// Create summary from run metrics.
    #[must_use]
    pub fn from_runs(runs: &[RunMetrics]) -> Self {
        if runs.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_runs: runs.len() as u32,
            min_duration_ticks: u64::MAX,
            ..Default::default()
        };

        let mut duration_sum = 0u64;
        let mut peak_sum = 0u64;
        let mut spawned_sum = 0u64;

        for run in runs {
            match run.result {
                Some(SiegeResult::Victory) => summary.victories += 1,
                Some(SiegeResult::Defeat) => summary.defeats += 1,
                None => summary.timeouts += 1,
            }
            if run.boss_phase_reached == 2 {
                summary.boss_final_phase_runs += 1;
            }
            duration_sum += run.duration_ticks;
            summary.min_duration_ticks = summary.min_duration_ticks.min(run.duration_ticks);
            summary.max_duration_ticks = summary.max_duration_ticks.max(run.duration_ticks);
            peak_sum += u64::from(run.peak_live);
            spawned_sum += run.units_spawned;
        }

        let n = runs.len() as f64;
        summary.victory_rate = f64::from(summary.victories) / n;
        summary.avg_duration_ticks = duration_sum as f64 / n;
        summary.avg_peak_live = peak_sum as f64 / n;
        summary.avg_units_spawned = spawned_sum as f64 / n;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(result: Option<SiegeResult>, duration: u64, phase: u8) -> RunMetrics {
        RunMetrics {
            result,
            duration_ticks: duration,
            boss_phase_reached: phase,
            peak_live: 10,
            units_spawned: 40,
            ..RunMetrics::new("test", 0, SiegeMode::Normal)
        }
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(BatchSummary::from_runs(&[]), BatchSummary::default());
    }

    #[test]
    fn test_summary_counts() {
        let runs = vec![
            run(Some(SiegeResult::Victory), 100, 2),
            run(Some(SiegeResult::Victory), 300, 1),
            run(Some(SiegeResult::Defeat), 200, 0),
            run(None, 400, 0),
        ];
        let summary = BatchSummary::from_runs(&runs);
        assert_eq!(summary.total_runs, 4);
        assert_eq!(summary.victories, 2);
        assert_eq!(summary.defeats, 1);
        assert_eq!(summary.timeouts, 1);
        assert!((summary.victory_rate - 0.5).abs() < f64::EPSILON);
        assert!((summary.avg_duration_ticks - 250.0).abs() < f64::EPSILON);
        assert_eq!(summary.min_duration_ticks, 100);
        assert_eq!(summary.max_duration_ticks, 400);
        assert_eq!(summary.boss_final_phase_runs, 1);
    }

    #[test]
    fn test_record_tick_tracks_peak_and_queue() {
        let mut metrics = RunMetrics::new("test", 1, SiegeMode::Normal);
        let events = TickEvents {
            tick: 1,
            events: vec![SiegeEvent::WaveLaunched {
                label: siege_core::spawner::WaveLabel::Scripted(1),
                queued: 6,
            }],
            spawned: vec![1],
        };
        metrics.record_tick(&events, 1);
        metrics.record_tick(&TickEvents::default(), 0);
        assert_eq!(metrics.units_queued, 6);
        assert_eq!(metrics.units_spawned, 1);
        assert_eq!(metrics.peak_live, 1);
        assert!(metrics.result.is_none());
    }
}
