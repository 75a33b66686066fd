//! Batch siege runner for balance testing.
//!
//! Runs one scenario over many seeds in parallel using rayon.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::metrics::{BatchSummary, RunMetrics};
use crate::runner::SiegeRunner;
use crate::scenario::Scenario;

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario to run
    pub scenario: Scenario,
    /// Number of runs
    pub run_count: u32,
    /// Maximum parallel runs (0 = use rayon default)
    pub parallel_runs: u32,
    /// Starting seed; run `i` uses `seed_start + i`
    pub seed_start: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::default(),
            run_count: 100,
            parallel_runs: 0,
            seed_start: 0,
        }
    }
}

impl BatchConfig {
    /// Create config for a scenario
    pub fn new(scenario: Scenario, run_count: u32) -> Self {
        Self {
            scenario,
            run_count,
            ..Default::default()
        }
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual run metrics, in seed order
    pub runs: Vec<RunMetrics>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Run a batch of sieges
pub fn run_batch(runner: &SiegeRunner, config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    let completed = AtomicU32::new(0);

    info!(
        "Starting batch run: {} runs of '{}'",
        config.run_count, config.scenario.name
    );

    // Configure thread pool if specified
    if config.parallel_runs > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_runs as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let runs: Vec<RunMetrics> = (0..config.run_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            let metrics = runner.run(&config.scenario, seed);

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % 10 == 0 {
                debug!("Progress: {}/{}", done, config.run_count);
            }
            metrics
        })
        .collect();

    let summary = BatchSummary::from_runs(&runs);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} runs in {:.1}s ({:.1}% victories)",
        runs.len(),
        duration_seconds,
        summary.victory_rate * 100.0
    );

    BatchResults {
        config,
        runs,
        summary,
        duration_seconds,
    }
}

/// Verify determinism by running the same seed several times
pub fn verify_determinism(runner: &SiegeRunner, scenario: &Scenario, seed: u64, runs: u32) -> bool {
    let results: Vec<RunMetrics> = (0..runs).map(|_| runner.run(scenario, seed)).collect();
    let deterministic = results.windows(2).all(|w| w[0] == w[1]);
    if !deterministic {
        let hashes: Vec<u64> = results.iter().map(|r| r.final_state_hash).collect();
        tracing::warn!(seed, ?hashes, "Runs diverged");
    }
    deterministic
}

#[cfg(test)]
mod tests {
    use super::*;
    use siege_core::config::SiegeConfig;
    use siege_core::waves::SiegeCatalogs;

    fn runner() -> SiegeRunner {
        SiegeRunner::new(
            SiegeConfig {
                victory_check_interval: 1,
                ..SiegeConfig::default()
            },
            SiegeCatalogs::default(),
        )
    }

    #[test]
    fn test_batch_runs_every_seed_in_order() {
        let config = BatchConfig::new(Scenario::standard(2).with_kills(20), 6).with_seed(40);
        let results = run_batch(&runner(), config);
        assert_eq!(results.runs.len(), 6);
        assert_eq!(results.summary.total_runs, 6);
        let seeds: Vec<u64> = results.runs.iter().map(|r| r.seed).collect();
        assert_eq!(seeds, vec![40, 41, 42, 43, 44, 45]);
        assert_eq!(results.summary.victories, 6);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/batch_results.json");
        let config = BatchConfig::new(Scenario::standard(1).with_kills(20), 2);
        let results = run_batch(&runner(), config.clone());

        results.save(&path).unwrap();
        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.config, config);
        assert_eq!(loaded.runs, results.runs);
    }

    #[test]
    fn test_verify_determinism() {
        let scenario = Scenario::standard(2).with_kills(3);
        assert!(verify_determinism(&runner(), &scenario, 77, 3));
    }
}
