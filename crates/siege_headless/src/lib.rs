//! Headless siege runner for balance testing and CI verification.
//!
//! Drives the siege director against the in-memory sandbox world with a
//! scripted kill policy, so wave catalogs and tunables can be checked
//! without a game attached:
//!
//! - **Balance**: Run a scenario over many seeds and compare victory rates
//! - **CI verification**: Catalog validation and determinism checks
//! - **Data authoring**: Load catalogs and configs from RON before shipping
//!
//! # Example
//!
//! ```bash
//! # Run one siege and print its metrics
//! cargo run -p siege_headless -- run --players 2 --kills 3
//!
//! # Run a batch over 500 seeds
//! cargo run -p siege_headless -- batch --count 500 --output results/
//!
//! # Validate a catalog file
//! cargo run -p siege_headless -- validate --catalog data/waves.ron
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
pub mod loader;
pub mod metrics;
pub mod runner;
pub mod scenario;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults};
pub use loader::{load_catalogs, load_config, load_wave_catalog, LoadError};
pub use metrics::{BatchSummary, RunMetrics};
pub use runner::SiegeRunner;
pub use scenario::{Scenario, ScenarioMode};
