//! Headless siege runner.
//!
//! Runs sieges without a game attached. Reports go to stdout as JSON, logs
//! go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # One siege with the shipped catalogs
//! cargo run -p siege_headless -- run --players 2 --kills 3
//!
//! # An endless siege on day 180 from a scenario file
//! cargo run -p siege_headless -- run --scenario scenarios/night_raid.ron --day 180
//!
//! # Batch balance test
//! cargo run -p siege_headless -- batch --count 1000 --output results/
//!
//! # Check a catalog before shipping it
//! cargo run -p siege_headless -- validate --catalog data/siege_catalogs.ron
//! ```

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use siege_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    loader::{catalogs_or_default, config_or_default, LoadError},
    runner::SiegeRunner,
    scenario::{Scenario, ScenarioMode},
};

#[derive(Parser)]
#[command(name = "siege-headless")]
#[command(about = "Headless siege runner for balance testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by commands that play sieges.
#[derive(Args)]
struct SiegeArgs {
    /// Scenario file to load (flags below override it)
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Wave catalog RON file (defaults to the shipped catalogs)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Siege config RON file (defaults to the shipped tunables)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Connected players
    #[arg(short, long)]
    players: Option<u32>,

    /// Siege units killed per tick
    #[arg(short, long)]
    kills: Option<u32>,

    /// Enemy multiplier in percent
    #[arg(long)]
    multiplier: Option<u32>,

    /// Play an endless siege for this colony day
    #[arg(long)]
    day: Option<u32>,

    /// Tick limit
    #[arg(long)]
    max_ticks: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single siege and print its metrics
    Run {
        #[command(flatten)]
        siege: SiegeArgs,

        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Run a batch of sieges over consecutive seeds
    Batch {
        #[command(flatten)]
        siege: SiegeArgs,

        /// Number of runs
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel runs (0 = auto)
        #[arg(long, default_value = "0")]
        parallel: u32,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Output directory for batch_results.json (prints summary only if unset)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify determinism by running the same seed several times
    Verify {
        #[command(flatten)]
        siege: SiegeArgs,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Load and validate catalog and config files
    Validate {
        /// Wave catalog RON file
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Siege config RON file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is for reports
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let result = match cli.command {
        Commands::Run { siege, seed } => cmd_run(&siege, seed),
        Commands::Batch {
            siege,
            count,
            parallel,
            seed,
            output,
        } => cmd_batch(&siege, count, parallel, seed, output.as_deref()),
        Commands::Verify { siege, seed, runs } => cmd_verify(&siege, seed, runs),
        Commands::Validate { catalog, config } => cmd_validate(catalog.as_deref(), config.as_deref()),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Command failed");
        eprintln!("FATAL: {e}");
        std::process::exit(1);
    }
}

/// Build the runner and scenario from the command line.
fn prepare(args: &SiegeArgs) -> Result<(SiegeRunner, Scenario), LoadError> {
    let config = config_or_default(args.config.as_deref())?;
    let catalogs = catalogs_or_default(args.catalog.as_deref())?;

    let mut scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::default(),
    };
    if let Some(players) = args.players {
        scenario.players = players;
    }
    if let Some(kills) = args.kills {
        scenario.kills_per_tick = kills;
    }
    if let Some(pct) = args.multiplier {
        scenario.enemy_multiplier_pct = pct;
    }
    if let Some(day) = args.day {
        scenario.mode = ScenarioMode::Endless { day };
    }
    if let Some(max_ticks) = args.max_ticks {
        scenario.max_ticks = max_ticks;
    }

    tracing::info!(
        scenario = %scenario.name,
        players = scenario.players,
        mode = ?scenario.mode,
        waves = catalogs.waves.len(),
        "Siege configuration"
    );
    Ok((SiegeRunner::new(config, catalogs), scenario))
}

/// Run a single siege
fn cmd_run(args: &SiegeArgs, seed: u64) -> Result<(), Box<dyn std::error::Error>> {
    let (runner, scenario) = prepare(args)?;
    let metrics = runner.run(&scenario, seed);
    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}

/// Run a batch of sieges
fn cmd_batch(
    args: &SiegeArgs,
    count: u32,
    parallel: u32,
    seed: u64,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (runner, scenario) = prepare(args)?;
    let config = BatchConfig {
        parallel_runs: parallel,
        ..BatchConfig::new(scenario, count).with_seed(seed)
    };

    let results = run_batch(&runner, config);

    if let Some(dir) = output {
        let path = dir.join("batch_results.json");
        results.save(&path)?;
        tracing::info!(path = %path.display(), "Results saved");
    }
    println!("{}", serde_json::to_string_pretty(&results.summary)?);
    Ok(())
}

/// Verify determinism
fn cmd_verify(args: &SiegeArgs, seed: u64, runs: u32) -> Result<(), Box<dyn std::error::Error>> {
    let (runner, scenario) = prepare(args)?;
    if verify_determinism(&runner, &scenario, seed, runs) {
        eprintln!("DETERMINISTIC: {runs} runs of seed {seed} matched");
        Ok(())
    } else {
        Err(format!("runs of seed {seed} diverged").into())
    }
}

/// Validate data files
fn cmd_validate(catalog: Option<&Path>, config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    if catalog.is_none() && config.is_none() {
        return Err("nothing to validate; pass --catalog and/or --config".into());
    }
    if let Some(path) = catalog {
        let catalogs = catalogs_or_default(Some(path))?;
        eprintln!(
            "OK: {} ({} waves, {} endless sets)",
            path.display(),
            catalogs.waves.len(),
            catalogs.endless.len()
        );
    }
    if let Some(path) = config {
        config_or_default(Some(path))?;
        eprintln!("OK: {}", path.display());
    }
    Ok(())
}
