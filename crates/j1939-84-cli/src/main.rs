//! j1939-84 - run J1939-84 steps against a simulated vehicle
//!
//! Loads a simulated vehicle from TOML, discovers its modules and runs the
//! selected steps, printing every result line. The exit code is non-zero when
//! any step reported a FAIL or the run aborted.

mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use j1939_84::{all_steps, RunConfig, TestScheduler};
use j1939_core::{CommunicationsModule, ModuleRegistry};
use j1939_sim::{SimulatedVehicle, VehicleConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::output::{ConsoleListener, OutputFormat};

#[derive(Parser)]
#[command(name = "j1939-84")]
#[command(author, version, about = "J1939-84 conformance step runner")]
#[command(propagate_version = true)]
struct Cli {
    /// Simulated vehicle configuration (TOML)
    #[arg(long, env = "J1939_VEHICLE", default_value = "configs/vehicle.toml")]
    vehicle: PathBuf,

    /// Run configuration (TOML)
    #[arg(short, long, env = "J1939_RUN_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Only print FAIL and WARN lines
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the selected steps (default)
    Run {
        /// Step to run as PART.STEP; repeat to select several
        #[arg(short, long = "step")]
        steps: Vec<String>,

        /// Length of one settle second in milliseconds
        #[arg(long)]
        settle_unit_ms: Option<u64>,
    },

    /// Discover the vehicle's modules and show the registry
    Discover,

    /// List the steps a run would execute
    Steps {
        /// Step selector as PART.STEP
        #[arg(short, long = "step")]
        steps: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays parseable
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "j1939_84=info,j1939_core=info,j1939_sim=debug".into())
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();

    let command = cli.command.unwrap_or(Commands::Run {
        steps: Vec::new(),
        settle_unit_ms: None,
    });

    let mut config = match &cli.config {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("Failed to load run config {}", path.display()))?,
        None => RunConfig::default(),
    };

    match command {
        Commands::Run { steps, settle_unit_ms } => {
            if !steps.is_empty() {
                config.steps = steps;
            }
            if let Some(ms) = settle_unit_ms {
                config.settle_unit_ms = ms;
            }
            config.validate()?;
            run(&cli.vehicle, config, cli.output, cli.no_color, cli.quiet).await
        }
        Commands::Discover => {
            let comms = load_vehicle(&cli.vehicle)?;
            let registry = ModuleRegistry::discover(&comms)
                .await
                .context("Module discovery failed")?;
            output::print_modules(cli.output, registry.modules());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Steps { steps } => {
            if !steps.is_empty() {
                config.steps = steps;
            }
            config.validate()?;
            let scheduler = TestScheduler::new(
                Arc::new(ConsoleListener::new(cli.output, cli.no_color, cli.quiet)),
                Arc::new(ModuleRegistry::new()),
                CommunicationsModule::new(Arc::new(SimulatedVehicle::new())),
            )
            .with_config(config)
            .with_steps(all_steps());
            output::print_steps(cli.output, &scheduler.planned());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_vehicle(path: &Path) -> Result<CommunicationsModule> {
    let config = VehicleConfig::load(path)
        .with_context(|| format!("Failed to load vehicle config {}", path.display()))?;
    tracing::info!(modules = config.modules.len(), path = %path.display(), "Loaded simulated vehicle");
    Ok(CommunicationsModule::new(Arc::new(SimulatedVehicle::from_config(&config))))
}

async fn run(
    vehicle_path: &Path,
    config: RunConfig,
    format: OutputFormat,
    no_color: bool,
    quiet: bool,
) -> Result<ExitCode> {
    let comms = load_vehicle(vehicle_path)?;
    let registry = ModuleRegistry::discover(&comms)
        .await
        .context("Module discovery failed")?;

    let listener = Arc::new(ConsoleListener::new(format, no_color, quiet));
    let handle = TestScheduler::new(listener.clone(), Arc::new(registry), comms)
        .with_config(config)
        .with_steps(all_steps())
        .spawn();

    let canceller = handle.canceller();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current step");
            canceller.cancel();
        }
    });

    let report = handle.join().await?;
    listener.print_summary(&report);

    if report.aborted().is_some() || listener.has_failures() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
