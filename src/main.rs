//! Task simulator CLI.
//!
//! Loads experiment definitions from an XML file, the referenced task CSV,
//! validates the dependency graph, and runs the simulation.
//!
//! # Example
//!
//! ```bash
//! task_simulator experiments.xml --experiment simple
//! task_simulator experiments.xml -e ping_pong --verbose
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tasksim::{config, csv, validate_dependencies, SimError, Simulator};

/// Simulates task execution on a multi-host system.
#[derive(Parser, Debug)]
#[command(name = "task_simulator")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the XML file containing experiment definitions
    experiments_path: PathBuf,

    /// Experiment name to run
    #[arg(short = 'e', long)]
    experiment: String,

    /// Show detailed statistics
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // Help and version requests are not errors.
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
            let _ = e.print();
            return code;
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), SimError> {
    info!("Loading experiments from: {}", args.experiments_path.display());
    let experiments = config::load_experiments(&args.experiments_path)?;

    info!("Loading experiment: {}", args.experiment);
    let experiment = config::get_experiment(&experiments, &args.experiment)?;

    info!("Experiment configuration:");
    info!("  Tasks CSV: {}", experiment.tasks_csv.display());
    let hosts_info: Vec<String> = experiment
        .hosts
        .iter()
        .map(|(id, hc)| format!("{} ({} cores, {} RAM)", id, hc.cpu_cores, hc.ram))
        .collect();
    info!("  Hosts: {}", hosts_info.join("; "));

    info!("Parsing tasks from CSV: {}", experiment.tasks_csv.display());
    let tasks = csv::load_tasks(&experiment.tasks_csv)?;
    info!("Parsed {} tasks", tasks.len());

    info!("Validating task dependencies...");
    validate_dependencies(&tasks)?;
    info!("Dependencies validated successfully");

    info!("Initializing simulator...");
    let mut sim = Simulator::new(experiment, tasks)?;

    info!("Starting simulation...");
    sim.run(args.verbose)?;

    info!("Simulation completed successfully!");
    Ok(())
}
