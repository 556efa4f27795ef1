//! ambrs - sample aerosol ensembles and run a box model over them
//!
//! # Usage
//!
//! ```bash
//! ambrs sample ensemble.toml -n 200 --seed 42 -o ensemble.json
//! ambrs run ensemble.toml --ensemble ensemble.json
//! ```

use ambrs::config::EnsembleConfig;
use ambrs::input::InputBuilder;
use ambrs::ppe::{sample_ensemble, Ensemble, SamplingMethod};
use ambrs::runner::{JobOutcome, PoolRunner, RunSummary};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "ambrs")]
#[command(about = "Perturbed-parameter ensembles for aerosol box models")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Draw an ensemble from a configuration file and save it as JSON
    Sample {
        /// Ensemble configuration (TOML)
        config: PathBuf,

        /// Sampling method, overriding the configuration
        #[arg(long)]
        method: Option<SamplingMethod>,

        /// Number of members, overriding the configuration
        #[arg(short = 'n', long)]
        size: Option<usize>,

        /// RNG seed, overriding the configuration
        #[arg(long)]
        seed: Option<u64>,

        /// Where to write the ensemble
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Run the configured simulator once per ensemble member
    Run {
        /// Ensemble configuration (TOML) with a [runner] table
        config: PathBuf,

        /// Ensemble written by `ambrs sample`
        #[arg(long)]
        ensemble: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ambrs=info,ambrs_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sample {
            config,
            method,
            size,
            seed,
            output,
        } => sample(&config, method, size, seed, &output),
        Commands::Run { config, ensemble } => run(&config, &ensemble),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: &Path) -> Result<EnsembleConfig> {
    EnsembleConfig::from_file(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn sample(
    config_path: &Path,
    method: Option<SamplingMethod>,
    size: Option<usize>,
    seed: Option<u64>,
    output: &Path,
) -> Result<ExitCode> {
    let mut config = load_config(config_path)?;
    if seed.is_some() {
        config.seed = seed;
    }
    let method = method.unwrap_or(config.method);
    let size = size.unwrap_or(config.size);
    let mut rng = config.rng();

    let specification = config
        .into_specification()
        .context("Invalid ensemble specification")?;
    let ensemble = sample_ensemble(&specification, size, method, &mut rng)?;

    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &ensemble)
        .context("Failed to write ensemble")?;

    info!(members = ensemble.len(), output = %output.display(), "Wrote ensemble");
    Ok(ExitCode::SUCCESS)
}

fn run(config_path: &Path, ensemble_path: &Path) -> Result<ExitCode> {
    let config = load_config(config_path)?;

    let file = File::open(ensemble_path)
        .with_context(|| format!("Failed to open {}", ensemble_path.display()))?;
    let ensemble: Ensemble =
        serde_json::from_reader(BufReader::new(file)).context("Failed to read ensemble")?;
    ensemble.validate()?;

    let specification = config
        .clone()
        .into_specification()
        .context("Invalid ensemble specification")?;
    if !ensemble.is_empty() {
        specification
            .check_scenario(&ensemble.member(0)?)
            .context("Ensemble does not match the configuration")?;
    }

    let runner_config = config
        .runner
        .as_ref()
        .context("Configuration has no [runner] table")?;
    let runner = PoolRunner::from_config(runner_config)?;
    let inputs = config
        .input_builder()?
        .create_inputs(&ensemble, &config.processes)?;

    let results = runner.run(&inputs)?;
    for result in &results {
        if let JobOutcome::Failed(e) = &result.outcome {
            warn!(
                index = result.index,
                dir = %result.working_directory.display(),
                "{}",
                e
            );
        }
    }

    let summary = RunSummary::from_results(&results);
    info!(%summary, root = %runner.root().display(), "Run complete");
    if summary.all_succeeded() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
