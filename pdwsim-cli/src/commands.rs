//! CLI command implementations

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use pdwsim_core::{
    CsvPulseWriter, GenerationMode, GenerationReport, Pdw, PulseMerger, ScenarioConfig,
    SeedSequence, generate,
};
use pdwsim_core::rng::MAX_SEED;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Generate a fixed number of pulses into a CSV file
    Count {
        #[command(flatten)]
        run: RunArgs,
        /// Number of pulses to write
        #[arg(short = 'n', long)]
        pulses: usize,
    },
    /// Generate every pulse with TOA below a ceiling into a CSV file
    Until {
        #[command(flatten)]
        run: RunArgs,
        /// Exclusive TOA ceiling
        #[arg(short, long)]
        end_toa: f64,
    },
    /// Print the first pulses of a scenario
    Preview {
        /// Scenario TOML file
        #[arg(short, long, default_value = "radars.toml")]
        config: PathBuf,
        /// Number of pulses to show
        #[arg(short = 'n', long, default_value = "20")]
        pulses: usize,
        /// Seed override
        #[arg(long, value_parser = seed_parser())]
        seed: Option<u64>,
    },
}

/// Options shared by the file-writing commands
#[derive(Args)]
pub struct RunArgs {
    /// Scenario TOML file
    #[arg(short, long, default_value = "radars.toml")]
    pub config: PathBuf,
    /// CSV output path
    #[arg(short, long, default_value = "data.csv")]
    pub output: PathBuf,
    /// Seed override; the config seed or OS entropy is used otherwise
    #[arg(long, value_parser = seed_parser())]
    pub seed: Option<u64>,
    /// Write `<output-stem>_config.toml` next to the output
    #[arg(long)]
    pub save_config: bool,
}

fn seed_parser() -> clap::builder::RangedU64ValueParser<u64> {
    clap::value_parser!(u64).range(0..=MAX_SEED)
}

/// Handle the CLI command
///
/// # Errors
/// Returns the load, validation or I/O failure of the command
pub async fn handle_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Count { run, pulses } => {
            let report = run_to_file(run, GenerationMode::Count(pulses)).await?;
            print!("{}", report.summary());
        }
        Commands::Until { run, end_toa } => {
            let report = run_to_file(run, GenerationMode::UntilToa(end_toa)).await?;
            print!("{}", report.summary());
        }
        Commands::Preview {
            config,
            pulses,
            seed,
        } => preview(&config, pulses, seed)?,
    }
    Ok(())
}

/// Loads the scenario and builds its merger with the resolved seed.
///
/// # Errors
/// - Scenario file missing, malformed or invalid
pub fn prepare_scenario(
    config_path: &Path,
    seed_override: Option<u64>,
) -> anyhow::Result<(ScenarioConfig, PulseMerger, u64)> {
    let mut config = ScenarioConfig::load(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    let mut seeds = match seed_override.or(config.seed) {
        Some(seed) if seed > MAX_SEED => {
            anyhow::bail!("Seed {seed} exceeds the largest storable seed {MAX_SEED}")
        }
        Some(seed) => SeedSequence::from_seed(seed),
        None => {
            let seeds = SeedSequence::from_entropy();
            tracing::info!(seed = seeds.seed(), "No seed configured, drew one from entropy");
            seeds
        }
    };
    let seed = seeds.seed();
    config.seed = Some(seed);

    let merger = config
        .build_merger(&mut seeds)
        .with_context(|| format!("Invalid scenario in {}", config_path.display()))?;
    Ok((config, merger, seed))
}

/// Generates pulses into the CSV file named by `run`.
///
/// The pull loop runs on the blocking pool so the runtime stays responsive;
/// its join handle is the completion signal.
///
/// # Errors
/// - Scenario file missing, malformed or invalid
/// - Output or snapshot file cannot be written
pub async fn run_to_file(run: RunArgs, mode: GenerationMode) -> anyhow::Result<GenerationReport> {
    mode.validate()?;
    let (config, mut merger, seed) = prepare_scenario(&run.config, run.seed)?;
    let output = run.output.clone();

    let report = tokio::task::spawn_blocking(move || write_csv(&mut merger, mode, &output))
        .await
        .context("Generation task panicked")??
        .with_seed(seed);

    tracing::info!(
        output = %run.output.display(),
        pulses = report.pulses_written,
        "CSV written"
    );

    if run.save_config {
        let snapshot = snapshot_path(&run.output);
        config
            .save(&snapshot)
            .with_context(|| format!("Failed to write {}", snapshot.display()))?;
        tracing::info!(snapshot = %snapshot.display(), "Configuration snapshot written");
    }

    Ok(report)
}

fn write_csv(
    merger: &mut PulseMerger,
    mode: GenerationMode,
    output: &Path,
) -> anyhow::Result<GenerationReport> {
    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let mut writer = CsvPulseWriter::new(BufWriter::new(file));
    Ok(generate(merger, mode, &mut writer)?)
}

/// Returns `<dir>/<stem>_config.toml` for an output path.
pub fn snapshot_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pdwsim".to_string());
    output.with_file_name(format!("{stem}_config.toml"))
}

fn preview(config_path: &Path, pulses: usize, seed: Option<u64>) -> anyhow::Result<()> {
    let (_, mut merger, seed) = prepare_scenario(config_path, seed)?;
    let mut collected: Vec<Pdw> = Vec::new();
    let report = generate(&mut merger, GenerationMode::Count(pulses), &mut collected)?
        .with_seed(seed);

    println!(
        "{:>7} {:>14} {:>10} {:>12} {:>10} {:>10}",
        "RadarID", "TOA", "DOA", "RF", "PW", "PA"
    );
    println!("{:-<68}", "");
    for pulse in &collected {
        println!(
            "{:>7} {:>14.3} {:>10.3} {:>12.3} {:>10.3} {:>10.3}",
            pulse.radar_id, pulse.toa, pulse.doa, pulse.rf, pulse.pw, pulse.pa
        );
    }
    println!();
    print!("{}", report.summary());
    Ok(())
}
