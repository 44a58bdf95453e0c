//! cpapflow - CPAP recording analyzer
//!
//! Entry point for the command line driver.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cpapflow::{output, Analysis, AnalysisConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Breathing metrics from CPAP Venturi recordings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one or more recordings and write their metrics
    Analyze(AnalyzeArgs),
    /// Write the default analysis config to a file
    Config(ConfigArgs),
}

#[derive(Parser, Debug)]
struct AnalyzeArgs {
    /// Recording files (header line + 7-column CSV rows)
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    inputs: Vec<PathBuf>,

    /// Analysis config (JSON); defaults are used if absent
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Directory for result files
    #[arg(short, long, default_value = ".", value_hint = ValueHint::DirPath)]
    output_dir: PathBuf,

    /// Also write the flow chart as `<stem>.png`
    #[arg(long, action = ArgAction::SetTrue)]
    png: bool,

    /// Debug logging
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Parser, Debug)]
struct ConfigArgs {
    /// Destination file
    #[arg(long, value_hint = ValueHint::FilePath)]
    write: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = match &cli.command {
        Command::Analyze(args) if args.verbose => "cpapflow=debug,cpapflow_core=debug",
        _ => "cpapflow=info,cpapflow_core=info",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Config(args) => {
            AnalysisConfig::default()
                .save(&args.write)
                .with_context(|| format!("Failed to write config {}", args.write.display()))?;
            Ok(())
        }
    }
}

fn handle_analyze(args: AnalyzeArgs) -> Result<()> {
    info!(
        version = cpapflow::VERSION,
        build_date = cpapflow::BUILD_DATE,
        "cpapflow starting"
    );

    let config = match &args.config {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    // Recordings share nothing, so each gets its own thread
    let results: Vec<(&PathBuf, Result<Analysis>)> = std::thread::scope(|scope| {
        let handles: Vec<_> = args
            .inputs
            .iter()
            .map(|path| {
                let config = &config;
                (path, scope.spawn(move || cpapflow::analyze_path(path, config)))
            })
            .collect();
        handles
            .into_iter()
            .map(|(path, handle)| {
                let result = handle
                    .join()
                    .map_err(|_| anyhow!("analysis thread panicked"))
                    .and_then(|r| r.map_err(anyhow::Error::from));
                (path, result)
            })
            .collect()
    });

    let stems = output::output_stems(&args.inputs);
    let mut failures = 0;
    for ((path, result), stem) in results.into_iter().zip(&stems) {
        match result {
            Ok(analysis) => {
                report(path, &analysis);
                output::write_results_as(&args.output_dir, stem, path, &analysis, args.png)?;
            }
            Err(e) => {
                error!(path = %path.display(), error = %format!("{:#}", e), "Analysis failed");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} recordings failed", failures, args.inputs.len());
    }
    Ok(())
}

fn report(path: &Path, analysis: &Analysis) {
    let m = &analysis.metrics;
    println!("{}", path.display());
    println!("  Duration:        {:.2} s", m.duration);
    println!("  Breaths:         {}", m.breaths);
    println!("  Breath rate:     {:.2} bpm", m.breath_rate_bpm);
    println!("  Apnea events:    {}", m.apnea_count);
    println!("  Leakage:         {:.3} L", m.leakage);

    let rejected = analysis.diagnostics.rejected_rows();
    if rejected > 0 {
        warn!(path = %path.display(), rejected, "Rows discarded during ingestion");
    }
    if m.apnea_danger() {
        warn!(path = %path.display(), apneas = m.apnea_count, "Multiple apnea events");
    }
}
