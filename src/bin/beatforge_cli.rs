use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use beatforge::analysis::{ChartStats, TrackAnalyzer};
use beatforge::config::AppConfig;
use beatforge::distributor::NoteDistributor;
use beatforge::error::log_analysis_error;
use beatforge::schedule::{LaneTimes, NoteSchedule};
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "beatforge_cli",
    about = "Chart generation harness for the beatforge core"
)]
struct Cli {
    /// Path to a JSON config file (defaults apply when absent)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a WAV file into a per-lane note dictionary
    Analyze {
        /// Input WAV file
        input: PathBuf,
        /// Write the JSON report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Re-run the detected notes through the lane distributor
        #[arg(long, default_value_t = false)]
        rebalance: bool,
    },
    /// Rebalance an existing note-dictionary JSON file
    Rebalance {
        /// Input note-dictionary JSON ({"t1": [...], ...})
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Override the distribution seed
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Emit the deterministic demo schedule
    Demo {
        #[arg(long, default_value_t = 120)]
        bpm: u32,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli
        .config
        .as_ref()
        .map(AppConfig::load_from_file)
        .unwrap_or_default();

    match cli.command {
        Commands::Analyze {
            input,
            output,
            rebalance,
        } => run_analyze(&config, &input, output, rebalance),
        Commands::Rebalance {
            input,
            output,
            seed,
        } => run_rebalance(&config, &input, output, seed),
        Commands::Demo { bpm, output } => run_demo(bpm, output),
    }
}

fn run_analyze(
    config: &AppConfig,
    input: &PathBuf,
    output: Option<PathBuf>,
    rebalance: bool,
) -> Result<ExitCode> {
    let (samples, sample_rate) =
        read_wav_mono(input).with_context(|| format!("reading {}", input.display()))?;

    let analyzer = TrackAnalyzer::new(config.analyzer.clone());
    spawn_progress_printer(&analyzer);

    let outcome = match analyzer.analyze(&samples, sample_rate) {
        Ok(outcome) => outcome,
        Err(err) => {
            log_analysis_error(&err, "analyze");
            anyhow::bail!("analyzing {}: {}", input.display(), err);
        }
    };

    let (notes, stats) = if rebalance {
        let mut distributor = NoteDistributor::new(config.distributor.clone());
        let rebalanced = distributor.rebalance_existing(&outcome.notes);
        let stats = ChartStats::from_lane_times(&rebalanced);
        (rebalanced, stats)
    } else {
        (outcome.notes, outcome.stats)
    };

    let report = ChartReportPayload {
        source: input.display().to_string(),
        sample_rate,
        stats: &stats,
        notes: &notes,
    };
    emit_json(&report, output)?;
    Ok(ExitCode::from(0))
}

fn run_rebalance(
    config: &AppConfig,
    input: &PathBuf,
    output: Option<PathBuf>,
    seed: Option<u64>,
) -> Result<ExitCode> {
    let contents =
        fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let notes: LaneTimes = serde_json::from_str(&contents)
        .with_context(|| format!("parsing note dictionary {}", input.display()))?;

    let mut distributor_config = config.distributor.clone();
    if let Some(seed) = seed {
        distributor_config.seed = seed;
    }

    let mut distributor = NoteDistributor::new(distributor_config);
    let rebalanced = distributor.rebalance_existing(&notes);
    let stats = ChartStats::from_lane_times(&rebalanced);

    let report = ChartReportPayload {
        source: input.display().to_string(),
        sample_rate: 0,
        stats: &stats,
        notes: &rebalanced,
    };
    emit_json(&report, output)?;
    Ok(ExitCode::from(0))
}

fn run_demo(bpm: u32, output: Option<PathBuf>) -> Result<ExitCode> {
    let schedule = NoteSchedule::demo(bpm);
    emit_json(&schedule, output)?;
    Ok(ExitCode::from(0))
}

/// Decode a WAV file into mono f32 samples.
///
/// Multi-channel input is downmixed by averaging; integer formats are
/// normalized into [-1, 1]. Decoding lives here at the CLI boundary so
/// the core only ever sees plain PCM.
fn read_wav_mono(path: &PathBuf) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let mono: Vec<f32> = if channels > 1 {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    } else {
        samples
    };

    Ok((mono, spec.sample_rate))
}

/// Print progress updates to stderr while an analysis runs.
fn spawn_progress_printer(analyzer: &TrackAnalyzer) {
    let mut progress_rx = analyzer.subscribe_progress();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to create Tokio runtime for progress printing");

        rt.block_on(async move {
            let mut last = 255u8;
            loop {
                match progress_rx.recv().await {
                    Ok(update) => {
                        if update.percent != last {
                            eprintln!("[analyze] {}%", update.percent);
                            last = update.percent;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    });
}

fn emit_json<T: Serialize>(payload: &T, output_path: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(payload)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

#[derive(Serialize)]
struct ChartReportPayload<'a> {
    source: String,
    #[serde(skip_serializing_if = "sample_rate_unknown")]
    sample_rate: u32,
    stats: &'a ChartStats,
    notes: &'a LaneTimes,
}

fn sample_rate_unknown(rate: &u32) -> bool {
    *rate == 0
}
