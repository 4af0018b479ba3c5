//! Vital CLI - Command-line interface for Vitalflow
//!
//! Commands:
//! - derive: Run daily samples through the engine and emit per-day reports
//! - risk: Print the five-condition risk trajectory bundle for a sample set
//! - doctor: Inspect a saved engine state snapshot

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use vitalflow::pipeline::SignalEngine;
use vitalflow::report::ReportEncoder;
use vitalflow::types::{DailySample, IntakeProfile};
use vitalflow::{DeriveError, ENGINE_VERSION};

/// Vital - On-device derivation engine for wearable health signals
#[derive(Parser)]
#[command(name = "vital")]
#[command(author = "Vitalflow Labs")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Derive health signals from daily biometric samples", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run daily samples through the engine and emit per-day reports
    Derive {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Intake profile JSON file (enables classification and risk)
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Load engine state from file before processing
        #[arg(long)]
        load_state: Option<PathBuf>,

        /// Save engine state to file after processing
        #[arg(long)]
        save_state: Option<PathBuf>,
    },

    /// Print the five-condition risk trajectory bundle for a sample set
    Risk {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Intake profile JSON file (required for risk projection)
        #[arg(long)]
        profile: PathBuf,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Inspect a saved engine state snapshot
    Doctor {
        /// Engine state file to inspect
        #[arg(long)]
        state: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one sample per line)
    Ndjson,
    /// JSON array of samples
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one report per line)
    Ndjson,
    /// JSON array of reports
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Debug)]
enum CliError {
    Io(io::Error),
    Derive(DeriveError),
    Parse(String),
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<DeriveError> for CliError {
    fn from(e: DeriveError) -> Self {
        CliError::Derive(e)
    }
}

#[derive(Serialize)]
struct CliErrorJson {
    error: String,
}

impl CliError {
    fn message(&self) -> String {
        match self {
            CliError::Io(e) => format!("io error: {e}"),
            CliError::Derive(e) => e.to_string(),
            CliError::Parse(msg) => format!("parse error: {msg}"),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let json = serde_json::to_string(&CliErrorJson { error: e.message() })
                .unwrap_or_else(|_| e.message());
            eprintln!("{json}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Derive {
            input,
            output,
            input_format,
            output_format,
            profile,
            load_state,
            save_state,
        } => cmd_derive(
            &input,
            &output,
            input_format,
            output_format,
            profile.as_deref(),
            load_state.as_deref(),
            save_state.as_deref(),
        ),
        Commands::Risk {
            input,
            input_format,
            profile,
            pretty,
        } => cmd_risk(&input, input_format, &profile, pretty),
        Commands::Doctor { state, json } => cmd_doctor(&state, json),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_derive(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    profile: Option<&Path>,
    load_state: Option<&Path>,
    save_state: Option<&Path>,
) -> Result<(), CliError> {
    let mut engine = match load_state {
        Some(path) => SignalEngine::from_json(&fs::read_to_string(path)?)?,
        None => SignalEngine::new(),
    };
    if let Some(path) = profile {
        engine.set_profile(read_profile(path)?)?;
    }

    let mut samples = read_samples(input, &input_format)?;
    samples.sort_by_key(|s| s.date);

    let encoder = ReportEncoder::new();
    let mut reports = Vec::new();
    for sample in samples {
        let date = sample.date;
        let outcome = engine.ingest(sample);
        reports.push(encoder.encode(&engine, date, outcome));
    }

    let rendered = match output_format {
        OutputFormat::Ndjson => {
            let mut lines = Vec::new();
            for report in &reports {
                lines.push(serde_json::to_string(report).map_err(DeriveError::JsonError)?);
            }
            lines.join("\n") + "\n"
        }
        OutputFormat::Json => {
            serde_json::to_string(&reports).map_err(DeriveError::JsonError)? + "\n"
        }
        OutputFormat::JsonPretty => {
            serde_json::to_string_pretty(&reports).map_err(DeriveError::JsonError)? + "\n"
        }
    };
    write_output(output, &rendered)?;

    if let Some(path) = save_state {
        fs::write(path, engine.to_json()?)?;
    }
    Ok(())
}

fn cmd_risk(
    input: &Path,
    input_format: InputFormat,
    profile: &Path,
    pretty: bool,
) -> Result<(), CliError> {
    let mut engine = SignalEngine::new();
    engine.set_profile(read_profile(profile)?)?;

    let mut samples = read_samples(input, &input_format)?;
    samples.sort_by_key(|s| s.date);
    for sample in samples {
        engine.ingest(sample);
    }

    let bundle = engine.risk_trajectories()?;
    let json = if pretty {
        serde_json::to_string_pretty(&bundle).map_err(DeriveError::JsonError)?
    } else {
        serde_json::to_string(&bundle).map_err(DeriveError::JsonError)?
    };
    println!("{json}");

    let [first, second] = bundle.top_concerns();
    eprintln!("top concerns: {}, {}", first.as_str(), second.as_str());
    Ok(())
}

fn cmd_doctor(state: &Path, json: bool) -> Result<(), CliError> {
    let engine = SignalEngine::from_json(&fs::read_to_string(state)?)?;
    let latest = engine.samples().iter().map(|s| s.date).max();
    let averages = engine.window_averages();

    if json {
        let summary = serde_json::json!({
            "samples": engine.samples().len(),
            "latest_date": latest,
            "baselines": engine.baselines().len(),
            "records": engine.records().len(),
            "alerts": engine.alerts().len(),
            "unseen_alerts": engine.alerts().iter().filter(|a| !a.seen).count(),
            "profile_set": engine.profile().is_some(),
            "window_averages": averages,
        });
        println!("{summary}");
    } else {
        println!("samples:        {}", engine.samples().len());
        if let Some(date) = latest {
            println!("latest date:    {date}");
        }
        println!("baselines:      {}", engine.baselines().len());
        println!("records:        {}", engine.records().len());
        println!(
            "alerts:         {} ({} unseen)",
            engine.alerts().len(),
            engine.alerts().iter().filter(|a| !a.seen).count()
        );
        println!(
            "profile:        {}",
            if engine.profile().is_some() { "set" } else { "missing" }
        );
    }
    Ok(())
}

fn read_profile(path: &Path) -> Result<IntakeProfile, CliError> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| CliError::Parse(format!("profile: {e}")))
}

fn read_samples(path: &Path, format: &InputFormat) -> Result<Vec<DailySample>, CliError> {
    let raw = if path == Path::new("-") {
        if atty::is(atty::Stream::Stdin) {
            eprintln!("reading samples from stdin (end with Ctrl-D)");
        }
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(path)?
    };

    match format {
        InputFormat::Ndjson => raw
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(i, line)| {
                serde_json::from_str(line)
                    .map_err(|e| CliError::Parse(format!("line {}: {e}", i + 1)))
            })
            .collect(),
        InputFormat::Json => {
            serde_json::from_str(&raw).map_err(|e| CliError::Parse(e.to_string()))
        }
    }
}

fn write_output(path: &Path, contents: &str) -> Result<(), CliError> {
    if path == Path::new("-") {
        io::stdout().write_all(contents.as_bytes())?;
    } else {
        fs::write(path, contents)?;
    }
    Ok(())
}
