use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use lawnest::config::{ConfigError, EngineConfig};
use lawnest::engine::{Action, EngineCore};
use lawnest::estimate::{Complexity, Estimate, Rates};
use lawnest::input::Event;
use lawnest::metrics::Totals;
use lawnest::snapshot::Snapshot;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON in {}: {source}", .path.display())]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{field} must be a non-negative number, got {value}")]
    InvalidNumber { field: &'static str, value: f64 },
}

#[derive(Parser, Debug)]
#[command(name = "lawnest-cli", about = "Replay lawn measurement sessions and price the result")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Feed a JSON array of events through the engine and print the final state.
    Replay(ReplayArgs),
    /// Price a known area and perimeter.
    Estimate(EstimateArgs),
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// JSON array of events, e.g. `[{"type":"load_image","width":800,"height":600}]`.
    script: PathBuf,

    /// Engine config as JSON. Unset fields keep their defaults. Without it, `LAWNEST_*` variables apply.
    #[arg(long, env = "LAWNEST_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    pricing: PricingArgs,
}

#[derive(Args, Debug)]
struct EstimateArgs {
    /// Area in calibrated square units.
    #[arg(long)]
    area: f64,

    /// Perimeter in calibrated linear units.
    #[arg(long)]
    perimeter: f64,

    #[command(flatten)]
    pricing: PricingArgs,
}

#[derive(Args, Debug)]
struct PricingArgs {
    #[arg(long, env = "LAWNEST_COMPLEXITY", default_value = "simple")]
    complexity: Complexity,

    #[arg(long, env = "LAWNEST_PRICE_PER_SQ_FT")]
    price_per_sq_ft: Option<f64>,

    #[arg(long, env = "LAWNEST_PRICE_PER_LIN_FT")]
    price_per_lin_ft: Option<f64>,

    #[arg(long, env = "LAWNEST_SERVICE_FEE")]
    service_fee: Option<f64>,
}

impl PricingArgs {
    fn rates(&self) -> Result<Rates, CliError> {
        let defaults = Rates::default();
        let rates = Rates {
            price_per_sq_ft: self.price_per_sq_ft.unwrap_or(defaults.price_per_sq_ft),
            price_per_lin_ft: self.price_per_lin_ft.unwrap_or(defaults.price_per_lin_ft),
            service_fee: self.service_fee.unwrap_or(defaults.service_fee),
        };
        non_negative("price_per_sq_ft", rates.price_per_sq_ft)?;
        non_negative("price_per_lin_ft", rates.price_per_lin_ft)?;
        non_negative("service_fee", rates.service_fee)?;
        Ok(rates)
    }
}

#[derive(Debug, Serialize)]
struct ReplayReport {
    events: usize,
    actions: usize,
    rejected_confirmations: usize,
    snapshot: Snapshot,
    estimate: Estimate,
}

fn main() -> Result<(), CliError> {
    // stdout carries the JSON report.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Replay(args) => run_replay(args),
        Command::Estimate(args) => run_estimate(args),
    }
}

fn run_replay(args: ReplayArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;
    let events: Vec<Event> = read_json(&args.script)?;
    let rates = args.pricing.rates()?;
    let report = replay(config, events, rates, args.pricing.complexity);
    print_json(&report)
}

fn run_estimate(args: EstimateArgs) -> Result<(), CliError> {
    non_negative("area", args.area)?;
    non_negative("perimeter", args.perimeter)?;
    let rates = args.pricing.rates()?;
    let totals = Totals { area: args.area, perimeter: args.perimeter };
    print_json(&Estimate::compute(totals, rates, args.pricing.complexity))
}

fn replay(config: EngineConfig, events: Vec<Event>, rates: Rates, complexity: Complexity) -> ReplayReport {
    let mut engine = EngineCore::with_config(config);
    let event_count = events.len();
    let mut action_count = 0;
    let mut rejected = 0;

    for (index, event) in events.into_iter().enumerate() {
        let actions = engine.dispatch(event);
        for action in &actions {
            debug!(index, ?action, "action");
            if let Action::CalibrationRejected { reason } = action {
                warn!(index, %reason, "calibration length rejected");
                rejected += 1;
            }
        }
        action_count += actions.len();
    }

    info!(
        events = event_count,
        actions = action_count,
        polygons = engine.polygons().len(),
        scale_factor = ?engine.scale_factor(),
        "replay finished"
    );
    ReplayReport {
        events: event_count,
        actions: action_count,
        rejected_confirmations: rejected,
        snapshot: engine.snapshot(),
        estimate: engine.estimate(rates, complexity),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, CliError> {
    let Some(path) = path else {
        return Ok(EngineConfig::from_env()?);
    };
    let config: EngineConfig = read_json(path)?;
    config.validate()?;
    Ok(config)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_path_buf(), source })?;
    serde_json::from_str(&raw).map_err(|source| CliError::Parse { path: path.to_path_buf(), source })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

fn non_negative(field: &'static str, value: f64) -> Result<(), CliError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CliError::InvalidNumber { field, value })
    }
}
