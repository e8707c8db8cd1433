//! Rootstar Sim Application
//!
//! Command-line runner for the Rootstar brainwave simulator. Metrics are
//! written to stdout as JSON lines; logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Stream 100 ticks at the default 100 ms cadence
//! rootstar-sim run
//!
//! # Focus state, no jitter, 20 ticks, reproducible
//! rootstar-sim run --state focus --noise 0 --ticks 20 --seed 7
//!
//! # Start from a JSON config file and override the interval
//! rootstar-sim run --config sim.json --interval-ms 50 --summary
//!
//! # List target states and their gain profiles
//! rootstar-sim states
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use rootstar_sim_core::{
    BandGains, SignatureTier, SimulatorConfig, TargetState, GAIN_TABLE_VERSION,
};
use rootstar_sim_native::{
    SessionStatus, SessionTracker, SimulatorBuilder, SimulatorService,
};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Ticks streamed when `--ticks` is not given
const DEFAULT_RUN_TICKS: u64 = 100;

/// Capacity of the metrics channel between the service and stdout
const METRICS_BUFFER: usize = 256;

/// Rootstar brainwave simulator
#[derive(Parser, Debug)]
#[command(name = "rootstar-sim")]
#[command(author, version, about = "Rootstar brainwave simulator", long_about = None)]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the simulator and stream metrics (default if no subcommand)
    Run(RunArgs),

    /// List target states and their band gains
    States,
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// JSON configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target state, e.g. FOCUS or deep-meditation
    #[arg(short, long)]
    state: Option<TargetState>,

    /// Jitter magnitude
    #[arg(long)]
    noise: Option<f64>,

    /// Global amplitude multiplier
    #[arg(long)]
    amplitude: Option<f64>,

    /// Tick period in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Number of ticks to stream
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Seed for reproducible jitter
    #[arg(long)]
    seed: Option<u64>,

    /// Print the session summary as a final JSON line
    #[arg(long)]
    summary: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Rootstar Sim v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        None => run(RunArgs::default()),
        Some(Commands::Run(args)) => run(args),
        Some(Commands::States) => list_states(),
    }
}

/// Resolve configuration from the optional file and flag overrides
fn load_config(args: &RunArgs) -> anyhow::Result<SimulatorConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => SimulatorConfig::default(),
    };

    if let Some(state) = args.state {
        config.target_state = state;
    }
    if let Some(noise) = args.noise {
        config.noise_level = noise;
    }
    if let Some(amplitude) = args.amplitude {
        config.amplitude_scale = amplitude;
    }
    if let Some(interval_ms) = args.interval_ms {
        config.tick_interval_ms = interval_ms;
    }

    config.validate()?;
    Ok(config)
}

/// Run the simulator service until the requested number of ticks is streamed
fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(stream_metrics(config, &args))
}

async fn stream_metrics(config: SimulatorConfig, args: &RunArgs) -> anyhow::Result<()> {
    let ticks = args.ticks.unwrap_or(DEFAULT_RUN_TICKS);

    let mut builder = SimulatorBuilder::new().config(config);
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    let (handle, task) = SimulatorService::spawn(builder.build()?);

    let (_, mut metrics_rx) = handle.subscribe_channel(METRICS_BUFFER).await?;
    let mut session = SessionTracker::new(config.target_state, now_ms());

    info!(
        state = %config.target_state,
        noise_level = config.noise_level,
        amplitude_scale = config.amplitude_scale,
        interval_ms = config.tick_interval_ms,
        ticks,
        "Starting simulation"
    );
    handle.start_default().await?;

    let mut emitted = 0_u64;
    while emitted < ticks {
        let Some(metrics) = metrics_rx.recv().await else {
            break;
        };
        session.record(&metrics);
        let line = serde_json::to_string(&metrics)?;
        writeln!(io::stdout().lock(), "{line}")?;
        emitted += 1;
    }

    handle.stop().await?;
    let status = handle.status().await?;
    debug!(?status, "Simulator stopped");
    handle.shutdown().await?;
    task.await?;

    let outcome = if emitted == ticks {
        SessionStatus::Completed
    } else {
        SessionStatus::Interrupted
    };
    let summary = session.finish(outcome, now_ms());

    info!(
        session = %summary.id,
        samples = summary.samples,
        peak = summary.peak_energetic_score,
        average = summary.average_energetic_score,
        tier = ?SignatureTier::classify(summary.peak_energetic_score),
        "Session finished"
    );

    if args.summary {
        let line = serde_json::to_string(&summary)?;
        writeln!(io::stdout().lock(), "{line}")?;
    }

    Ok(())
}

/// Print every target state with its band gains
fn list_states() -> anyhow::Result<()> {
    write_states(&mut io::stdout().lock())
}

fn write_states(out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(out, "Gain table v{GAIN_TABLE_VERSION}")?;
    writeln!(
        out,
        "{:<16} {:<24} {:>6} {:>6} {:>6} {:>6} {:>6}",
        "STATE", "PATTERN", "DELTA", "THETA", "ALPHA", "BETA", "GAMMA"
    )?;
    for state in TargetState::ALL {
        let g = BandGains::for_state(state);
        writeln!(
            out,
            "{:<16} {:<24} {:>6.2} {:>6.2} {:>6.2} {:>6.2} {:>6.2}",
            state.name(),
            state.description(),
            g.delta,
            g.theta,
            g.alpha,
            g.beta,
            g.gamma
        )?;
    }
    Ok(())
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
