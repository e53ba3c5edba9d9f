//! Heartline Application
//!
//! Command-line front end for the Heartline ECG analysis engine. Replays
//! recorded sample streams or runs a synthetic demo feed, printing monitor
//! events as JSON lines and a ten-second summary at the end.
//!
//! # Usage
//!
//! ```bash
//! # Replay a recording (one `value`, `timestamp_ms,value` or JSON per line)
//! heartline replay --input session.csv
//!
//! # Replay with a custom configuration
//! heartline replay --input session.csv --config monitor.json
//!
//! # Synthetic 48 BPM feed, paced in real time
//! heartline demo --bpm 48 --seconds 30 --realtime
//!
//! # Print the default configuration
//! heartline config
//! ```

mod demo;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use heartline_core::{MonitorConfig, Sample};
use heartline_native::bridge::{read_samples, ConnectionWatchdog, CHECK_INTERVAL};
use heartline_native::{EventSink, HeartMonitor, IngestOutcome, MonitorEvent};

use crate::demo::SyntheticEcg;

/// Heartline ECG monitor
#[derive(Parser, Debug)]
#[command(name = "heartline")]
#[command(author, version, about = "Streaming single-channel ECG analysis", long_about = None)]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a recorded sample stream
    Replay {
        /// Recording path
        #[arg(short, long)]
        input: PathBuf,

        /// JSON monitor configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Also print a chart point event for every sample
        #[arg(long)]
        points: bool,
    },

    /// Run a synthetic demo feed
    Demo {
        /// Heart rate of the synthetic feed
        #[arg(short, long, default_value = "72")]
        bpm: u16,

        /// Seconds of signal to generate
        #[arg(short, long, default_value = "20")]
        seconds: u32,

        /// Pseudo-noise amplitude (raw units)
        #[arg(long, default_value = "5.0")]
        noise: f64,

        /// JSON monitor configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pace samples at the sampling rate
        #[arg(long)]
        realtime: bool,

        /// Also print a chart point event for every sample
        #[arg(long)]
        points: bool,
    },

    /// Print the default configuration as JSON
    Config,
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
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Heartline v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Replay {
            input,
            config,
            points,
        } => run_replay(&input, config.as_deref(), points),
        Commands::Demo {
            bpm,
            seconds,
            noise,
            config,
            realtime,
            points,
        } => run_demo(bpm, seconds, noise, config.as_deref(), realtime, points),
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&MonitorConfig::default())?);
            Ok(())
        }
    }
}

/// Load a configuration file, or the defaults when none is given
fn load_config(path: Option<&Path>) -> anyhow::Result<MonitorConfig> {
    let Some(path) = path else {
        return Ok(MonitorConfig::default());
    };
    let text = std::fs::read_to_string(path)?;
    let config: MonitorConfig = serde_json::from_str(&text)?;
    config.validate()?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Stdout sink printing events as JSON lines
struct PrintSink {
    points: bool,
}

impl EventSink for PrintSink {
    fn emit(&mut self, event: MonitorEvent) {
        print_event(&event, self.points);
    }
}

fn print_event(event: &MonitorEvent, points: bool) {
    if matches!(event, MonitorEvent::Point(_)) && !points {
        return;
    }
    match serde_json::to_string(event) {
        Ok(json) => println!("{json}"),
        Err(e) => warn!("Failed to serialize event: {}", e),
    }
}

/// Run beat analysis once per full analysis window of new samples
fn analyze_periodically(monitor: &mut HeartMonitor, sink: &mut dyn EventSink) {
    let every = monitor.config().beat_analysis_samples().max(1) as u64;
    if monitor.data_count() % every == 0 {
        if let Err(e) = monitor.analyze_beat(sink) {
            info!("Beat analysis skipped: {}", e);
        }
    }
}

/// Print the ten-second summary and its interpretation
fn print_summary(monitor: &HeartMonitor) -> anyhow::Result<()> {
    let summary = monitor.ten_second_summary();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    println!("{}", serde_json::to_string_pretty(&summary.interval_report())?);
    for note in summary.clinical_notes() {
        info!("{}", note);
    }
    Ok(())
}

/// Replay a recorded stream through the engine
fn run_replay(input: &Path, config: Option<&Path>, points: bool) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let mut monitor = HeartMonitor::new(config)?;
    let mut sink = PrintSink { points };

    info!("Replaying {}", input.display());
    let reader = BufReader::new(File::open(input)?);

    let mut rejected = 0usize;
    for result in read_samples(reader, config.sampling_rate_hz) {
        let sample = match result {
            Ok(sample) => sample,
            Err(e) => {
                warn!("Skipping line: {}", e);
                rejected += 1;
                continue;
            }
        };
        if let IngestOutcome::Rejected(_) = monitor.ingest(&sample, &mut sink) {
            rejected += 1;
            continue;
        }
        analyze_periodically(&mut monitor, &mut sink);
    }

    info!(
        "Replay finished: {} samples accepted, {} rejected",
        monitor.data_count(),
        rejected
    );
    print_summary(&monitor)
}

/// Run the synthetic feed
fn run_demo(
    bpm: u16,
    seconds: u32,
    noise: f64,
    config: Option<&Path>,
    realtime: bool,
    points: bool,
) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let mut monitor = HeartMonitor::new(config)?;
    let feed = SyntheticEcg::new(config.sampling_rate_hz, bpm, noise);
    let total = u64::from(seconds) * u64::from(config.sampling_rate_hz);

    info!("Demo feed: {} BPM for {} s", bpm, seconds);

    if realtime {
        let rt = tokio::runtime::Runtime::new()?;
        monitor = rt.block_on(run_demo_realtime(monitor, feed, total, points))?;
    } else {
        let mut sink = PrintSink { points };
        for sample in feed.take(total as usize) {
            monitor.ingest(&sample, &mut sink);
            analyze_periodically(&mut monitor, &mut sink);
        }
    }

    print_summary(&monitor)
}

/// Paced demo: samples on a timer, events fanned out over a broadcast
/// channel, connection watchdog checked periodically
async fn run_demo_realtime(
    mut monitor: HeartMonitor,
    mut feed: SyntheticEcg,
    total: u64,
    points: bool,
) -> anyhow::Result<HeartMonitor> {
    let (mut tx, mut rx) = broadcast::channel::<MonitorEvent>(1024);

    let printer = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => print_event(&event, points),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Printer lagged, dropped {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let period = Duration::from_secs_f64(monitor.config().sample_period_ms() / 1000.0);
    let mut sample_tick = tokio::time::interval(period);
    let mut watchdog_tick = tokio::time::interval(CHECK_INTERVAL);
    let mut watchdog = ConnectionWatchdog::default();

    let mut sent = 0u64;
    while sent < total {
        tokio::select! {
            _ = sample_tick.tick() => {
                let sample: Sample = feed.next_sample();
                if let Some(event) = watchdog.on_sample(Instant::now()) {
                    info!("Connection: {:?}", event);
                }
                monitor.ingest(&sample, &mut tx);
                analyze_periodically(&mut monitor, &mut tx);
                sent += 1;
            }
            _ = watchdog_tick.tick() => {
                if let Some(event) = watchdog.check(Instant::now()) {
                    warn!("Connection: {:?}", event);
                }
            }
        }
    }

    drop(tx);
    printer.await?;
    Ok(monitor)
}
