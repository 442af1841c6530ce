//! Synheart Sleep Agent CLI
//!
//! Live sleep/wake features and overnight sleep analysis.

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use synheart_sleep_agent::{
    collector::{CollectorConfig, RawReading, SampleCollector},
    config::Config,
    monitor::{AnalysisOutcome, BatchAnalyzer, BatchSettings, LiveMonitor, StateHub},
    transparency::create_shared_log_with_persistence,
    SleepClassifier, DATA_DECLARATION, VERSION,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "synheart-sleep")]
#[command(author = "Synheart")]
#[command(version = VERSION)]
#[command(about = "Sleep/wake features and overnight sleep analysis", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a recorded night
    Analyze {
        /// Recording file (header + HH:MM:SS,hr,ax,ay,az rows)
        file: PathBuf,

        /// Output file for the analysis JSON
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Calendar day the recording starts on (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Time zone override (IANA name)
        #[arg(long)]
        timezone: Option<String>,
    },

    /// Compute live features from `hr,ax,ay,az` lines on stdin
    Live {
        /// Only print every Nth feature vector
        #[arg(long, default_value = "1")]
        every: u64,
    },

    /// Show current status and cumulative statistics
    Status,

    /// Display data handling declaration
    Privacy,

    /// Show configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(&cli.log_level) {
        eprintln!("Warning: Could not initialise logging: {e}");
    }

    let result = match cli.command {
        Commands::Analyze {
            file,
            output,
            date,
            timezone,
        } => cmd_analyze(&file, output, date, timezone),
        Commands::Live { every } => cmd_live(every),
        Commands::Status => {
            cmd_status();
            Ok(())
        }
        Commands::Privacy => {
            cmd_privacy();
            Ok(())
        }
        Commands::Config => cmd_config(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Install a stderr `fmt` subscriber filtered by `level` (or `RUST_LOG`).
fn setup_logging(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.to_lowercase()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load configuration, using defaults: {e}");
            Config::default()
        }
    }
}

fn cmd_analyze(
    file: &Path,
    output: Option<PathBuf>,
    date: Option<NaiveDate>,
    timezone: Option<String>,
) -> anyhow::Result<()> {
    let mut config = load_config();
    if let Some(tz) = timezone {
        config.timezone = tz;
    }
    config.validate().context("invalid configuration")?;

    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read recording {}", file.display()))?;

    let mut settings = BatchSettings::from_config(&config);
    if let Some(date) = date {
        settings = settings.with_reference_date(date);
    }

    let log = create_shared_log_with_persistence(config.data_path.join("transparency.json"));
    let hub = StateHub::shared();
    let analyzer = Arc::new(BatchAnalyzer::new(settings, hub).with_log(log.clone()));
    let classifier: Arc<dyn SleepClassifier> = Arc::new(config.classifier);

    println!("Synheart Sleep Agent v{VERSION}");
    println!();
    println!("Analyzing {}...", file.display());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    let outcome = runtime.block_on(analyzer.analyze_async(text, classifier))?;

    print_outcome(&outcome);

    let output_path = match output {
        Some(path) => path,
        None => {
            config
                .ensure_directories()
                .context("failed to create export directory")?;
            config.export_path.join(format!(
                "analysis_{}.json",
                Utc::now().format("%Y%m%d_%H%M%S")
            ))
        }
    };
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&outcome)?;
    std::fs::write(&output_path, json)
        .with_context(|| format!("failed to write {}", output_path.display()))?;
    println!();
    println!("Exported analysis to {output_path:?}");

    if let Err(e) = log.save() {
        eprintln!("Warning: Could not save transparency log: {e}");
    }

    Ok(())
}

fn print_outcome(outcome: &AnalysisOutcome) {
    let report = &outcome.report;
    println!(
        "  Samples: {} ({} rows dropped, {} day rollovers)",
        outcome.sample_count, outcome.dropped_rows, outcome.rollovers
    );
    println!("  Windows classified: {}", outcome.windows.len());
    println!();
    if report.has_session() {
        println!("Sleep Report");
        println!("============");
    } else {
        println!("No sleep session found.");
    }
    println!("  Bed time:   {}", report.bed_time);
    println!("  Wake time:  {}", report.wake_time);
    println!("  Duration:   {}", report.sleep_duration);
    println!("  Efficiency: {}", report.efficiency);
    println!("  Chart points: {}", outcome.chart.len());
}

fn cmd_live(every: u64) -> anyhow::Result<()> {
    let config = load_config();
    config.validate().context("invalid configuration")?;

    println!("Synheart Sleep Agent v{VERSION}");
    println!();
    println!("Reading hr,ax,ay,az lines from stdin. Press Ctrl+C to stop.");
    println!(
        "  Windows: {}s / {}s / {}s",
        config.live_short_window.as_secs(),
        config.live_mid_window.as_secs(),
        config.live_retention.as_secs()
    );
    println!();

    let log = create_shared_log_with_persistence(config.data_path.join("transparency.json"));
    let hub = StateHub::shared();
    let mut monitor = LiveMonitor::new(config.live_windows(), hub);

    let mut collector = SampleCollector::new(CollectorConfig {
        capacity: config.collector_capacity,
    });
    collector.start()?;

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    // Transport: stdin lines pushed through the collector.
    let input_done = Arc::new(AtomicBool::new(false));
    let sender = collector.sender();
    let done = input_done.clone();
    let reader = thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let Some(reading) = RawReading::parse_csv(&line) else {
                tracing::debug!(%line, "skipping unparsable live input");
                continue;
            };
            // Back off while the consumer catches up.
            while let Err(e) = sender.push(reading) {
                match e {
                    synheart_sleep_agent::CollectorError::BufferFull => {
                        thread::sleep(Duration::from_millis(10))
                    }
                    _ => return,
                }
            }
        }
        done.store(true, Ordering::SeqCst);
    });

    let receiver = collector.receiver().clone();
    while running.load(Ordering::SeqCst) {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(reading) => {
                log.record_sample();
                let features = monitor.add(
                    reading.heart_rate,
                    reading.accel_x,
                    reading.accel_y,
                    reading.accel_z,
                );
                if monitor.samples_seen() % every.max(1) == 0 {
                    if let Some(features) = features {
                        let values: Vec<String> = features
                            .as_slice()
                            .iter()
                            .map(|v| format!("{v:.3}"))
                            .collect();
                        println!(
                            "[{}] hr={:.1} vm={:.3} buffered={} features=[{}]",
                            Utc::now().format("%H:%M:%S"),
                            reading.heart_rate,
                            reading.vector_magnitude(),
                            monitor.buffered(),
                            values.join(", ")
                        );
                    }
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                if input_done.load(Ordering::SeqCst) && receiver.is_empty() {
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                eprintln!("Collector disconnected unexpectedly");
                break;
            }
        }
    }

    println!();
    println!("Stopping...");
    collector.stop();
    if input_done.load(Ordering::SeqCst) {
        let _ = reader.join();
    }

    if let Err(e) = log.save() {
        eprintln!("Warning: Could not save transparency log: {e}");
    }

    println!();
    println!("{}", log.summary());
    Ok(())
}

fn cmd_status() {
    let config = load_config();

    println!("Synheart Sleep Agent Status");
    println!("===========================");
    println!();

    println!("Configuration:");
    println!(
        "  Live windows: {}s / {}s / {}s",
        config.live_short_window.as_secs(),
        config.live_mid_window.as_secs(),
        config.live_retention.as_secs()
    );
    println!(
        "  Batch window: {} samples, stride {}",
        config.batch_window_samples, config.batch_stride_samples
    );
    println!("  Wake tolerance: {}s", config.wake_tolerance_secs);
    println!("  Time zone: {}", config.timezone);
    println!();

    let stats_path = config.data_path.join("transparency.json");
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Cumulative Statistics:");
                if let Some(samples) = stats.get("samples_ingested") {
                    println!("  Live samples ingested: {samples}");
                }
                if let Some(rows) = stats.get("rows_dropped") {
                    println!("  Recording rows dropped: {rows}");
                }
                if let Some(windows) = stats.get("windows_classified") {
                    println!("  Windows classified: {windows}");
                }
                if let Some(analyses) = stats.get("analyses_completed") {
                    println!("  Analyses completed: {analyses}");
                }
            }
        }
    } else {
        println!("No previous session data found.");
    }
}

fn cmd_privacy() {
    println!("{DATA_DECLARATION}");
}

fn cmd_config() -> anyhow::Result<()> {
    let config = load_config();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");
}
