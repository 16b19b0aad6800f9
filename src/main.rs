//! QorSense - Sensor Health Analysis CLI
//!
//! Command-line surface over the analysis engine.
//!
//! # Usage
//!
//! ```bash
//! # Analyze a JSON request (or `-` for stdin, or a `.csv` of readings)
//! qorsense analyze request.json
//!
//! # Produce a synthetic request for a scenario
//! qorsense generate --scenario drifting --length 200 --seed 42 > drifting.json
//!
//! # Text report with metric table and trend snapshot
//! qorsense report drifting.json
//!
//! # Live monitoring of simulated sensors (Ctrl+C to stop)
//! qorsense monitor --scenario noisy --sensors 3 --ticks 300 --interval-ms 50
//!
//! # Live monitoring of an external feed
//! simulation --scenario drifting | qorsense monitor --stdin
//! ```
//!
//! # Environment Variables
//!
//! - `QORSENSE_CONFIG`: Path to a qorsense.toml (default: ./qorsense.toml, then built-ins)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use qorsense::monitor::{spawn_stdin_feed, FeedSource, MonitorStats, ScenarioSource, SampleSource};
use qorsense::sensors::read_csv_request;
use qorsense::{
    AnalysisRequest, AnalysisResult, LiveMonitor, MonitorLoop, QorsenseConfig, ReportSummary,
    Scenario, SensorAnalyzer, SensorType, SyntheticGenerator,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "qorsense")]
#[command(about = "QorSense industrial sensor health analysis")]
#[command(version)]
struct CliArgs {
    /// Path to a qorsense.toml; overrides QORSENSE_CONFIG and ./qorsense.toml
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines (logs go to stderr either way)
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Analyze one series and print the result as JSON
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Pretty-print the result
        #[arg(long)]
        pretty: bool,
    },

    /// Print a synthetic analysis request as JSON
    Generate {
        /// Normal, Drifting, Noisy or Oscillation (case-insensitive)
        #[arg(long, default_value = "Normal")]
        scenario: Scenario,

        /// Number of samples
        #[arg(long, default_value_t = 200)]
        length: usize,

        /// Random seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, default_value = "SIM-001")]
        sensor_id: String,

        #[arg(long, default_value = "Generic")]
        sensor_type: SensorType,

        /// Add RFC 3339 timestamps spaced this many seconds apart
        #[arg(long, value_name = "SECS")]
        period_secs: Option<u32>,
    },

    /// Analyze one series and print a report summary
    Report {
        #[command(flatten)]
        input: InputArgs,

        /// Print the summary as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Run live monitors and print every published result as a JSON line
    Monitor {
        /// Scenario for simulated sensors (default: monitor.scenario from config)
        #[arg(long)]
        scenario: Option<Scenario>,

        /// Number of independent monitors
        #[arg(long, default_value_t = 1)]
        sensors: usize,

        /// Stop each monitor after this many ticks (default: run until Ctrl+C)
        #[arg(long)]
        ticks: Option<u64>,

        /// Tick interval (default: monitor.interval_ms from config)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Seed for the scenario generators; monitor N uses seed + N
        #[arg(long)]
        seed: Option<u64>,

        /// Feed the first monitor from stdin (one reading or `timestamp,value` per line)
        #[arg(long)]
        stdin: bool,

        #[arg(long, default_value = "Generic")]
        sensor_type: SensorType,
    },
}

/// Where a one-shot series comes from.
#[derive(clap::Args, Debug)]
struct InputArgs {
    /// JSON request file, `.csv` readings file, or `-` for a JSON request on stdin
    input: String,

    /// Sensor ID for CSV input (default: file stem)
    #[arg(long)]
    sensor_id: Option<String>,

    /// Sensor type for CSV input
    #[arg(long, default_value = "Generic")]
    sensor_type: SensorType,
}

// ============================================================================
// Setup
// ============================================================================

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&Path>) -> Result<QorsenseConfig> {
    match path {
        Some(path) => QorsenseConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => QorsenseConfig::load().context("Failed to load configuration"),
    }
}

fn read_request(input: &InputArgs) -> Result<AnalysisRequest> {
    if input.input == "-" {
        let mut json = String::new();
        std::io::stdin()
            .read_to_string(&mut json)
            .context("Failed to read request from stdin")?;
        return AnalysisRequest::from_json(&json).context("Invalid request on stdin");
    }

    let path = Path::new(&input.input);
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        let sensor_id = input.sensor_id.clone().unwrap_or_else(|| {
            path.file_stem()
                .map_or_else(|| "SENSOR".to_string(), |s| s.to_string_lossy().into_owned())
        });
        return read_csv_request(path, &sensor_id, input.sensor_type)
            .with_context(|| format!("Failed to load readings from {}", path.display()));
    }

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    AnalysisRequest::from_json(&json).with_context(|| format!("Invalid request in {}", path.display()))
}

// ============================================================================
// Subcommands
// ============================================================================

fn run_analyze(analyzer: &SensorAnalyzer, input: &InputArgs, pretty: bool) -> Result<()> {
    let request = read_request(input)?;
    let result = analyzer
        .analyze(&request)
        .with_context(|| format!("Analysis failed for sensor {}", request.sensor_id))?;
    let json = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{json}");
    Ok(())
}

fn run_generate(
    scenario: Scenario,
    length: usize,
    seed: Option<u64>,
    sensor_id: &str,
    sensor_type: SensorType,
    period_secs: Option<u32>,
) -> Result<()> {
    let mut generator = SyntheticGenerator::new(scenario, seed);
    let request = match period_secs {
        Some(secs) => generator.generate_request(
            sensor_id,
            sensor_type,
            length,
            chrono::Utc::now(),
            chrono::Duration::seconds(i64::from(secs)),
        )?,
        None => AnalysisRequest::new(sensor_id, sensor_type, &generator.generate(length)?),
    };
    info!(scenario = %scenario, length, "Generated synthetic request");
    println!("{}", serde_json::to_string(&request)?);
    Ok(())
}

fn run_report(analyzer: &SensorAnalyzer, input: &InputArgs, json: bool) -> Result<()> {
    let request = read_request(input)?;
    let detailed = analyzer
        .analyze_detailed(&request)
        .with_context(|| format!("Analysis failed for sensor {}", request.sensor_id))?;
    let summary =
        ReportSummary::build(&detailed.result, &detailed.series.values).with_dfa(&detailed.report.dfa);
    if json {
        println!("{}", summary.to_json()?);
    } else {
        print!("{}", summary.render_text());
    }
    Ok(())
}

struct MonitorOptions {
    scenario: Option<Scenario>,
    sensors: usize,
    ticks: Option<u64>,
    interval_ms: Option<u64>,
    seed: Option<u64>,
    stdin: bool,
    sensor_type: SensorType,
}

async fn run_monitors(config: QorsenseConfig, opts: MonitorOptions) -> Result<()> {
    if opts.sensors == 0 {
        anyhow::bail!("--sensors must be at least 1");
    }
    let scenario = opts.scenario.unwrap_or(config.monitor.scenario);
    let interval = Duration::from_millis(opts.interval_ms.unwrap_or(config.monitor.interval_ms).max(1));
    let seed = opts.seed.or(config.monitor.seed);

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, stopping monitors");
        shutdown_token.cancel();
    });

    let (result_tx, mut result_rx) = mpsc::channel::<AnalysisResult>(256);
    let mut task_set: JoinSet<(LiveMonitor, MonitorStats)> = JoinSet::new();

    for index in 0..opts.sensors {
        let sensor_id = format!("SIM-{:03}", index + 1);
        let source: Box<dyn SampleSource> = if opts.stdin && index == 0 {
            let (feed_tx, feed) = FeedSource::channel(config.monitor.buffer_capacity);
            spawn_stdin_feed(feed_tx);
            Box::new(feed)
        } else {
            let sensor_seed = seed.map(|s| s.wrapping_add(index as u64));
            Box::new(ScenarioSource::new(scenario, sensor_seed))
        };

        let analyzer = SensorAnalyzer::new(config.analysis.clone())
            .context("Invalid analysis thresholds")?;
        let mut monitor = LiveMonitor::new(
            &sensor_id,
            opts.sensor_type,
            analyzer,
            config.monitor.buffer_capacity,
            source,
        )
        .with_context(|| format!("Failed to create monitor {sensor_id}"))?;

        let mut driver = MonitorLoop::new(interval, cancel_token.child_token())
            .with_publisher(result_tx.clone());
        if let Some(ticks) = opts.ticks {
            driver = driver.with_max_ticks(ticks);
        }
        task_set.spawn(async move {
            let stats = driver.run(&mut monitor).await;
            (monitor, stats)
        });
    }
    // Printer ends once every monitor has dropped its publisher
    drop(result_tx);

    info!(
        sensors = opts.sensors,
        scenario = %scenario,
        interval_ms = interval.as_millis() as u64,
        "Monitors running"
    );

    while let Some(result) = result_rx.recv().await {
        println!("{}", serde_json::to_string(&result)?);
    }

    while let Some(joined) = task_set.join_next().await {
        match joined {
            Ok((monitor, stats)) => info!(
                sensor_id = %monitor.sensor_id(),
                ticks = stats.ticks,
                analyses = stats.analyses,
                failures = stats.failures,
                last_status = %monitor
                    .last_result()
                    .map_or_else(|| "none".to_string(), |r| r.status.to_string()),
                "Monitor finished"
            ),
            Err(e) => {
                error!("Monitor task panicked: {}", e);
                return Err(anyhow::anyhow!("Monitor task panicked: {e}"));
            }
        }
    }

    info!("QorSense monitor shutdown complete");
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.json_logs);

    let config = load_config(args.config.as_deref())?;

    match args.command {
        SubCommand::Analyze { input, pretty } => {
            let analyzer = SensorAnalyzer::new(config.analysis).context("Invalid analysis thresholds")?;
            run_analyze(&analyzer, &input, pretty)
        }
        SubCommand::Generate {
            scenario,
            length,
            seed,
            sensor_id,
            sensor_type,
            period_secs,
        } => run_generate(scenario, length, seed, &sensor_id, sensor_type, period_secs),
        SubCommand::Report { input, json } => {
            let analyzer = SensorAnalyzer::new(config.analysis).context("Invalid analysis thresholds")?;
            run_report(&analyzer, &input, json)
        }
        SubCommand::Monitor {
            scenario,
            sensors,
            ticks,
            interval_ms,
            seed,
            stdin,
            sensor_type,
        } => {
            let opts = MonitorOptions {
                scenario,
                sensors,
                ticks,
                interval_ms,
                seed,
                stdin,
                sensor_type,
            };
            run_monitors(config, opts).await
        }
    }
}
