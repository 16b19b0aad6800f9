//! Sensor Sample Simulation
//!
//! Streams synthetic sensor readings, one per line, for feeding the live
//! monitor or building test files. Scenarios:
//! - Normal: baseline 10 with bounded gaussian noise (σ 0.5)
//! - Drifting: normal plus a 0.075/sample ramp
//! - Noisy: baseline with heavy noise (σ 3.0)
//! - Oscillation: baseline plus a 5-unit sine swing, period 12.5 samples
//!
//! # Usage
//! ```bash
//! ./simulation --scenario drifting --interval-ms 100 | ./qorsense monitor --stdin
//! ./simulation --scenario noisy --length 500 --timestamps --interval-ms 0 > noisy.csv
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use qorsense::{Scenario, SyntheticGenerator};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "simulation")]
#[command(about = "Synthetic sensor sample stream for QorSense testing")]
#[command(version)]
struct Args {
    /// Normal, Drifting, Noisy or Oscillation (case-insensitive)
    #[arg(short, long, default_value = "Normal")]
    scenario: Scenario,

    /// Number of samples to emit (default: stream until interrupted)
    #[arg(short, long)]
    length: Option<u64>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Delay between samples in milliseconds (0 = no delay)
    #[arg(short, long, default_value_t = 1000)]
    interval_ms: u64,

    /// Prefix each sample with an RFC 3339 timestamp (`timestamp,value`)
    #[arg(short, long)]
    timestamps: bool,

    /// Suppress the stderr banner
    #[arg(short, long)]
    quiet: bool,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();

    let mut generator = SyntheticGenerator::new(args.scenario, args.seed);
    let interval = Duration::from_millis(args.interval_ms);
    // Timestamps advance by the nominal interval, or one second when unthrottled
    let step = chrono::Duration::milliseconds(i64::try_from(args.interval_ms.max(1_000)).unwrap_or(1_000));
    let start = chrono::Utc::now();

    if !args.quiet {
        eprintln!("QorSense sample simulation");
        eprintln!("  Scenario: {}", args.scenario);
        match args.length {
            Some(length) => eprintln!("  Samples:  {length}"),
            None => eprintln!("  Samples:  unbounded"),
        }
        eprintln!("  Interval: {} ms", args.interval_ms);
        if let Some(seed) = args.seed {
            eprintln!("  Seed:     {seed}");
        }
    }

    let started = Instant::now();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut emitted: u64 = 0;

    while args.length.map_or(true, |length| emitted < length) {
        let tick = Instant::now();
        let value = generator.next_value();

        let written = if args.timestamps {
            let offset = i32::try_from(emitted).map(|n| step * n).unwrap_or(step);
            writeln!(out, "{},{value:.6}", (start + offset).to_rfc3339())
        } else {
            writeln!(out, "{value:.6}")
        };
        match written.and_then(|()| out.flush()) {
            Ok(()) => {}
            // Downstream closed (e.g. the monitor stopped)
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => break,
            Err(e) => return Err(e).context("Failed to write sample"),
        }
        emitted += 1;

        if !interval.is_zero() {
            let elapsed = tick.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
    }

    if !args.quiet {
        eprintln!(
            "Emitted {emitted} samples in {:.1}s",
            started.elapsed().as_secs_f64()
        );
    }
    Ok(())
}
