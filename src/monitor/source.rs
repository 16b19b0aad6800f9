//! Sample source abstraction for the live monitor.
//!
//! A source hands the monitor at most one sample per tick. Sources never
//! block: a tick with nothing available reports `Pending` and the buffer is
//! left untouched.

use tokio::sync::mpsc;

use crate::sensors::{Scenario, SyntheticGenerator};

/// Result of asking a source for the next sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleEvent {
    /// A new reading.
    Sample(f64),
    /// Nothing available this tick.
    Pending,
    /// The source will never produce another sample.
    Exhausted,
}

/// Where live readings come from.
pub trait SampleSource: Send + 'static {
    /// Take the next sample without waiting.
    fn next_sample(&mut self) -> SampleEvent;

    /// Human-readable name for logging (e.g. "scenario:Drifting", "feed").
    fn source_name(&self) -> String;
}

// ============================================================================
// Scenario Source (synthetic generator)
// ============================================================================

/// Streams the selected synthetic scenario, one sample per tick.
#[derive(Debug, Clone)]
pub struct ScenarioSource {
    generator: SyntheticGenerator,
}

impl ScenarioSource {
    pub fn new(scenario: Scenario, seed: Option<u64>) -> Self {
        Self {
            generator: SyntheticGenerator::new(scenario, seed),
        }
    }

    pub fn scenario(&self) -> Scenario {
        self.generator.scenario()
    }
}

impl SampleSource for ScenarioSource {
    fn next_sample(&mut self) -> SampleEvent {
        SampleEvent::Sample(self.generator.next_value())
    }

    fn source_name(&self) -> String {
        format!("scenario:{}", self.generator.scenario())
    }
}

// ============================================================================
// Feed Source (external readings over a channel)
// ============================================================================

/// Drains readings pushed by an external producer.
///
/// Each tick consumes at most one queued reading. Once every sender is
/// dropped and the queue is empty the source is exhausted.
#[derive(Debug)]
pub struct FeedSource {
    rx: mpsc::Receiver<f64>,
}

impl FeedSource {
    pub fn new(rx: mpsc::Receiver<f64>) -> Self {
        Self { rx }
    }

    /// Create a feed and the sender that fills it.
    pub fn channel(capacity: usize) -> (mpsc::Sender<f64>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self::new(rx))
    }
}

impl SampleSource for FeedSource {
    fn next_sample(&mut self) -> SampleEvent {
        match self.rx.try_recv() {
            Ok(value) => SampleEvent::Sample(value),
            Err(mpsc::error::TryRecvError::Empty) => SampleEvent::Pending,
            Err(mpsc::error::TryRecvError::Disconnected) => SampleEvent::Exhausted,
        }
    }

    fn source_name(&self) -> String {
        "feed".to_string()
    }
}

// ============================================================================
// Stdin feed (one reading per line)
// ============================================================================

/// Spawn a task that reads one reading per line from stdin into `tx`.
///
/// Used with the simulation binary:
/// `simulation --scenario Drifting | qorsense monitor --stdin`
///
/// Malformed lines are logged and skipped. The task ends at EOF or when the
/// feed is dropped, which exhausts the matching `FeedSource`.
pub fn spawn_stdin_feed(tx: mpsc::Sender<f64>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        use tokio::io::AsyncBufReadExt;
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin feed read failed");
                    break;
                }
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match parse_feed_line(line) {
                Some(value) => {
                    if tx.send(value).await.is_err() {
                        break;
                    }
                }
                None => tracing::warn!(line = %line, "Skipping malformed feed line"),
            }
        }
        tracing::debug!("stdin feed closed");
    })
}

/// Parse a feed line: either a bare number or `timestamp,value`.
fn parse_feed_line(line: &str) -> Option<f64> {
    line.rsplit(',').next()?.trim().parse().ok()
}
