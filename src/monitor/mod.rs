//! Live monitor - per-sensor rolling analysis
//!
//! A `LiveMonitor` is an explicit, caller-owned object: one per sensor, with
//! its own rolling buffer, sample source, analyzer and last result. Nothing
//! is shared between monitors.
//!
//! State machine:
//! - `Start`: Idle → Running (buffer kept)
//! - `Stop`:  Running → Idle (buffer kept)
//! - `Clear`: any → Idle, buffer emptied, last result discarded
//!
//! While Running, each `tick()` takes one sample from the source, appends it
//! with FIFO eviction and, once `min_data_points` are buffered, re-runs the
//! analysis. The async driver lives in [`runner`].

mod runner;
mod source;

pub use runner::{spawn_monitor, MonitorLoop};
pub use source::{spawn_stdin_feed, FeedSource, SampleEvent, SampleSource, ScenarioSource};

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

use crate::analyzer::SensorAnalyzer;
use crate::config::QorsenseConfig;
use crate::processing::ValidationError;
use crate::sensors::Scenario;
use crate::types::{AnalysisResult, SensorType};

// ============================================================================
// Rolling Buffer
// ============================================================================

/// Fixed-capacity FIFO of the most recent readings.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingBuffer {
    values: VecDeque<f64>,
    capacity: usize,
}

impl RollingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a reading, returning the evicted oldest one when full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        let evicted = if self.values.len() >= self.capacity {
            self.values.pop_front()
        } else {
            None
        };
        self.values.push_back(value);
        evicted
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Oldest-first copy of the buffered readings.
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }
}

// ============================================================================
// State machine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitorState {
    Idle,
    Running,
}

impl std::fmt::Display for MonitorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorState::Idle => write!(f, "Idle"),
            MonitorState::Running => write!(f, "Running"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitorCommand {
    Start,
    Stop,
    Clear,
}

/// Counters kept per monitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorStats {
    /// Ticks handled while Running
    pub ticks: u64,
    /// Samples appended to the buffer
    pub samples: u64,
    /// Ticks with no sample available
    pub empty_ticks: u64,
    /// Analyses published
    pub analyses: u64,
    /// Analyses that failed validation
    pub failures: u64,
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Monitor is not running; nothing happened
    Idle,
    /// Source had nothing this tick; buffer untouched
    NoSample,
    /// Source is exhausted; the caller should stop ticking
    SourceExhausted,
    /// Sample appended but not enough data to analyze yet
    Buffering { len: usize, needed: usize },
    /// New result published
    Published(AnalysisResult),
    /// Analysis failed; logged and skipped
    Failed(ValidationError),
}

// ============================================================================
// Live Monitor
// ============================================================================

pub struct LiveMonitor {
    sensor_id: String,
    sensor_type: SensorType,
    state: MonitorState,
    buffer: RollingBuffer,
    analyzer: SensorAnalyzer,
    source: Box<dyn SampleSource>,
    last_result: Option<AnalysisResult>,
    stats: MonitorStats,
}

impl std::fmt::Debug for LiveMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveMonitor")
            .field("sensor_id", &self.sensor_id)
            .field("state", &self.state)
            .field("buffered", &self.buffer.len())
            .field("source", &self.source.source_name())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl LiveMonitor {
    /// Create an idle monitor with an empty buffer.
    ///
    /// The buffer must be able to hold `min_data_points` readings, otherwise
    /// the monitor could never analyze.
    pub fn new(
        sensor_id: impl Into<String>,
        sensor_type: SensorType,
        analyzer: SensorAnalyzer,
        capacity: usize,
        source: Box<dyn SampleSource>,
    ) -> Result<Self, ValidationError> {
        if capacity == 0 {
            return Err(ValidationError::InvalidLength(capacity));
        }
        let needed = analyzer.config().min_data_points;
        if capacity < needed {
            return Err(ValidationError::InvalidConfig(vec![format!(
                "buffer capacity {capacity} is smaller than min_data_points {needed}"
            )]));
        }
        Ok(Self {
            sensor_id: sensor_id.into(),
            sensor_type,
            state: MonitorState::Idle,
            buffer: RollingBuffer::new(capacity),
            analyzer,
            source,
            last_result: None,
            stats: MonitorStats::default(),
        })
    }

    /// Build a monitor fed by the configured scenario.
    pub fn from_config(
        sensor_id: impl Into<String>,
        sensor_type: SensorType,
        config: &QorsenseConfig,
    ) -> Result<Self, ValidationError> {
        let analyzer = SensorAnalyzer::new(config.analysis.clone())?;
        let source = ScenarioSource::new(config.monitor.scenario, config.monitor.seed);
        Self::new(
            sensor_id,
            sensor_type,
            analyzer,
            config.monitor.buffer_capacity,
            Box::new(source),
        )
    }

    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == MonitorState::Running
    }

    pub fn buffer(&self) -> &RollingBuffer {
        &self.buffer
    }

    pub fn last_result(&self) -> Option<&AnalysisResult> {
        self.last_result.as_ref()
    }

    pub fn stats(&self) -> &MonitorStats {
        &self.stats
    }

    pub fn source_name(&self) -> String {
        self.source.source_name()
    }

    /// Apply a state machine command.
    pub fn handle(&mut self, command: MonitorCommand) {
        let before = self.state;
        match command {
            MonitorCommand::Start => self.state = MonitorState::Running,
            MonitorCommand::Stop => self.state = MonitorState::Idle,
            MonitorCommand::Clear => {
                self.state = MonitorState::Idle;
                self.buffer.clear();
                self.last_result = None;
            }
        }
        if before != self.state || command == MonitorCommand::Clear {
            info!(
                sensor_id = %self.sensor_id,
                ?command,
                from = %before,
                to = %self.state,
                buffered = self.buffer.len(),
                "Monitor transition"
            );
        }
    }

    pub fn start(&mut self) {
        self.handle(MonitorCommand::Start);
    }

    pub fn stop(&mut self) {
        self.handle(MonitorCommand::Stop);
    }

    pub fn clear(&mut self) {
        self.handle(MonitorCommand::Clear);
    }

    /// Replace the sample source. Buffer and state are kept.
    pub fn set_source(&mut self, source: Box<dyn SampleSource>) {
        debug!(
            sensor_id = %self.sensor_id,
            from = %self.source.source_name(),
            to = %source.source_name(),
            "Monitor source replaced"
        );
        self.source = source;
    }

    /// Switch the simulated scenario for subsequent ticks.
    pub fn select_scenario(&mut self, scenario: Scenario, seed: Option<u64>) {
        self.set_source(Box::new(ScenarioSource::new(scenario, seed)));
    }

    /// Run one tick of the monitor.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != MonitorState::Running {
            return TickOutcome::Idle;
        }
        self.stats.ticks += 1;

        let value = match self.source.next_sample() {
            SampleEvent::Sample(value) => value,
            SampleEvent::Pending => {
                self.stats.empty_ticks += 1;
                debug!(sensor_id = %self.sensor_id, "No sample available this tick");
                return TickOutcome::NoSample;
            }
            SampleEvent::Exhausted => {
                info!(sensor_id = %self.sensor_id, source = %self.source.source_name(), "Sample source exhausted");
                return TickOutcome::SourceExhausted;
            }
        };

        self.buffer.push(value);
        self.stats.samples += 1;

        let needed = self.analyzer.config().min_data_points;
        if self.buffer.len() < needed {
            return TickOutcome::Buffering {
                len: self.buffer.len(),
                needed,
            };
        }

        match self
            .analyzer
            .analyze_values(&self.sensor_id, self.sensor_type, &self.buffer.to_vec())
        {
            Ok(result) => {
                self.stats.analyses += 1;
                self.last_result = Some(result.clone());
                TickOutcome::Published(result)
            }
            Err(e) => {
                self.stats.failures += 1;
                warn!(sensor_id = %self.sensor_id, error = %e, "Live analysis failed; skipping tick");
                TickOutcome::Failed(e)
            }
        }
    }
}
