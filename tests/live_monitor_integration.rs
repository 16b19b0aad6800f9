//! Live monitor integration tests
//!
//! Drive `MonitorLoop` on real tokio timers with short intervals and check
//! publishing, cancellation, feed exhaustion and scenario switching.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use qorsense::monitor::{spawn_monitor, FeedSource, ScenarioSource};
use qorsense::{
    AnalysisResult, HealthStatus, LiveMonitor, MonitorLoop, MonitorState, QorsenseConfig, Scenario,
    SensorAnalyzer, SensorType,
};

const FAST: Duration = Duration::from_millis(1);

fn seeded_config(scenario: Scenario, seed: u64) -> QorsenseConfig {
    let mut config = QorsenseConfig::default();
    config.monitor.scenario = scenario;
    config.monitor.seed = Some(seed);
    config
}

fn drain(rx: &mut mpsc::Receiver<AnalysisResult>) -> Vec<AnalysisResult> {
    let mut results = Vec::new();
    while let Ok(result) = rx.try_recv() {
        results.push(result);
    }
    results
}

#[tokio::test]
async fn publishes_once_buffer_reaches_min_points() {
    let config = seeded_config(Scenario::Normal, 42);
    let mut monitor = LiveMonitor::from_config("FT-101", SensorType::Flow, &config).expect("valid");
    let (tx, mut rx) = mpsc::channel(128);

    let stats = MonitorLoop::new(FAST, CancellationToken::new())
        .with_publisher(tx)
        .with_max_ticks(60)
        .run(&mut monitor)
        .await;

    // Ticks 50..=60 each publish
    assert_eq!(stats.ticks, 60);
    assert_eq!(stats.samples, 60);
    assert_eq!(stats.analyses, 11);
    assert_eq!(stats.failures, 0);

    let results = drain(&mut rx);
    assert_eq!(results.len(), 11);
    assert!(results.iter().all(|r| r.sensor_id == "FT-101"));

    // Loop leaves the monitor stopped with its buffer intact
    assert_eq!(monitor.state(), MonitorState::Idle);
    assert_eq!(monitor.buffer().len(), 60);
    assert_eq!(monitor.last_result(), results.last());
}

#[tokio::test]
async fn cancellation_stops_the_loop() {
    let config = seeded_config(Scenario::Noisy, 3);
    let monitor = LiveMonitor::from_config("PT-7", SensorType::Pressure, &config).expect("valid");
    let cancel = CancellationToken::new();

    let handle = spawn_monitor(monitor, MonitorLoop::new(Duration::from_millis(2), cancel.clone()));
    tokio::time::sleep(Duration::from_millis(40)).await;
    cancel.cancel();

    let (monitor, stats) = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop exits promptly after cancel")
        .expect("task did not panic");
    assert!(stats.ticks > 0);
    assert_eq!(monitor.state(), MonitorState::Idle);
    assert_eq!(monitor.buffer().len() as u64, stats.samples.min(100));
}

#[test]
fn cancelled_before_start_runs_no_ticks() {
    let config = seeded_config(Scenario::Normal, 1);
    let mut monitor = LiveMonitor::from_config("TT-1", SensorType::Temperature, &config).expect("valid");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime");
    let stats = runtime.block_on(MonitorLoop::new(FAST, cancel).run(&mut monitor));
    assert_eq!(stats.ticks, 0);
    assert!(monitor.buffer().is_empty());
}

#[tokio::test]
async fn zero_tick_limit_runs_no_ticks() {
    let config = seeded_config(Scenario::Normal, 4);
    let mut monitor = LiveMonitor::from_config("TT-0", SensorType::Temperature, &config).expect("valid");

    let stats = MonitorLoop::new(FAST, CancellationToken::new())
        .with_max_ticks(0)
        .run(&mut monitor)
        .await;
    assert_eq!(stats.ticks, 0);
    assert_eq!(stats.samples, 0);
    assert!(monitor.buffer().is_empty());
    assert_eq!(monitor.state(), MonitorState::Idle);
}

#[tokio::test]
async fn parent_token_stops_every_monitor() {
    let parent = CancellationToken::new();
    let handles: Vec<_> = (0..3u64)
        .map(|i| {
            let config = seeded_config(Scenario::Oscillation, i);
            let monitor = LiveMonitor::from_config(format!("SIM-{i}"), SensorType::Generic, &config)
                .expect("valid");
            spawn_monitor(monitor, MonitorLoop::new(Duration::from_millis(2), parent.child_token()))
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(20)).await;
    parent.cancel();

    for handle in handles {
        let (monitor, _) = tokio_test::assert_ok!(handle.await);
        assert!(!monitor.is_running());
    }
}

#[tokio::test]
async fn feed_source_drains_then_exhausts() {
    let (feed_tx, feed) = FeedSource::channel(64);
    for i in 0..55 {
        feed_tx.send(20.0 + 0.01 * f64::from(i)).await.expect("feed open");
    }
    drop(feed_tx);

    let analyzer = SensorAnalyzer::default();
    let mut monitor =
        LiveMonitor::new("LT-9", SensorType::Generic, analyzer, 100, Box::new(feed)).expect("valid");
    let (tx, mut rx) = mpsc::channel(16);

    // No tick limit: the loop ends on exhaustion
    let stats = tokio::time::timeout(
        Duration::from_secs(5),
        MonitorLoop::new(FAST, CancellationToken::new())
            .with_publisher(tx)
            .run(&mut monitor),
    )
    .await
    .expect("loop ends when the feed is exhausted");

    assert_eq!(stats.samples, 55);
    assert_eq!(stats.analyses, 6);
    assert_eq!(drain(&mut rx).len(), 6);
    assert_eq!(monitor.source_name(), "feed");
}

#[tokio::test]
async fn empty_feed_leaves_buffer_untouched() {
    let (_feed_tx, feed) = FeedSource::channel(4);
    let mut monitor =
        LiveMonitor::new("LT-2", SensorType::Generic, SensorAnalyzer::default(), 100, Box::new(feed))
            .expect("valid");

    let stats = MonitorLoop::new(FAST, CancellationToken::new())
        .with_max_ticks(5)
        .run(&mut monitor)
        .await;
    assert_eq!(stats.ticks, 5);
    assert_eq!(stats.empty_ticks, 5);
    assert!(monitor.buffer().is_empty());
}

#[tokio::test]
async fn live_ticks_follow_the_selected_scenario() {
    let config = seeded_config(Scenario::Normal, 11);
    let mut monitor = LiveMonitor::from_config("FT-3", SensorType::Flow, &config).expect("valid");

    MonitorLoop::new(FAST, CancellationToken::new())
        .with_max_ticks(60)
        .run(&mut monitor)
        .await;
    let before = monitor.last_result().cloned().expect("published");
    assert!(before.metrics.slope.abs() < 0.05, "{}", before.metrics.slope);

    monitor.select_scenario(Scenario::Drifting, Some(11));
    assert_eq!(monitor.source_name(), "scenario:Drifting");

    // Enough ticks to flush every Normal sample from the 100-sample buffer
    MonitorLoop::new(FAST, CancellationToken::new())
        .with_max_ticks(150)
        .run(&mut monitor)
        .await;
    let after = monitor.last_result().expect("published");
    assert!((after.metrics.slope - 0.075).abs() < 0.01, "{}", after.metrics.slope);
    assert!(after.has_flag("SLOPE_WARNING"));
    assert_eq!(after.status, HealthStatus::Red);
}

#[tokio::test]
async fn clear_discards_buffer_and_result() {
    let config = seeded_config(Scenario::Normal, 5);
    let mut monitor = LiveMonitor::from_config("FT-8", SensorType::Flow, &config).expect("valid");
    MonitorLoop::new(FAST, CancellationToken::new())
        .with_max_ticks(55)
        .run(&mut monitor)
        .await;
    assert!(monitor.last_result().is_some());

    monitor.clear();
    assert_eq!(monitor.state(), MonitorState::Idle);
    assert!(monitor.buffer().is_empty());
    assert!(monitor.last_result().is_none());

    // Restart buffers from scratch
    let stats = MonitorLoop::new(FAST, CancellationToken::new())
        .with_max_ticks(10)
        .run(&mut monitor)
        .await;
    assert_eq!(monitor.buffer().len(), 10);
    assert_eq!(stats.ticks, 65);
    assert!(monitor.last_result().is_none());
}

#[test]
fn scenario_source_feeds_a_manual_tick_loop() {
    // The loop is optional; ticks can be driven directly
    let analyzer = SensorAnalyzer::default();
    let source = ScenarioSource::new(Scenario::Noisy, Some(2));
    let mut monitor = LiveMonitor::new("MAN-1", SensorType::Generic, analyzer, 50, Box::new(source))
        .expect("valid");
    monitor.start();
    let published = (0..120)
        .map(|_| monitor.tick())
        .filter(|outcome| matches!(outcome, qorsense::monitor::TickOutcome::Published(_)))
        .count();
    assert_eq!(published, 71);
    let result = monitor.last_result().expect("published");
    assert!(result.has_flag("NOISE_CRITICAL"));
}

#[test]
fn block_on_runs_a_bounded_loop() {
    let config = seeded_config(Scenario::Normal, 9);
    let mut monitor = LiveMonitor::from_config("TT-3", SensorType::Temperature, &config).expect("valid");
    let stats = tokio_test::block_on(
        MonitorLoop::new(FAST, CancellationToken::new())
            .with_max_ticks(3)
            .run(&mut monitor),
    );
    assert_eq!(stats.ticks, 3);
    assert_eq!(monitor.buffer().len(), 3);
}
