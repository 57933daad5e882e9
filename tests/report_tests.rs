// Tests for run observers and the run summary - public API only

use makegood::cli::args::ProgressMode;
use makegood::lifecycle::{Launch, ProcessExit, TestLifecycle};
use makegood::report::{ConsoleReporter, JsonReporter, RunObserver, RunStatus, RunSummary};
use std::sync::Arc;
use std::time::{Duration, Instant};

const REPORT: &str = r#"<testsuite name="FooTest" file="/app/tests/FooTest.php" tests="2">
  <testcase name="testOne" file="/app/tests/FooTest.php"/>
  <testcase name="testTwo" file="/app/tests/FooTest.php">
    <failure message="expected 1, got 2"/>
  </testcase>
</testsuite>
"#;

fn finished_run() -> TestLifecycle {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("junit.xml");
    std::fs::write(&path, REPORT).expect("write report");

    let mut lifecycle = TestLifecycle::with_poll_interval(Duration::from_millis(10));
    lifecycle
        .start(Arc::new(Launch::new(&path)), Vec::new())
        .expect("lifecycle starts");
    let deadline = Instant::now() + Duration::from_secs(5);
    while !lifecycle.is_reader_finished() && Instant::now() < deadline {
        lifecycle.poll();
        std::thread::sleep(Duration::from_millis(10));
    }
    lifecycle.end(ProcessExit::Code(1));
    lifecycle
}

#[test]
fn test_progress_mode_from_str() {
    // Arrange & Act
    let modes: Vec<ProgressMode> = ["dots", "bar", "none", "verbose"]
        .iter()
        .map(|s| s.parse().unwrap_or(ProgressMode::Bar))
        .collect();

    // Assert
    assert_eq!(
        modes,
        vec![
            ProgressMode::Dots,
            ProgressMode::Bar,
            ProgressMode::None,
            ProgressMode::Verbose
        ]
    );
}

#[test]
fn test_progress_mode_from_str_invalid_falls_back_to_bar() {
    let mode: ProgressMode = "sparkles".parse().unwrap_or(ProgressMode::None);
    assert_eq!(mode, ProgressMode::Bar);
}

#[test]
fn test_summary_of_idle_lifecycle() {
    // Arrange
    let mut lifecycle = TestLifecycle::new();
    lifecycle.end(ProcessExit::Unknown);

    // Act
    let summary = RunSummary::from_lifecycle(&lifecycle);

    // Assert
    assert_eq!(summary.status, RunStatus::Passed);
    assert!(summary.launch_id.is_none());
    assert!(summary.failures.is_empty());
    assert!(summary.results.is_empty());
}

#[test]
fn test_summary_of_failed_run() {
    // Arrange & Act
    let lifecycle = finished_run();
    let summary = RunSummary::from_lifecycle(&lifecycle);

    // Assert: the failing exit status marks the run aborted on top of its failures
    assert_eq!(summary.status, RunStatus::Aborted);
    assert!(summary.has_failures);
    assert_eq!(summary.progress.completed, 2);
    assert_eq!(summary.progress.failures, 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].name, "testTwo");
    assert_eq!(
        summary.failures[0].message.as_deref(),
        Some("expected 1, got 2")
    );
}

#[test]
fn test_json_reporter_writes_summary() {
    // Arrange
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("summary.json");
    let lifecycle = finished_run();
    let summary = RunSummary::from_lifecycle(&lifecycle);

    // Act
    JsonReporter::new(output.clone())
        .on_run_end(&summary)
        .expect("summary written");

    // Assert
    let content = std::fs::read_to_string(&output).expect("read summary");
    let json: serde_json::Value = serde_json::from_str(&content).expect("valid JSON");
    assert_eq!(json["status"], "aborted");
    assert_eq!(json["has_failures"], true);
    assert_eq!(json["progress"]["completed"], 2);
    assert_eq!(json["failures"][0]["name"], "testTwo");
}

#[test]
fn test_json_reporter_reports_unwritable_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let reporter = JsonReporter::new(dir.path().join("missing").join("summary.json"));
    let mut lifecycle = TestLifecycle::new();
    lifecycle.end(ProcessExit::Unknown);

    let result = reporter.on_run_end(&RunSummary::from_lifecycle(&lifecycle));

    assert!(result.is_err());
}

#[test]
fn test_console_reporter_quiet_mode_succeeds() {
    let lifecycle = finished_run();
    let summary = RunSummary::from_lifecycle(&lifecycle);

    let reporter = ConsoleReporter::new(ProgressMode::None);

    assert!(reporter.on_run_end(&summary).is_ok());
}
