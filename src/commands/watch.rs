// Watch command - follow a report written by another process

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::cli::args::WatchArgs;
use crate::cli::ProgressMode;
use crate::config::Config;
use crate::lifecycle::{Launch, ProcessExit, TestLifecycle};
use crate::report::{ConsoleReporter, JsonReporter, RunObserver, RunStatus, RunSummary};

/// Follow the report until its root element closes, reading fails, or the
/// timeout expires. Returns the final summary.
pub fn handle_watch(args: &WatchArgs, config: &Config) -> Result<RunSummary> {
    let poll_interval = args
        .poll_interval
        .map(|ms| Duration::from_millis(ms.max(1)))
        .unwrap_or_else(|| config.reader.poll_interval());
    let mode: ProgressMode = args
        .progress
        .as_deref()
        .unwrap_or(config.progress.mode.as_str())
        .parse()
        .unwrap_or(ProgressMode::Bar);

    let mut observers: Vec<Box<dyn RunObserver>> = vec![Box::new(ConsoleReporter::new(mode))];
    if let Some(path) = &args.json {
        observers.push(Box::new(JsonReporter::new(path.clone())));
    }

    let launch = Arc::new(Launch::new(&args.report).with_targets(args.targets.iter().cloned()));
    let mut lifecycle = TestLifecycle::with_poll_interval(poll_interval);
    lifecycle
        .start(Arc::clone(&launch), observers)
        .with_context(|| format!("Failed to watch {}", args.report.display()))?;

    let deadline = args
        .timeout
        .map(|secs| Instant::now() + Duration::from_secs(secs));

    loop {
        lifecycle.poll();
        if lifecycle.is_reader_finished() {
            break;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            info!("Timeout reached, treating the runner as finished");
            break;
        }
        std::thread::sleep(poll_interval);
    }

    lifecycle.end(ProcessExit::Unknown);

    let summary = RunSummary::from_lifecycle(&lifecycle);
    if summary.status == RunStatus::Aborted {
        warn!(
            "Test run aborted: {}",
            summary.abort_reason.as_deref().unwrap_or("unknown reason")
        );
    }
    Ok(summary)
}
