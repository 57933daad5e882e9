// Console reporter - live progress and a final summary on stdout

use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use super::{RunObserver, RunStatus, RunSummary};
use crate::cli::ProgressMode;
use crate::state::{Progress, TestCaseResult, TestStatus};

const RULE: &str =
    "════════════════════════════════════════════════════════════════════════════════";
const THIN_RULE: &str =
    "────────────────────────────────────────────────────────────────────────────────";

/// Console reporter
pub struct ConsoleReporter {
    mode: ProgressMode,
    progress_bar: ProgressBar,
    dots_lock: Mutex<()>,
    dots_count: AtomicUsize,
}

impl ConsoleReporter {
    /// Create new console reporter
    pub fn new(mode: ProgressMode) -> Self {
        // Length is unknown until the report announces its plan.
        let progress_bar = if matches!(mode, ProgressMode::Bar) {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
            {
                pb.set_style(style);
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        Self {
            mode,
            progress_bar,
            dots_lock: Mutex::new(()),
            dots_count: AtomicUsize::new(0),
        }
    }

    fn print_dot(&self, status: TestStatus) {
        let symbol = match status {
            TestStatus::Passed => ".",
            TestStatus::Failed => "F",
            TestStatus::Errored => "E",
            TestStatus::Pending => "?",
        };

        let _guard = self.dots_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "{}", symbol);
        let _ = stdout.flush();

        let count = self.dots_count.fetch_add(1, Ordering::Relaxed) + 1;
        if count >= 80 {
            let _ = writeln!(stdout);
            self.dots_count.store(0, Ordering::Relaxed);
        }
    }

    /// Print summary
    pub fn print_summary(&self, summary: &RunSummary) {
        self.progress_bar.finish_and_clear();
        if matches!(self.mode, ProgressMode::Dots) && self.dots_count.load(Ordering::Relaxed) > 0 {
            println!();
        }

        let progress = &summary.progress;
        let passed = progress
            .completed
            .saturating_sub(progress.failures + progress.errors);

        println!();
        println!("{}", RULE);
        match summary.status {
            RunStatus::Aborted => println!(
                "{}",
                style(format!(
                    "💥 ABORTED ({} of {} completed in {}ms)",
                    progress.completed,
                    progress
                        .total
                        .map_or_else(|| "?".to_string(), |t| t.to_string()),
                    progress.elapsed_ms
                ))
                .red()
                .bold()
            ),
            RunStatus::Failed => println!(
                "{}",
                style(format!(
                    "❌ FAILED ({} failed, {} errors, {} passed in {}ms)",
                    progress.failures, progress.errors, passed, progress.elapsed_ms
                ))
                .red()
            ),
            RunStatus::Passed => println!(
                "{}",
                style(format!(
                    "✅ PASSED ({} passed in {}ms)",
                    passed, progress.elapsed_ms
                ))
                .green()
            ),
        }
        println!("{}", THIN_RULE);
        println!("📊 Execution Statistics:");
        match progress.total {
            Some(total) => println!("   • Planned tests: {}", total),
            None => println!("   • Planned tests: not announced"),
        }
        println!("   • Completed: {}", progress.completed);
        println!("   • Passed: {}", passed);
        println!("   • Failed: {}", progress.failures);
        println!("   • Errors: {}", progress.errors);
        if progress.suite_failures > 0 {
            println!("   • Suite failures: {}", progress.suite_failures);
        }
        println!("   • Duration: {}ms", progress.elapsed_ms);

        if let Some(reason) = &summary.abort_reason {
            println!("   • Aborted: {}", reason);
        }

        if !summary.failures.is_empty() {
            println!("{}", THIN_RULE);
            println!("❌ Failed Tests:");
            for failure in &summary.failures {
                let mut line = format!("{} ({}ms)", failure.name, failure.time.as_millis());
                if let Some(file) = &failure.file {
                    line.push_str(&format!(" [{}]", file));
                }
                println!("   • {}", line);
                if let Some(message) = &failure.message {
                    println!("      {}", message.lines().next().unwrap_or_default());
                }
            }
        }

        if !summary.uncovered_targets.is_empty() {
            println!("⚠️  Targets without results:");
            for target in &summary.uncovered_targets {
                println!("   • {}", target);
            }
        }

        println!("{}", RULE);
        println!();
    }
}

impl RunObserver for ConsoleReporter {
    fn on_plan(&self, total: usize) {
        self.progress_bar.set_length(total as u64);
    }

    fn on_case_start(&self, case: &TestCaseResult) {
        match self.mode {
            ProgressMode::Bar => self.progress_bar.set_message(case.name.clone()),
            ProgressMode::Verbose => print!("Testing {} ... ", case.name),
            ProgressMode::Dots | ProgressMode::None => {}
        }
    }

    fn on_case_end(&self, case: &TestCaseResult, progress: &Progress) {
        match self.mode {
            ProgressMode::Bar => self.progress_bar.set_position(progress.completed() as u64),
            ProgressMode::Dots => self.print_dot(case.status),
            ProgressMode::Verbose => match case.status {
                TestStatus::Failed | TestStatus::Errored => println!(
                    "❌ {}: {}",
                    if case.status == TestStatus::Failed {
                        "FAIL"
                    } else {
                        "ERROR"
                    },
                    case.failure
                        .as_ref()
                        .and_then(|f| f.message.as_deref())
                        .unwrap_or("no message")
                ),
                _ => println!("✅ PASS ({}ms)", case.time.as_millis()),
            },
            ProgressMode::None => {}
        }
    }

    fn on_run_end(&self, summary: &RunSummary) -> anyhow::Result<()> {
        self.print_summary(summary);
        Ok(())
    }
}
