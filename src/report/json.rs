// JSON reporter - writes the run summary to a JSON file

use super::{RunObserver, RunSummary};
use anyhow::{Context, Result};
use std::fs::File;
use std::path::PathBuf;

/// JSON reporter
pub struct JsonReporter {
    output_path: PathBuf,
}

impl JsonReporter {
    /// Create new JSON reporter
    pub fn new(output_path: PathBuf) -> Self {
        Self { output_path }
    }
}

impl RunObserver for JsonReporter {
    fn on_run_end(&self, summary: &RunSummary) -> Result<()> {
        let file = File::create(&self.output_path).with_context(|| {
            format!(
                "Failed to create JSON report file: {}",
                self.output_path.display()
            )
        })?;

        serde_json::to_writer_pretty(file, summary)
            .context("Failed to serialize run summary to JSON")?;

        Ok(())
    }
}
