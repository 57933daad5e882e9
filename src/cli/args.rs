// CLI argument definitions using Clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Progress indicator modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    Dots,
    Bar,
    None,
    Verbose,
}

impl std::str::FromStr for ProgressMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dots" => Ok(Self::Dots),
            "bar" => Ok(Self::Bar),
            "none" => Ok(Self::None),
            "verbose" => Ok(Self::Verbose),
            _ => Ok(Self::Bar),
        }
    }
}

/// Follow streamed JUnit XML test reports
#[derive(Parser, Debug)]
#[command(name = "makegood")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Follow JUnit XML reports while the test runner writes them", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose debug output
    #[arg(short = 'v', long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(short = 'c', long, global = true, default_value_t = false)]
    pub no_color: bool,

    /// Show current configuration and exit
    #[arg(long, default_value_t = false)]
    pub config: bool,

    /// Create default configuration file
    #[arg(long, value_name = "CONFIG_FILE")]
    pub init_config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Follow a report while another process writes it
    Watch(WatchArgs),

    /// Print the test runner command line for a project
    Command(CommandArgs),
}

#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// JUnit XML file being written by the test runner
    pub report: PathBuf,

    /// Stop waiting for more data after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Test identifiers the run is expected to cover
    #[arg(long = "target", value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Write the run summary as JSON
    #[arg(long, value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Progress display (bar, dots, verbose, none)
    #[arg(long)]
    pub progress: Option<String>,

    /// Reader poll interval in milliseconds
    #[arg(long, value_name = "MS")]
    pub poll_interval: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct CommandArgs {
    /// Project root the runner and prepare script are resolved against
    #[arg(long, default_value = ".")]
    pub project: PathBuf,

    /// Test files to run
    #[arg(required = true)]
    pub targets: Vec<String>,
}
