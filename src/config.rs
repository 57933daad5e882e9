// Configuration file handling

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub reader: ReaderConfig,

    #[serde(default)]
    pub launch: LaunchConfig,

    #[serde(default)]
    pub progress: ProgressConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Delay between attempts to read more of the report (milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl ReaderConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Test runner executable, relative to the project root
    #[serde(default = "default_test_runner")]
    pub test_runner: String,

    /// Script the runner loads before the tests (`-p`), relative to the project root
    #[serde(default = "default_prepare_script")]
    pub prepare_script: String,

    /// Directory for streamed reports (system temp dir when unset)
    #[serde(default)]
    pub junit_xml_dir: Option<String>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            test_runner: default_test_runner(),
            prepare_script: default_prepare_script(),
            junit_xml_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Progress indicator mode
    #[serde(default = "default_progress")]
    pub mode: String,

    /// Enable colored output
    #[serde(default = "default_color")]
    pub color: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            mode: default_progress(),
            color: default_color(),
        }
    }
}

// Default values
pub const CONFIG_FILE_NAME: &str = ".makegoodrc.toml";

pub fn default_poll_interval_ms() -> u64 {
    100
}

pub fn default_test_runner() -> String {
    String::from("bin/testrunner")
}

pub fn default_prepare_script() -> String {
    String::from("tests/prepare.php")
}

fn default_progress() -> String {
    String::from("bar")
}

fn default_color() -> bool {
    true
}

impl Config {
    /// Load configuration from default locations
    pub fn load() -> Option<Self> {
        // Check locations in order:
        // 1. .makegoodrc.toml (current directory)
        // 2. ~/.makegoodrc.toml (home directory)

        let cwd = std::env::current_dir().ok()?;
        let mut paths = vec![cwd.join(CONFIG_FILE_NAME)];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(CONFIG_FILE_NAME));
        }

        for path in &paths {
            if path.exists() {
                return Self::load_from_file(path);
            }
        }

        None
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Option<Self> {
        toml::from_str(content).ok()
    }

    /// Generate default configuration as TOML
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_else(|_| String::new())
    }
}
