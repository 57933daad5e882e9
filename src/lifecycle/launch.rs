// Launch - identity and command line of one test runner invocation

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::LaunchConfig;

/// One invocation of the test runner.
///
/// Shared as `Arc<Launch>` between the collaborator that spawns the process
/// and the [`TestLifecycle`](crate::lifecycle::TestLifecycle) ingesting its
/// report; identity is the allocation, not the contents.
#[derive(Debug)]
pub struct Launch {
    id: Uuid,
    created_at: DateTime<Utc>,
    junit_xml_file: PathBuf,
    test_runner: Option<PathBuf>,
    prepare_script: Option<PathBuf>,
    targets: Vec<String>,
}

impl Launch {
    /// A launch known only by the report it writes
    pub fn new(junit_xml_file: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            junit_xml_file: junit_xml_file.into(),
            test_runner: None,
            prepare_script: None,
            targets: Vec::new(),
        }
    }

    /// Resolve the runner, prepare script and report path for a project
    pub fn from_config(
        config: &LaunchConfig,
        project_root: &Path,
        targets: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let id = Uuid::new_v4();
        let report_dir = config
            .junit_xml_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        Self {
            id,
            created_at: Utc::now(),
            junit_xml_file: report_dir.join(format!("makegood-{}.xml", id)),
            test_runner: Some(project_root.join(&config.test_runner)),
            prepare_script: Some(project_root.join(&config.prepare_script)),
            targets: targets
                .into_iter()
                .map(|t| resolve(project_root, t.into()))
                .collect(),
        }
    }

    pub fn with_targets(mut self, targets: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.targets.extend(targets.into_iter().map(Into::into));
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Where the runner streams its JUnit XML
    pub fn junit_xml_file(&self) -> &Path {
        &self.junit_xml_file
    }

    pub fn test_runner(&self) -> Option<&Path> {
        self.test_runner.as_deref()
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Runner arguments: `-p <prepare script> <target>...`
    pub fn arguments(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(prepare) = &self.prepare_script {
            args.push("-p".to_string());
            args.push(prepare.to_string_lossy().into_owned());
        }
        args.extend(self.targets.iter().cloned());
        args
    }

    /// Printable command line, if a runner is known
    pub fn command_line(&self) -> Option<String> {
        let runner = self.test_runner.as_ref()?;
        let mut line = runner.to_string_lossy().into_owned();
        for arg in self.arguments() {
            line.push(' ');
            line.push_str(&arg);
        }
        Some(line)
    }
}

fn resolve(project_root: &Path, target: String) -> String {
    let path = Path::new(&target);
    if path.is_absolute() {
        target
    } else {
        project_root.join(path).to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LaunchConfig {
        LaunchConfig {
            test_runner: "bin/testrunner".to_string(),
            prepare_script: "tests/prepare.php".to_string(),
            junit_xml_dir: Some("/tmp/reports".to_string()),
        }
    }

    #[test]
    fn test_arguments_follow_runner_convention() {
        let launch = Launch::from_config(&config(), Path::new("/project"), ["tests/FooTest.php"]);
        assert_eq!(
            launch.arguments(),
            vec![
                "-p".to_string(),
                "/project/tests/prepare.php".to_string(),
                "/project/tests/FooTest.php".to_string(),
            ]
        );
        assert_eq!(launch.test_runner(), Some(Path::new("/project/bin/testrunner")));
    }

    #[test]
    fn test_report_file_is_unique_per_launch() {
        let first = Launch::from_config(&config(), Path::new("/project"), ["a"]);
        let second = Launch::from_config(&config(), Path::new("/project"), ["a"]);
        assert_ne!(first.junit_xml_file(), second.junit_xml_file());
        assert!(first.junit_xml_file().starts_with("/tmp/reports"));
    }

    #[test]
    fn test_report_only_launch_has_no_command() {
        let launch = Launch::new("/tmp/report.xml").with_targets(["FooTest"]);
        assert!(launch.command_line().is_none());
        assert_eq!(launch.arguments(), vec!["FooTest".to_string()]);
    }
}
