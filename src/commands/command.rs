// Command command - show how the test runner would be invoked

use anyhow::{Result, bail};

use crate::cli::args::CommandArgs;
use crate::config::Config;
use crate::lifecycle::Launch;

pub fn handle_command(args: &CommandArgs, config: &Config) -> Result<()> {
    if !args.project.exists() {
        bail!("Project not found: {}", args.project.display());
    }

    let launch = Launch::from_config(&config.launch, &args.project, args.targets.iter().cloned());
    let Some(command_line) = launch.command_line() else {
        bail!("No test runner configured");
    };

    println!("{}", command_line);
    println!("# report: {}", launch.junit_xml_file().display());

    Ok(())
}
