// Main entry point for makegood

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use makegood::cli::{Cli, Commands};
use makegood::commands::{handle_command, handle_watch};
use makegood::config::{self, Config};
use makegood::logging;
use makegood::report::RunStatus;

fn main() -> Result<()> {
    // Load configuration from file (if exists)
    let file_config = Config::load();

    let cli = Cli::parse();

    let color = file_config.as_ref().is_none_or(|cfg| cfg.progress.color);
    if cli.no_color || !color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }
    logging::init(cli.verbose);

    if cli.verbose {
        info!("Starting makegood v{}", env!("CARGO_PKG_VERSION"));
    }

    // Handle config flag
    if cli.config {
        print_config(file_config.as_ref());
        return Ok(());
    }

    // Handle init_config flag
    if let Some(config_file) = cli.init_config {
        let toml_content = Config::default().to_toml();
        std::fs::write(&config_file, toml_content)
            .with_context(|| format!("Failed to write {}", config_file.display()))?;
        println!("Configuration file created: {}", config_file.display());
        println!("\nYou can now edit the file to customize your settings.");
        return Ok(());
    }

    let config = file_config.unwrap_or_default();

    match &cli.command {
        Some(Commands::Watch(args)) => {
            let summary = handle_watch(args, &config)?;
            if summary.status != RunStatus::Passed {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Commands::Command(args)) => handle_command(args, &config),
        None => {
            warn!("No command given. Use 'makegood --help' for usage.");
            Ok(())
        }
    }
}

fn print_config(file_config: Option<&Config>) {
    println!("Current configuration:");

    match file_config {
        Some(cfg) => {
            println!("\n  Configuration file loaded:");
            println!("    Poll interval: {}ms", cfg.reader.poll_interval_ms);
            println!("    Test runner: {}", cfg.launch.test_runner);
            println!("    Prepare script: {}", cfg.launch.prepare_script);
            if let Some(ref dir) = cfg.launch.junit_xml_dir {
                println!("    Report directory: {}", dir);
            }
            println!("    Progress mode: {}", cfg.progress.mode);
            println!(
                "    Color: {}",
                if cfg.progress.color {
                    "enabled"
                } else {
                    "disabled"
                }
            );
        }
        None => {
            println!("\n  No configuration file loaded");
            println!(
                "  Create one with: makegood --init-config {}",
                config::CONFIG_FILE_NAME
            );
        }
    }

    println!("\nConfiguration precedence:");
    println!("  1. Command-line arguments (highest)");
    println!("  2. Configuration file");
    println!("  3. Built-in defaults (lowest)");
}
