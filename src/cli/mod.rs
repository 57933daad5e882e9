// CLI module - command-line interface definitions

pub mod args;

pub use args::{Cli, CommandArgs, Commands, ProgressMode, WatchArgs};
