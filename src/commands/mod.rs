// Commands module - handles CLI command execution

pub mod command;
pub mod watch;

pub use command::handle_command;
pub use watch::handle_watch;
