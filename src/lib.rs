pub mod cli;
pub mod commands;
pub mod config;
pub mod lifecycle;
pub mod logging;
pub mod reader;
pub mod report;
pub mod state;
pub mod time;

pub use lifecycle::{Launch, ProcessExit, TestLifecycle};
pub use reader::{JunitXmlReader, ReadError, ReaderMessage, ReportEvent};
