// Logging - single-line stderr format for run diagnostics

use chrono::Local;
use console::style;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// `<emoji> LEVEL [hh:mm:ss] (thread) component: message`
///
/// The component (`reader`, `lifecycle`, ...) is only shown in verbose mode,
/// the thread only when the event did not come from the main thread.
pub struct RunLogFormatter {
    verbose: bool,
}

impl RunLogFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

fn level_marker(level: Level) -> (&'static str, &'static str) {
    match level {
        Level::TRACE => ("🔬", "TRACE"),
        Level::DEBUG => ("🐛", "DEBUG"),
        Level::INFO => ("ℹ️ ", "INFO"),
        Level::WARN => ("⚠️ ", "WARN"),
        Level::ERROR => ("❌", "ERROR"),
    }
}

/// First module below the crate root, e.g. `makegood::reader::parser` -> `reader`
fn component(target: &str) -> Option<&str> {
    let rest = target.strip_prefix("makegood::")?;
    rest.split("::").next().filter(|c| !c.is_empty())
}

impl<S, N> FormatEvent<S, N> for RunLogFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let (emoji, label) = level_marker(*metadata.level());
        let timestamp = Local::now().format("%H:%M:%S");

        if writer.has_ansi_escapes() {
            let label = match *metadata.level() {
                Level::ERROR => style(label).for_stderr().red().bold(),
                Level::WARN => style(label).for_stderr().yellow(),
                _ => style(label).for_stderr().dim(),
            };
            write!(writer, "{} {} [{}]", emoji, label, timestamp)?;
        } else {
            write!(writer, "{} {} [{}]", emoji, label, timestamp)?;
        }

        if let Some(name) = std::thread::current().name()
            && name != "main"
        {
            write!(writer, " ({})", name)?;
        }
        if self.verbose
            && let Some(component) = component(metadata.target())
        {
            write!(writer, " {}", component)?;
        }
        write!(writer, ": ")?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Install the global subscriber; `verbose` enables debug output for this crate
pub fn init(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        "makegood=debug,warn"
    } else {
        "makegood=warn,error"
    };

    let _ = tracing_subscriber::fmt()
        .with_ansi(console::colors_enabled_stderr())
        .event_format(RunLogFormatter::new(verbose))
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_from_target() {
        assert_eq!(component("makegood::reader::parser"), Some("reader"));
        assert_eq!(component("makegood::lifecycle"), Some("lifecycle"));
        assert_eq!(component("makegood"), None);
        assert_eq!(component("quick_xml::reader"), None);
    }

    #[test]
    fn test_level_labels() {
        assert_eq!(level_marker(Level::WARN).1, "WARN");
        assert_eq!(level_marker(Level::ERROR), ("❌", "ERROR"));
    }
}
