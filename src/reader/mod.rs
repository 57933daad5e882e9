// Reader module - follows a JUnit XML report while the test runner writes it
// A background thread polls the file and sends parsed events over a channel

pub mod event;
pub mod parser;

pub use event::{CaseStart, ReaderMessage, ReportEvent, SuiteStart};
pub use parser::StreamingParser;

use crossbeam_channel::{Receiver, Sender};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Default delay between read attempts
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Why the reader stopped before the report was complete
#[derive(Debug, Error)]
pub enum ReadError {
    /// The report path cannot be used at all (a directory, no permission)
    #[error("cannot read test report {}: {source}", .path.display())]
    Environment {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The writer finished without producing a well-formed report
    #[error("malformed test report at byte {offset}: {reason}")]
    Malformed { offset: u64, reason: String },
}

impl ReadError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, ReadError::Malformed { .. })
    }
}

/// Shared "no more data is coming" flag
#[derive(Debug, Clone)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

impl StopHandle {
    fn new() -> Self {
        let (wake_tx, wake_rx) = crossbeam_channel::bounded(1);
        Self {
            requested: Arc::new(AtomicBool::new(false)),
            wake_tx,
            wake_rx,
        }
    }

    /// Request a stop; safe to call repeatedly and from any thread
    pub fn stop(&self) {
        self.requested.store(true, Ordering::SeqCst);
        let _ = self.wake_tx.try_send(());
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Sleep for `interval`, returning early on stop
    fn wait(&self, interval: Duration) {
        let _ = self.wake_rx.recv_timeout(interval);
    }
}

/// Background reader for one report file
pub struct JunitXmlReader {
    path: PathBuf,
    poll_interval: Duration,
    stop: StopHandle,
    thread: Option<JoinHandle<()>>,
}

impl JunitXmlReader {
    pub fn new(path: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self {
            path: path.into(),
            poll_interval,
            stop: StopHandle::new(),
            thread: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start the background thread; events arrive on the returned channel
    pub fn spawn(&mut self) -> io::Result<Receiver<ReaderMessage>> {
        if self.thread.is_some() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "reader thread already started",
            ));
        }

        let (tx, rx) = crossbeam_channel::unbounded();
        let path = self.path.clone();
        let poll_interval = self.poll_interval;
        let stop = self.stop.clone();

        let handle = thread::Builder::new()
            .name("junit-xml-reader".to_string())
            .spawn(move || read_report(&path, poll_interval, &stop, &tx))?;
        self.thread = Some(handle);

        Ok(rx)
    }

    /// Tell the reader the writer has finished
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// The background thread has exited (or never started)
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the background thread; later calls return immediately
    pub fn join(&mut self) -> thread::Result<()> {
        match self.thread.take() {
            Some(handle) => handle.join(),
            None => Ok(()),
        }
    }
}

impl Drop for JunitXmlReader {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.stop();
            let _ = self.join();
        }
    }
}

enum SourceError {
    Environment(io::Error),
    Transient(io::Error),
}

/// The report file, opened once it exists and read from where we left off
struct ReportSource<'a> {
    path: &'a Path,
    file: Option<File>,
}

impl<'a> ReportSource<'a> {
    fn new(path: &'a Path) -> Self {
        Self { path, file: None }
    }

    fn read_into(&mut self, parser: &mut StreamingParser) -> Result<usize, SourceError> {
        if self.file.is_none() {
            match File::open(self.path) {
                Ok(file) => {
                    let metadata = file.metadata().map_err(SourceError::Transient)?;
                    if metadata.is_dir() {
                        return Err(SourceError::Environment(io::Error::new(
                            io::ErrorKind::InvalidInput,
                            "path is a directory",
                        )));
                    }
                    debug!("Test report appeared: {}", self.path.display());
                    self.file = Some(file);
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
                Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                    return Err(SourceError::Environment(err));
                }
                Err(err) => return Err(SourceError::Transient(err)),
            }
        }
        let Some(file) = self.file.as_mut() else {
            return Ok(0);
        };

        let mut bytes = Vec::new();
        let read = file
            .read_to_end(&mut bytes)
            .map_err(SourceError::Transient)?;
        parser.feed(&bytes);
        Ok(read)
    }
}

fn read_report(
    path: &Path,
    poll_interval: Duration,
    stop: &StopHandle,
    tx: &Sender<ReaderMessage>,
) {
    let mut source = ReportSource::new(path);
    let mut parser = StreamingParser::new();

    loop {
        // Sampled before reading so everything written before stop() is seen.
        let finished = stop.is_requested();

        match source.read_into(&mut parser) {
            Ok(read) if read > 0 => debug!("Read {} byte(s) from {}", read, path.display()),
            Ok(_) => {}
            Err(SourceError::Environment(source)) => {
                let error = ReadError::Environment {
                    path: path.to_path_buf(),
                    source,
                };
                let _ = tx.send(ReaderMessage::Aborted {
                    at: Instant::now(),
                    error,
                });
                return;
            }
            Err(SourceError::Transient(err)) => {
                warn!("Failed to read test report {}: {}", path.display(), err);
            }
        }

        let mut events = Vec::new();
        let outcome = parser.parse_into(finished, &mut events);
        for event in events {
            let message = ReaderMessage::Event {
                at: Instant::now(),
                event,
            };
            if tx.send(message).is_err() {
                debug!("Lifecycle went away, reader exiting");
                return;
            }
        }
        if let Err(error) = outcome {
            let _ = tx.send(ReaderMessage::Aborted {
                at: Instant::now(),
                error,
            });
            return;
        }

        if parser.is_complete() {
            let _ = tx.send(ReaderMessage::Finished { at: Instant::now() });
            return;
        }
        if finished {
            return;
        }

        stop.wait(poll_interval);
    }
}
