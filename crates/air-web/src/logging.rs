//! `tracing` output for the browser console.
//!
//! The fmt layer formats each event into one line and hands it to a sink
//! (on `wasm32`, `console.log`). No timestamps or ANSI colors: the console
//! has its own.

use std::io;

use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// Writer that forwards every formatted line to `sink`.
#[derive(Debug, Clone)]
pub struct ConsoleWriter<F> {
    sink: F,
}

impl<F: Fn(&str)> ConsoleWriter<F> {
    pub fn new(sink: F) -> Self {
        Self { sink }
    }
}

impl<F: Fn(&str)> io::Write for ConsoleWriter<F> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        let line = text.trim_end();
        if !line.is_empty() {
            (self.sink)(line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a, F: Fn(&str) + Clone + 'a> MakeWriter<'a> for ConsoleWriter<F> {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Subscriber writing events at `level` and above to `sink`.
pub fn subscriber<F>(sink: F, level: Level) -> impl tracing::Subscriber + Send + Sync + 'static
where
    F: Fn(&str) + Clone + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_writer(ConsoleWriter::new(sink))
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .finish()
}

/// Install the console subscriber as the global default.
///
/// Debug builds log at `DEBUG`, release builds at `INFO`. Does nothing if a
/// subscriber is already installed.
pub fn init_logging<F>(sink: F)
where
    F: Fn(&str) + Clone + Send + Sync + 'static,
{
    let level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };
    if tracing::subscriber::set_global_default(subscriber(sink, level)).is_err() {
        tracing::debug!("Subscriber already installed");
    }
}
