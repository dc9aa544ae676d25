//! Destinations for script output.
//!
//! The session delivers every output line, followed by a final exit-code line,
//! to an [`OutputSink`]. Calls come from a single consumer task, one at a
//! time, but that task may run on any runtime thread, hence `Send + Sync`.

use std::io::{stdout, Write};
use std::sync::{Mutex, PoisonError};

use crate::error::{Error, Result};

pub trait OutputSink: Send + Sync {
    /// Delivers one line, without its line terminator.
    ///
    /// # Errors
    ///
    /// A failure only affects this line; the session logs it and carries on.
    fn accept(&self, line: &str) -> Result<()>;
}

impl<F> OutputSink for F
where
    F: Fn(&str) -> Result<()> + Send + Sync,
{
    fn accept(&self, line: &str) -> Result<()> {
        self(line)
    }
}

/// Prints lines to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn accept(&self, line: &str) -> Result<()> {
        let mut stdout = stdout().lock();
        writeln!(stdout, "{line}").map_err(Error::Stdio)?;
        stdout.flush().map_err(Error::Stdio)
    }
}

/// Forwards lines to the `log` facade at info level.
#[derive(Debug, Clone)]
pub struct LogSink {
    target: String,
}

impl LogSink {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

impl OutputSink for LogSink {
    fn accept(&self, line: &str) -> Result<()> {
        log::info!(target: self.target.as_str(), "{line}");
        Ok(())
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the lines received so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl OutputSink for MemorySink {
    fn accept(&self, line: &str) -> Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.accept("first").unwrap();
        sink.accept("second").unwrap();
        assert_eq!(sink.lines(), vec!["first", "second"]);
    }

    #[test]
    fn test_closure_sink() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&received);
        let sink = move |line: &str| -> Result<()> {
            captured.lock().unwrap().push(line.len());
            Ok(())
        };

        sink.accept("four").unwrap();
        assert_eq!(*received.lock().unwrap(), vec![4]);
    }

    #[test]
    fn test_closure_sink_error() {
        let sink = |_: &str| -> Result<()> { Err(Error::Sink("pane closed".to_string())) };
        assert!(matches!(sink.accept("x"), Err(Error::Sink(_))));
    }

    #[test]
    fn test_log_sink_accepts() {
        assert!(LogSink::new("script").accept("line").is_ok());
    }

    #[test]
    fn test_sinks_as_trait_objects() {
        let sinks: Vec<Box<dyn OutputSink>> =
            vec![Box::new(ConsoleSink), Box::new(MemorySink::new())];
        for sink in &sinks {
            assert!(sink.accept("shared").is_ok());
        }
    }
}
