//! Diagnostic sinks for error and progress reporting
//!
//! The engine never opens files or sockets; everything it has to say goes
//! through an [`Io`] implementation supplied by the caller.

use std::sync::Mutex;

/// Sink for diagnostics emitted by the fuser, the kernels, and the runner.
pub trait Io {
    /// Report an error condition.
    fn error(&self, msg: &str);

    /// Report progress or timing information.
    fn message(&self, msg: &str);
}

/// Writes errors to stderr and messages to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleIo;

impl Io for ConsoleIo {
    fn error(&self, msg: &str) {
        eprintln!("{msg}");
    }

    fn message(&self, msg: &str) {
        println!("{msg}");
    }
}

/// Discards all diagnostics.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentIo;

impl Io for SilentIo {
    fn error(&self, _msg: &str) {}

    fn message(&self, _msg: &str) {}
}

/// Buffers diagnostics in memory so callers can inspect them afterwards.
#[derive(Debug, Default)]
pub struct BufferedIo {
    errors: Mutex<Vec<String>>,
    messages: Mutex<Vec<String>>,
}

impl BufferedIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// All errors reported so far.
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    /// All messages reported so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Io for BufferedIo {
    fn error(&self, msg: &str) {
        self.errors.lock().unwrap().push(msg.to_string());
    }

    fn message(&self, msg: &str) {
        self.messages.lock().unwrap().push(msg.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffered_io_captures_both_streams() {
        let io = BufferedIo::new();
        io.error("bad input");
        io.message("step done");
        io.message("all done");

        assert_eq!(io.errors(), vec!["bad input"]);
        assert_eq!(io.messages(), vec!["step done", "all done"]);
    }
}
