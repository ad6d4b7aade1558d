//! Terminal output callback for streamed stages
//!
//! `TerminalOutputCallback` echoes each line a streamed stage writes, as it
//! arrives, so long-running processors show progress instead of going quiet
//! until they exit.
//!
//! # Example
//!
//! ```no_run
//! use corpus_pipeline::cli::terminal_output::TerminalOutputCallback;
//! use corpus_pipeline::process::{OutputCallback, OutputStream};
//!
//! let callback = TerminalOutputCallback::new(false);
//! callback.on_line(OutputStream::Stdout, "Indexed 12 documents");
//! ```

use crate::process::{OutputCallback, OutputStream};
use console::style;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Callback that prints streamed stage output to the terminal
///
/// stdout lines are printed as-is. stderr lines are dimmed, and prefixed
/// with the stream name when `label_streams` is set.
#[derive(Debug)]
pub struct TerminalOutputCallback {
    label_streams: bool,
    lines: AtomicUsize,
}

impl TerminalOutputCallback {
    pub fn new(label_streams: bool) -> Self {
        Self {
            label_streams,
            lines: AtomicUsize::new(0),
        }
    }

    /// Number of lines echoed so far
    pub fn lines_printed(&self) -> usize {
        self.lines.load(Ordering::SeqCst)
    }

    fn render(&self, stream: OutputStream, line: &str) -> String {
        match stream {
            OutputStream::Stdout => line.to_string(),
            OutputStream::Stderr if self.label_streams => {
                style(format!("[{}] {}", stream, line)).dim().to_string()
            }
            OutputStream::Stderr => style(line).dim().to_string(),
        }
    }

    /// Flush stdout to ensure immediate display
    fn flush_stdout(&self) {
        let _ = io::stdout().flush();
    }
}

impl OutputCallback for TerminalOutputCallback {
    fn on_line(&self, stream: OutputStream, line: &str) {
        println!("{}", self.render(stream, line));
        self.flush_stdout();
        self.lines.fetch_add(1, Ordering::SeqCst);
    }
}
