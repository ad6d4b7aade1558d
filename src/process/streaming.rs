//! Live output support for child processes
//!
//! When an [`Invocation`](crate::core::Invocation) runs in stream mode, each
//! line read from the child's stdout or stderr is handed to an
//! [`OutputCallback`] as soon as it arrives. Lines of one stream keep their
//! order.
//!
//! # Example
//!
//! ```
//! use corpus_pipeline::process::{OutputCallback, OutputStream};
//!
//! struct Prefixer;
//!
//! impl OutputCallback for Prefixer {
//!     fn on_line(&self, stream: OutputStream, line: &str) {
//!         println!("[{}] {}", stream, line);
//!     }
//! }
//! ```

use std::fmt;

/// Which pipe a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStream::Stdout => write!(f, "stdout"),
            OutputStream::Stderr => write!(f, "stderr"),
        }
    }
}

/// Receives child-process output line by line
///
/// This trait is object-safe and can be used as `&dyn OutputCallback`.
pub trait OutputCallback: Send + Sync {
    /// Called for every line, without its trailing newline
    fn on_line(&self, stream: OutputStream, line: &str);
}

/// Callback that drops every line
#[derive(Debug, Clone, Default)]
pub struct NoopCallback;

impl OutputCallback for NoopCallback {
    fn on_line(&self, _stream: OutputStream, _line: &str) {}
}
