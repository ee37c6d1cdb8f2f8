//! Runtime error feedback staging.
//!
//! When the sandbox running a generated game reports a runtime error,
//! it is staged here until the next submit consumes it. At most one
//! report is staged at a time; a newer report replaces an unconsumed
//! one. The loop never calls submit itself.

use draftfun_types::session::RuntimeError;

/// Holds at most one pending runtime error report.
#[derive(Debug, Default)]
pub struct ErrorFeedbackLoop {
    staged: Option<RuntimeError>,
}

impl ErrorFeedbackLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a report for the next submit and return the text a client
    /// can pre-fill into the input box. Replaces any unconsumed report
    /// (most recent wins).
    pub fn report(&mut self, error: RuntimeError) -> String {
        let prefill = format!("Fix this error: {}", error.describe());
        self.staged = Some(error);
        prefill
    }

    /// Peek at the staged report without consuming it. Used to
    /// pre-fill input text for the user.
    pub fn staged(&self) -> Option<&RuntimeError> {
        self.staged.as_ref()
    }

    /// Take the staged report, clearing it. Called exactly once per
    /// submit that embeds the error into a prompt.
    pub fn consume(&mut self) -> Option<RuntimeError> {
        self.staged.take()
    }

    /// Discard the staged report without submitting, e.g. when the
    /// user clears the pre-filled input.
    pub fn clear(&mut self) {
        self.staged = None;
    }
}
