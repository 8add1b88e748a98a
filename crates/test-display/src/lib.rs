//! A recording display for testing purpose.

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};

use agent_progress_core::ProgressDisplay;

/// The error returned once the injected failure point is reached.
#[derive(Debug, PartialEq, Eq)]
pub struct Error {
    call_index: usize,
}

impl Error {
    /// Returns the index of the call that failed.
    #[inline]
    pub fn call_index(&self) -> usize {
        self.call_index
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "display call #{} failed", self.call_index)
    }
}

impl StdError for Error {}

/// A call received by [`RecordingDisplay`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DisplayCall {
    /// `write_text` was called.
    WriteText {
        /// The written fragment.
        fragment: String,
        /// Whether a line break was requested.
        is_final: bool,
    },
    /// `begin_progress` was called.
    Begin(String),
    /// An active indicator was stopped without status by a later
    /// `begin_progress`. Carries the label it showed last.
    Interrupted(String),
    /// `update_progress` was called while an indicator was active.
    Update(String),
    /// `finish_progress` was called.
    Finish {
        /// The terminal label.
        label: String,
        /// The reported outcome.
        succeeded: bool,
    },
    /// `print_status` was called.
    Status {
        /// The status label.
        label: String,
        /// The reported outcome.
        succeeded: bool,
    },
}

/// A display that records every call instead of rendering.
///
/// It follows the single-slot rules of a real terminal display, so tests
/// can inspect which indicator is active at any point.
#[derive(Clone, Debug, Default)]
pub struct RecordingDisplay {
    calls: Vec<DisplayCall>,
    active: Option<String>,
    received: usize,
    fail_at: Option<usize>,
}

impl RecordingDisplay {
    /// Creates a display whose `n`-th call (zero-based) and all later
    /// calls fail.
    #[inline]
    pub fn failing_at(n: usize) -> Self {
        Self {
            fail_at: Some(n),
            ..Default::default()
        }
    }

    /// Returns the recorded calls.
    #[inline]
    pub fn calls(&self) -> &[DisplayCall] {
        &self.calls
    }

    /// Returns the label of the active indicator.
    #[inline]
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Returns the text as it would appear on the terminal.
    pub fn text_output(&self) -> String {
        let mut output = String::new();
        for call in &self.calls {
            if let DisplayCall::WriteText { fragment, is_final } = call {
                output.push_str(fragment);
                if *is_final {
                    output.push('\n');
                }
            }
        }
        output
    }

    /// Counts the recorded calls matching `predicate`.
    #[inline]
    pub fn count(&self, predicate: impl Fn(&DisplayCall) -> bool) -> usize {
        self.calls.iter().filter(|&call| predicate(call)).count()
    }

    fn receive(&mut self) -> Result<(), Error> {
        let call_index = self.received;
        self.received += 1;
        match self.fail_at {
            Some(n) if call_index >= n => Err(Error { call_index }),
            _ => Ok(()),
        }
    }
}

impl ProgressDisplay for RecordingDisplay {
    type Error = Error;

    fn write_text(
        &mut self,
        fragment: &str,
        is_final: bool,
    ) -> Result<(), Self::Error> {
        self.receive()?;
        self.calls.push(DisplayCall::WriteText {
            fragment: fragment.to_owned(),
            is_final,
        });
        Ok(())
    }

    fn begin_progress(&mut self, label: &str) -> Result<(), Self::Error> {
        self.receive()?;
        if let Some(previous) = self.active.take() {
            self.calls.push(DisplayCall::Interrupted(previous));
        }
        self.calls.push(DisplayCall::Begin(label.to_owned()));
        self.active = Some(label.to_owned());
        Ok(())
    }

    fn update_progress(&mut self, label: &str) -> Result<(), Self::Error> {
        self.receive()?;
        if let Some(active) = &mut self.active {
            label.clone_into(active);
            self.calls.push(DisplayCall::Update(label.to_owned()));
        }
        Ok(())
    }

    fn finish_progress(
        &mut self,
        label: &str,
        succeeded: bool,
    ) -> Result<(), Self::Error> {
        self.receive()?;
        self.active = None;
        self.calls.push(DisplayCall::Finish {
            label: label.to_owned(),
            succeeded,
        });
        Ok(())
    }

    fn print_status(
        &mut self,
        label: &str,
        succeeded: bool,
    ) -> Result<(), Self::Error> {
        self.receive()?;
        self.calls.push(DisplayCall::Status {
            label: label.to_owned(),
            succeeded,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_slot() {
        let mut display = RecordingDisplay::default();
        display.update_progress("ignored").unwrap();
        display.begin_progress("a").unwrap();
        display.update_progress("a: 2 chars").unwrap();
        display.begin_progress("b").unwrap();
        assert_eq!(display.active(), Some("b"));
        display.finish_progress("b done", true).unwrap();

        assert_eq!(display.active(), None);
        assert_eq!(
            display.calls(),
            [
                DisplayCall::Begin("a".to_owned()),
                DisplayCall::Update("a: 2 chars".to_owned()),
                DisplayCall::Interrupted("a: 2 chars".to_owned()),
                DisplayCall::Begin("b".to_owned()),
                DisplayCall::Finish {
                    label: "b done".to_owned(),
                    succeeded: true,
                },
            ]
        );
    }

    #[test]
    fn test_failure_injection() {
        let mut display = RecordingDisplay::failing_at(1);
        display.write_text("ok", false).unwrap();
        let err = display.write_text("lost", true).unwrap_err();
        assert_eq!(err.call_index(), 1);
        assert!(display.begin_progress("x").is_err());
        assert_eq!(display.text_output(), "ok");
    }
}
