//! The output side of the dispatcher.

use std::error::Error;

/// A sink that renders assistant text and a single progress indicator.
///
/// Implementations own at most one active indicator. Calls are delivered
/// one at a time from the dispatcher, so implementations don't need to
/// be thread-safe.
///
/// A returned error means the output device is unusable. The dispatcher
/// does not retry and hands the error to its caller.
pub trait ProgressDisplay {
    /// The error type of the output backend.
    type Error: Error + Send + Sync + 'static;

    /// Writes a text fragment.
    ///
    /// A line break is appended only when `is_final` is set, so fragments
    /// can be streamed character by character.
    fn write_text(
        &mut self,
        fragment: &str,
        is_final: bool,
    ) -> Result<(), Self::Error>;

    /// Starts a new indicator bound to `label`.
    ///
    /// An indicator that is still active is stopped without any status
    /// before the new one starts.
    fn begin_progress(&mut self, label: &str) -> Result<(), Self::Error>;

    /// Replaces the label of the active indicator. Does nothing if there
    /// is none.
    fn update_progress(&mut self, label: &str) -> Result<(), Self::Error>;

    /// Renders the terminal state of the active indicator with `label`
    /// and frees the slot.
    fn finish_progress(
        &mut self,
        label: &str,
        succeeded: bool,
    ) -> Result<(), Self::Error>;

    /// Renders a terminal status line without touching the active
    /// indicator.
    ///
    /// This is used for invocations that lost the slot before they
    /// finished.
    fn print_status(
        &mut self,
        label: &str,
        succeeded: bool,
    ) -> Result<(), Self::Error>;
}

impl<D: ProgressDisplay + ?Sized> ProgressDisplay for &mut D {
    type Error = D::Error;

    #[inline]
    fn write_text(
        &mut self,
        fragment: &str,
        is_final: bool,
    ) -> Result<(), Self::Error> {
        (**self).write_text(fragment, is_final)
    }

    #[inline]
    fn begin_progress(&mut self, label: &str) -> Result<(), Self::Error> {
        (**self).begin_progress(label)
    }

    #[inline]
    fn update_progress(&mut self, label: &str) -> Result<(), Self::Error> {
        (**self).update_progress(label)
    }

    #[inline]
    fn finish_progress(
        &mut self,
        label: &str,
        succeeded: bool,
    ) -> Result<(), Self::Error> {
        (**self).finish_progress(label, succeeded)
    }

    #[inline]
    fn print_status(
        &mut self,
        label: &str,
        succeeded: bool,
    ) -> Result<(), Self::Error> {
        (**self).print_status(label, succeeded)
    }
}
