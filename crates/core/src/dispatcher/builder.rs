use super::{Dispatcher, DispatcherState};
use crate::display::ProgressDisplay;
use crate::ledger::{CompletedInvocation, Ledger};

/// [`Dispatcher`] builder.
pub struct DispatcherBuilder<D> {
    display: D,
    on_complete: Option<Box<dyn Fn(&CompletedInvocation) + Send + Sync>>,
}

impl<D: ProgressDisplay> DispatcherBuilder<D> {
    /// Creates a new builder rendering to `display`.
    #[inline]
    pub fn with_display(display: D) -> Self {
        Self {
            display,
            on_complete: None,
        }
    }

    /// Attaches a callback to be invoked once for every finished
    /// invocation, after its terminal state has been rendered.
    #[inline]
    pub fn on_complete(
        mut self,
        on_complete: impl Fn(&CompletedInvocation) + Send + Sync + 'static,
    ) -> Self {
        self.on_complete = Some(Box::new(on_complete));
        self
    }

    /// Builds the dispatcher, starting in the idle state.
    #[inline]
    pub fn build(self) -> Dispatcher<D> {
        Dispatcher {
            display: self.display,
            ledger: Ledger::default(),
            state: DispatcherState::Idle,
            on_complete: self.on_complete,
        }
    }
}
