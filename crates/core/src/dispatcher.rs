mod builder;

use agent_progress_event::{RawEvent, StreamEvent, classify_all};

use crate::display::ProgressDisplay;
use crate::ledger::{CompletedInvocation, Ledger};
pub use builder::DispatcherBuilder;

/// Which invocation owns the progress indicator, if any.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DispatcherState {
    /// No invocation owns the indicator.
    #[default]
    Idle,
    /// The invocation with this id owns the indicator.
    Tracking(String),
}

/// The entry point for events pushed by the agent runtime.
///
/// A dispatcher lives for one session. Events must be delivered one at a
/// time in emission order; the dispatcher never blocks and never calls
/// back into the runtime. It cycles between [`DispatcherState::Idle`]
/// and [`DispatcherState::Tracking`] once per tool invocation.
///
/// An invocation that never reports a result keeps the indicator until
/// input for another invocation arrives.
pub struct Dispatcher<D> {
    display: D,
    ledger: Ledger,
    state: DispatcherState,
    on_complete: Option<Box<dyn Fn(&CompletedInvocation) + Send + Sync>>,
}

impl<D: ProgressDisplay> Dispatcher<D> {
    /// Classifies a raw event and dispatches everything it carries.
    pub fn handle(&mut self, event: &RawEvent) -> Result<(), D::Error> {
        for event in classify_all(event) {
            self.dispatch(event)?;
        }
        Ok(())
    }

    /// Dispatches one classified event.
    ///
    /// Only display failures are reported. Unrecognized events and
    /// results for unknown invocations are ignored.
    pub fn dispatch(&mut self, event: StreamEvent) -> Result<(), D::Error> {
        trace!("dispatching {event:?} in {:?}", self.state);
        let input_size = event.input_size().unwrap_or_default();
        match event {
            StreamEvent::TextFragment { content, is_final } => {
                self.display.write_text(&content, is_final)
            }
            StreamEvent::ToolInputFragment {
                invocation_id,
                tool_name,
                ..
            } => self.on_tool_input(invocation_id, &tool_name, input_size),
            StreamEvent::ToolStarted { tool_name } => {
                if self.state == DispatcherState::Idle {
                    return Ok(());
                }
                self.display
                    .update_progress(&format!("🔧 Starting {tool_name}..."))
            }
            StreamEvent::ToolResult {
                invocation_id,
                succeeded,
            } => self.on_tool_result(&invocation_id, succeeded),
            StreamEvent::Unclassified => Ok(()),
        }
    }

    /// Returns the current state.
    #[inline]
    pub fn state(&self) -> &DispatcherState {
        &self.state
    }

    /// Returns the invocations that have not finished yet.
    #[inline]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Returns the display sink.
    #[inline]
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Ends the session and returns the display sink.
    ///
    /// Invocations that never finished are dropped silently.
    pub fn into_display(self) -> D {
        if !self.ledger.is_empty() {
            debug!("{} invocations unfinished at exit", self.ledger.len());
        }
        self.display
    }

    fn is_tracking(&self, id: &str) -> bool {
        matches!(&self.state, DispatcherState::Tracking(current) if current == id)
    }

    fn on_tool_input(
        &mut self,
        id: String,
        tool_name: &str,
        size: usize,
    ) -> Result<(), D::Error> {
        // Ledger and state change only after the display accepted the call.
        if !self.is_tracking(&id) {
            if let DispatcherState::Tracking(previous) = &self.state {
                debug!("invocation {previous} loses the indicator to {id}");
            }
            let name = self.ledger.get(&id).map_or(tool_name, |i| i.name());
            self.display
                .begin_progress(&format!("🛠️  {name}: Preparing..."))?;
            self.ledger.upsert(&id, tool_name);
            self.ledger.set_running(&id);
            self.state = DispatcherState::Tracking(id.clone());
        }

        let Some(invocation) = self.ledger.get(&id) else {
            return Ok(());
        };
        if size > invocation.observed_input_size() {
            self.display.update_progress(&format!(
                "🛠️  {}: {size} chars",
                invocation.name()
            ))?;
            self.ledger.record_input_size(&id, size);
        }
        Ok(())
    }

    fn on_tool_result(
        &mut self,
        id: &str,
        succeeded: bool,
    ) -> Result<(), D::Error> {
        let Some(completed) = self.ledger.get(id).map(|i| i.finish(succeeded))
        else {
            debug!("no active invocation for result of {id}");
            return Ok(());
        };

        let label = completion_label(&completed);
        if self.is_tracking(id) {
            self.display.finish_progress(&label, succeeded)?;
            self.state = DispatcherState::Idle;
        } else {
            self.display.print_status(&label, succeeded)?;
        }
        self.ledger.complete(id, succeeded);

        if let Some(on_complete) = &self.on_complete {
            on_complete(&completed);
        }
        Ok(())
    }
}

fn completion_label(completed: &CompletedInvocation) -> String {
    let secs = completed.elapsed.as_secs_f64();
    if completed.succeeded() {
        format!("{} completed in {secs:.2}s", completed.name)
    } else {
        format!("{} failed after {secs:.2}s", completed.name)
    }
}
