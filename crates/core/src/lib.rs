//! Correlates streamed agent events into tool invocations and drives a
//! single-slot progress display.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod dispatcher;
pub mod display;
pub mod ledger;

pub use agent_progress_event as event;
pub use dispatcher::{Dispatcher, DispatcherBuilder, DispatcherState};
pub use display::ProgressDisplay;
pub use ledger::{CompletedInvocation, InvocationStatus, Ledger, ToolInvocation};
