//! Live terminal progress for the tool calls of an agent runtime.
//!
//! The crate renders the event stream of an agent session with a spinner
//! per tool invocation, and includes a program that replays recorded
//! sessions in the terminal.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod config;
mod console;
pub mod source;

pub use config::{ConfigError, ReplayConfig, ReplayConfigBuilder};
pub use console::{ConsoleConfig, ConsoleConfigBuilder, ConsoleDisplay};

/// Re-exports of [`agent_progress_core`] crate.
pub mod core {
    pub use agent_progress_core::*;
}
