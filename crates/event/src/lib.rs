//! Event records emitted by an agent runtime while it streams a turn.
//!
//! The runtime hands its callback a loosely structured bag of optional
//! fields. [`RawEvent`] captures that bag without enforcing a schema, and
//! [`classify`] turns it into a closed [`StreamEvent`] that downstream
//! code can match exhaustively.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod classify;
mod raw;

pub use classify::*;
pub use raw::*;
