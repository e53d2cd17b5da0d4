//! Signals: named request/response mailboxes between state machines and
//! their environment.
//!
//! - [`definition`] - Signal definitions and per-signal state
//! - [`handler`] - `StateSignalHandler`, the process-wide signal table
//! - [`trigger`] - `SignalTrigger` / `SignalHandle` typed wrappers

pub mod definition;
pub mod handler;
pub mod trigger;

pub use definition::{SignalDefinition, SignalParameterDef, SignalProperties};
pub use handler::StateSignalHandler;
pub use trigger::{SignalHandle, SignalTrigger};
