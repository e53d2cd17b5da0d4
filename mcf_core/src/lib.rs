//! Machine control core library
//!
//! Shared runtime state for a machine-control process: typed parameters,
//! the state machine registry and request/response signals between state
//! machines and their environment. Every component is safe to share across
//! threads behind an `Arc`.
//!
//! # Module Structure
//!
//! - [`parameter`] - Typed parameter store (handler → group → parameter)
//! - [`registry`] - State machine instances, state names and dot-paths
//! - [`signal`] - Signal definitions, trigger/handle/collect and wrappers
//! - [`config`] - Configuration loading traits and machine definitions
//! - [`system`] - Building the shared state from a machine definition
//! - [`error`] - `CoreError` and `CoreResult`
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use mcf_core::prelude::*;
//!
//! let signals = Arc::new(StateSignalHandler::new());
//! signals
//!     .add_signal_definition("laser1", "StartJob", vec![], vec![])
//!     .unwrap();
//! let uuid = signals.trigger_signal("laser1", "StartJob", "").unwrap().unwrap();
//! assert_eq!(signals.check_signal("laser1", "StartJob").unwrap(), Some(uuid));
//! ```

pub mod config;
pub mod error;
pub mod names;
pub mod parameter;
pub mod prelude;
pub mod registry;
pub mod signal;
pub mod system;
