//! Prelude module for common re-exports.
//!
//! ```rust
//! use mcf_core::prelude::*;
//! ```

// ─── Errors ─────────────────────────────────────────────────────────
pub use crate::error::{CoreError, CoreResult};

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    ConfigError, ConfigLoader, DerivedDef, LogLevel, MachineDefinition, SharedConfig,
};

// ─── Parameters ─────────────────────────────────────────────────────
pub use crate::parameter::{
    ParameterGroup, ParameterHandler, ParameterInfo, ParameterType, ParameterValue,
};

// ─── Registry ───────────────────────────────────────────────────────
pub use crate::registry::{ParameterPath, StateMachineRegistry};

// ─── Signals ────────────────────────────────────────────────────────
pub use crate::signal::{
    SignalDefinition, SignalHandle, SignalParameterDef, SignalProperties, SignalTrigger,
    StateSignalHandler,
};

// ─── System ─────────────────────────────────────────────────────────
pub use crate::system::SystemState;
