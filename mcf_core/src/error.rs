//! Error types for the parameter store, registry and signal handler.
//!
//! Every variant here is a configuration error: an unknown key, a malformed
//! name, a duplicate definition or an exhausted capacity. None of them are
//! retried. Concurrent-access outcomes (trigger while triggered, collect
//! before handled, UUID already cycled) are plain `bool`/`Option` returns
//! and never appear in this enum.

use thiserror::Error;

/// Error type for all core operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ─── Parameters ─────────────────────────────────────────────────
    /// A parameter with this name already exists in the group.
    #[error("duplicate parameter name: {0}")]
    DuplicateParameterName(String),

    /// No parameter with this name exists in the group.
    #[error("parameter not found: {0}")]
    ParameterNotFound(String),

    /// Parameter index is out of range.
    #[error("invalid parameter index {index} (count {count})")]
    InvalidIndex { index: usize, count: usize },

    /// The group reached its parameter ceiling.
    #[error("too many parameters in group '{0}'")]
    TooManyParameters(String),

    /// Unknown parameter type string.
    #[error("invalid parameter type: {0}")]
    InvalidParameterType(String),

    /// A value could not be converted to or from the parameter's type.
    #[error("invalid value '{value}' for {expected} parameter")]
    InvalidParameterValue { value: String, expected: &'static str },

    /// Parameter name is empty or contains forbidden characters.
    #[error("invalid parameter name: '{0}'")]
    InvalidParameterName(String),

    /// Derived parameters mirror their source and cannot be written.
    #[error("derived parameter is read-only: {0}")]
    DerivedParameterReadOnly(String),

    /// Following derived parameters did not reach a plain parameter.
    #[error("derived parameter chain too long or cyclic: {0}")]
    DerivedParameterCycle(String),

    // ─── Groups ─────────────────────────────────────────────────────
    /// A group with this name already exists in the handler.
    #[error("duplicate parameter group name: {0}")]
    DuplicateParameterGroupName(String),

    /// No group with this name exists in the handler.
    #[error("parameter group not found: {0}")]
    ParameterGroupNotFound(String),

    /// The handler reached its group ceiling.
    #[error("too many parameter groups in '{0}'")]
    TooManyParameterGroups(String),

    /// Group name is empty or contains forbidden characters.
    #[error("invalid parameter group name: '{0}'")]
    InvalidGroupName(String),

    // ─── State machine instances ────────────────────────────────────
    /// The instance is already registered.
    #[error("duplicate state machine instance: {0}")]
    DuplicateInstance(String),

    /// The instance is not registered.
    #[error("state machine not found: {0}")]
    StateMachineNotFound(String),

    /// Instance name is empty or contains forbidden characters.
    #[error("invalid state machine instance name: '{0}'")]
    InvalidInstanceName(String),

    /// Dot-path has too few segments.
    #[error("invalid parameter path: '{0}'")]
    InvalidParameterPath(String),

    // ─── Signals ────────────────────────────────────────────────────
    /// Signal name is empty or malformed. Carries `instance/name`.
    #[error("invalid signal name: '{0}'")]
    InvalidSignalName(String),

    /// Signal already defined for this instance.
    #[error("duplicate signal: {0}")]
    DuplicateSignal(String),

    /// Unknown `(instance, signal)` pair or correlation UUID.
    #[error("signal not found: {0}")]
    SignalNotFound(String),

    /// A `SignalTrigger` was asked to trigger a second time.
    #[error("signal has already been triggered: {0}")]
    SignalAlreadyTriggered(String),

    /// A `SignalTrigger` was asked to wait before it triggered.
    #[error("signal has not been triggered: {0}")]
    SignalNotTriggered(String),

    /// A `SignalTrigger` lost the race against another producer.
    #[error("could not trigger signal: {0}")]
    CouldNotTriggerSignal(String),

    // ─── Payloads ───────────────────────────────────────────────────
    /// Payload is not a JSON object of string values.
    #[error("invalid JSON payload: {0}")]
    InvalidJson(String),
}

/// Result alias used throughout the crate.
pub type CoreResult<T> = Result<T, CoreError>;
