//! State machine registry: instance name → parameters, scratch store, state.
//!
//! The registry is the single source of truth for which instances exist and
//! which state each one is in. Instances are registered once at startup and
//! live for the process lifetime.
//!
//! Lookups clone the `Arc` out of the registry and release the registry lock
//! before the caller touches the handler or group, so no call ever holds the
//! registry lock together with a handler or group lock.

pub mod dot_path;

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

pub use dot_path::{ParameterPath, STATE_PSEUDO_GROUP};

use crate::error::{CoreError, CoreResult};
use crate::names::{check_group_name, check_instance_name, check_parameter_name};
use crate::parameter::{ParameterGroup, ParameterHandler};

#[derive(Debug)]
struct InstanceEntry {
    parameters: Arc<ParameterHandler>,
    data_store: Arc<ParameterGroup>,
    state_name: String,
}

/// Process-wide table of state machine instances.
#[derive(Debug, Default)]
pub struct StateMachineRegistry {
    instances: Mutex<BTreeMap<String, InstanceEntry>>,
}

impl StateMachineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an instance with its parameter handler.
    ///
    /// Allocates an empty scratch data store and an empty state name.
    ///
    /// # Errors
    /// - `InvalidInstanceName` for a malformed name
    /// - `DuplicateInstance` if the name is already registered
    pub fn register_instance(
        &self,
        name: &str,
        parameters: Arc<ParameterHandler>,
    ) -> CoreResult<()> {
        check_instance_name(name)?;
        let mut instances = self.instances.lock();
        if instances.contains_key(name) {
            return Err(CoreError::DuplicateInstance(name.to_string()));
        }
        instances.insert(
            name.to_string(),
            InstanceEntry {
                parameters,
                data_store: Arc::new(ParameterGroup::unnamed()),
                state_name: String::new(),
            },
        );
        info!(instance = name, "state machine instance registered");
        Ok(())
    }

    pub fn has_instance(&self, name: &str) -> bool {
        self.instances.lock().contains_key(name)
    }

    /// Registered instance names, sorted.
    pub fn instance_names(&self) -> Vec<String> {
        self.instances.lock().keys().cloned().collect()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.lock().len()
    }

    /// # Errors
    /// `StateMachineNotFound` if the instance is not registered.
    pub fn parameter_handler(&self, name: &str) -> CoreResult<Arc<ParameterHandler>> {
        self.with_entry(name, |e| Arc::clone(&e.parameters))
    }

    /// Scratch group for transient values outside the parameter schema.
    ///
    /// # Errors
    /// `StateMachineNotFound` if the instance is not registered.
    pub fn data_store(&self, name: &str) -> CoreResult<Arc<ParameterGroup>> {
        self.with_entry(name, |e| Arc::clone(&e.data_store))
    }

    /// Overwrite the current state name of an instance.
    ///
    /// # Errors
    /// `StateMachineNotFound` if the instance is not registered.
    pub fn set_instance_state_name(&self, name: &str, state: &str) -> CoreResult<()> {
        let mut instances = self.instances.lock();
        let entry = instances
            .get_mut(name)
            .ok_or_else(|| CoreError::StateMachineNotFound(name.to_string()))?;
        if entry.state_name != state {
            debug!(instance = name, from = %entry.state_name, to = state, "state changed");
        }
        entry.state_name = state.to_string();
        Ok(())
    }

    /// Current state name, or an empty string for unknown instances.
    pub fn instance_state_name(&self, name: &str) -> String {
        self.instances
            .lock()
            .get(name)
            .map(|e| e.state_name.clone())
            .unwrap_or_default()
    }

    /// Read a value addressed by dot-path.
    ///
    /// `instance.$state` yields the instance's state name;
    /// `instance.group.parameter` yields the parameter's current value.
    ///
    /// # Errors
    /// - Path parsing errors, see [`ParameterPath::parse`]
    /// - `InvalidParameterPath` for a two-segment path other than `$state`
    /// - `StateMachineNotFound`, `ParameterGroupNotFound`, `ParameterNotFound`
    pub fn resolve_value(&self, path: &str) -> CoreResult<String> {
        let parsed = ParameterPath::parse(path, true, true)?;
        check_instance_name(&parsed.instance)?;

        if parsed.is_state() {
            return self.with_entry(&parsed.instance, |e| e.state_name.clone());
        }
        if parsed.parameter.is_empty() {
            return Err(CoreError::InvalidParameterPath(path.to_string()));
        }
        check_group_name(&parsed.group)?;
        check_parameter_name(&parsed.parameter)?;

        let handler = self.parameter_handler(&parsed.instance)?;
        let group = handler.require_group(&parsed.group)?;
        group.value_by_name(&parsed.parameter)
    }

    fn with_entry<T>(&self, name: &str, f: impl FnOnce(&InstanceEntry) -> T) -> CoreResult<T> {
        self.instances
            .lock()
            .get(name)
            .map(f)
            .ok_or_else(|| CoreError::StateMachineNotFound(name.to_string()))
    }
}
