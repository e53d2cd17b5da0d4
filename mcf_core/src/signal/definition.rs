//! Signal definitions and the live Idle/Triggered state of one signal.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreResult;
use crate::parameter::{ParameterGroup, ParameterType};

/// One declared field of a signal's request or result payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalParameterDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: ParameterType,
}

impl SignalParameterDef {
    pub fn new(name: &str, data_type: ParameterType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
        }
    }
}

/// Immutable definition of a signal, keyed by `(instance, name)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalDefinition {
    pub instance: String,
    pub name: String,
    pub parameters: Vec<SignalParameterDef>,
    pub results: Vec<SignalParameterDef>,
}

impl SignalDefinition {
    /// `instance/name`, as used in error messages.
    pub fn key(&self) -> String {
        format!("{}/{}", self.instance, self.name)
    }

    /// Add every declared request field to `group`.
    pub fn populate_parameters(&self, group: &ParameterGroup) -> CoreResult<()> {
        populate(&self.parameters, group)
    }

    /// Add every declared result field to `group`.
    pub fn populate_results(&self, group: &ParameterGroup) -> CoreResult<()> {
        populate(&self.results, group)
    }
}

fn populate(defs: &[SignalParameterDef], group: &ParameterGroup) -> CoreResult<()> {
    for def in defs {
        group.add_parameter(&def.name, def.data_type, "", "")?;
    }
    Ok(())
}

/// Correlation UUID, instance, name and request payload of a triggered
/// signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalProperties {
    pub uuid: Uuid,
    pub instance: String,
    pub name: String,
    pub payload: String,
}

/// Live state of one signal.
///
/// Idle: `current` is `None`. Triggered: `current` holds the correlation
/// UUID and `payload` the request. A triggered signal is claimed by at most
/// one consumer wrapper. Handled results stay in `results` until collected
/// with `clear`.
#[derive(Debug)]
pub(crate) struct StateSignal {
    pub(crate) definition: Arc<SignalDefinition>,
    payload: String,
    current: Option<Uuid>,
    claimed: bool,
    results: HashMap<Uuid, String>,
}

impl StateSignal {
    pub(crate) fn new(definition: SignalDefinition) -> Self {
        Self {
            definition: Arc::new(definition),
            payload: String::new(),
            current: None,
            claimed: false,
            results: HashMap::new(),
        }
    }

    pub(crate) fn is_triggered(&self) -> bool {
        self.current.is_some()
    }

    /// Idle → Triggered. `None` if already triggered; state is untouched.
    pub(crate) fn trigger(&mut self, payload: &str) -> Option<Uuid> {
        if self.is_triggered() {
            return None;
        }
        let uuid = Uuid::new_v4();
        self.payload = payload.to_string();
        self.current = Some(uuid);
        self.claimed = false;
        Some(uuid)
    }

    /// Take exclusive ownership of the outstanding trigger. `false` if idle
    /// or already claimed.
    pub(crate) fn claim(&mut self) -> bool {
        if !self.is_triggered() || self.claimed {
            return false;
        }
        self.claimed = true;
        true
    }

    /// Properties of the outstanding trigger, if any.
    pub(crate) fn properties(&self) -> Option<SignalProperties> {
        self.current.map(|uuid| SignalProperties {
            uuid,
            instance: self.definition.instance.clone(),
            name: self.definition.name.clone(),
            payload: self.payload.clone(),
        })
    }

    /// Correlation UUID of the outstanding trigger, if any.
    pub(crate) fn current_uuid(&self) -> Option<Uuid> {
        self.current
    }

    pub(crate) fn payload(&self) -> &str {
        &self.payload
    }

    /// Triggered → Idle. The result is stored under the UUID that is current
    /// at call time; returns that UUID, or `None` if nothing was outstanding
    /// and the result was dropped.
    pub(crate) fn mark_handled(&mut self, result: &str) -> Option<Uuid> {
        let stored = self.current.take();
        self.claimed = false;
        if let Some(uuid) = stored {
            self.results.insert(uuid, result.to_string());
        }
        self.payload.clear();
        stored
    }

    /// Read a handled result, removing it when `clear` is set.
    pub(crate) fn collect(&mut self, uuid: &Uuid, clear: bool) -> Option<String> {
        if clear {
            self.results.remove(uuid)
        } else {
            self.results.get(uuid).cloned()
        }
    }

    pub(crate) fn pending_results(&self) -> usize {
        self.results.len()
    }
}
