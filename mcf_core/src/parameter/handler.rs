//! Per-instance collection of parameter groups.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::group::{DEFAULT_MAX_PARAMETERS, ParameterGroup};
use crate::error::{CoreError, CoreResult};

/// Default ceiling on groups per handler.
pub const DEFAULT_MAX_PARAMETER_GROUPS: usize = 1024 * 1024;

#[derive(Debug, Default)]
struct HandlerInner {
    description: String,
    groups: Vec<Arc<ParameterGroup>>,
    index: HashMap<String, usize>,
}

/// Ordered, named collection of [`ParameterGroup`]s owned by one instance.
///
/// Groups are handed out as `Arc`s so readers can keep using a group after
/// the handler lock is released. The handler lock is never held while a
/// group lock is taken.
#[derive(Debug)]
pub struct ParameterHandler {
    max_groups: usize,
    max_parameters: usize,
    inner: Mutex<HandlerInner>,
}

impl ParameterHandler {
    pub fn new(description: &str) -> Self {
        Self {
            max_groups: DEFAULT_MAX_PARAMETER_GROUPS,
            max_parameters: DEFAULT_MAX_PARAMETERS,
            inner: Mutex::new(HandlerInner {
                description: description.to_string(),
                ..Default::default()
            }),
        }
    }

    /// Override the group ceiling.
    pub fn with_max_groups(mut self, max_groups: usize) -> Self {
        self.max_groups = max_groups;
        self
    }

    /// Parameter ceiling applied to every group this handler creates.
    pub fn with_max_parameters(mut self, max_parameters: usize) -> Self {
        self.max_parameters = max_parameters;
        self
    }

    pub fn max_groups(&self) -> usize {
        self.max_groups
    }

    pub fn max_parameters(&self) -> usize {
        self.max_parameters
    }

    pub fn description(&self) -> String {
        self.inner.lock().description.clone()
    }

    pub fn set_description(&self, description: &str) {
        self.inner.lock().description = description.to_string();
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.inner.lock().index.contains_key(name)
    }

    pub fn group_count(&self) -> usize {
        self.inner.lock().groups.len()
    }

    /// Create and append a new empty group.
    ///
    /// # Errors
    /// - `InvalidGroupName` for a malformed name
    /// - `DuplicateParameterGroupName` if the name exists
    /// - `TooManyParameterGroups` at the ceiling
    pub fn add_group(&self, name: &str, description: &str) -> CoreResult<Arc<ParameterGroup>> {
        let group =
            Arc::new(ParameterGroup::new(name, description)?.with_max_parameters(self.max_parameters));
        let mut inner = self.inner.lock();
        if inner.index.contains_key(name) {
            return Err(CoreError::DuplicateParameterGroupName(format!(
                "{}/{}",
                inner.description, name
            )));
        }
        if inner.groups.len() >= self.max_groups {
            return Err(CoreError::TooManyParameterGroups(format!(
                "{}/{}",
                inner.description, name
            )));
        }
        let idx = inner.groups.len();
        inner.index.insert(name.to_string(), idx);
        inner.groups.push(Arc::clone(&group));
        debug!(handler = %inner.description, group = name, "parameter group added");
        Ok(group)
    }

    /// Group at `index`, in insertion order.
    pub fn group(&self, index: usize) -> CoreResult<Arc<ParameterGroup>> {
        let inner = self.inner.lock();
        inner
            .groups
            .get(index)
            .cloned()
            .ok_or(CoreError::InvalidIndex {
                index,
                count: inner.groups.len(),
            })
    }

    /// Look up a group by name.
    ///
    /// Returns `Ok(None)` for a missing group unless `fail_if_missing` is set,
    /// in which case `ParameterGroupNotFound` is returned.
    pub fn find_group(
        &self,
        name: &str,
        fail_if_missing: bool,
    ) -> CoreResult<Option<Arc<ParameterGroup>>> {
        let inner = self.inner.lock();
        match inner.index.get(name) {
            Some(&idx) => Ok(Some(Arc::clone(&inner.groups[idx]))),
            None if fail_if_missing => Err(CoreError::ParameterGroupNotFound(name.to_string())),
            None => Ok(None),
        }
    }

    /// Like [`find_group`](Self::find_group) with `fail_if_missing = true`.
    pub fn require_group(&self, name: &str) -> CoreResult<Arc<ParameterGroup>> {
        self.find_group(name, true)?
            .ok_or_else(|| CoreError::ParameterGroupNotFound(name.to_string()))
    }

    /// All groups, in insertion order.
    pub fn groups(&self) -> Vec<Arc<ParameterGroup>> {
        self.inner.lock().groups.clone()
    }

    /// Structural deep copy: same groups and parameter definitions, values
    /// reset to defaults, no shared state with `self`.
    pub fn duplicate(&self) -> CoreResult<ParameterHandler> {
        let (description, groups) = {
            let inner = self.inner.lock();
            (inner.description.clone(), inner.groups.clone())
        };

        let copy = ParameterHandler::new(&description)
            .with_max_groups(self.max_groups)
            .with_max_parameters(self.max_parameters);
        for source in &groups {
            let target = copy.add_group(source.name(), source.description())?;
            target.add_duplicates_from_group(source)?;
        }
        debug!(handler = %description, groups = groups.len(), "parameter handler duplicated");
        Ok(copy)
    }
}
