//! Dot-path addressing: `instance.group.parameter` or `instance.group`.
//!
//! The pseudo-group `$state` (`axis1.$state`) names the current state of an
//! instance. It only passes validation when non-alphanumeric names are
//! allowed.

use core::fmt;

use crate::error::{CoreError, CoreResult};
use crate::names::{check_group_name, check_instance_name, check_parameter_name};

/// Pseudo-group addressing the current state name of an instance.
pub const STATE_PSEUDO_GROUP: &str = "$state";

/// Parsed dot-path. `parameter` is empty for two-segment paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterPath {
    pub instance: String,
    pub group: String,
    pub parameter: String,
}

impl ParameterPath {
    /// Split a dot-path into instance, group and parameter.
    ///
    /// Surrounding whitespace is ignored. Everything after the second dot
    /// belongs to the parameter segment.
    ///
    /// # Errors
    /// - `InvalidParameterPath` if there is no dot, or only one dot and
    ///   `allow_empty_parameter_name` is false
    /// - `InvalidInstanceName` / `InvalidGroupName` / `InvalidParameterName`
    ///   for a malformed segment, unless `allow_non_alphanumeric_names` is set
    pub fn parse(
        path: &str,
        allow_empty_parameter_name: bool,
        allow_non_alphanumeric_names: bool,
    ) -> CoreResult<Self> {
        let trimmed = path.trim();
        let (instance, rest) = trimmed
            .split_once('.')
            .ok_or_else(|| CoreError::InvalidParameterPath(path.to_string()))?;

        let (group, parameter) = match rest.split_once('.') {
            Some((group, parameter)) => (group, Some(parameter)),
            None if allow_empty_parameter_name => (rest, None),
            None => return Err(CoreError::InvalidParameterPath(path.to_string())),
        };

        if !allow_non_alphanumeric_names {
            check_instance_name(instance)?;
            check_group_name(group)?;
            if let Some(parameter) = parameter {
                check_parameter_name(parameter)?;
            }
        }

        Ok(Self {
            instance: instance.to_string(),
            group: group.to_string(),
            parameter: parameter.unwrap_or_default().to_string(),
        })
    }

    /// `true` for `instance.$state`.
    pub fn is_state(&self) -> bool {
        self.group == STATE_PSEUDO_GROUP && self.parameter.is_empty()
    }
}

impl fmt::Display for ParameterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parameter.is_empty() {
            write!(f, "{}.{}", self.instance, self.group)
        } else {
            write!(f, "{}.{}.{}", self.instance, self.group, self.parameter)
        }
    }
}
