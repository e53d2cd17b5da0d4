//! Identifier rules shared by instances, groups and parameters.
//!
//! A valid name is non-empty and consists of ASCII letters, digits,
//! `_` and `-`. Dots are reserved for the dot-path addressing scheme.

use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Upper bound on identifier length.
pub const MAX_NAME_LENGTH: usize = 256;

/// Returns `true` if `name` is a valid identifier.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LENGTH
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

pub(crate) fn check_instance_name(name: &str) -> CoreResult<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(CoreError::InvalidInstanceName(name.to_string()))
    }
}

pub(crate) fn check_group_name(name: &str) -> CoreResult<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(CoreError::InvalidGroupName(name.to_string()))
    }
}

pub(crate) fn check_parameter_name(name: &str) -> CoreResult<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(CoreError::InvalidParameterName(name.to_string()))
    }
}

/// Parse a UUID string and return its lowercase hyphenated form.
///
/// An empty string maps to the nil UUID.
pub fn normalize_uuid(value: &str) -> CoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(Uuid::nil().hyphenated().to_string());
    }
    Uuid::parse_str(trimmed)
        .map(|u| u.hyphenated().to_string())
        .map_err(|_| CoreError::InvalidParameterValue {
            value: value.to_string(),
            expected: "uuid",
        })
}
