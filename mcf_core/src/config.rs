//! Configuration loading traits and types.
//!
//! Machine state is rebuilt at every start from a static TOML description:
//! parameter templates, state machine instances and their signals. Nothing
//! here is persisted back.
//!
//! # Usage
//!
//! ```rust,no_run
//! use mcf_core::config::{ConfigError, ConfigLoader, MachineDefinition};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let definition = MachineDefinition::load(Path::new("machine.toml"))?;
//!     definition.validate()?;
//!     println!("Service: {}", definition.shared.service_name);
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::CoreError;
use crate::parameter::group::DEFAULT_MAX_PARAMETERS;
use crate::parameter::handler::DEFAULT_MAX_PARAMETER_GROUPS;
use crate::parameter::ParameterType;
use crate::signal::SignalParameterDef;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<CoreError> for ConfigError {
    fn from(e: CoreError) -> Self {
        ConfigError::ValidationError(e.to_string())
    }
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string for `tracing_subscriber::EnvFilter`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "cell-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// # Errors
    /// `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Capacity ceilings applied to every handler and group built at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreLimits {
    pub max_parameter_groups: usize,
    pub max_parameters: usize,
}

impl Default for CoreLimits {
    fn default() -> Self {
        Self {
            max_parameter_groups: DEFAULT_MAX_PARAMETER_GROUPS,
            max_parameters: DEFAULT_MAX_PARAMETERS,
        }
    }
}

impl CoreLimits {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_parameter_groups == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_parameter_groups must be > 0".to_string(),
            ));
        }
        if self.max_parameters == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_parameters must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// One parameter declaration inside a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: ParameterType,
    #[serde(default)]
    pub description: String,
    /// Default value in string form. Blank means the type's zero value.
    #[serde(default)]
    pub default: String,
}

/// Read-only alias of a parameter in another group.
///
/// `instance` defaults to the instance owning the group. The source must be
/// declared before any derived parameter that points at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedDef {
    pub name: String,
    #[serde(default)]
    pub instance: Option<String>,
    pub group: String,
    pub parameter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,
    #[serde(default)]
    pub derived: Vec<DerivedDef>,
}

/// Reusable parameter schema, duplicated into every instance naming it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub groups: Vec<GroupDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalDef {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<SignalParameterDef>,
    #[serde(default)]
    pub results: Vec<SignalParameterDef>,
}

/// One state machine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Template whose groups are duplicated before `groups` are added.
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub groups: Vec<GroupDef>,
    #[serde(default)]
    pub signals: Vec<SignalDef>,
}

/// Static machine description.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// service_name = "cell-01"
///
/// [[templates]]
/// name = "axis"
///
/// [[templates.groups]]
/// name = "motion"
/// parameters = [{ name = "speed", type = "double", default = "25.0" }]
///
/// [[instances]]
/// name = "axis1"
/// template = "axis"
///
/// [[instances.signals]]
/// name = "Home"
/// results = [{ name = "ok", type = "bool" }]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineDefinition {
    pub shared: SharedConfig,
    #[serde(default)]
    pub limits: CoreLimits,
    #[serde(default)]
    pub templates: Vec<TemplateDef>,
    #[serde(default)]
    pub instances: Vec<InstanceDef>,
}

impl MachineDefinition {
    /// Structural checks that do not need the core types. Name syntax and
    /// per-group duplicates are reported when the state is built.
    ///
    /// # Errors
    /// `ConfigError::ValidationError` for an empty service name, zero
    /// limits, duplicate template or instance names, an instance naming an
    /// unknown template, or a derived parameter naming an unknown instance.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.limits.validate()?;

        let mut templates = HashSet::new();
        for template in &self.templates {
            if !templates.insert(template.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate template '{}'",
                    template.name
                )));
            }
        }

        let mut instances = HashSet::new();
        for instance in &self.instances {
            if !instances.insert(instance.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate instance '{}'",
                    instance.name
                )));
            }
            if let Some(template) = &instance.template
                && !templates.contains(template.as_str())
            {
                return Err(ConfigError::ValidationError(format!(
                    "instance '{}' references unknown template '{}'",
                    instance.name, template
                )));
            }
        }

        let groups = self
            .templates
            .iter()
            .flat_map(|t| &t.groups)
            .chain(self.instances.iter().flat_map(|i| &i.groups));
        for group in groups {
            for derived in &group.derived {
                if let Some(source) = &derived.instance
                    && !instances.contains(source.as_str())
                {
                    return Err(ConfigError::ValidationError(format!(
                        "derived parameter '{}.{}' references unknown instance '{}'",
                        group.name, derived.name, source
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn template(&self, name: &str) -> Option<&TemplateDef> {
        self.templates.iter().find(|t| t.name == name)
    }
}

/// Trait for loading configuration from TOML files.
///
/// Implemented for every `serde::de::DeserializeOwned` type.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
