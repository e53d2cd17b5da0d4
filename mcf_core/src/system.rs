//! Startup assembly of the registry and signal table from a
//! [`MachineDefinition`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::{ConfigError, ConfigLoader, CoreLimits, GroupDef, MachineDefinition};
use crate::error::CoreResult;
use crate::parameter::ParameterHandler;
use crate::registry::StateMachineRegistry;
use crate::signal::StateSignalHandler;

/// The two process-wide components, shared by every thread.
#[derive(Debug, Clone, Default)]
pub struct SystemState {
    pub registry: Arc<StateMachineRegistry>,
    pub signals: Arc<StateSignalHandler>,
}

impl SystemState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load, validate and build a machine definition file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let definition = MachineDefinition::load(path)?;
        Self::from_definition(&definition)
    }

    /// Build registry and signal table from a definition.
    ///
    /// Template handlers are built once and duplicated per instance, so
    /// instances never share parameter values. Derived parameters are linked
    /// once every instance is registered, so they may point at any instance.
    ///
    /// # Errors
    /// `ConfigError::ValidationError` for structural problems and for every
    /// core error raised while building (bad names, duplicates, bad defaults).
    pub fn from_definition(definition: &MachineDefinition) -> Result<Self, ConfigError> {
        definition.validate()?;
        let limits = definition.limits;

        let mut templates = HashMap::with_capacity(definition.templates.len());
        for template in &definition.templates {
            let handler = new_handler(&template.description, limits);
            add_groups(&handler, &template.groups)?;
            templates.insert(template.name.as_str(), handler);
        }

        let state = Self::new();
        for instance in &definition.instances {
            let handler = match instance.template.as_deref().and_then(|t| templates.get(t)) {
                Some(template) => template.duplicate()?,
                None => new_handler("", limits),
            };
            let description = if instance.description.is_empty() {
                instance.name.as_str()
            } else {
                instance.description.as_str()
            };
            handler.set_description(description);
            add_groups(&handler, &instance.groups)?;
            state
                .registry
                .register_instance(&instance.name, Arc::new(handler))?;

            for signal in &instance.signals {
                state.signals.add_signal_definition(
                    &instance.name,
                    &signal.name,
                    signal.parameters.clone(),
                    signal.results.clone(),
                )?;
            }
        }

        for instance in &definition.instances {
            let template_groups = instance
                .template
                .as_deref()
                .and_then(|t| definition.template(t))
                .map(|t| t.groups.as_slice())
                .unwrap_or_default();
            let handler = state.registry.parameter_handler(&instance.name)?;
            for def in template_groups.iter().chain(&instance.groups) {
                add_derived(&state.registry, &instance.name, &handler, def)?;
            }
        }

        info!(
            service = %definition.shared.service_name,
            instances = state.registry.instance_count(),
            signals = state.signals.signal_count(),
            "machine state built"
        );
        Ok(state)
    }
}

fn new_handler(description: &str, limits: CoreLimits) -> ParameterHandler {
    ParameterHandler::new(description)
        .with_max_groups(limits.max_parameter_groups)
        .with_max_parameters(limits.max_parameters)
}

/// Add groups, extending a group the handler already has under that name.
fn add_groups(handler: &ParameterHandler, groups: &[GroupDef]) -> CoreResult<()> {
    for def in groups {
        let group = match handler.find_group(&def.name, false)? {
            Some(existing) => existing,
            None => handler.add_group(&def.name, &def.description)?,
        };
        for p in &def.parameters {
            group.add_parameter(&p.name, p.data_type, &p.description, &p.default)?;
        }
    }
    Ok(())
}

/// Link the derived parameters of one group. The source instance defaults
/// to the owner.
fn add_derived(
    registry: &StateMachineRegistry,
    owner: &str,
    handler: &ParameterHandler,
    def: &GroupDef,
) -> CoreResult<()> {
    if def.derived.is_empty() {
        return Ok(());
    }
    let group = handler.require_group(&def.name)?;
    for derived in &def.derived {
        let instance = derived.instance.as_deref().unwrap_or(owner);
        let source = registry
            .parameter_handler(instance)?
            .require_group(&derived.group)?;
        group.add_derived_parameter(&derived.name, &source, &derived.parameter)?;
    }
    Ok(())
}
