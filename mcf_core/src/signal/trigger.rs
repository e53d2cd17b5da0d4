//! Typed producer/consumer wrappers around [`StateSignalHandler`].
//!
//! Request and result payloads travel through the handler as JSON objects of
//! `name → string value`, produced and consumed by the parameter groups the
//! wrappers populate from the signal definition.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use uuid::Uuid;

use super::definition::SignalProperties;
use super::handler::StateSignalHandler;
use crate::error::{CoreError, CoreResult};
use crate::parameter::ParameterGroup;

/// Producer side of one signal: fill in the request, trigger once, collect
/// the result.
#[derive(Debug)]
pub struct SignalTrigger {
    handler: Arc<StateSignalHandler>,
    instance: String,
    name: String,
    parameters: ParameterGroup,
    results: ParameterGroup,
    triggered: Option<Uuid>,
}

impl SignalTrigger {
    /// # Errors
    /// `SignalNotFound` if the signal is not defined.
    pub fn new(handler: Arc<StateSignalHandler>, instance: &str, name: &str) -> CoreResult<Self> {
        let parameters = ParameterGroup::unnamed();
        let results = ParameterGroup::unnamed();
        handler.populate_parameter_group(instance, name, &parameters)?;
        handler.populate_result_group(instance, name, &results)?;
        Ok(Self {
            handler,
            instance: instance.to_string(),
            name: name.to_string(),
            parameters,
            results,
            triggered: None,
        })
    }

    /// Request fields. Set them before calling [`trigger`](Self::trigger).
    pub fn parameters(&self) -> &ParameterGroup {
        &self.parameters
    }

    /// Result fields, filled by [`wait_for_handling`](Self::wait_for_handling).
    pub fn results(&self) -> &ParameterGroup {
        &self.results
    }

    pub fn can_trigger(&self) -> CoreResult<bool> {
        if self.triggered.is_some() {
            return Ok(false);
        }
        self.handler.can_trigger(&self.instance, &self.name)
    }

    /// Trigger the signal with the current request fields.
    ///
    /// # Errors
    /// - `SignalAlreadyTriggered` if this helper already triggered
    /// - `CouldNotTriggerSignal` if another producer holds the signal
    pub fn trigger(&mut self) -> CoreResult<Uuid> {
        if self.triggered.is_some() {
            return Err(CoreError::SignalAlreadyTriggered(self.key()));
        }
        let payload = self.parameters.to_json()?;
        let uuid = self
            .handler
            .trigger_signal(&self.instance, &self.name, &payload)?
            .ok_or_else(|| CoreError::CouldNotTriggerSignal(self.key()))?;
        self.triggered = Some(uuid);
        Ok(uuid)
    }

    pub fn triggered_uuid(&self) -> Option<Uuid> {
        self.triggered
    }

    /// Wait for the consumer's result and load it into [`results`](Self::results).
    ///
    /// Returns `false` on timeout. The result is cleared from the handler
    /// once collected.
    ///
    /// # Errors
    /// - `SignalNotTriggered` if [`trigger`](Self::trigger) was never called
    /// - `InvalidJson` / `ParameterNotFound` for a result that does not match
    ///   the result definition
    pub fn wait_for_handling(&self, timeout: Duration) -> CoreResult<bool> {
        let uuid = self
            .triggered
            .ok_or_else(|| CoreError::SignalNotTriggered(self.key()))?;
        let Some(result) = self.handler.wait_for_handling(&uuid, true, timeout)? else {
            return Ok(false);
        };
        if !result.is_empty() {
            self.results.apply_json(&result)?;
        }
        Ok(true)
    }

    fn key(&self) -> String {
        format!("{}/{}", self.instance, self.name)
    }
}

/// Consumer side of one triggered signal. Each trigger is claimed by at
/// most one handle.
#[derive(Debug)]
pub struct SignalHandle {
    handler: Arc<StateSignalHandler>,
    uuid: Uuid,
    instance: String,
    name: String,
    parameters: ParameterGroup,
    results: ParameterGroup,
}

impl SignalHandle {
    /// Claim the outstanding trigger `uuid` and decode its request.
    ///
    /// Returns `None` if the trigger was already handled, re-triggered or
    /// claimed by another handle.
    ///
    /// # Errors
    /// - `SignalNotFound` if `uuid` was never issued
    /// - `InvalidJson` / `ParameterNotFound` for a payload that does not
    ///   match the request definition
    pub fn from_uuid(handler: Arc<StateSignalHandler>, uuid: Uuid) -> CoreResult<Option<Self>> {
        match handler.claim_signal(&uuid)? {
            Some(props) => Self::attach(handler, props).map(Some),
            None => Ok(None),
        }
    }

    /// Block until the signal carries an unclaimed trigger, then claim it.
    ///
    /// Returns `None` on timeout. A consumer that loses a trigger to another
    /// handle keeps waiting for the next one.
    pub fn wait(
        handler: Arc<StateSignalHandler>,
        instance: &str,
        name: &str,
        timeout: Duration,
    ) -> CoreResult<Option<Self>> {
        match handler.wait_and_claim_signal(instance, name, timeout)? {
            Some(props) => Self::attach(handler, props).map(Some),
            None => Ok(None),
        }
    }

    fn attach(handler: Arc<StateSignalHandler>, props: SignalProperties) -> CoreResult<Self> {
        let parameters = ParameterGroup::unnamed();
        let results = ParameterGroup::unnamed();
        handler.populate_parameter_group(&props.instance, &props.name, &parameters)?;
        handler.populate_result_group(&props.instance, &props.name, &results)?;
        if !props.payload.is_empty() {
            parameters.apply_json(&props.payload)?;
        }

        Ok(Self {
            handler,
            uuid: props.uuid,
            instance: props.instance,
            name: props.name,
            parameters,
            results,
        })
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decoded request fields.
    pub fn parameters(&self) -> &ParameterGroup {
        &self.parameters
    }

    /// Result fields. Set them before calling [`finish`](Self::finish).
    pub fn results(&self) -> &ParameterGroup {
        &self.results
    }

    /// Mark the signal handled with the current result fields.
    pub fn finish(self) -> CoreResult<()> {
        debug!(instance = %self.instance, signal = %self.name, uuid = %self.uuid, "finishing signal");
        self.handler
            .mark_signal_as_handled(&self.uuid, &self.results.to_json()?)
    }
}
