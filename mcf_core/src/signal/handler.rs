//! Process-wide signal table with UUID-correlated result delivery.
//!
//! All signals live behind one lock. A condition variable is notified on
//! every trigger and every handle, so the blocking `wait_for_*` calls and the
//! non-blocking polls observe the same state; polling callers never depend on
//! the notifications.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::definition::{SignalDefinition, SignalParameterDef, SignalProperties, StateSignal};
use crate::error::{CoreError, CoreResult};
use crate::names::{check_instance_name, check_parameter_name, is_valid_name};
use crate::parameter::ParameterGroup;

#[derive(Debug, Default)]
struct SignalTable {
    signals: Vec<StateSignal>,
    /// instance → signal name → index into `signals`.
    by_name: HashMap<String, BTreeMap<String, usize>>,
    /// Issued correlation UUID → index into `signals`. Entries outlive the
    /// trigger and are removed only when the result is collected with clear.
    by_uuid: HashMap<Uuid, usize>,
}

impl SignalTable {
    fn index_of(&self, instance: &str, name: &str) -> CoreResult<usize> {
        self.by_name
            .get(instance)
            .and_then(|signals| signals.get(name))
            .copied()
            .ok_or_else(|| CoreError::SignalNotFound(format!("{instance}/{name}")))
    }

    fn index_of_uuid(&self, uuid: &Uuid) -> CoreResult<usize> {
        self.by_uuid
            .get(uuid)
            .copied()
            .ok_or_else(|| CoreError::SignalNotFound(uuid.to_string()))
    }

    fn collect(&mut self, uuid: &Uuid, clear: bool) -> CoreResult<Option<String>> {
        let idx = self.index_of_uuid(uuid)?;
        let result = self.signals[idx].collect(uuid, clear);
        if result.is_some() && clear {
            self.by_uuid.remove(uuid);
            debug!(%uuid, "signal result collected and cleared");
        }
        Ok(result)
    }
}

/// Named mailboxes per `(instance, signal)` with at most one outstanding
/// request each.
#[derive(Debug, Default)]
pub struct StateSignalHandler {
    table: Mutex<SignalTable>,
    changed: Condvar,
}

impl StateSignalHandler {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Definitions ────────────────────────────────────────────────

    /// Define a signal for an instance.
    ///
    /// # Errors
    /// - `InvalidInstanceName` for a malformed instance name
    /// - `InvalidSignalName` for an empty or malformed signal name
    /// - `InvalidParameterName` / `DuplicateParameterName` for a bad payload
    ///   field list
    /// - `DuplicateSignal` if the pair is already defined
    pub fn add_signal_definition(
        &self,
        instance: &str,
        name: &str,
        parameters: Vec<SignalParameterDef>,
        results: Vec<SignalParameterDef>,
    ) -> CoreResult<()> {
        check_instance_name(instance)?;
        if !is_valid_name(name) {
            return Err(CoreError::InvalidSignalName(format!("{instance}/{name}")));
        }
        check_field_list(&parameters)?;
        check_field_list(&results)?;

        let mut table = self.table.lock();
        if table
            .by_name
            .get(instance)
            .is_some_and(|signals| signals.contains_key(name))
        {
            return Err(CoreError::DuplicateSignal(format!("{instance}/{name}")));
        }

        let idx = table.signals.len();
        table.signals.push(StateSignal::new(SignalDefinition {
            instance: instance.to_string(),
            name: name.to_string(),
            parameters,
            results,
        }));
        table
            .by_name
            .entry(instance.to_string())
            .or_default()
            .insert(name.to_string(), idx);
        info!(instance, signal = name, "signal defined");
        Ok(())
    }

    pub fn has_signal_definition(&self, instance: &str, name: &str) -> bool {
        self.table.lock().index_of(instance, name).is_ok()
    }

    /// # Errors
    /// `SignalNotFound` if the pair is not defined.
    pub fn signal_definition(&self, instance: &str, name: &str) -> CoreResult<Arc<SignalDefinition>> {
        let table = self.table.lock();
        let idx = table.index_of(instance, name)?;
        Ok(Arc::clone(&table.signals[idx].definition))
    }

    /// Signal names defined for `instance`, sorted.
    pub fn signal_names(&self, instance: &str) -> Vec<String> {
        self.table
            .lock()
            .by_name
            .get(instance)
            .map(|signals| signals.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn signal_count(&self) -> usize {
        self.table.lock().signals.len()
    }

    /// Add the declared request fields of a signal to `group`.
    ///
    /// The signal lock is released before `group` is touched.
    pub fn populate_parameter_group(
        &self,
        instance: &str,
        name: &str,
        group: &ParameterGroup,
    ) -> CoreResult<()> {
        self.signal_definition(instance, name)?
            .populate_parameters(group)
    }

    /// Add the declared result fields of a signal to `group`.
    pub fn populate_result_group(
        &self,
        instance: &str,
        name: &str,
        group: &ParameterGroup,
    ) -> CoreResult<()> {
        self.signal_definition(instance, name)?.populate_results(group)
    }

    // ─── Producer side ──────────────────────────────────────────────

    /// Raise a signal with a request payload.
    ///
    /// Returns the fresh correlation UUID, or `None` if the signal is already
    /// triggered. A `None` leaves the stored payload and UUID untouched.
    ///
    /// # Errors
    /// `SignalNotFound` if the pair is not defined.
    pub fn trigger_signal(
        &self,
        instance: &str,
        name: &str,
        payload: &str,
    ) -> CoreResult<Option<Uuid>> {
        let mut table = self.table.lock();
        let idx = table.index_of(instance, name)?;
        let Some(uuid) = table.signals[idx].trigger(payload) else {
            debug!(instance, signal = name, "trigger refused, signal busy");
            return Ok(None);
        };
        table.by_uuid.insert(uuid, idx);
        drop(table);

        self.changed.notify_all();
        debug!(instance, signal = name, %uuid, "signal triggered");
        Ok(Some(uuid))
    }

    /// `true` iff the signal is idle, i.e. a trigger would succeed right now.
    ///
    /// # Errors
    /// `SignalNotFound` if the pair is not defined.
    pub fn can_trigger(&self, instance: &str, name: &str) -> CoreResult<bool> {
        let table = self.table.lock();
        let idx = table.index_of(instance, name)?;
        Ok(!table.signals[idx].is_triggered())
    }

    /// Collect the result of a handled signal.
    ///
    /// Returns `None` if the signal has not been handled yet. With `clear`
    /// set, a present result is removed together with its UUID; results that
    /// are never collected with `clear` stay for the process lifetime.
    ///
    /// # Errors
    /// `SignalNotFound` if the UUID was never issued or was already cleared.
    pub fn signal_has_been_handled(&self, uuid: &Uuid, clear: bool) -> CoreResult<Option<String>> {
        self.table.lock().collect(uuid, clear)
    }

    /// Block until the signal issued as `uuid` has been handled, or until
    /// `timeout` elapses. Semantics of the result match
    /// [`signal_has_been_handled`](Self::signal_has_been_handled).
    pub fn wait_for_handling(
        &self,
        uuid: &Uuid,
        clear: bool,
        timeout: Duration,
    ) -> CoreResult<Option<String>> {
        let deadline = Instant::now().checked_add(timeout);
        let mut table = self.table.lock();
        loop {
            if let Some(result) = table.collect(uuid, clear)? {
                return Ok(Some(result));
            }
            if self.wait(&mut table, deadline) {
                return table.collect(uuid, clear);
            }
        }
    }

    // ─── Consumer side ──────────────────────────────────────────────

    /// Non-blocking poll: the correlation UUID if the signal is triggered.
    ///
    /// # Errors
    /// `SignalNotFound` if the pair is not defined.
    pub fn check_signal(&self, instance: &str, name: &str) -> CoreResult<Option<Uuid>> {
        let table = self.table.lock();
        let idx = table.index_of(instance, name)?;
        Ok(table.signals[idx].current_uuid())
    }

    /// `true` if `uuid` is the outstanding trigger of one of `instance`'s
    /// signals. Unknown or already handled UUIDs yield `false`.
    pub fn check_signal_uuid(&self, instance: &str, uuid: &Uuid) -> bool {
        let table = self.table.lock();
        let Ok(idx) = table.index_of_uuid(uuid) else {
            return false;
        };
        let signal = &table.signals[idx];
        signal.definition.instance == instance && signal.current_uuid() == Some(*uuid)
    }

    /// Block until the signal is triggered or `timeout` elapses.
    ///
    /// # Errors
    /// `SignalNotFound` if the pair is not defined.
    pub fn wait_for_signal(
        &self,
        instance: &str,
        name: &str,
        timeout: Duration,
    ) -> CoreResult<Option<Uuid>> {
        let deadline = Instant::now().checked_add(timeout);
        let mut table = self.table.lock();
        let idx = table.index_of(instance, name)?;
        loop {
            if let Some(uuid) = table.signals[idx].current_uuid() {
                return Ok(Some(uuid));
            }
            if self.wait(&mut table, deadline) {
                return Ok(table.signals[idx].current_uuid());
            }
        }
    }

    /// Attach a result to a triggered signal and return it to Idle.
    ///
    /// The result is stored under the signal's correlation UUID current at
    /// call time. Callers pass the UUID they received from `check_signal`;
    /// it selects the signal.
    ///
    /// # Errors
    /// `SignalNotFound` if the UUID is unknown.
    pub fn mark_signal_as_handled(&self, uuid: &Uuid, result: &str) -> CoreResult<()> {
        let mut table = self.table.lock();
        let idx = table.index_of_uuid(uuid)?;
        let signal = &mut table.signals[idx];
        match signal.mark_handled(result) {
            Some(stored) if stored == *uuid => {
                debug!(signal = %signal.definition.key(), %uuid, "signal handled");
            }
            Some(stored) => {
                warn!(
                    signal = %signal.definition.key(),
                    %uuid,
                    current = %stored,
                    "signal handled through a stale UUID; result stored under current UUID"
                );
            }
            None => {
                warn!(
                    signal = %signal.definition.key(),
                    %uuid,
                    "signal handled while idle; result dropped"
                );
            }
        }
        drop(table);

        self.changed.notify_all();
        Ok(())
    }

    /// Instance, name and payload of the outstanding trigger `uuid`.
    ///
    /// Returns `None` once the signal has been handled or re-triggered since
    /// `uuid` was issued, even if its result is still collectable.
    pub fn find_signal_properties_by_uuid(&self, uuid: &Uuid) -> Option<SignalProperties> {
        let table = self.table.lock();
        let idx = table.index_of_uuid(uuid).ok()?;
        let signal = &table.signals[idx];
        if signal.current_uuid() != Some(*uuid) {
            return None;
        }
        signal.properties()
    }

    /// Claim the outstanding trigger `uuid` for exclusive handling.
    ///
    /// Returns `Ok(None)` if the signal was handled or re-triggered since
    /// `uuid` was issued, or if another consumer already claimed it.
    ///
    /// # Errors
    /// `SignalNotFound` if `uuid` was never issued or its result was already
    /// cleared.
    pub fn claim_signal(&self, uuid: &Uuid) -> CoreResult<Option<SignalProperties>> {
        let mut table = self.table.lock();
        let idx = table.index_of_uuid(uuid)?;
        let signal = &mut table.signals[idx];
        if signal.current_uuid() != Some(*uuid) || !signal.claim() {
            return Ok(None);
        }
        Ok(signal.properties())
    }

    /// Block until the signal carries an unclaimed trigger, then claim it.
    ///
    /// Of several threads waiting on the same signal, exactly one wins each
    /// trigger; the rest keep waiting. Returns `Ok(None)` on timeout.
    pub fn wait_and_claim_signal(
        &self,
        instance: &str,
        name: &str,
        timeout: Duration,
    ) -> CoreResult<Option<SignalProperties>> {
        let deadline = Instant::now().checked_add(timeout);
        let mut table = self.table.lock();
        let idx = table.index_of(instance, name)?;
        loop {
            let signal = &mut table.signals[idx];
            if signal.claim() {
                return Ok(signal.properties());
            }
            if self.wait(&mut table, deadline) {
                let signal = &mut table.signals[idx];
                return Ok(if signal.claim() { signal.properties() } else { None });
            }
        }
    }

    // ─── Diagnostics ────────────────────────────────────────────────

    /// Number of handled results not yet collected with clear.
    pub fn pending_result_count(&self) -> usize {
        self.table
            .lock()
            .signals
            .iter()
            .map(StateSignal::pending_results)
            .sum()
    }

    /// Wait for a change notification. Returns `true` once the deadline
    /// has passed.
    fn wait(&self, table: &mut MutexGuard<'_, SignalTable>, deadline: Option<Instant>) -> bool {
        match deadline {
            Some(deadline) => self.changed.wait_until(table, deadline).timed_out(),
            None => {
                self.changed.wait(table);
                false
            }
        }
    }
}

fn check_field_list(defs: &[SignalParameterDef]) -> CoreResult<()> {
    for (i, def) in defs.iter().enumerate() {
        check_parameter_name(&def.name)?;
        if defs[..i].iter().any(|d| d.name == def.name) {
            return Err(CoreError::DuplicateParameterName(def.name.clone()));
        }
    }
    Ok(())
}
