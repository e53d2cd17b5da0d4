//! Ordered, named collection of typed parameters.
//!
//! A `ParameterGroup` guards its parameters with one internal lock. Each
//! public call takes that lock once and never reaches into another group
//! while holding it; group-to-group copies snapshot the source first.
//!
//! A derived parameter is a read-only alias of a parameter in another group.
//! Reads through it release this group's lock before the source group is
//! locked, one hop at a time.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};

use super::value::{ParameterType, ParameterValue};
use crate::error::{CoreError, CoreResult};
use crate::names::{check_group_name, check_parameter_name};

/// Default ceiling on parameters per group.
pub const DEFAULT_MAX_PARAMETERS: usize = 1024 * 1024;

/// Longest chain of derived parameters followed by one read.
const MAX_DERIVATION_DEPTH: usize = 16;

/// Definition of one parameter, detached from the group lock.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    pub name: String,
    pub description: String,
    /// Default value rendered as a string.
    pub default_value: String,
    pub data_type: ParameterType,
    /// `group.parameter` of the source for derived parameters.
    pub source: Option<String>,
}

#[derive(Debug, Clone)]
struct Valued {
    description: String,
    default_value: ParameterValue,
    value: ParameterValue,
    change_counter: u64,
}

impl Valued {
    fn data_type(&self) -> ParameterType {
        self.default_value.data_type()
    }

    fn info(&self, name: &str) -> ParameterInfo {
        ParameterInfo {
            name: name.to_string(),
            description: self.description.clone(),
            default_value: self.default_value.to_string(),
            data_type: self.data_type(),
            source: None,
        }
    }

    fn assign(&mut self, value: ParameterValue) {
        self.value = value;
        self.change_counter += 1;
    }
}

#[derive(Clone)]
struct Link {
    group: Arc<ParameterGroup>,
    source: String,
}

impl Link {
    fn path(&self) -> String {
        format!("{}.{}", self.group.name(), self.source)
    }
}

// Only the path: the source group may link back here.
impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Link").field(&self.path()).finish()
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Valued(Valued),
    Derived(Link),
}

#[derive(Debug, Clone)]
struct Parameter {
    name: String,
    slot: Slot,
}

/// What a read sees under the group lock: a local result, or the link to
/// follow once the lock is released.
enum Entry<T> {
    Local(T),
    Link(Link),
}

impl Parameter {
    fn valued(name: &str, description: &str, default_value: ParameterValue) -> Self {
        Self {
            name: name.to_string(),
            slot: Slot::Valued(Valued {
                description: description.to_string(),
                value: default_value.clone(),
                default_value,
                change_counter: 0,
            }),
        }
    }

    fn derived(name: &str, group: Arc<ParameterGroup>, source: &str) -> Self {
        Self {
            name: name.to_string(),
            slot: Slot::Derived(Link {
                group,
                source: source.to_string(),
            }),
        }
    }

    fn entry<T>(&self, f: impl FnOnce(&Valued) -> T) -> Entry<T> {
        match &self.slot {
            Slot::Valued(v) => Entry::Local(f(v)),
            Slot::Derived(link) => Entry::Link(link.clone()),
        }
    }

    fn info_entry(&self) -> Entry<ParameterInfo> {
        self.entry(|v| v.info(&self.name))
    }

    /// Fresh copy of the definition; runtime value reset to the default.
    /// Derived parameters keep pointing at the same source.
    fn duplicate_definition(&self) -> Self {
        match &self.slot {
            Slot::Valued(v) => Self::valued(&self.name, &v.description, v.default_value.clone()),
            Slot::Derived(_) => self.clone(),
        }
    }

    /// Copy of the definition carrying the current value.
    fn duplicate_with_value(&self) -> Self {
        let mut copy = self.duplicate_definition();
        if let (Slot::Valued(target), Slot::Valued(source)) = (&mut copy.slot, &self.slot) {
            target.value = source.value.clone();
        }
        copy
    }
}

/// Resolve an entry, following derived links without holding more than one
/// group lock at a time.
fn follow<T, F: Fn(&Valued) -> T>(entry: Entry<T>, f: &F, depth: usize) -> CoreResult<T> {
    match entry {
        Entry::Local(t) => Ok(t),
        Entry::Link(link) => {
            if depth >= MAX_DERIVATION_DEPTH {
                return Err(CoreError::DerivedParameterCycle(link.path()));
            }
            let next = link.group.inner.lock().by_name(&link.source)?.entry(f);
            follow(next, f, depth + 1)
        }
    }
}

fn resolve_info(name: String, entry: Entry<ParameterInfo>) -> CoreResult<ParameterInfo> {
    match entry {
        Entry::Local(info) => Ok(info),
        Entry::Link(link) => {
            let source = link.path();
            let mut info = follow(Entry::Link(link), &|v: &Valued| v.info(""), 0)?;
            info.name = name;
            info.source = Some(source);
            Ok(info)
        }
    }
}

#[derive(Debug, Default)]
struct GroupInner {
    parameters: Vec<Parameter>,
    index: HashMap<String, usize>,
    change_counter: u64,
}

impl GroupInner {
    fn position(&self, name: &str) -> CoreResult<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| CoreError::ParameterNotFound(name.to_string()))
    }

    fn by_name(&self, name: &str) -> CoreResult<&Parameter> {
        let idx = self.position(name)?;
        Ok(&self.parameters[idx])
    }

    fn by_index(&self, index: usize) -> CoreResult<&Parameter> {
        self.parameters.get(index).ok_or(CoreError::InvalidIndex {
            index,
            count: self.parameters.len(),
        })
    }

    fn check_index(&self, index: usize) -> CoreResult<()> {
        self.by_index(index).map(|_| ())
    }

    fn valued_mut(&mut self, idx: usize) -> CoreResult<&mut Valued> {
        let parameter = &mut self.parameters[idx];
        match &mut parameter.slot {
            Slot::Valued(v) => Ok(v),
            Slot::Derived(_) => Err(CoreError::DerivedParameterReadOnly(parameter.name.clone())),
        }
    }

    fn set(&mut self, idx: usize, text: &str) -> CoreResult<()> {
        let valued = self.valued_mut(idx)?;
        let parsed = valued.data_type().parse_value(text)?;
        valued.assign(parsed);
        self.change_counter += 1;
        Ok(())
    }

    fn reindex(&mut self) {
        self.index = self
            .parameters
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();
    }
}

/// Ordered, named collection of parameters with interior locking.
#[derive(Debug)]
pub struct ParameterGroup {
    name: String,
    description: String,
    max_parameters: usize,
    inner: Mutex<GroupInner>,
}

impl ParameterGroup {
    /// Create an empty group.
    ///
    /// # Errors
    /// `InvalidGroupName` if `name` is not a valid identifier.
    pub fn new(name: &str, description: &str) -> CoreResult<Self> {
        check_group_name(name)?;
        Ok(Self::build(name, description))
    }

    /// Create an empty group without a name.
    ///
    /// Used for per-instance scratch stores and signal payload projections,
    /// which are never addressed by group name.
    pub fn unnamed() -> Self {
        Self::build("", "")
    }

    fn build(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            max_parameters: DEFAULT_MAX_PARAMETERS,
            inner: Mutex::new(GroupInner::default()),
        }
    }

    /// Override the parameter ceiling.
    pub fn with_max_parameters(mut self, max_parameters: usize) -> Self {
        self.max_parameters = max_parameters;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.inner.lock().index.contains_key(name)
    }

    pub fn parameter_count(&self) -> usize {
        self.inner.lock().parameters.len()
    }

    /// Group-wide change counter, bumped by every add, remove and set.
    pub fn change_counter(&self) -> u64 {
        self.inner.lock().change_counter
    }

    fn read_by_name<T, F: Fn(&Valued) -> T>(&self, name: &str, f: &F) -> CoreResult<T> {
        let entry = self.inner.lock().by_name(name)?.entry(f);
        follow(entry, f, 0)
    }

    fn read_by_index<T, F: Fn(&Valued) -> T>(&self, index: usize, f: &F) -> CoreResult<T> {
        let entry = self.inner.lock().by_index(index)?.entry(f);
        follow(entry, f, 0)
    }

    // ─── Definition ─────────────────────────────────────────────────

    /// Add a parameter of type `data_type`, parsing `default_value`.
    ///
    /// A blank default becomes the type's zero value.
    ///
    /// # Errors
    /// - `InvalidParameterName` for a malformed name
    /// - `DuplicateParameterName` if the name exists
    /// - `TooManyParameters` at the ceiling
    /// - `InvalidParameterValue` if the default does not parse
    pub fn add_parameter(
        &self,
        name: &str,
        data_type: ParameterType,
        description: &str,
        default_value: &str,
    ) -> CoreResult<ParameterInfo> {
        check_parameter_name(name)?;
        let default_value = data_type.parse_default(default_value)?;
        let parameter = Parameter::valued(name, description, default_value);
        let info = resolve_info(parameter.name.clone(), parameter.info_entry())?;
        self.insert(vec![parameter])?;
        Ok(info)
    }

    /// Add a parameter whose type is given by name (`"string"`, `"int"`, ...).
    pub fn add_typed_parameter(
        &self,
        name: &str,
        type_name: &str,
        description: &str,
        default_value: &str,
    ) -> CoreResult<ParameterInfo> {
        let data_type: ParameterType = type_name.parse()?;
        self.add_parameter(name, data_type, description, default_value)
    }

    pub fn add_string_parameter(
        &self,
        name: &str,
        description: &str,
        default_value: &str,
    ) -> CoreResult<ParameterInfo> {
        self.add_parameter(name, ParameterType::String, description, default_value)
    }

    pub fn add_int_parameter(
        &self,
        name: &str,
        description: &str,
        default_value: i64,
    ) -> CoreResult<ParameterInfo> {
        self.add_parameter(
            name,
            ParameterType::Int,
            description,
            &default_value.to_string(),
        )
    }

    pub fn add_double_parameter(
        &self,
        name: &str,
        description: &str,
        default_value: f64,
    ) -> CoreResult<ParameterInfo> {
        self.add_parameter(
            name,
            ParameterType::Double,
            description,
            &default_value.to_string(),
        )
    }

    pub fn add_bool_parameter(
        &self,
        name: &str,
        description: &str,
        default_value: bool,
    ) -> CoreResult<ParameterInfo> {
        self.add_parameter(
            name,
            ParameterType::Bool,
            description,
            ParameterValue::Bool(default_value).to_string().as_str(),
        )
    }

    pub fn add_uuid_parameter(
        &self,
        name: &str,
        description: &str,
        default_value: &str,
    ) -> CoreResult<ParameterInfo> {
        self.add_parameter(name, ParameterType::Uuid, description, default_value)
    }

    /// Add a read-only alias of `source_name` in `source`.
    ///
    /// Description, default and type are those of the source parameter.
    ///
    /// # Errors
    /// - `InvalidParameterName` for a malformed name
    /// - `ParameterNotFound` if the source parameter does not exist
    /// - `DuplicateParameterName` / `TooManyParameters` as for any add
    pub fn add_derived_parameter(
        &self,
        name: &str,
        source: &Arc<ParameterGroup>,
        source_name: &str,
    ) -> CoreResult<ParameterInfo> {
        check_parameter_name(name)?;
        let parameter = Parameter::derived(name, Arc::clone(source), source_name);
        let info = resolve_info(parameter.name.clone(), parameter.info_entry())?;
        self.insert(vec![parameter])?;
        Ok(info)
    }

    /// Add a derived parameter for every parameter of `source`, under the
    /// same names. Nothing is added if any name already exists here.
    pub fn add_derivatives_from_group(&self, source: &Arc<ParameterGroup>) -> CoreResult<()> {
        let derived: Vec<Parameter> = source
            .inner
            .lock()
            .parameters
            .iter()
            .map(|p| Parameter::derived(&p.name, Arc::clone(source), &p.name))
            .collect();
        self.insert(derived)
    }

    /// Remove a parameter. Unknown names are ignored.
    pub fn remove_parameter(&self, name: &str) {
        let mut inner = self.inner.lock();
        if let Some(idx) = inner.index.get(name).copied() {
            inner.parameters.remove(idx);
            inner.reindex();
            inner.change_counter += 1;
        }
    }

    /// Copy every parameter definition of `other` into this group.
    ///
    /// Runtime values are not copied; the new parameters start at their
    /// defaults. Nothing is added if any name already exists here.
    pub fn add_duplicates_from_group(&self, other: &ParameterGroup) -> CoreResult<()> {
        let copies: Vec<Parameter> = other
            .inner
            .lock()
            .parameters
            .iter()
            .map(Parameter::duplicate_definition)
            .collect();
        self.insert(copies)
    }

    /// Copy every parameter of this group, current values included, into
    /// `target`. Nothing is added if any name already exists there.
    pub fn copy_to_group(&self, target: &ParameterGroup) -> CoreResult<()> {
        let copies: Vec<Parameter> = self
            .inner
            .lock()
            .parameters
            .iter()
            .map(Parameter::duplicate_with_value)
            .collect();
        target.insert(copies)
    }

    fn insert(&self, parameters: Vec<Parameter>) -> CoreResult<()> {
        let mut inner = self.inner.lock();
        for p in &parameters {
            if inner.index.contains_key(&p.name) {
                return Err(CoreError::DuplicateParameterName(p.name.clone()));
            }
        }
        if inner.parameters.len() + parameters.len() > self.max_parameters {
            return Err(CoreError::TooManyParameters(self.name.clone()));
        }
        for p in parameters {
            let idx = inner.parameters.len();
            inner.index.insert(p.name.clone(), idx);
            inner.parameters.push(p);
            inner.change_counter += 1;
        }
        Ok(())
    }

    // ─── Introspection ──────────────────────────────────────────────

    pub fn parameter_info(&self, index: usize) -> CoreResult<ParameterInfo> {
        let (name, entry) = {
            let inner = self.inner.lock();
            let p = inner.by_index(index)?;
            (p.name.clone(), p.info_entry())
        };
        resolve_info(name, entry)
    }

    pub fn parameter_info_by_name(&self, name: &str) -> CoreResult<ParameterInfo> {
        let entry = self.inner.lock().by_name(name)?.info_entry();
        resolve_info(name.to_string(), entry)
    }

    /// Definitions of all parameters, in insertion order.
    pub fn parameter_infos(&self) -> CoreResult<Vec<ParameterInfo>> {
        let entries: Vec<_> = self
            .inner
            .lock()
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.info_entry()))
            .collect();
        entries
            .into_iter()
            .map(|(name, entry)| resolve_info(name, entry))
            .collect()
    }

    pub fn parameter_type_by_name(&self, name: &str) -> CoreResult<ParameterType> {
        self.read_by_name(name, &Valued::data_type)
    }

    /// Number of successful sets on the named parameter. Derived parameters
    /// report their source's counter.
    pub fn change_counter_by_name(&self, name: &str) -> CoreResult<u64> {
        self.read_by_name(name, &|v: &Valued| v.change_counter)
    }

    /// `true` if the named parameter is a derived, read-only alias.
    pub fn is_derived(&self, name: &str) -> CoreResult<bool> {
        Ok(matches!(
            self.inner.lock().by_name(name)?.slot,
            Slot::Derived(_)
        ))
    }

    // ─── Getters ────────────────────────────────────────────────────

    pub fn value_by_index(&self, index: usize) -> CoreResult<String> {
        self.read_by_index(index, &|v: &Valued| v.value.to_string())
    }

    pub fn value_by_name(&self, name: &str) -> CoreResult<String> {
        self.read_by_name(name, &|v: &Valued| v.value.to_string())
    }

    /// Current typed value of the named parameter.
    pub fn typed_value_by_name(&self, name: &str) -> CoreResult<ParameterValue> {
        self.read_by_name(name, &|v: &Valued| v.value.clone())
    }

    pub fn int_value_by_name(&self, name: &str) -> CoreResult<i64> {
        self.typed_value_by_name(name)?.as_int()
    }

    pub fn double_value_by_name(&self, name: &str) -> CoreResult<f64> {
        self.typed_value_by_name(name)?.as_double()
    }

    pub fn bool_value_by_name(&self, name: &str) -> CoreResult<bool> {
        self.typed_value_by_name(name)?.as_bool()
    }

    pub fn uuid_value_by_name(&self, name: &str) -> CoreResult<String> {
        self.typed_value_by_name(name)?.as_uuid()
    }

    // ─── Setters ────────────────────────────────────────────────────
    // Every setter fails with `DerivedParameterReadOnly` on a derived
    // parameter.

    pub fn set_value_by_index(&self, index: usize, value: &str) -> CoreResult<()> {
        let mut inner = self.inner.lock();
        inner.check_index(index)?;
        inner.set(index, value)
    }

    /// Set a value from its string form, parsed per the parameter's type.
    ///
    /// Increments the parameter's change counter by one.
    pub fn set_value_by_name(&self, name: &str, value: &str) -> CoreResult<()> {
        let mut inner = self.inner.lock();
        let idx = inner.position(name)?;
        inner.set(idx, value)
    }

    pub fn set_int_value_by_name(&self, name: &str, value: i64) -> CoreResult<()> {
        self.set_value_by_name(name, &value.to_string())
    }

    pub fn set_double_value_by_name(&self, name: &str, value: f64) -> CoreResult<()> {
        self.set_value_by_name(name, &value.to_string())
    }

    pub fn set_bool_value_by_name(&self, name: &str, value: bool) -> CoreResult<()> {
        self.set_value_by_name(name, &ParameterValue::Bool(value).to_string())
    }

    pub fn set_uuid_value_by_name(&self, name: &str, value: &str) -> CoreResult<()> {
        let mut inner = self.inner.lock();
        let idx = inner.position(name)?;
        let data_type = inner.valued_mut(idx)?.data_type();
        if data_type != ParameterType::Uuid {
            return Err(CoreError::InvalidParameterValue {
                value: value.to_string(),
                expected: data_type.as_str(),
            });
        }
        inner.set(idx, value)
    }

    // ─── JSON projection ────────────────────────────────────────────

    /// Render all values, derived ones included, as a JSON object of strings.
    pub fn to_json(&self) -> CoreResult<String> {
        let render = |v: &Valued| v.value.to_string();
        let entries: Vec<_> = self
            .inner
            .lock()
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.entry(render)))
            .collect();

        let mut map = Map::new();
        for (name, entry) in entries {
            map.insert(name, Value::String(follow(entry, &render, 0)?));
        }
        Ok(Value::Object(map).to_string())
    }

    /// Set values from a JSON object of strings.
    ///
    /// All members are validated before any value changes.
    ///
    /// # Errors
    /// - `InvalidJson` if the text is not an object or a member is not a string
    /// - `ParameterNotFound` for unknown member names
    /// - `DerivedParameterReadOnly` for a member naming a derived parameter
    /// - `InvalidParameterValue` if a value does not parse
    pub fn apply_json(&self, json: &str) -> CoreResult<()> {
        let document: Value =
            serde_json::from_str(json).map_err(|e| CoreError::InvalidJson(e.to_string()))?;
        let object = document
            .as_object()
            .ok_or_else(|| CoreError::InvalidJson("expected an object".to_string()))?;

        let mut inner = self.inner.lock();
        let mut updates = Vec::with_capacity(object.len());
        for (name, value) in object {
            let text = value.as_str().ok_or_else(|| {
                CoreError::InvalidJson(format!("member '{name}' is not a string"))
            })?;
            let idx = inner.position(name)?;
            let parsed = inner.valued_mut(idx)?.data_type().parse_value(text)?;
            updates.push((idx, parsed));
        }
        for (idx, parsed) in updates {
            inner.valued_mut(idx)?.assign(parsed);
            inner.change_counter += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motion_group() -> ParameterGroup {
        let group = ParameterGroup::new("motion", "Motion limits").unwrap();
        group.add_double_parameter("speed", "Max speed", 100.0).unwrap();
        group.add_int_parameter("steps", "Steps per mm", 200).unwrap();
        group.add_bool_parameter("enabled", "Axis enabled", false).unwrap();
        group.add_string_parameter("label", "Display label", "X").unwrap();
        group
    }

    #[test]
    fn new_rejects_bad_name() {
        assert!(matches!(
            ParameterGroup::new("bad.name", ""),
            Err(CoreError::InvalidGroupName(_))
        ));
    }

    #[test]
    fn duplicate_parameter_name_fails() {
        let group = ParameterGroup::new("g", "").unwrap();
        group.add_string_parameter("x", "", "").unwrap();
        let result = group.add_string_parameter("x", "", "");
        assert!(matches!(result, Err(CoreError::DuplicateParameterName(n)) if n == "x"));
        assert_eq!(group.parameter_count(), 1);
    }

    #[test]
    fn invalid_parameter_name_fails() {
        let group = ParameterGroup::new("g", "").unwrap();
        assert!(matches!(
            group.add_string_parameter("", "", ""),
            Err(CoreError::InvalidParameterName(_))
        ));
    }

    #[test]
    fn set_then_get_bumps_counter_by_one() {
        let group = ParameterGroup::new("g", "").unwrap();
        group.add_string_parameter("x", "", "").unwrap();
        let before = group.change_counter_by_name("x").unwrap();
        group.set_value_by_name("x", "5").unwrap();
        assert_eq!(group.value_by_name("x").unwrap(), "5");
        assert_eq!(group.change_counter_by_name("x").unwrap(), before + 1);
    }

    #[test]
    fn missing_parameter_is_not_found() {
        let group = motion_group();
        assert!(matches!(
            group.value_by_name("nope"),
            Err(CoreError::ParameterNotFound(_))
        ));
        assert!(matches!(
            group.set_value_by_name("nope", "1"),
            Err(CoreError::ParameterNotFound(_))
        ));
    }

    #[test]
    fn typed_accessors() {
        let group = motion_group();
        group.set_double_value_by_name("speed", 12.5).unwrap();
        assert_eq!(group.double_value_by_name("speed").unwrap(), 12.5);
        group.set_int_value_by_name("steps", -3).unwrap();
        assert_eq!(group.int_value_by_name("steps").unwrap(), -3);
        group.set_value_by_name("enabled", "true").unwrap();
        assert!(group.bool_value_by_name("enabled").unwrap());
        assert_eq!(group.value_by_name("enabled").unwrap(), "1");
    }

    #[test]
    fn set_rejects_unparsable_value_without_counting() {
        let group = motion_group();
        assert!(matches!(
            group.set_value_by_name("steps", "many"),
            Err(CoreError::InvalidParameterValue { .. })
        ));
        assert_eq!(group.change_counter_by_name("steps").unwrap(), 0);
        assert_eq!(group.int_value_by_name("steps").unwrap(), 200);
    }

    #[test]
    fn uuid_parameter_normalizes() {
        let group = ParameterGroup::new("g", "").unwrap();
        group.add_uuid_parameter("job", "", "").unwrap();
        group
            .set_uuid_value_by_name("job", "6F9619FF-8B86-D011-B42D-00C04FC964FF")
            .unwrap();
        assert_eq!(
            group.uuid_value_by_name("job").unwrap(),
            "6f9619ff-8b86-d011-b42d-00c04fc964ff"
        );
    }

    #[test]
    fn set_uuid_on_non_uuid_parameter_fails() {
        let group = motion_group();
        assert!(group
            .set_uuid_value_by_name("label", "6f9619ff-8b86-d011-b42d-00c04fc964ff")
            .is_err());
    }

    #[test]
    fn info_by_index_and_name() {
        let group = motion_group();
        assert_eq!(group.parameter_count(), 4);
        let info = group.parameter_info(1).unwrap();
        assert_eq!(info.name, "steps");
        assert_eq!(info.description, "Steps per mm");
        assert_eq!(info.default_value, "200");
        assert_eq!(info.data_type, ParameterType::Int);
        let info = group.parameter_info_by_name("enabled").unwrap();
        assert_eq!(info.default_value, "0");
        assert!(matches!(
            group.parameter_info(9),
            Err(CoreError::InvalidIndex { index: 9, count: 4 })
        ));
    }

    #[test]
    fn index_access() {
        let group = motion_group();
        group.set_value_by_index(3, "Y").unwrap();
        assert_eq!(group.value_by_index(3).unwrap(), "Y");
        assert!(group.set_value_by_index(4, "Z").is_err());
    }

    #[test]
    fn typed_add_by_type_name() {
        let group = ParameterGroup::new("g", "").unwrap();
        group.add_typed_parameter("a", "int", "", "").unwrap();
        assert_eq!(group.value_by_name("a").unwrap(), "0");
        assert!(matches!(
            group.add_typed_parameter("b", "matrix", "", ""),
            Err(CoreError::InvalidParameterType(_))
        ));
    }

    #[test]
    fn remove_keeps_order() {
        let group = motion_group();
        group.remove_parameter("steps");
        group.remove_parameter("unknown");
        let names: Vec<_> = group.parameter_infos().unwrap().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["speed", "enabled", "label"]);
        assert_eq!(group.value_by_index(2).unwrap(), "X");
    }

    #[test]
    fn parameter_ceiling() {
        let group = ParameterGroup::new("g", "").unwrap().with_max_parameters(1);
        group.add_string_parameter("a", "", "").unwrap();
        assert!(matches!(
            group.add_string_parameter("b", "", ""),
            Err(CoreError::TooManyParameters(_))
        ));
    }

    #[test]
    fn duplicates_copy_definitions_not_values() {
        let source = motion_group();
        source.set_double_value_by_name("speed", 1.5).unwrap();
        let target = ParameterGroup::new("motion", "").unwrap();
        target.add_duplicates_from_group(&source).unwrap();
        assert_eq!(target.parameter_infos().unwrap(), source.parameter_infos().unwrap());
        assert_eq!(target.double_value_by_name("speed").unwrap(), 100.0);
        assert_eq!(target.change_counter_by_name("speed").unwrap(), 0);
    }

    #[test]
    fn duplicates_into_self_is_rejected() {
        let group = motion_group();
        assert!(matches!(
            group.add_duplicates_from_group(&group),
            Err(CoreError::DuplicateParameterName(_))
        ));
        assert_eq!(group.parameter_count(), 4);
    }

    #[test]
    fn json_round_trip_through_apply() {
        let group = motion_group();
        group
            .apply_json(r#"{"speed":"7.5","enabled":"1"}"#)
            .unwrap();
        assert_eq!(group.double_value_by_name("speed").unwrap(), 7.5);
        let json: Value = serde_json::from_str(&group.to_json().unwrap()).unwrap();
        assert_eq!(json["speed"], "7.5");
        assert_eq!(json["enabled"], "1");
        assert_eq!(json["label"], "X");
    }

    #[test]
    fn apply_json_is_all_or_nothing() {
        let group = motion_group();
        let result = group.apply_json(r#"{"speed":"1","steps":"x"}"#);
        assert!(result.is_err());
        assert_eq!(group.double_value_by_name("speed").unwrap(), 100.0);
    }

    #[test]
    fn apply_json_rejects_bad_shapes() {
        let group = motion_group();
        assert!(matches!(group.apply_json("[1]"), Err(CoreError::InvalidJson(_))));
        assert!(matches!(
            group.apply_json(r#"{"speed":1}"#),
            Err(CoreError::InvalidJson(_))
        ));
        assert!(matches!(
            group.apply_json(r#"{"ghost":"1"}"#),
            Err(CoreError::ParameterNotFound(_))
        ));
    }

    #[test]
    fn copy_to_group_carries_values() {
        let source = motion_group();
        source.set_double_value_by_name("speed", 1.5).unwrap();
        let target = ParameterGroup::unnamed();
        source.copy_to_group(&target).unwrap();
        assert_eq!(target.double_value_by_name("speed").unwrap(), 1.5);
        assert_eq!(target.parameter_info_by_name("speed").unwrap().default_value, "100");

        target.set_double_value_by_name("speed", 3.0).unwrap();
        assert_eq!(source.double_value_by_name("speed").unwrap(), 1.5);
        assert!(matches!(
            source.copy_to_group(&target),
            Err(CoreError::DuplicateParameterName(_))
        ));
    }

    #[test]
    fn derived_parameter_reads_follow_source() {
        let source = Arc::new(motion_group());
        let status = ParameterGroup::new("status", "").unwrap();
        let info = status
            .add_derived_parameter("max_speed", &source, "speed")
            .unwrap();
        assert_eq!(info.name, "max_speed");
        assert_eq!(info.description, "Max speed");
        assert_eq!(info.data_type, ParameterType::Double);
        assert_eq!(info.source.as_deref(), Some("motion.speed"));
        assert!(status.is_derived("max_speed").unwrap());

        source.set_double_value_by_name("speed", 42.0).unwrap();
        assert_eq!(status.value_by_name("max_speed").unwrap(), "42");
        assert_eq!(status.double_value_by_name("max_speed").unwrap(), 42.0);
        assert_eq!(status.value_by_index(0).unwrap(), "42");
        assert_eq!(status.change_counter_by_name("max_speed").unwrap(), 1);
        let json: Value = serde_json::from_str(&status.to_json().unwrap()).unwrap();
        assert_eq!(json["max_speed"], "42");
    }

    #[test]
    fn derived_parameter_rejects_writes() {
        let source = Arc::new(motion_group());
        let status = ParameterGroup::new("status", "").unwrap();
        status.add_derived_parameter("steps", &source, "steps").unwrap();

        assert!(matches!(
            status.set_value_by_name("steps", "5"),
            Err(CoreError::DerivedParameterReadOnly(n)) if n == "steps"
        ));
        assert!(matches!(
            status.set_int_value_by_name("steps", 5),
            Err(CoreError::DerivedParameterReadOnly(_))
        ));
        assert!(matches!(
            status.set_value_by_index(0, "5"),
            Err(CoreError::DerivedParameterReadOnly(_))
        ));
        assert!(matches!(
            status.apply_json(r#"{"steps":"5"}"#),
            Err(CoreError::DerivedParameterReadOnly(_))
        ));
        assert_eq!(source.int_value_by_name("steps").unwrap(), 200);
    }

    #[test]
    fn derived_parameter_needs_existing_source() {
        let source = Arc::new(motion_group());
        let status = ParameterGroup::new("status", "").unwrap();
        assert!(matches!(
            status.add_derived_parameter("x", &source, "ghost"),
            Err(CoreError::ParameterNotFound(_))
        ));
        assert_eq!(status.parameter_count(), 0);
    }

    #[test]
    fn derivatives_mirror_whole_group() {
        let source = Arc::new(motion_group());
        let mirror = ParameterGroup::new("mirror", "").unwrap();
        mirror.add_derivatives_from_group(&source).unwrap();
        assert_eq!(mirror.parameter_count(), 4);
        source.set_value_by_name("label", "Z").unwrap();
        assert_eq!(mirror.value_by_name("label").unwrap(), "Z");
        assert!(matches!(
            mirror.add_derivatives_from_group(&source),
            Err(CoreError::DuplicateParameterName(_))
        ));
    }

    #[test]
    fn derived_cycle_is_reported() {
        let a = Arc::new(ParameterGroup::new("a", "").unwrap());
        let b = Arc::new(ParameterGroup::new("b", "").unwrap());
        a.add_int_parameter("x", "", 1).unwrap();
        b.add_derived_parameter("y", &a, "x").unwrap();
        a.remove_parameter("x");
        assert!(matches!(
            b.value_by_name("y"),
            Err(CoreError::ParameterNotFound(_))
        ));

        a.insert(vec![Parameter::derived("x", Arc::clone(&b), "y")])
            .unwrap();
        assert!(matches!(
            b.value_by_name("y"),
            Err(CoreError::DerivedParameterCycle(_))
        ));
    }
}
