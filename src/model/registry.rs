//! The set of known attribute kinds.
//!
//! A registry is an ordinary value owned by the caller, never ambient global
//! state: each session (and each test) constructs its own. Registration takes
//! `&mut self`, so concurrent writers must go through external locking.

use super::attribute::{AttributeSpec, ElementType, Level};
use super::error::Error;
use std::collections::HashMap;
use tracing::debug;

/// Maps attribute names to their [`AttributeSpec`].
#[derive(Debug, Clone, Default)]
pub struct AttributeRegistry {
    specs: Vec<AttributeSpec>,
    by_name: HashMap<String, usize>,
}

impl AttributeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with the standard attributes.
    ///
    /// | name       | singular  | level   | type   | mutable |
    /// |------------|-----------|---------|--------|---------|
    /// | `names`    | `name`    | atom    | string | no      |
    /// | `types`    | `type`    | atom    | string | no      |
    /// | `elements` | `element` | atom    | string | no      |
    /// | `masses`   | `mass`    | atom    | float  | yes     |
    /// | `charges`  | `charge`  | atom    | float  | yes     |
    /// | `resids`   | `resid`   | residue | int    | no      |
    /// | `resnames` | `resname` | residue | string | no      |
    /// | `segids`   | `segid`   | segment | string | no      |
    pub fn with_defaults() -> Self {
        let defaults = [
            AttributeSpec::new("names", "name", Level::Atom, ElementType::String),
            AttributeSpec::new("types", "type", Level::Atom, ElementType::String),
            AttributeSpec::new("elements", "element", Level::Atom, ElementType::String),
            AttributeSpec::new("masses", "mass", Level::Atom, ElementType::Float).mutable(),
            AttributeSpec::new("charges", "charge", Level::Atom, ElementType::Float).mutable(),
            AttributeSpec::new("resids", "resid", Level::Residue, ElementType::Int),
            AttributeSpec::new("resnames", "resname", Level::Residue, ElementType::String),
            AttributeSpec::new("segids", "segid", Level::Segment, ElementType::String),
        ];

        let mut registry = Self::new();
        for spec in defaults {
            registry.insert(spec);
        }
        registry
    }

    /// Registers a new attribute kind.
    ///
    /// Fails with [`Error::DuplicateAttribute`] if either the plural or the
    /// singular name is already taken by a registered spec; the existing spec
    /// is left untouched.
    pub fn register(&mut self, spec: AttributeSpec) -> Result<(), Error> {
        if let Some(clash) = [&spec.name, &spec.singular]
            .into_iter()
            .find(|key| self.resolve(key).is_ok())
        {
            return Err(Error::DuplicateAttribute(clash.clone()));
        }

        debug!(
            name = %spec.name,
            singular = %spec.singular,
            level = %spec.level,
            element_type = %spec.element_type,
            "attribute registered"
        );
        self.insert(spec);
        Ok(())
    }

    /// Looks up a spec by its plural name.
    pub fn lookup(&self, name: &str) -> Result<&AttributeSpec, Error> {
        self.by_name
            .get(name)
            .map(|&idx| &self.specs[idx])
            .ok_or_else(|| Error::not_in_registry(name))
    }

    /// Looks up a spec by either its plural or its singular name.
    pub fn resolve(&self, key: &str) -> Result<&AttributeSpec, Error> {
        if let Ok(spec) = self.lookup(key) {
            return Ok(spec);
        }
        self.specs
            .iter()
            .find(|spec| spec.singular == key)
            .ok_or_else(|| Error::not_in_registry(key))
    }

    /// Returns the specs declared at `level`, in registration order.
    pub fn list_by_level(&self, level: Level) -> Vec<&AttributeSpec> {
        self.specs.iter().filter(|s| s.level == level).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    fn insert(&mut self, spec: AttributeSpec) {
        self.by_name.insert(spec.name.clone(), self.specs.len());
        self.specs.push(spec);
    }
}
