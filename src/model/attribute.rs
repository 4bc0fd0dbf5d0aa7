//! Typed, named per-entity columns.
//!
//! An [`AttributeSpec`] describes one attribute kind; an [`AttributeArray`]
//! pairs a spec with a dense column of [`AttributeValues`], one value per entity
//! at the spec's [`Level`].

use super::error::Error;
use serde::Deserialize;
use std::fmt;

/// Cardinality level an attribute is declared at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Atom,
    Residue,
    Segment,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Atom, Level::Residue, Level::Segment];
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Atom => write!(f, "atom"),
            Level::Residue => write!(f, "residue"),
            Level::Segment => write!(f, "segment"),
        }
    }
}

/// Element type of an attribute column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Int,
    Float,
    String,
    Vector3,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Int => write!(f, "int"),
            ElementType::Float => write!(f, "float"),
            ElementType::String => write!(f, "string"),
            ElementType::Vector3 => write!(f, "vector3"),
        }
    }
}

/// Describes one attribute kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeSpec {
    /// Unique plural identifier, used for column access (`names`).
    pub name: String,
    /// Singular identifier, used for per-entity access (`name`).
    pub singular: String,
    pub level: Level,
    pub element_type: ElementType,
    /// Whether individual values may be overwritten after construction.
    pub mutable: bool,
}

impl AttributeSpec {
    pub fn new(
        name: impl Into<String>,
        singular: impl Into<String>,
        level: Level,
        element_type: ElementType,
    ) -> Self {
        Self {
            name: name.into(),
            singular: singular.into(),
            level,
            element_type,
            mutable: false,
        }
    }

    pub fn mutable(mut self) -> Self {
        self.mutable = true;
        self
    }

    /// Returns `true` if `key` is either the plural or the singular name.
    #[inline]
    pub fn answers_to(&self, key: &str) -> bool {
        self.name == key || self.singular == key
    }
}

/// A single owned attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Int(i64),
    Float(f64),
    String(String),
    Vector3([f32; 3]),
}

impl AttributeValue {
    pub fn element_type(&self) -> ElementType {
        match self {
            AttributeValue::Int(_) => ElementType::Int,
            AttributeValue::Float(_) => ElementType::Float,
            AttributeValue::String(_) => ElementType::String,
            AttributeValue::Vector3(_) => ElementType::Vector3,
        }
    }

    /// Parses a text field according to `element_type`.
    ///
    /// Vector fields are three whitespace-separated numbers. Returns `None`
    /// when the text does not parse; callers attach positional context.
    pub fn parse(element_type: ElementType, text: &str) -> Option<Self> {
        let text = text.trim();
        match element_type {
            ElementType::Int => text.parse().ok().map(AttributeValue::Int),
            ElementType::Float => text.parse().ok().map(AttributeValue::Float),
            ElementType::String => Some(AttributeValue::String(text.to_string())),
            ElementType::Vector3 => {
                let mut parts = text.split_whitespace().map(str::parse::<f32>);
                match (parts.next(), parts.next(), parts.next(), parts.next()) {
                    (Some(Ok(x)), Some(Ok(y)), Some(Ok(z)), None) => {
                        Some(AttributeValue::Vector3([x, y, z]))
                    }
                    _ => None,
                }
            }
        }
    }
}

/// A borrowed view of one value in a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRef<'a> {
    Int(i64),
    Float(f64),
    Str(&'a str),
    Vector3([f32; 3]),
}

impl<'a> ValueRef<'a> {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ValueRef::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ValueRef::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match *self {
            ValueRef::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vector3(&self) -> Option<[f32; 3]> {
        match self {
            ValueRef::Vector3(v) => Some(*v),
            _ => None,
        }
    }

    pub fn to_value(&self) -> AttributeValue {
        match *self {
            ValueRef::Int(v) => AttributeValue::Int(v),
            ValueRef::Float(v) => AttributeValue::Float(v),
            ValueRef::Str(v) => AttributeValue::String(v.to_string()),
            ValueRef::Vector3(v) => AttributeValue::Vector3(v),
        }
    }
}

impl fmt::Display for ValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRef::Int(v) => write!(f, "{v}"),
            ValueRef::Float(v) => write!(f, "{v}"),
            ValueRef::Str(v) => f.write_str(v),
            ValueRef::Vector3([x, y, z]) => write!(f, "({x}, {y}, {z})"),
        }
    }
}

/// Dense storage for one column.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValues {
    Int(Vec<i64>),
    Float(Vec<f64>),
    String(Vec<String>),
    Vector3(Vec<[f32; 3]>),
}

impl AttributeValues {
    /// Creates an empty column of the given element type.
    pub fn with_capacity(element_type: ElementType, capacity: usize) -> Self {
        match element_type {
            ElementType::Int => AttributeValues::Int(Vec::with_capacity(capacity)),
            ElementType::Float => AttributeValues::Float(Vec::with_capacity(capacity)),
            ElementType::String => AttributeValues::String(Vec::with_capacity(capacity)),
            ElementType::Vector3 => AttributeValues::Vector3(Vec::with_capacity(capacity)),
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            AttributeValues::Int(_) => ElementType::Int,
            AttributeValues::Float(_) => ElementType::Float,
            AttributeValues::String(_) => ElementType::String,
            AttributeValues::Vector3(_) => ElementType::Vector3,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            AttributeValues::Int(v) => v.len(),
            AttributeValues::Float(v) => v.len(),
            AttributeValues::String(v) => v.len(),
            AttributeValues::Vector3(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<ValueRef<'_>> {
        match self {
            AttributeValues::Int(v) => v.get(index).map(|x| ValueRef::Int(*x)),
            AttributeValues::Float(v) => v.get(index).map(|x| ValueRef::Float(*x)),
            AttributeValues::String(v) => v.get(index).map(|x| ValueRef::Str(x)),
            AttributeValues::Vector3(v) => v.get(index).map(|x| ValueRef::Vector3(*x)),
        }
    }

    /// Appends a value; returns it back if its type does not match the column.
    pub fn push(&mut self, value: AttributeValue) -> Result<(), AttributeValue> {
        match (self, value) {
            (AttributeValues::Int(v), AttributeValue::Int(x)) => v.push(x),
            (AttributeValues::Float(v), AttributeValue::Float(x)) => v.push(x),
            (AttributeValues::String(v), AttributeValue::String(x)) => v.push(x),
            (AttributeValues::Vector3(v), AttributeValue::Vector3(x)) => v.push(x),
            (_, other) => return Err(other),
        }
        Ok(())
    }

    /// Overwrites the value at `index`; `false` if out of range or mistyped.
    pub(crate) fn replace(&mut self, index: usize, value: AttributeValue) -> bool {
        match (self, value) {
            (AttributeValues::Int(v), AttributeValue::Int(x)) if index < v.len() => v[index] = x,
            (AttributeValues::Float(v), AttributeValue::Float(x)) if index < v.len() => {
                v[index] = x
            }
            (AttributeValues::String(v), AttributeValue::String(x)) if index < v.len() => {
                v[index] = x
            }
            (AttributeValues::Vector3(v), AttributeValue::Vector3(x)) if index < v.len() => {
                v[index] = x
            }
            _ => return false,
        }
        true
    }
}

impl From<Vec<i64>> for AttributeValues {
    fn from(v: Vec<i64>) -> Self {
        AttributeValues::Int(v)
    }
}

impl From<Vec<f64>> for AttributeValues {
    fn from(v: Vec<f64>) -> Self {
        AttributeValues::Float(v)
    }
}

impl From<Vec<String>> for AttributeValues {
    fn from(v: Vec<String>) -> Self {
        AttributeValues::String(v)
    }
}

impl From<Vec<[f32; 3]>> for AttributeValues {
    fn from(v: Vec<[f32; 3]>) -> Self {
        AttributeValues::Vector3(v)
    }
}

/// A column tagged with the spec it was built for.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeArray {
    spec: AttributeSpec,
    values: AttributeValues,
}

impl AttributeArray {
    /// Pairs `values` with `spec`, checking the element type.
    ///
    /// Cardinality is checked by the topology, which knows the entity counts.
    pub fn new(spec: AttributeSpec, values: AttributeValues) -> Result<Self, Error> {
        if values.element_type() != spec.element_type {
            return Err(Error::TypeMismatch {
                name: spec.name,
                expected: spec.element_type,
                found: values.element_type(),
            });
        }
        Ok(Self { spec, values })
    }

    #[inline]
    pub fn spec(&self) -> &AttributeSpec {
        &self.spec
    }

    #[inline]
    pub fn values(&self) -> &AttributeValues {
        &self.values
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    #[inline]
    pub fn level(&self) -> Level {
        self.spec.level
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<ValueRef<'_>> {
        self.values.get(index)
    }

    pub(crate) fn values_mut(&mut self) -> &mut AttributeValues {
        &mut self.values
    }
}
