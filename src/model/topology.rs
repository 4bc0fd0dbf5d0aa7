use super::attribute::{
    AttributeArray, AttributeSpec, AttributeValue, AttributeValues, ElementType, Level, ValueRef,
};
use super::error::Error;
use super::registry::AttributeRegistry;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Population size at each level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntityCounts {
    pub atoms: usize,
    pub residues: usize,
    pub segments: usize,
}

impl EntityCounts {
    #[inline]
    pub fn get(&self, level: Level) -> usize {
        match level {
            Level::Atom => self.atoms,
            Level::Residue => self.residues,
            Level::Segment => self.segments,
        }
    }
}

/// Containment of atoms in residues and residues in segments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Hierarchy {
    pub n_residues: usize,
    pub atom_resindex: Vec<usize>,
    pub n_segments: usize,
    pub residue_segindex: Vec<usize>,
}

/// How a parser groups atoms into residues when the input carries no
/// residue information of its own.
///
/// Every policy places all residues in a single segment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResidueGrouping {
    /// One residue holding every atom. Zero atoms give zero residues.
    #[default]
    Single,
    /// One residue per atom.
    PerAtom,
    /// A new residue starts wherever the named atom column changes value.
    ByAttribute(String),
}

impl ResidueGrouping {
    /// Builds the hierarchy for `n_atoms` atoms.
    ///
    /// `column` resolves atom-level columns by name for
    /// [`ResidueGrouping::ByAttribute`].
    pub fn hierarchy<'a>(
        &self,
        n_atoms: usize,
        column: impl Fn(&str) -> Option<&'a AttributeValues>,
    ) -> Result<Hierarchy, Error> {
        let (n_residues, atom_resindex) = match self {
            ResidueGrouping::Single => (usize::from(n_atoms > 0), vec![0; n_atoms]),
            ResidueGrouping::PerAtom => (n_atoms, (0..n_atoms).collect()),
            ResidueGrouping::ByAttribute(name) => {
                let values = column(name.as_str())
                    .ok_or_else(|| Error::not_in_topology(name.clone()))?;
                if values.len() != n_atoms {
                    return Err(Error::CardinalityMismatch {
                        name: name.clone(),
                        level: Level::Atom,
                        expected: n_atoms,
                        found: values.len(),
                    });
                }
                let mut resindex = Vec::with_capacity(n_atoms);
                let mut current = 0;
                for i in 0..n_atoms {
                    if i > 0 && values.get(i) != values.get(i - 1) {
                        current += 1;
                    }
                    resindex.push(current);
                }
                (if n_atoms > 0 { current + 1 } else { 0 }, resindex)
            }
        };

        let n_segments = usize::from(n_residues > 0);
        Ok(Hierarchy {
            n_residues,
            atom_resindex,
            n_segments,
            residue_segindex: vec![0; n_residues],
        })
    }
}

/// Assembles a [`Topology`], validating every invariant in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct TopologyBuilder {
    counts: EntityCounts,
    atom_resindex: Option<Vec<usize>>,
    residue_segindex: Option<Vec<usize>>,
    attributes: Vec<(AttributeSpec, AttributeValues)>,
}

impl TopologyBuilder {
    pub fn new(n_atoms: usize) -> Self {
        Self {
            counts: EntityCounts {
                atoms: n_atoms,
                ..EntityCounts::default()
            },
            ..Self::default()
        }
    }

    /// Declares `n_residues` residues and the owning residue of every atom.
    pub fn residues(mut self, n_residues: usize, atom_resindex: Vec<usize>) -> Self {
        self.counts.residues = n_residues;
        self.atom_resindex = Some(atom_resindex);
        self
    }

    /// Declares `n_segments` segments and the owning segment of every residue.
    pub fn segments(mut self, n_segments: usize, residue_segindex: Vec<usize>) -> Self {
        self.counts.segments = n_segments;
        self.residue_segindex = Some(residue_segindex);
        self
    }

    pub fn hierarchy(self, hierarchy: Hierarchy) -> Self {
        self.residues(hierarchy.n_residues, hierarchy.atom_resindex)
            .segments(hierarchy.n_segments, hierarchy.residue_segindex)
    }

    /// Applies a grouping policy, resolving columns among the attributes
    /// added so far.
    pub fn group_residues(self, grouping: &ResidueGrouping) -> Result<Self, Error> {
        let hierarchy = grouping.hierarchy(self.counts.atoms, |name| {
            self.attributes
                .iter()
                .find(|(spec, _)| spec.name == name && spec.level == Level::Atom)
                .map(|(_, values)| values)
        })?;
        Ok(self.hierarchy(hierarchy))
    }

    pub fn attribute(mut self, spec: AttributeSpec, values: impl Into<AttributeValues>) -> Self {
        self.attributes.push((spec, values.into()));
        self
    }

    #[inline]
    pub fn counts(&self) -> EntityCounts {
        self.counts
    }

    pub fn build(self) -> Result<Topology, Error> {
        let counts = self.counts;

        if let Some(map) = &self.atom_resindex {
            check_containment(map, Level::Atom, counts.atoms, counts.residues)?;
        }
        if let Some(map) = &self.residue_segindex {
            check_containment(map, Level::Residue, counts.residues, counts.segments)?;
        }

        let mut topology = Topology {
            counts,
            attributes: BTreeMap::new(),
            atom_resindex: self.atom_resindex,
            residue_segindex: self.residue_segindex,
        };
        for (spec, values) in self.attributes {
            topology.attach(spec, values)?;
        }

        debug!(
            atoms = counts.atoms,
            residues = counts.residues,
            segments = counts.segments,
            attributes = topology.attributes.len(),
            "topology built"
        );
        Ok(topology)
    }
}

fn check_containment(
    map: &[usize],
    level: Level,
    count: usize,
    parent_count: usize,
) -> Result<(), Error> {
    if map.len() != count {
        return Err(Error::CardinalityMismatch {
            name: format!("{level} containment map"),
            level,
            expected: count,
            found: map.len(),
        });
    }
    match map.iter().enumerate().find(|&(_, &p)| p >= parent_count) {
        Some((index, &parent)) => Err(Error::ContainmentOutOfRange {
            level,
            index,
            parent,
            parent_count,
        }),
        None => Ok(()),
    }
}

/// Time-invariant description of a particle population.
///
/// Attribute columns always hold exactly one value per entity at their level.
/// Columns can be attached after construction, but existing columns never
/// change length.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    counts: EntityCounts,
    attributes: BTreeMap<String, AttributeArray>,
    atom_resindex: Option<Vec<usize>>,
    residue_segindex: Option<Vec<usize>>,
}

impl Topology {
    pub fn builder(n_atoms: usize) -> TopologyBuilder {
        TopologyBuilder::new(n_atoms)
    }

    #[inline]
    pub fn counts(&self) -> EntityCounts {
        self.counts
    }

    #[inline]
    pub fn n_atoms(&self) -> usize {
        self.counts.atoms
    }

    #[inline]
    pub fn n_residues(&self) -> usize {
        self.counts.residues
    }

    #[inline]
    pub fn n_segments(&self) -> usize {
        self.counts.segments
    }

    /// Returns the column with the given plural name.
    pub fn attribute(&self, name: &str) -> Result<&AttributeArray, Error> {
        self.attributes
            .get(name)
            .ok_or_else(|| Error::not_in_topology(name))
    }

    /// Returns the column whose spec answers to `key` (plural or singular).
    pub fn find(&self, key: &str) -> Result<&AttributeArray, Error> {
        self.attribute(key).or_else(|_| {
            self.attributes
                .values()
                .find(|a| a.spec().singular == key)
                .ok_or_else(|| Error::not_in_topology(key))
        })
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Iterates columns in name order.
    pub fn attributes(&self) -> impl Iterator<Item = &AttributeArray> {
        self.attributes.values()
    }

    pub fn ints(&self, name: &str) -> Result<&[i64], Error> {
        match self.attribute(name)?.values() {
            AttributeValues::Int(v) => Ok(v),
            other => Err(type_mismatch(name, ElementType::Int, other)),
        }
    }

    pub fn floats(&self, name: &str) -> Result<&[f64], Error> {
        match self.attribute(name)?.values() {
            AttributeValues::Float(v) => Ok(v),
            other => Err(type_mismatch(name, ElementType::Float, other)),
        }
    }

    pub fn strings(&self, name: &str) -> Result<&[String], Error> {
        match self.attribute(name)?.values() {
            AttributeValues::String(v) => Ok(v),
            other => Err(type_mismatch(name, ElementType::String, other)),
        }
    }

    pub fn vectors(&self, name: &str) -> Result<&[[f32; 3]], Error> {
        match self.attribute(name)?.values() {
            AttributeValues::Vector3(v) => Ok(v),
            other => Err(type_mismatch(name, ElementType::Vector3, other)),
        }
    }

    /// Attaches a column for an attribute registered in `registry`.
    ///
    /// Fails with [`Error::NotFound`] if `name` is not registered.
    pub fn add_attribute(
        &mut self,
        registry: &AttributeRegistry,
        name: &str,
        values: impl Into<AttributeValues>,
    ) -> Result<(), Error> {
        let spec = registry.lookup(name)?.clone();
        self.attach(spec, values.into())
    }

    /// Attaches a column described by `spec`.
    pub fn attach(&mut self, spec: AttributeSpec, values: AttributeValues) -> Result<(), Error> {
        if self.attributes.contains_key(&spec.name) {
            return Err(Error::DuplicateAttribute(spec.name));
        }
        let expected = self.counts.get(spec.level);
        if values.len() != expected {
            return Err(Error::CardinalityMismatch {
                name: spec.name,
                level: spec.level,
                expected,
                found: values.len(),
            });
        }

        let array = AttributeArray::new(spec, values)?;
        trace!(
            name = array.name(),
            level = %array.level(),
            len = array.len(),
            "attribute attached"
        );
        self.attributes.insert(array.name().to_string(), array);
        Ok(())
    }

    /// Overwrites one value of a mutable attribute.
    pub fn set_value(
        &mut self,
        name: &str,
        index: usize,
        value: AttributeValue,
    ) -> Result<(), Error> {
        let counts = self.counts;
        let array = self
            .attributes
            .get_mut(name)
            .ok_or_else(|| Error::not_in_topology(name))?;
        let spec = array.spec();

        if !spec.mutable {
            return Err(Error::ReadOnly(spec.name.clone()));
        }
        if value.element_type() != spec.element_type {
            return Err(Error::TypeMismatch {
                name: spec.name.clone(),
                expected: spec.element_type,
                found: value.element_type(),
            });
        }
        let count = counts.get(spec.level);
        if index >= count {
            return Err(Error::EntityOutOfRange {
                level: spec.level,
                index,
                count,
            });
        }

        array.values_mut().replace(index, value);
        Ok(())
    }

    pub fn atom(&self, index: usize) -> Result<Entity<'_>, Error> {
        self.entity(Level::Atom, index)
    }

    pub fn residue(&self, index: usize) -> Result<Entity<'_>, Error> {
        self.entity(Level::Residue, index)
    }

    pub fn segment(&self, index: usize) -> Result<Entity<'_>, Error> {
        self.entity(Level::Segment, index)
    }

    pub fn entity(&self, level: Level, index: usize) -> Result<Entity<'_>, Error> {
        let count = self.counts.get(level);
        if index >= count {
            return Err(Error::EntityOutOfRange {
                level,
                index,
                count,
            });
        }
        Ok(Entity {
            topology: self,
            level,
            index,
        })
    }

    pub fn atom_resindex(&self) -> Option<&[usize]> {
        self.atom_resindex.as_deref()
    }

    pub fn residue_segindex(&self) -> Option<&[usize]> {
        self.residue_segindex.as_deref()
    }

    /// Indices of the atoms owned by residue `index`, in atom order.
    pub fn residue_atoms(&self, index: usize) -> Result<Vec<usize>, Error> {
        self.residue(index)?;
        Ok(self
            .atom_resindex
            .iter()
            .flatten()
            .enumerate()
            .filter(|&(_, &r)| r == index)
            .map(|(atom, _)| atom)
            .collect())
    }

    fn parent_of(&self, level: Level, index: usize) -> Option<(Level, usize)> {
        match level {
            Level::Atom => self
                .atom_resindex
                .as_ref()
                .map(|m| (Level::Residue, m[index])),
            Level::Residue => self
                .residue_segindex
                .as_ref()
                .map(|m| (Level::Segment, m[index])),
            Level::Segment => None,
        }
    }
}

fn type_mismatch(name: &str, requested: ElementType, values: &AttributeValues) -> Error {
    Error::TypeMismatch {
        name: name.to_string(),
        expected: values.element_type(),
        found: requested,
    }
}

/// A single atom, residue or segment of a [`Topology`].
#[derive(Debug, Clone, Copy)]
pub struct Entity<'a> {
    topology: &'a Topology,
    level: Level,
    index: usize,
}

impl<'a> Entity<'a> {
    #[inline]
    pub fn level(&self) -> Level {
        self.level
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Reads an attribute value by plural or singular name.
    ///
    /// Attributes declared at a coarser level are read through the containment
    /// map, so an atom answers `resid` with its residue's value. A missing
    /// column, or a missing containment map on the way up, is
    /// [`Error::NotFound`].
    pub fn get(&self, key: &str) -> Result<ValueRef<'a>, Error> {
        let array = self.topology.find(key)?;
        let target = array.level();

        let mut level = self.level;
        let mut index = self.index;
        while level < target {
            (level, index) = self
                .topology
                .parent_of(level, index)
                .ok_or_else(|| Error::not_in_topology(key))?;
        }
        if level != target {
            return Err(Error::not_in_topology(key));
        }

        array
            .get(index)
            .ok_or(Error::EntityOutOfRange {
                level,
                index,
                count: array.len(),
            })
    }

    /// The residue containing this atom, if the topology has one.
    pub fn residue(&self) -> Option<Entity<'a>> {
        self.ancestor(Level::Residue)
    }

    /// The segment containing this atom or residue.
    pub fn segment(&self) -> Option<Entity<'a>> {
        self.ancestor(Level::Segment)
    }

    fn ancestor(&self, target: Level) -> Option<Entity<'a>> {
        let mut level = self.level;
        let mut index = self.index;
        while level < target {
            (level, index) = self.topology.parent_of(level, index)?;
        }
        (level == target && self.level != target).then_some(Entity {
            topology: self.topology,
            level,
            index,
        })
    }
}
