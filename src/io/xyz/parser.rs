use super::{BlockReader, FORMAT};
use crate::io::{Error, TopologyParser, util};
use crate::model::attribute::{AttributeSpec, Level};
use crate::model::element::{atomic_mass, guess_element};
use crate::model::frame::Frame;
use crate::model::registry::AttributeRegistry;
use crate::model::topology::{ResidueGrouping, Topology, TopologyBuilder};
use serde::Deserialize;
use std::io::BufRead;
use tracing::{debug, warn};

/// What the parser does when an atom name matches no element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownElements {
    /// Leave `elements` and `masses` out of the topology.
    #[default]
    Omit,
    /// Reject the input at the first unknown atom.
    Fail,
}

/// Builds a topology from the first block of an XYZ input.
///
/// The first token of each row becomes the atom name; `elements` is guessed
/// from it. Later blocks are not read.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct XyzParser {
    pub grouping: ResidueGrouping,
    /// Fill `masses` from guessed elements when that attribute is registered.
    pub guess_masses: bool,
    pub unknown_elements: UnknownElements,
}

impl Default for XyzParser {
    fn default() -> Self {
        Self {
            grouping: ResidueGrouping::PerAtom,
            guess_masses: true,
            unknown_elements: UnknownElements::default(),
        }
    }
}

impl TopologyParser for XyzParser {
    fn format(&self) -> &str {
        FORMAT
    }

    fn parse(
        &self,
        reader: &mut dyn BufRead,
        registry: &AttributeRegistry,
    ) -> Result<Topology, Error> {
        let mut blocks = BlockReader::new();
        let mut names = Vec::new();
        if let Some(n_atoms) = blocks.read_count(reader)? {
            names.reserve(n_atoms);
            blocks.read_body(reader, n_atoms, &mut Frame::default(), |symbol| {
                names.push(symbol.to_string())
            })?;
        }
        let n_atoms = names.len();
        // Atom rows are the last `n_atoms` lines consumed.
        let first_row = blocks.line_no() + 1 - n_atoms;

        let mut builder = TopologyBuilder::new(n_atoms);
        if let Some(elements) = self.guess_elements(&names, first_row)? {
            if let Some(spec) = atom_spec(registry, "elements") {
                let column: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                builder = builder.attribute(spec, column);
            }
            if self.guess_masses
                && let Some(spec) = atom_spec(registry, "masses")
            {
                let column: Option<Vec<f64>> = elements.iter().map(|e| atomic_mass(e)).collect();
                match column {
                    Some(column) => builder = builder.attribute(spec, column),
                    None => warn!(format = FORMAT, "no mass for some elements; masses omitted"),
                }
            }
        }
        if let Some(spec) = atom_spec(registry, "names") {
            builder = builder.attribute(spec, names);
        }

        let topology = util::add_default_hierarchy(builder, &self.grouping, registry)?.build()?;
        debug!(
            format = FORMAT,
            atoms = topology.n_atoms(),
            residues = topology.n_residues(),
            "topology parsed"
        );
        Ok(topology)
    }
}

impl XyzParser {
    /// One element per atom, or `None` when some atom is unknown and the
    /// policy is to omit.
    fn guess_elements(
        &self,
        names: &[String],
        first_row: usize,
    ) -> Result<Option<Vec<&'static str>>, Error> {
        let mut elements = Vec::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            match guess_element(name) {
                Some(element) => elements.push(element),
                None if self.unknown_elements == UnknownElements::Fail => {
                    return Err(Error::malformed(
                        FORMAT,
                        first_row + i,
                        format!("cannot guess element for '{name}'"),
                    ));
                }
                None => {
                    warn!(
                        format = FORMAT,
                        atom = %name,
                        "unknown element; elements and masses omitted"
                    );
                    return Ok(None);
                }
            }
        }
        Ok(Some(elements))
    }
}

fn atom_spec(registry: &AttributeRegistry, name: &str) -> Option<AttributeSpec> {
    registry
        .lookup(name)
        .ok()
        .filter(|spec| spec.level == Level::Atom)
        .cloned()
}
